//! 终端表格：按终端宽度截断变量值

use crate::utils::EnvironmentMap;
use std::io::IsTerminal;

/// Separator plus right margin around the value column.
const PADDING: usize = 6;
const ELLIPSIS: &str = "...";

/// Width of stdout in columns, `None` when stdout is not a terminal.
pub fn terminal_width() -> Option<usize> {
    if !std::io::stdout().is_terminal() {
        return None;
    }
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => Some(cols as usize),
        _ => None,
    }
}

/// Cuts `value` to at most `width` characters, ending in `...` when cut.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width < ELLIPSIS.len() {
        return value.chars().take(width).collect();
    }

    let mut out: String = value.chars().take(width - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// One `KEY    VALUE` line per variable; values are cut to fit `width` when known.
pub fn render_table(values: &EnvironmentMap, width: Option<usize>) -> String {
    let key_width = values.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let value_width = width.map(|w| w.saturating_sub(key_width + PADDING));

    let mut out = String::new();
    for (key, value) in values {
        let shown = match value_width {
            Some(w) => truncate(value, w),
            None => value.clone(),
        };
        out.push_str(&format!("{:<kw$}    {}\n", key, shown, kw = key_width));
    }
    out
}
