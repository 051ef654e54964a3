pub mod display;

use crate::inspector::Inspector;
use crate::utils::Result;
use std::io::Write;

/// Prints every variable of the container as an aligned table.
pub fn run_list(inspector: &dyn Inspector, container_id: &str, out: &mut dyn Write) -> Result<()> {
    let values = inspector.get_all_values(container_id)?;
    log::debug!("{} variables in {}", values.len(), container_id);

    out.write_all(display::render_table(&values, display::terminal_width()).as_bytes())?;
    Ok(())
}

/// Prints one raw value, suitable for scripting.
pub fn run_get(
    inspector: &dyn Inspector,
    container_id: &str,
    var_name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let value = inspector.get_value(container_id, var_name)?;
    if value.is_empty() {
        writeln!(out, "<empty>")?;
    } else {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}
