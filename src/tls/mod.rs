//! tls verify：读取容器里的 PEM 证书/私钥，配对后逐张打印

pub mod elapsed;
pub mod pem;
pub mod report;

pub use self::pem::{normalize_pem, KeyPair};
pub use report::{inspect_certificate, render_report, CertificateReport};

use crate::inspector::Inspector;
use crate::utils::{DockerenvError, Result};
use chrono::{DateTime, Utc};
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Variable holding the PEM certificate (chain).
    pub cert_var: String,
    /// Variable holding the PEM private key.
    pub key_var: String,
    pub ca_var: Option<String>,
    pub b64decode: bool,
}

#[derive(Debug)]
pub struct VerifyOutcome {
    pub key_type: &'static str,
    /// One entry per certificate in the chain; a failed parse does not stop the rest.
    pub chain: Vec<Result<CertificateReport>>,
    pub ca: Vec<Result<CertificateReport>>,
    /// Whether the last chain certificate was issued by (or is) one of the CA certificates.
    /// `None` without a CA.
    pub signed_by_ca: Option<bool>,
}

pub fn verify(inspector: &dyn Inspector, container_id: &str, opts: &VerifyOptions) -> Result<VerifyOutcome> {
    let cert_pem = fetch_pem(inspector, container_id, &opts.cert_var, opts.b64decode)?;
    let key_pem = fetch_pem(inspector, container_id, &opts.key_var, opts.b64decode)?;
    let ca_pem = match &opts.ca_var {
        Some(var) => Some(fetch_pem(inspector, container_id, var, opts.b64decode)?),
        None => None,
    };

    let pair = KeyPair::from_pem(cert_pem.as_bytes(), key_pem.as_bytes())?;
    log::info!("Loaded {} key pair with {} certs", pair.key_type, pair.chain.len());

    let chain: Vec<Result<CertificateReport>> = pair
        .chain
        .iter()
        .enumerate()
        .map(|(i, der)| inspect_certificate(i, der))
        .collect();

    let ca = match &ca_pem {
        Some(data) => {
            let blocks = self::pem::certificate_blocks(data.as_bytes())?;
            if blocks.is_empty() {
                return Err(DockerenvError::Parse(format!(
                    "no CERTIFICATE block found in {}",
                    opts.ca_var.as_deref().unwrap_or("CA cert")
                )));
            }
            blocks
                .iter()
                .enumerate()
                .map(|(i, der)| inspect_certificate(i, der))
                .collect()
        }
        None => Vec::new(),
    };

    let signed_by_ca = ca_pem.as_ref().map(|_| issued_by_any(&chain, &ca));

    Ok(VerifyOutcome {
        key_type: pair.key_type,
        chain,
        ca,
        signed_by_ca,
    })
}

pub fn run_verify(
    inspector: &dyn Inspector,
    container_id: &str,
    opts: &VerifyOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let outcome = verify(inspector, container_id, opts)?;
    out.write_all(render_outcome(&outcome, Utc::now()).as_bytes())?;
    Ok(())
}

pub fn render_outcome(outcome: &VerifyOutcome, now: DateTime<Utc>) -> String {
    let mut text = String::new();
    render_section(&mut text, "Certificate", &outcome.chain, now);
    render_section(&mut text, "CA Certificate", &outcome.ca, now);

    if let Some(signed) = outcome.signed_by_ca {
        text.push_str(&format!("Chain issued by CA: {}\n", if signed { "yes" } else { "no" }));
    }
    text
}

fn render_section(text: &mut String, title: &str, reports: &[Result<CertificateReport>], now: DateTime<Utc>) {
    for entry in reports {
        match entry {
            Ok(r) => {
                text.push_str(&render_report(r, title, now));
                text.push('\n');
            }
            Err(e) => {
                log::error!("{}", e);
                text.push_str(&format!("{}: {}\n\n", title, e));
            }
        }
    }
}

fn fetch_pem(inspector: &dyn Inspector, container_id: &str, var: &str, b64decode: bool) -> Result<String> {
    let raw = inspector.get_value(container_id, var)?;
    let raw = if b64decode {
        self::pem::decode_base64(var, &raw)?
    } else {
        raw
    };
    Ok(normalize_pem(var, &raw))
}

fn issued_by_any(chain: &[Result<CertificateReport>], ca: &[Result<CertificateReport>]) -> bool {
    let Some(Ok(last)) = chain.last() else {
        return false;
    };
    ca.iter()
        .flatten()
        .any(|c| c.subject == last.issuer || c.subject == last.subject)
}
