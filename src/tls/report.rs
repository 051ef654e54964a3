//! 单张证书的可读报告

use crate::tls::elapsed::time_elapsed;
use crate::utils::{DockerenvError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub oid: String,
    pub critical: bool,
    /// Raw extension value, hex encoded.
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct CertificateReport {
    pub index: usize,
    pub is_ca: bool,
    pub subject: String,
    pub issuer: String,
    pub subject_key_id: Option<String>,
    pub authority_key_id: Option<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub key_usage: Vec<&'static str>,
    pub ext_key_usage: Vec<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub permitted_dns_domains: Vec<String>,
    pub extensions: Vec<ExtensionEntry>,
}

/// Parses one DER certificate into a report.
pub fn inspect_certificate(index: usize, der: &[u8]) -> Result<CertificateReport> {
    let err = |message: String| DockerenvError::CertParse { index, message };

    let (_, cert) = X509Certificate::from_der(der).map_err(|e| err(e.to_string()))?;

    let mut subject_key_id = None;
    let mut authority_key_id = None;
    let mut extensions = Vec::new();
    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(kid) => {
                subject_key_id = Some(hex::encode(kid.0));
            }
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                authority_key_id = aki.key_identifier.as_ref().map(|k| hex::encode(k.0));
            }
            _ => {}
        }
        extensions.push(ExtensionEntry {
            oid: ext.oid.to_id_string(),
            critical: ext.critical,
            value: hex::encode(ext.value),
        });
    }

    let key_usage = match cert.key_usage().map_err(|e| err(e.to_string()))? {
        Some(ku) => key_usage_names(ku.value),
        None => Vec::new(),
    };

    let ext_key_usage = match cert.extended_key_usage().map_err(|e| err(e.to_string()))? {
        Some(eku) => ext_key_usage_names(eku.value),
        None => Vec::new(),
    };

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Some(san) = cert.subject_alternative_name().map_err(|e| err(e.to_string()))? {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                GeneralName::IPAddress(raw) => {
                    if let Some(ip) = ip_from_bytes(raw) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    let mut permitted_dns_domains = Vec::new();
    if let Some(nc) = cert.name_constraints().map_err(|e| err(e.to_string()))? {
        for subtree in nc.value.permitted_subtrees.iter().flatten() {
            if let GeneralName::DNSName(d) = &subtree.base {
                permitted_dns_domains.push(d.to_string());
            }
        }
    }

    Ok(CertificateReport {
        index,
        is_ca: cert.is_ca(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        subject_key_id,
        authority_key_id,
        not_before: to_utc(cert.validity().not_before.timestamp(), index)?,
        not_after: to_utc(cert.validity().not_after.timestamp(), index)?,
        key_usage,
        ext_key_usage,
        dns_names,
        ip_addresses,
        permitted_dns_domains,
        extensions,
    })
}

/// Every set usage bit, in bit order.
pub fn key_usage_names(ku: &KeyUsage) -> Vec<&'static str> {
    let flags = [
        (ku.digital_signature(), "Digital Signature"),
        (ku.non_repudiation(), "Content Commitment"),
        (ku.key_encipherment(), "Key Encipherment"),
        (ku.data_encipherment(), "Data Encipherment"),
        (ku.key_agreement(), "Key Agreement"),
        (ku.key_cert_sign(), "Certificate Sign"),
        (ku.crl_sign(), "CRL Sign"),
        (ku.encipher_only(), "Encipher Only"),
        (ku.decipher_only(), "Decipher Only"),
    ];

    let mut names = Vec::new();
    for (set, name) in flags {
        if set {
            names.push(name);
        }
    }
    names
}

pub fn ext_key_usage_names(eku: &ExtendedKeyUsage) -> Vec<String> {
    let known = [
        (eku.any, "Any"),
        (eku.server_auth, "Server Authentication"),
        (eku.client_auth, "Client Authentication"),
        (eku.code_signing, "Code Signing"),
        (eku.email_protection, "Email Protection"),
        (eku.time_stamping, "Time Stamping"),
        (eku.ocsp_signing, "OCSP Signing"),
    ];

    known
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| name.to_string())
        .chain(eku.other.iter().map(|oid| oid.to_id_string()))
        .collect()
}

fn ip_from_bytes(raw: &[u8]) -> Option<IpAddr> {
    match raw.len() {
        4 => <[u8; 4]>::try_from(raw).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(raw).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

fn to_utc(timestamp: i64, index: usize) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| DockerenvError::CertParse {
            index,
            message: format!("invalid timestamp {}", timestamp),
        })
}

// ── 文本输出 ────────────────────────────────────────────────────────────────

pub fn render_report(report: &CertificateReport, title: &str, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let heading = format!("{} {} (CA: {})", title, report.index, report.is_ca);
    // String 上的 write! 不会失败
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "{}", "=".repeat(heading.chars().count()));

    let _ = writeln!(out, "  Subject          : {}", report.subject);
    let _ = writeln!(out, "  Subject Key Id   : {}", report.subject_key_id.as_deref().unwrap_or("-"));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Issuer           : {}", report.issuer);
    let _ = writeln!(out, "  Authority Key Id : {}", report.authority_key_id.as_deref().unwrap_or("-"));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Not Before : {}   ({})",
        report.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
        time_elapsed(now, report.not_before, false));
    let _ = writeln!(out, "  Not After  : {}   ({})",
        report.not_after.format("%Y-%m-%d %H:%M:%S UTC"),
        time_elapsed(now, report.not_after, false));
    let _ = writeln!(out);

    if !report.key_usage.is_empty() {
        let _ = writeln!(out, "  Key Usage  : {}", report.key_usage.join(", "));
        let _ = writeln!(out);
    }

    if !report.ext_key_usage.is_empty() {
        let _ = writeln!(out, "  ExtKeyUsages ({}) : {}",
            report.ext_key_usage.len(), report.ext_key_usage.join(", "));
        let _ = writeln!(out);
    }

    list_section(&mut out, "DNSNames", &report.dns_names);
    let ips: Vec<String> = report.ip_addresses.iter().map(IpAddr::to_string).collect();
    list_section(&mut out, "IPAddresses", &ips);
    list_section(&mut out, "Permitted DNS Domains", &report.permitted_dns_domains);

    if !report.extensions.is_empty() {
        let _ = writeln!(out, "  Extensions ({})", report.extensions.len());
        for x in &report.extensions {
            let _ = writeln!(out, "    - ID: {}", x.oid);
            let _ = writeln!(out, "      Critical: {}", x.critical);
            let _ = writeln!(out, "      Value: {}", x.value);
        }
        let _ = writeln!(out);
    }

    out
}

fn list_section(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {} ({})", label, items.len());
    for item in items {
        let _ = writeln!(out, "    - {}", item);
    }
    let _ = writeln!(out);
}
