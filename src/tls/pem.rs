//! PEM 清理、私钥解析、证书与私钥配对
//!
//! Keys may be PKCS#8 (RSA, EC P-256, EC P-384), PKCS#1 RSA or SEC1 EC.

use crate::utils::{DockerenvError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use x509_parser::prelude::*;

/// Undoes the usual damage env files do to PEM values: literal `\n` and surrounding quotes.
pub fn normalize_pem(name: &str, raw: &str) -> String {
    let mut data = raw.to_string();

    if data.contains("\\n") {
        log::warn!("detected double escaping in {}", name);
        data = data.replace("\\n", "\n");
    }

    if data.len() >= 2 && data.starts_with('"') && data.ends_with('"') {
        log::warn!("removing extra quotes from {}", name);
        data = data[1..data.len() - 1].to_string();
    }

    data
}

/// Base64-decodes a raw value, ignoring embedded whitespace.
pub fn decode_base64(name: &str, raw: &str) -> Result<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DockerenvError::Parse(format!("{}: invalid base64: {}", name, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DockerenvError::Parse(format!("{}: decoded value is not UTF-8: {}", name, e)))
}

/// DER bodies of every `CERTIFICATE` block, in order.
pub fn certificate_blocks(pem_data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let blocks = ::pem::parse_many(pem_data)
        .map_err(|e| DockerenvError::Parse(format!("PEM: {}", e)))?;
    Ok(blocks
        .iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.contents().to_vec())
        .collect())
}

#[derive(Debug)]
struct PrivateKeyInfo {
    public_key_spki: Vec<u8>,
    key_type: &'static str,
}

/// A certificate chain whose leaf matches a private key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// DER certificates, leaf first.
    pub chain: Vec<Vec<u8>>,
    pub key_type: &'static str,
}

impl KeyPair {
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let chain = certificate_blocks(cert_pem)
            .map_err(|e| DockerenvError::KeyPair(format!("cert: {}", e)))?;
        if chain.is_empty() {
            return Err(DockerenvError::KeyPair(
                "no CERTIFICATE block found in cert PEM".to_string(),
            ));
        }

        let key = parse_private_key(key_pem)?;

        let (_, leaf) = X509Certificate::from_der(&chain[0])
            .map_err(|e| DockerenvError::KeyPair(format!("leaf certificate: {}", e)))?;

        if leaf.public_key().raw != key.public_key_spki.as_slice() {
            return Err(DockerenvError::KeyPair(
                "private key does not match public key in certificate".to_string(),
            ));
        }

        Ok(Self {
            chain,
            key_type: key.key_type,
        })
    }
}

fn key_err(kind: &str, e: impl std::fmt::Display) -> DockerenvError {
    DockerenvError::KeyPair(format!("{}: {}", kind, e))
}

fn parse_private_key(key_pem: &[u8]) -> Result<PrivateKeyInfo> {
    let blocks = ::pem::parse_many(key_pem).map_err(|e| key_err("key PEM", e))?;

    for p in &blocks {
        match p.tag() {
            "PRIVATE KEY" => return parse_pkcs8(p.contents()),
            "RSA PRIVATE KEY" => return parse_pkcs1_rsa(p.contents()),
            "EC PRIVATE KEY" => return parse_sec1_ec(p.contents()),
            // EC PARAMETERS 等
            _ => continue,
        }
    }

    Err(DockerenvError::KeyPair(
        "no private key block found in key PEM".to_string(),
    ))
}

fn parse_pkcs8(der: &[u8]) -> Result<PrivateKeyInfo> {
    {
        use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
        if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
            let spki = rsa::RsaPublicKey::from(&key)
                .to_public_key_der()
                .map_err(|e| key_err("RSA public key", e))?;
            return Ok(PrivateKeyInfo {
                public_key_spki: spki.as_bytes().to_vec(),
                key_type: "RSA",
            });
        }
    }

    {
        use p256::pkcs8::{DecodePrivateKey, EncodePublicKey};
        if let Ok(key) = p256::SecretKey::from_pkcs8_der(der) {
            let spki = key
                .public_key()
                .to_public_key_der()
                .map_err(|e| key_err("EC P-256 public key", e))?;
            return Ok(PrivateKeyInfo {
                public_key_spki: spki.as_bytes().to_vec(),
                key_type: "EC P-256",
            });
        }
    }

    {
        use p384::pkcs8::{DecodePrivateKey, EncodePublicKey};
        if let Ok(key) = p384::SecretKey::from_pkcs8_der(der) {
            let spki = key
                .public_key()
                .to_public_key_der()
                .map_err(|e| key_err("EC P-384 public key", e))?;
            return Ok(PrivateKeyInfo {
                public_key_spki: spki.as_bytes().to_vec(),
                key_type: "EC P-384",
            });
        }
    }

    Err(DockerenvError::KeyPair(
        "unsupported key type in PKCS#8 container".to_string(),
    ))
}

fn parse_pkcs1_rsa(der: &[u8]) -> Result<PrivateKeyInfo> {
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs8::EncodePublicKey;

    let key = rsa::RsaPrivateKey::from_pkcs1_der(der).map_err(|e| key_err("PKCS#1 RSA key", e))?;
    let spki = rsa::RsaPublicKey::from(&key)
        .to_public_key_der()
        .map_err(|e| key_err("RSA public key", e))?;

    Ok(PrivateKeyInfo {
        public_key_spki: spki.as_bytes().to_vec(),
        key_type: "RSA",
    })
}

fn parse_sec1_ec(der: &[u8]) -> Result<PrivateKeyInfo> {
    if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
        use p256::pkcs8::EncodePublicKey;
        let spki = key
            .public_key()
            .to_public_key_der()
            .map_err(|e| key_err("EC P-256 public key", e))?;
        return Ok(PrivateKeyInfo {
            public_key_spki: spki.as_bytes().to_vec(),
            key_type: "EC P-256",
        });
    }

    if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
        use p384::pkcs8::EncodePublicKey;
        let spki = key
            .public_key()
            .to_public_key_der()
            .map_err(|e| key_err("EC P-384 public key", e))?;
        return Ok(PrivateKeyInfo {
            public_key_spki: spki.as_bytes().to_vec(),
            key_type: "EC P-384",
        });
    }

    Err(DockerenvError::KeyPair(
        "unsupported EC curve (only P-256 and P-384 are supported)".to_string(),
    ))
}
