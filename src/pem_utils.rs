//! PEM armor for certificates and private keys.
//!
//! Decoding accepts exactly one block. Anything other than whitespace after
//! the first block is reported as [`CaError::MalformedChain`]; certificate
//! chains are not supported.

use crate::cert::Certificate;
use crate::error::{CaError, Result};
use crate::key::KeyPair;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a single PEM block with the expected label to DER-encoded bytes.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let block = pem::parse(pem_str)?;
    if block.tag() != label {
        return Err(CaError::UnexpectedPemLabel {
            expected: label.to_string(),
            found: block.tag().to_string(),
        });
    }

    let end_marker = format!("-----END {label}-----");
    let rest = pem_str
        .find(&end_marker)
        .map(|at| &pem_str[at + end_marker.len()..])
        .unwrap_or_default();
    if !rest.trim().is_empty() {
        return Err(CaError::MalformedChain);
    }

    Ok(block.into_contents())
}

/// Wraps a DER certificate in `CERTIFICATE` armor.
pub fn encode_certificate(der: &[u8]) -> String {
    der_to_pem(der, CERTIFICATE_LABEL)
}

/// Serializes `key` as PKCS#8 and wraps it in `PRIVATE KEY` armor.
pub fn encode_private_key(key: &KeyPair) -> Result<String> {
    let der = key.to_pkcs8_der()?;
    Ok(der_to_pem(der.as_bytes(), PRIVATE_KEY_LABEL))
}

/// Parses exactly one `CERTIFICATE` block.
pub fn decode_certificate(pem_str: &str) -> Result<Certificate> {
    Certificate::from_der(&pem_to_der(pem_str, CERTIFICATE_LABEL)?)
}

/// Parses exactly one `PRIVATE KEY` block holding an RSA key.
pub fn decode_private_key(pem_str: &str) -> Result<KeyPair> {
    KeyPair::from_pkcs8_der(&pem_to_der(pem_str, PRIVATE_KEY_LABEL)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = b"not really a certificate";

    #[test]
    fn test_armor_lines() {
        let text = encode_certificate(BODY);
        assert!(text.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(text.trim_end().ends_with("-----END CERTIFICATE-----"));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_crlf_input_is_accepted() {
        let text = encode_certificate(BODY).replace('\n', "\r\n");
        assert_eq!(pem_to_der(&text, CERTIFICATE_LABEL).unwrap(), BODY);
    }

    #[test]
    fn test_two_blocks_are_a_chain_error() {
        let text = format!("{}{}", encode_certificate(BODY), encode_certificate(BODY));
        assert!(matches!(
            pem_to_der(&text, CERTIFICATE_LABEL),
            Err(CaError::MalformedChain)
        ));
    }

    #[test]
    fn test_trailing_garbage_is_a_chain_error() {
        let text = format!("{}junk\n", encode_certificate(BODY));
        assert!(matches!(
            pem_to_der(&text, CERTIFICATE_LABEL),
            Err(CaError::MalformedChain)
        ));
    }

    #[test]
    fn test_wrong_label_is_reported() {
        let text = der_to_pem(BODY, "RSA PRIVATE KEY");
        match pem_to_der(&text, PRIVATE_KEY_LABEL) {
            Err(CaError::UnexpectedPemLabel { expected, found }) => {
                assert_eq!(expected, "PRIVATE KEY");
                assert_eq!(found, "RSA PRIVATE KEY");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_block_is_reported() {
        assert!(matches!(
            pem_to_der("", CERTIFICATE_LABEL),
            Err(CaError::MissingPemBlock(_))
        ));
    }

    #[test]
    fn test_undecodable_certificate_body() {
        let err = decode_certificate(&encode_certificate(BODY)).unwrap_err();
        assert!(matches!(err, CaError::Decoding(_)));
    }
}
