//! # signca - a minimal certificate authority
//!
//! signca creates a self-signed RSA root certificate authority and uses it to
//! issue server certificates for named hosts. Certificates and keys are
//! stored as PEM files (`<name>.pem` and `<name>-key.pem`), built entirely with
//! the RustCrypto crates.
//!
//! ## Certificate shapes
//!
//! - **Root**: `O=<name>`, CA basic constraint, key usage `keyCertSign` and
//!   `digitalSignature`, extended key usage `serverAuth`, signed with
//!   SHA-512/RSA, carries a subject key identifier.
//! - **Leaf**: `O=<host>` plus a single DNS subject alternative name, not a CA,
//!   key usage `keyEncipherment` and `digitalSignature`, extended key usage
//!   `serverAuth`, signed with SHA-256/RSA, points at the root through an
//!   authority key identifier.
//!
//! Every certificate is valid for 365 days from issuance, has a random 128-bit
//! serial number and a fresh 2048-bit RSA key.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signca::authority::Authority;
//!
//! # fn main() -> Result<(), signca::error::CaError> {
//! let mut authority = Authority::new();
//!
//! // signing-cert.pem / signing-cert-key.pem
//! let (_, root) = authority.create_root_signing_set("signing-cert", "signing.example.com")?;
//!
//! // www.pem / www-key.pem, signed by the set above
//! let (names, leaf) =
//!     authority.create_signed_certificate("www", "www.example.com", "signing-cert")?;
//!
//! assert_eq!(leaf.cert.dns_names()?, vec!["www.example.com".to_string()]);
//! leaf.cert.verify_signed_by(&root.cert.public_key()?)?;
//! println!("wrote {}", names.certificate.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Working in memory
//!
//! ```rust,no_run
//! use signca::{authority::Authority, pem_utils};
//!
//! # fn main() -> Result<(), signca::error::CaError> {
//! let mut authority = Authority::new();
//! let root = authority.create_root("authority.example.com")?;
//! let leaf = authority.issue(&root, "client.example.com")?;
//!
//! let pem = leaf.certificate_pem()?;
//! let decoded = pem_utils::decode_certificate(&pem)?;
//! assert_eq!(decoded, leaf.cert);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`error::CaError`]; decoding failures have one
//! variant per cause:
//!
//! ```rust
//! use signca::{error::CaError, pem_utils};
//!
//! match pem_utils::decode_private_key("invalid pem data") {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(CaError::MissingPemBlock(msg)) => println!("No key found: {}", msg),
//!     Err(CaError::WrongKeyType { found }) => println!("Not an RSA key: {}", found),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`authority`]: the create-root and create-signed workflows, file naming
//! - [`cert`]: decoded certificates, templates and X.509 extensions
//! - [`issuer`]: signing a template against an issuer
//! - [`key`]: RSA key generation and PKCS#8 import/export
//! - [`pem_utils`]: PEM armor for certificates and keys
//! - [`serial`]: random serial numbers
//! - [`clock`]: injectable time source
//! - [`error`]: error types
//! - [`tbs_certificate`]: low-level to-be-signed structure assembly

pub mod authority;
pub mod cert;
pub mod clock;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod serial;
pub mod tbs_certificate;
