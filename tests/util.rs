#![allow(dead_code)]

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use signca::authority::{Authority, SigningSet};
use signca::clock::FixedClock;
use time::OffsetDateTime;
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2026-05-04 09:30:00 UTC);

/// An authority with a seeded RNG and a frozen clock.
pub fn authority(seed: u64) -> Authority<ChaCha20Rng, FixedClock> {
    Authority::with_parts(ChaCha20Rng::seed_from_u64(seed), FixedClock(NOW))
}

/// A root signing set for `authority.example.com` and a leaf for
/// `client.example.com` signed by it.
pub fn root_and_leaf() -> (SigningSet, SigningSet) {
    let mut authority = authority(42);
    let root = authority.create_root("authority.example.com").unwrap();
    let leaf = authority.issue(&root, "client.example.com").unwrap();
    (root, leaf)
}

/// Wraps a PKCS#8 document in `PRIVATE KEY` armor.
pub fn private_key_pem(pkcs8_der: &[u8]) -> String {
    signca::pem_utils::der_to_pem(pkcs8_der, "PRIVATE KEY")
}
