use std::fmt;

use rand_core::CryptoRngCore;
use x509_cert::serial_number::SerialNumber;

use crate::error::{CaError, Result};

/// A certificate serial number drawn uniformly from `[0, 2^128)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Serial(pub u128);

impl Serial {
    /// Number of random bytes behind every serial.
    pub const BYTES: usize = 16;

    /// Draws a fresh serial from a cryptographically secure source.
    ///
    /// Fails only when the source cannot deliver bytes.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Result<Self> {
        let mut bytes = [0u8; Self::BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CaError::Entropy(e.to_string()))?;
        Ok(Serial(u128::from_be_bytes(bytes)))
    }

    /// Encodes the serial as a positive DER integer.
    pub fn to_x509(self) -> Result<SerialNumber> {
        let bytes = self.0.to_be_bytes();
        let first = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        let mut minimal = Vec::with_capacity(Self::BYTES + 1);
        if bytes[first] & 0x80 != 0 {
            minimal.push(0);
        }
        minimal.extend_from_slice(&bytes[first..]);
        SerialNumber::new(&minimal).map_err(|e| CaError::Encoding(e.to_string()))
    }

    /// Reads a serial back from its certificate encoding.
    ///
    /// Serials wider than 128 bits were not issued by this authority and are
    /// rejected.
    pub fn from_x509(serial: &SerialNumber) -> Result<Self> {
        let raw = serial.as_bytes();
        let first = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        let magnitude = &raw[first..];
        if magnitude.len() > Self::BYTES {
            return Err(CaError::Decoding(format!(
                "serial number is {} bytes wide, at most {} supported",
                magnitude.len(),
                Self::BYTES
            )));
        }
        Ok(Serial(
            magnitude
                .iter()
                .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
        ))
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::{CryptoRng, OsRng, RngCore};

    struct DrainedRng;

    impl RngCore for DrainedRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            Err(rand_core::Error::new(std::io::Error::other("entropy pool closed")))
        }
    }

    impl CryptoRng for DrainedRng {}

    #[test]
    fn test_generated_serials_differ() {
        let a = Serial::generate(&mut OsRng).unwrap();
        let b = Serial::generate(&mut OsRng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_x509_encoding_preserves_value() {
        for value in [0u128, 1, 0x7f, 0x80, 0xff00, u128::MAX] {
            let serial = Serial(value);
            let encoded = serial.to_x509().unwrap();
            assert_eq!(Serial::from_x509(&encoded).unwrap(), serial);
        }
    }

    #[test]
    fn test_high_bit_serial_stays_positive() {
        use der::Encode;

        let der = Serial(u128::MAX).to_x509().unwrap().to_der().unwrap();
        // INTEGER, 17 octets, leading zero keeps it non-negative
        assert_eq!(&der[..3], &[0x02, 0x11, 0x00]);
    }

    #[test]
    fn test_entropy_failure_is_reported() {
        let err = Serial::generate(&mut DrainedRng).unwrap_err();
        assert!(matches!(err, CaError::Entropy(_)));
    }
}
