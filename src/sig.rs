//! RSA Sign and Verify
//!
//! Signature Generation
//! The owner's identity string is read as a base-62 numeral `m` and signed
//! directly, with no digest: s = m^d mod n
//!
//! Signature Verification
//! Given a signature `s`, we can verify that it was actually signed by the holder of the
//! private key `d` by recomputing t = s^e mod n
//!
//! The signature is valid iff t = m.

use num_bigint::BigUint;

use crate::error::{Result, RsaError};
use crate::numtheory::pow_mod;

/// Reads `identity` as base 62: 0-9, then A-Z, then a-z.
pub fn identity_to_int(identity: &str) -> Result<BigUint> {
    let digits = identity
        .bytes()
        .map(|c| match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'A'..=b'Z' => Some(c - b'A' + 10),
            b'a'..=b'z' => Some(c - b'a' + 36),
            _ => None,
        })
        .collect::<Option<Vec<u8>>>()
        .filter(|digits| !digits.is_empty())
        .ok_or_else(|| RsaError::InvalidIdentity(identity.to_string()))?;

    BigUint::from_radix_be(&digits, 62)
        .ok_or_else(|| RsaError::InvalidIdentity(identity.to_string()))
}

/// s = m^d mod n
pub fn sign(m: &BigUint, d: &BigUint, n: &BigUint) -> Result<BigUint> {
    if m >= n {
        return Err(RsaError::ValueOutOfRange);
    }

    Ok(pow_mod(m, d, n))
}

/// t = s^e mod n, valid iff t = m
pub fn verify(m: &BigUint, s: &BigUint, e: &BigUint, n: &BigUint) -> bool {
    if s >= n {
        return false;
    }

    pow_mod(s, e, n) == *m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::{generate_keypair, KeygenParams};
    use crate::randstate::RandState;

    #[test]
    fn test_identity_to_int() {
        assert_eq!(identity_to_int("0").unwrap(), BigUint::from(0u32));
        assert_eq!(identity_to_int("z").unwrap(), BigUint::from(61u32));
        assert_eq!(identity_to_int("10").unwrap(), BigUint::from(62u32));
        assert_eq!(identity_to_int("Ab").unwrap(), BigUint::from(10u32 * 62 + 37));

        assert!(identity_to_int("").is_err());
        assert!(identity_to_int("jane doe").is_err());
        assert!(identity_to_int("jane_doe").is_err());
    }

    #[test]
    fn test_sign_verify() {
        // textbook key: p = 61, q = 53
        let (n, e, d) = (BigUint::from(3233u32), BigUint::from(17u32), BigUint::from(2753u32));
        let m = BigUint::from(2790u32);

        let s = sign(&m, &d, &n).unwrap();
        assert_eq!(s, BigUint::from(65u32));
        assert!(verify(&m, &s, &e, &n));
        assert!(!verify(&BigUint::from(2791u32), &s, &e, &n));

        assert!(sign(&BigUint::from(3233u32), &d, &n).is_err());
    }

    #[test]
    fn test_sign_verify_generated_key() {
        let mut rng = RandState::new(42);
        let key = generate_keypair(&KeygenParams::default(), &mut rng).unwrap();
        let m = identity_to_int("alice").unwrap();

        let s = sign(&m, &key.d, &key.n).unwrap();
        assert!(verify(&m, &s, &key.e, &key.n));

        for bit in [0u64, 1, 7, 64, s.bits().saturating_sub(1)] {
            let mut tampered = s.clone();
            tampered.set_bit(bit, !s.bit(bit));
            assert!(!verify(&m, &tampered, &key.e, &key.n));
        }
    }
}
