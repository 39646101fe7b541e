//! RSA key generation
//!
//! Split the requested modulus size between two primes `p` and `q`, with `p`
//! drawn somewhere in the middle half of the range rather than at exactly half.
//!
//! `n` = `p` * `q` and `φ(n)` = `(p-1)` × `(q-1)`.
//!
//! The public exponent `e` is a random integer of the full key size, redrawn until
//! gcd(`e`, `φ(n)`) = 1. The private exponent `d` is the inverse of `e` mod `φ(n)`.
//!
//! We end up with:
//!   - Pubkey: (n, e)
//!   - Privkey: (n, d)

use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::Rng;
use std::fmt::{self, Display, Formatter};

use crate::error::{Result, RsaError};
use crate::numtheory::{gcd, make_prime_bounded, mod_inverse};

/// Smallest modulus size that still leaves each prime at least 2 bits
/// and each cipher block at least one byte of payload.
pub const MIN_KEY_BITS: u64 = 32;
pub const DEFAULT_BITS: u64 = 256;
pub const DEFAULT_ITERS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeygenParams {
    /// requested size of `n`
    pub bits: u64,
    /// Miller-Rabin rounds per candidate
    pub iters: u64,
    /// ceiling on candidates per prime; `None` searches forever
    pub max_prime_attempts: Option<u64>,
}

impl Default for KeygenParams {
    fn default() -> Self {
        KeygenParams {
            bits: DEFAULT_BITS,
            iters: DEFAULT_ITERS,
            max_prime_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub p: BigUint,
    pub q: BigUint,
    pub n: BigUint, // modulo
    pub e: BigUint, // pubkey
    pub d: BigUint, // privkey
}

impl Display for KeyPair {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "KeyPair {{")?;
        writeln!(f, "\tp: {:02x},", self.p)?;
        writeln!(f, "\tq: {:02x},", self.q)?;
        writeln!(f, "\tn: {:02x},", self.n)?;
        writeln!(f, "\te: {:02x},", self.e)?;
        writeln!(f, "\td: {:02x},", self.d)?;
        write!(f, "}}")
    }
}

/// Picks (p_bits, q_bits) for a `bits`-bit modulus.
///
/// `p_bits` is drawn from [bits/4 + 1, bits - bits/4] and `q_bits` takes the rest.
/// `p` then gets one extra bit, so `n` usually comes out at `bits + 1` bits.
fn split_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> (u64, u64) {
    let quarter = bits / 4;
    let p_bits = rng.gen_range(quarter + 1..=bits - quarter);
    let q_bits = bits - p_bits;
    (p_bits + 1, q_bits)
}

/// Generate a `KeyPair` with a modulus of roughly `params.bits` bits
pub fn generate_keypair<R: Rng + ?Sized>(params: &KeygenParams, rng: &mut R) -> Result<KeyPair> {
    if params.bits < MIN_KEY_BITS {
        return Err(RsaError::KeyTooSmall {
            bits: params.bits,
            min: MIN_KEY_BITS,
        });
    }
    if params.iters == 0 {
        return Err(RsaError::InvalidIterations);
    }

    let (p_bits, q_bits) = split_bits(params.bits, rng);
    debug!("splitting {} bits as p: {p_bits}, q: {q_bits}", params.bits);

    let p = make_prime_bounded(p_bits, params.iters, params.max_prime_attempts, rng)?;
    let mut q = make_prime_bounded(q_bits, params.iters, params.max_prime_attempts, rng)?;
    while q == p {
        debug!("q collided with p, drawing again");
        q = make_prime_bounded(q_bits, params.iters, params.max_prime_attempts, rng)?;
    }

    let n = &p * &q;

    // `φ(n)` = `(p-1)` × `(q-1)`
    let totient = (&p - BigUint::one()) * (&q - BigUint::one());

    let mut attempts = 0u64;
    let e = loop {
        attempts += 1;
        let e = rng.gen_biguint(params.bits);
        if gcd(&e, &totient).is_one() {
            break e;
        }
    };
    debug!("public exponent found after {attempts} candidates");

    let d = mod_inverse(&e, &totient).ok_or(RsaError::NotInvertible)?;

    Ok(KeyPair { p, q, n, e, d })
}
