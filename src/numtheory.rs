//! Number theory primitives
//!
//! Modular exponentiation, Miller-Rabin, prime search, gcd and modular inverse.
//! Randomized functions take the caller's RNG explicitly; nothing here holds state.

use log::{debug, trace};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::Rng;

use crate::error::{Result, RsaError};

/// out = base^exponent mod modulus, right-to-left square and multiply
pub fn pow_mod(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    let mut out = BigUint::one();
    let mut p = base.clone();
    let mut d = exponent.clone();

    while !d.is_zero() {
        if d.is_odd() {
            out = (&out * &p) % modulus;
        }
        p = (&p * &p) % modulus;
        d >>= 1;
    }

    out
}

/// Miller-Rabin with `iters` random witnesses.
/// The probability of a composite passing is at most 4^-iters.
pub fn is_prime<R: Rng + ?Sized>(n: &BigUint, iters: u64, rng: &mut R) -> bool {
    match u8::try_from(n) {
        Ok(0) | Ok(1) | Ok(4) => return false,
        Ok(2) | Ok(3) => return true,
        _ => {}
    }
    if n.is_even() {
        return false;
    }

    // n - 1 = 2^s * r, r odd
    let n_minus_1 = n - 1u32;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let r = &n_minus_1 >> s;
    let two = BigUint::from(2u32);

    'witness: for _ in 0..iters {
        // a in [2, n - 2]
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut y = pow_mod(&a, &r, n);

        if y.is_one() || y == n_minus_1 {
            continue 'witness;
        }

        for _ in 1..s {
            y = pow_mod(&y, &two, n);
            if y.is_one() {
                return false;
            }
            if y == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Draws uniform `bits`-bit integers until one is probably prime with
/// exactly `bits` significant bits. There is no retry ceiling.
pub fn make_prime<R: Rng + ?Sized>(bits: u64, iters: u64, rng: &mut R) -> Result<BigUint> {
    make_prime_bounded(bits, iters, None, rng)
}

/// Like `make_prime`, giving up after `max_attempts` candidates when set.
pub fn make_prime_bounded<R: Rng + ?Sized>(
    bits: u64,
    iters: u64,
    max_attempts: Option<u64>,
    rng: &mut R,
) -> Result<BigUint> {
    // no prime has fewer than 2 bits
    if bits < 2 {
        return Err(RsaError::InvalidBitLength(bits));
    }
    // zero rounds would accept every odd candidate
    if iters == 0 {
        return Err(RsaError::InvalidIterations);
    }

    let mut attempts = 0u64;
    loop {
        if let Some(max) = max_attempts {
            if attempts >= max {
                return Err(RsaError::PrimeSearchExhausted { bits, attempts });
            }
        }
        attempts += 1;

        let candidate = rng.gen_biguint(bits);
        // reject leading-zero truncation before paying for Miller-Rabin
        if candidate.bits() != bits {
            continue;
        }
        if is_prime(&candidate, iters, rng) {
            debug!("found {bits}-bit prime after {attempts} candidates");
            return Ok(candidate);
        }
        trace!("candidate {attempts} for {bits}-bit prime rejected");
    }
}

/// Iterative Euclid
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

/// Modular inverse (a * a^-1 (mod n) = 1) by extended Euclid.
/// `None` when gcd(a, n) != 1; otherwise the result lies in [0, n).
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let (mut r, mut r_prime) = (BigInt::from(n.clone()), BigInt::from(a.clone()));
    let (mut t, mut t_prime) = (BigInt::zero(), BigInt::one());

    while !r_prime.is_zero() {
        let q = r.div_floor(&r_prime);

        let next_r = &r - &q * &r_prime;
        r = std::mem::replace(&mut r_prime, next_r);

        let next_t = &t - &q * &t_prime;
        t = std::mem::replace(&mut t_prime, next_t);
    }

    if r > BigInt::one() {
        return None;
    }

    if t.is_negative() {
        t += BigInt::from(n.clone());
    }

    t.to_biguint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randstate::RandState;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_pow_mod() {
        assert_eq!(pow_mod(&big(3), &big(5), &big(7)), big(5));
        assert_eq!(pow_mod(&big(42), &big(17), &big(3233)), big(2557));
        assert_eq!(pow_mod(&big(2557), &big(2753), &big(3233)), big(42));

        let (b, e, m) = (big(0xdead_beef), big(65537), big(1_000_000_007));
        assert_eq!(pow_mod(&b, &e, &m), b.modpow(&e, &m));
    }

    #[test]
    fn test_pow_mod_zero_exponent() {
        for a in [0u64, 1, 2, 99, 12345] {
            for n in [2u64, 7, 3233, 1_000_000_007] {
                assert_eq!(pow_mod(&big(a), &BigUint::zero(), &big(n)), BigUint::one());
            }
        }
    }

    #[test]
    fn test_is_prime_small() {
        let mut rng = RandState::new(7);
        assert!(!is_prime(&big(0), 1, &mut rng));
        assert!(!is_prime(&big(1), 1, &mut rng));
        assert!(is_prime(&big(2), 1, &mut rng));
        assert!(is_prime(&big(3), 1, &mut rng));
        assert!(!is_prime(&big(4), 1, &mut rng));

        for iters in [1u64, 5, 50] {
            assert!(is_prime(&big(5), iters, &mut rng));
            assert!(is_prime(&big(97), iters, &mut rng));
            assert!(!is_prime(&big(100), iters, &mut rng));
        }
    }

    #[test]
    fn test_is_prime_composites() {
        let mut rng = RandState::new(11);

        // Carmichael numbers
        assert!(!is_prime(&big(561), 20, &mut rng));
        assert!(!is_prime(&big(25326001), 20, &mut rng));
        assert!(!is_prime(&big(8481906873), 20, &mut rng));

        // strong pseudoprime to several bases
        assert!(!is_prime(&big(2152302898747), 20, &mut rng));
    }

    #[test]
    fn test_is_prime_large() {
        let mut rng = RandState::new(13);

        // Mersenne primes 2^61 - 1 and 2^89 - 1
        assert!(is_prime(&big(2305843009213693951), 50, &mut rng));
        assert!(is_prime(
            &BigUint::from(618970019642690137449562111u128),
            50,
            &mut rng
        ));
    }

    #[test]
    fn test_make_prime_exact_bits() {
        let mut rng = RandState::new(42);
        for bits in [2u64, 8, 17, 64, 128] {
            let p = make_prime(bits, 25, &mut rng).unwrap();
            assert_eq!(p.bits(), bits);
            assert!(is_prime(&p, 1, &mut rng));
        }
    }

    #[test]
    fn test_make_prime_rejects_tiny() {
        let mut rng = RandState::new(1);
        assert!(matches!(
            make_prime(1, 10, &mut rng),
            Err(RsaError::InvalidBitLength(1))
        ));
    }

    #[test]
    fn test_make_prime_rejects_zero_iterations() {
        let mut rng = RandState::new(1);
        assert!(matches!(
            make_prime(64, 0, &mut rng),
            Err(RsaError::InvalidIterations)
        ));
    }

    #[test]
    fn test_make_prime_bounded_exhausts() {
        let mut rng = RandState::new(3);
        assert!(matches!(
            make_prime_bounded(256, 10, Some(0), &mut rng),
            Err(RsaError::PrimeSearchExhausted { bits: 256, attempts: 0 })
        ));
        assert!(make_prime_bounded(32, 10, Some(1_000_000), &mut rng).is_ok());
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(&big(12), &big(0)), big(12));
        assert_eq!(gcd(&big(0), &big(9)), big(9));
        assert_eq!(gcd(&big(21), &big(21)), big(21));
        assert_eq!(gcd(&big(48), &big(18)), big(6));
        assert_eq!(gcd(&big(17), &big(3120)), big(1));
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(&big(2), &big(1000000007)), Some(big(500000004)));
        assert_eq!(mod_inverse(&big(17), &big(3120)), Some(big(2753)));
        assert_eq!(mod_inverse(&big(3), &big(7)), Some(big(5)));

        assert_eq!(mod_inverse(&big(15), &big(45)), None);
        assert_eq!(mod_inverse(&big(14), &big(28)), None);
        assert_eq!(mod_inverse(&big(0), &big(28)), None);
    }

    #[test]
    fn test_mod_inverse_property() {
        let n = big(3120);
        for a in 1u64..200 {
            let a = big(a);
            match mod_inverse(&a, &n) {
                Some(inv) => {
                    assert!(inv < n);
                    assert_eq!((&inv * &a) % &n, BigUint::one());
                }
                None => assert_ne!(gcd(&a, &n), BigUint::one()),
            }
        }
    }
}
