use crate::error::{BlockchainError, Result};
use crate::utils::crypto::{random_bits, random_in_range};
use num_bigint::BigUint;
use num_traits::{One, Zero};

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97,
];

/// Miller-Rabin rounds used by `random_prime` and parameter validation
pub const MILLER_RABIN_ROUNDS: usize = 40;

/// Probabilistic primality test: trial division, then Miller-Rabin with
/// `rounds` random bases.
pub fn is_probable_prime(n: &BigUint, rounds: usize) -> bool {
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let one = BigUint::one();
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    let upper = n - &two;

    'witness: for _ in 0..rounds {
        let a = random_in_range(&two, &upper);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
            if x == one {
                return false;
            }
        }
        return false;
    }
    true
}

/// Random prime of exactly `bits` bits, giving up after `budget` candidates.
pub fn random_prime(bits: u64, budget: u64) -> Result<BigUint> {
    if bits < 2 {
        return Err(BlockchainError::ParameterGeneration(format!(
            "cannot draw a {bits}-bit prime"
        )));
    }
    let top = BigUint::one() << (bits - 1);
    for _ in 0..budget {
        // Force the top bit (exact width) and the low bit (odd)
        let candidate = random_bits(bits) | &top | BigUint::one();
        if is_probable_prime(&candidate, MILLER_RABIN_ROUNDS) {
            return Ok(candidate);
        }
    }
    Err(BlockchainError::ParameterGeneration(format!(
        "no {bits}-bit prime found after {budget} candidates"
    )))
}
