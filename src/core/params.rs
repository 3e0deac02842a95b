//! Finite-field domain parameters `(q, p, g)`
//!
//! `q` is the prime order of the subgroup, `p = k*q + 1` the field prime and
//! `g` a generator of the order-`q` subgroup of `Z_p^*`. The triple is generated
//! once, persisted as three decimal lines and then passed by reference to
//! every signing operation.

use crate::error::{BlockchainError, Result};
use crate::utils::{
    is_probable_prime, random_bits, random_in_range, random_prime, MILLER_RABIN_ROUNDS,
};
use log::info;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::fs;
use std::path::Path;

pub const DEFAULT_Q_BITS: u64 = 224;
pub const DEFAULT_P_BITS: u64 = 2048;
pub const DEFAULT_RETRY_BUDGET: u64 = 100_000;

/// Bit lengths and search bound for parameter generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub q_bits: u64,
    pub p_bits: u64,
    /// Upper bound on candidates tried by each of the three searches
    pub retry_budget: u64,
}

impl Default for ParamSpec {
    fn default() -> Self {
        ParamSpec {
            q_bits: DEFAULT_Q_BITS,
            p_bits: DEFAULT_P_BITS,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParams {
    q: BigUint,
    p: BigUint,
    g: BigUint,
}

impl GroupParams {
    /// Build a parameter set from raw integers, checking the subgroup invariants
    pub fn new(q: BigUint, p: BigUint, g: BigUint) -> Result<GroupParams> {
        let params = GroupParams { q, p, g };
        params.validate()?;
        Ok(params)
    }

    /// Load the parameter file if it exists, otherwise generate and persist a fresh set
    pub fn generate_or_load(path: &Path, spec: &ParamSpec) -> Result<GroupParams> {
        if path.exists() {
            info!("Loading domain parameters from {}", path.display());
            return Self::load(path);
        }
        let params = Self::generate(spec)?;
        params.save(path)?;
        info!("Domain parameters written to {}", path.display());
        Ok(params)
    }

    pub fn generate(spec: &ParamSpec) -> Result<GroupParams> {
        if spec.p_bits <= spec.q_bits + 1 {
            return Err(BlockchainError::ParameterGeneration(format!(
                "p ({} bits) must be wider than q ({} bits)",
                spec.p_bits, spec.q_bits
            )));
        }
        info!(
            "Generating domain parameters: q {} bits, p {} bits",
            spec.q_bits, spec.p_bits
        );

        let q = random_prime(spec.q_bits, spec.retry_budget)?;
        let p = Self::find_field_prime(&q, spec)?;
        let g = Self::find_generator(&q, &p, spec.retry_budget)?;

        Ok(GroupParams { q, p, g })
    }

    /// Search even multipliers `k` until `k*q + 1` is a prime of exactly `p_bits` bits
    fn find_field_prime(q: &BigUint, spec: &ParamSpec) -> Result<BigUint> {
        let k_bits = spec.p_bits - spec.q_bits;
        let one = BigUint::one();
        for _ in 0..spec.retry_budget {
            // q is odd, so k must be even for k*q + 1 to be odd
            let k = random_bits(k_bits - 1) << 1u32;
            if k.is_zero() {
                continue;
            }
            let p = &k * q + &one;
            if p.bits() == spec.p_bits && is_probable_prime(&p, MILLER_RABIN_ROUNDS) {
                return Ok(p);
            }
        }
        Err(BlockchainError::ParameterGeneration(format!(
            "no {}-bit prime p = k*q + 1 found after {} candidates",
            spec.p_bits, spec.retry_budget
        )))
    }

    /// `g = h^((p-1)/q) mod p` for random `h` in `[2, p-2]`, until `g != 1`
    fn find_generator(q: &BigUint, p: &BigUint, budget: u64) -> Result<BigUint> {
        let one = BigUint::one();
        let two = BigUint::from(2u32);
        let cofactor = (p - &one) / q;
        let upper = p - &two;
        for _ in 0..budget {
            let h = random_in_range(&two, &upper);
            let g = h.modpow(&cofactor, p);
            if g != one {
                return Ok(g);
            }
        }
        Err(BlockchainError::ParameterGeneration(format!(
            "no subgroup generator found after {budget} candidates"
        )))
    }

    pub fn load(path: &Path) -> Result<GroupParams> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the three-line `q`, `p`, `g` text form
    pub fn parse(text: &str) -> Result<GroupParams> {
        let mut lines = text.lines();
        let mut next = |name: &str| -> Result<BigUint> {
            let line = lines.next().ok_or_else(|| {
                BlockchainError::ParameterGeneration(format!("parameter file is missing {name}"))
            })?;
            line.trim().parse::<BigUint>().map_err(|e| {
                BlockchainError::ParameterGeneration(format!("invalid {name} in parameter file: {e}"))
            })
        };
        let q = next("q")?;
        let p = next("p")?;
        let g = next("g")?;
        GroupParams::new(q, p, g)
    }

    pub fn to_text(&self) -> String {
        format!("{}\n{}\n{}\n", self.q, self.p, self.g)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let one = BigUint::one();
        // q = 2 leaves the nonce range [1, q-2] empty
        if self.q < BigUint::from(3u32) || self.p <= self.q {
            return Err(BlockchainError::ParameterGeneration(
                "parameters must satisfy 3 <= q < p".to_string(),
            ));
        }
        if !is_probable_prime(&self.q, MILLER_RABIN_ROUNDS) {
            return Err(BlockchainError::ParameterGeneration(
                "q is not prime".to_string(),
            ));
        }
        if !is_probable_prime(&self.p, MILLER_RABIN_ROUNDS) {
            return Err(BlockchainError::ParameterGeneration(
                "p is not prime".to_string(),
            ));
        }
        if !((&self.p - &one) % &self.q).is_zero() {
            return Err(BlockchainError::ParameterGeneration(
                "q does not divide p - 1".to_string(),
            ));
        }
        if self.g <= one || self.g >= self.p {
            return Err(BlockchainError::ParameterGeneration(
                "g must lie in [2, p-1]".to_string(),
            ));
        }
        if self.g.modpow(&self.q, &self.p) != one {
            return Err(BlockchainError::ParameterGeneration(
                "g does not generate the order-q subgroup".to_string(),
            ));
        }
        Ok(())
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Small parameter sizes keep the tests fast
    pub(crate) fn small_spec() -> ParamSpec {
        ParamSpec {
            q_bits: 64,
            p_bits: 256,
            retry_budget: 100_000,
        }
    }

    #[test]
    fn test_generated_params_satisfy_invariants() {
        let params = GroupParams::generate(&small_spec()).unwrap();

        assert_eq!(params.q().bits(), 64);
        assert_eq!(params.p().bits(), 256);
        assert_ne!(params.g(), &BigUint::one());
        assert_eq!(params.g().modpow(params.q(), params.p()), BigUint::one());
        assert!(((params.p() - 1u32) % params.q()).is_zero());
    }

    #[test]
    fn test_text_round_trip() {
        let params = GroupParams::generate(&small_spec()).unwrap();
        let parsed = GroupParams::parse(&params.to_text()).unwrap();
        assert_eq!(params, parsed);
    }

    #[test]
    fn test_generate_or_load_reuses_persisted_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pubparams.txt");

        let first = GroupParams::generate_or_load(&path, &small_spec()).unwrap();
        assert!(path.exists());
        let second = GroupParams::generate_or_load(&path, &small_spec()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_rejects_missing_line() {
        let result = GroupParams::parse("11\n23\n");
        assert!(matches!(
            result,
            Err(BlockchainError::ParameterGeneration(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        let result = GroupParams::parse("11\nabc\n4\n");
        assert!(matches!(
            result,
            Err(BlockchainError::ParameterGeneration(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_generator() {
        // 5 has order 22 in Z_23^*, not 11
        assert!(GroupParams::parse("11\n23\n5\n").is_err());
        // 4 = 2^2 generates the order-11 subgroup
        assert!(GroupParams::parse("11\n23\n4\n").is_ok());
    }

    #[test]
    fn test_parse_rejects_degenerate_subgroup() {
        // 2 | 3-1 and 2^2 = 1 mod 3, but q = 2 cannot be signed over
        assert!(matches!(
            GroupParams::parse("2\n3\n2\n"),
            Err(BlockchainError::ParameterGeneration(_))
        ));
    }

    #[test]
    fn test_parse_rejects_composite_moduli() {
        // q = 9 divides p - 1 = 18 and 4^9 = 1 mod 19, but q is composite
        assert!(matches!(
            GroupParams::parse("9\n19\n4\n"),
            Err(BlockchainError::ParameterGeneration(_))
        ));
        // q = 3 divides p - 1 = 90 and 29^3 = 1 mod 91, but p = 7 * 13
        assert!(matches!(
            GroupParams::parse("3\n91\n29\n"),
            Err(BlockchainError::ParameterGeneration(_))
        ));
    }

    #[test]
    fn test_parsed_params_can_sign() {
        use crate::core::signature::SignatureScheme;

        let params = GroupParams::parse("11\n23\n4\n").unwrap();
        let scheme = SignatureScheme::new(&params);
        let keys = scheme.keygen();
        let signature = scheme.sign(b"m", keys.secret());
        assert!(signature.h < *params.q());
    }

    #[test]
    fn test_zero_budget_fails() {
        let spec = ParamSpec {
            retry_budget: 0,
            ..small_spec()
        };
        assert!(matches!(
            GroupParams::generate(&spec),
            Err(BlockchainError::ParameterGeneration(_))
        ));
    }
}
