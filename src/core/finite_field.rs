use crate::core::params::GroupParams;
use crate::core::signature::Group;
use crate::error::{BlockchainError, Result};
use num_bigint::BigUint;
use num_traits::One;

/// The order-`q` subgroup of `Z_p^*`; elements are residues mod `p`.
impl Group for GroupParams {
    type Element = BigUint;

    const KEY_FIELDS: &'static [&'static str] = &["beta"];

    fn order(&self) -> &BigUint {
        self.q()
    }

    fn nonce_range(&self) -> (BigUint, BigUint) {
        (BigUint::one(), self.q() - 2u32)
    }

    fn base_mul(&self, k: &BigUint) -> BigUint {
        self.g().modpow(k, self.p())
    }

    fn mul(&self, element: &BigUint, k: &BigUint) -> BigUint {
        element.modpow(k, self.p())
    }

    fn combine(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % self.p()
    }

    /// The residue itself, unreduced
    fn commitment(&self, element: &BigUint) -> BigUint {
        element.clone()
    }

    fn element_fields(&self, element: &BigUint) -> Vec<BigUint> {
        vec![element.clone()]
    }

    fn element_from_fields(&self, fields: &[BigUint]) -> Result<BigUint> {
        match fields {
            [beta] if beta < self.p() => Ok(beta.clone()),
            [_] => Err(BlockchainError::Crypto(
                "public key is not reduced mod p".to_string(),
            )),
            _ => Err(BlockchainError::Crypto(format!(
                "expected 1 public key field, got {}",
                fields.len()
            ))),
        }
    }
}
