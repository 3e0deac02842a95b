//! The secp256k1 group for the elliptic-curve signature variant
//!
//! Point arithmetic is delegated to `k256`. Scalars and coordinates cross the
//! `Group` boundary as `BigUint` values, moved through 32-byte big-endian
//! encodings.

use crate::core::signature::Group;
use crate::error::{BlockchainError, Result};
use k256::elliptic_curve::group::Group as _;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};
use num_bigint::BigUint;
use num_traits::{One, Zero};

const SECP256K1_ORDER_HEX: &[u8] =
    b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";

/// secp256k1 with base point `G` of prime order `n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secp256k1 {
    order: BigUint,
}

impl Default for Secp256k1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Secp256k1 {
    pub fn new() -> Secp256k1 {
        Secp256k1 {
            order: BigUint::parse_bytes(SECP256K1_ORDER_HEX, 16).unwrap_or_default(),
        }
    }

    pub fn generator(&self) -> ProjectivePoint {
        ProjectivePoint::GENERATOR
    }

    /// `value mod n` as a curve scalar
    fn scalar(&self, value: &BigUint) -> Scalar {
        let reduced = value % &self.order;
        // Below n, so it always fits in 32 bytes
        let bytes = field_bytes(&reduced).unwrap_or_default();
        <Scalar as Reduce<U256>>::reduce_bytes(&bytes)
    }
}

/// Left-pad `value` to 32 big-endian bytes; `None` when it is wider
fn field_bytes(value: &BigUint) -> Option<FieldBytes> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let mut out = FieldBytes::default();
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

impl Group for Secp256k1 {
    type Element = ProjectivePoint;

    const KEY_FIELDS: &'static [&'static str] = &["x", "y"];

    fn order(&self) -> &BigUint {
        &self.order
    }

    fn nonce_range(&self) -> (BigUint, BigUint) {
        (BigUint::one(), &self.order - 1u32)
    }

    fn base_mul(&self, k: &BigUint) -> ProjectivePoint {
        ProjectivePoint::GENERATOR * self.scalar(k)
    }

    fn mul(&self, element: &ProjectivePoint, k: &BigUint) -> ProjectivePoint {
        *element * self.scalar(k)
    }

    fn combine(&self, a: &ProjectivePoint, b: &ProjectivePoint) -> ProjectivePoint {
        *a + *b
    }

    /// `x mod n`; the point at infinity commits to zero
    fn commitment(&self, element: &ProjectivePoint) -> BigUint {
        if bool::from(element.is_identity()) {
            return BigUint::zero();
        }
        let x = element.to_affine().x();
        let reduced = <Scalar as Reduce<U256>>::reduce_bytes(&x);
        BigUint::from_bytes_be(&reduced.to_bytes())
    }

    fn element_fields(&self, element: &ProjectivePoint) -> Vec<BigUint> {
        let encoded = element.to_affine().to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => vec![BigUint::from_bytes_be(x), BigUint::from_bytes_be(y)],
            _ => vec![BigUint::zero(), BigUint::zero()],
        }
    }

    fn element_from_fields(&self, fields: &[BigUint]) -> Result<ProjectivePoint> {
        let [x, y] = fields else {
            return Err(BlockchainError::Crypto(format!(
                "expected 2 public key fields, got {}",
                fields.len()
            )));
        };
        let not_on_curve = || BlockchainError::Crypto("public key is not on the curve".to_string());
        let (Some(x), Some(y)) = (field_bytes(x), field_bytes(y)) else {
            return Err(not_on_curve());
        };

        let encoded = EncodedPoint::from_affine_coordinates(&x, &y, false);
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        affine.map(ProjectivePoint::from).ok_or_else(not_on_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::elliptic_curve::group::Group as _;

    fn hex(value: &str) -> BigUint {
        BigUint::parse_bytes(value.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_generator_coordinates() {
        let curve = Secp256k1::new();
        let fields = curve.element_fields(&curve.generator());
        assert_eq!(
            fields,
            vec![
                hex("79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798"),
                hex("483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8"),
            ]
        );
    }

    #[test]
    fn test_known_multiple() {
        let curve = Secp256k1::new();
        let two_g = curve.base_mul(&BigUint::from(2u32));
        assert_eq!(
            curve.element_fields(&two_g),
            vec![
                hex("C6047F9441ED7D6D3045406E95C07CD85C778E4B8CEF3CA7ABAC09B95C709EE5"),
                hex("1AE168FEA63DC339A3C58419466CEAEEF7F632653266D0E1236431A950CFE52A"),
            ]
        );
        assert_eq!(
            curve.combine(&curve.generator(), &curve.generator()),
            two_g
        );
    }

    #[test]
    fn test_order_wraps_to_identity() {
        let curve = Secp256k1::new();
        let n_minus_one = curve.order() - 1u32;
        let sum = curve.combine(&curve.base_mul(&n_minus_one), &curve.generator());
        assert!(bool::from(sum.is_identity()));
        assert_eq!(curve.commitment(&sum), BigUint::zero());
        assert_eq!(curve.element_fields(&sum), vec![BigUint::zero(); 2]);
        // Scalars are taken mod n
        assert_eq!(
            curve.base_mul(&(curve.order() + 5u32)),
            curve.base_mul(&BigUint::from(5u32))
        );
    }

    #[test]
    fn test_scalar_mul_distributes() {
        let curve = Secp256k1::new();
        let a = BigUint::from(123_456_789u64);
        let b = BigUint::from(987_654_321u64);
        let lhs = curve.base_mul(&(&a + &b));
        let rhs = curve.combine(&curve.base_mul(&a), &curve.base_mul(&b));
        assert_eq!(lhs, rhs);
        assert_eq!(curve.mul(&curve.base_mul(&a), &b), curve.base_mul(&(&a * &b)));
    }

    #[test]
    fn test_commitment_is_x_mod_n() {
        let curve = Secp256k1::new();
        let point = curve.base_mul(&BigUint::from(7u32));
        let x = curve.element_fields(&point)[0].clone();
        assert_eq!(curve.commitment(&point), x % curve.order());
    }

    #[test]
    fn test_point_fields_validation() {
        let curve = Secp256k1::new();
        let point = curve.base_mul(&BigUint::from(42u32));
        let fields = curve.element_fields(&point);
        assert_eq!(curve.element_from_fields(&fields).unwrap(), point);

        let off_curve = vec![fields[0].clone(), &fields[1] + 1u32];
        assert!(curve.element_from_fields(&off_curve).is_err());

        let too_wide = vec![BigUint::one() << 256u32, fields[1].clone()];
        assert!(curve.element_from_fields(&too_wide).is_err());

        assert!(curve.element_from_fields(&fields[..1]).is_err());
    }
}
