//! Discrete-log signature scheme shared by the finite-field and elliptic-curve groups
//!
//! Signing: `k <- nonce range`, `r = commitment(k * base)`,
//! `h = SHA3-256(m || r) mod order`, `s = (k - secret * h) mod order`.
//! Verification recomputes `v = s * base + h * public` and accepts iff
//! `SHA3-256(m || commitment(v)) mod order == h`.

use crate::error::Result;
use crate::utils::{hash_to_scalar, random_in_range};
use log::debug;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::fmt;

/// Capabilities a prime-order group must offer to carry the signature scheme
pub trait Group {
    type Element: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Labels of the integers a group element is written as in transaction text
    const KEY_FIELDS: &'static [&'static str];

    /// Order of the base element
    fn order(&self) -> &BigUint;

    /// Inclusive range the per-signature nonce `k` is drawn from
    fn nonce_range(&self) -> (BigUint, BigUint);

    /// `k` applied to the base element (`g^k mod p` or `k·P`)
    fn base_mul(&self, k: &BigUint) -> Self::Element;

    /// `k` applied to an arbitrary element
    fn mul(&self, element: &Self::Element, k: &BigUint) -> Self::Element;

    /// The group operation (modular product or point addition)
    fn combine(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Integer that is appended to the message before hashing
    fn commitment(&self, element: &Self::Element) -> BigUint;

    fn element_fields(&self, element: &Self::Element) -> Vec<BigUint>;

    fn element_from_fields(&self, fields: &[BigUint]) -> Result<Self::Element>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub s: BigUint,
    pub h: BigUint,
}

/// A secret scalar and the matching public element
#[derive(Clone)]
pub struct KeyPair<E> {
    secret: BigUint,
    public: E,
}

impl<E> KeyPair<E> {
    pub fn secret(&self) -> &BigUint {
        &self.secret
    }

    pub fn public(&self) -> &E {
        &self.public
    }
}

impl<E: fmt::Debug> fmt::Debug for KeyPair<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("secret", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

pub struct SignatureScheme<'a, G: Group> {
    group: &'a G,
}

impl<'a, G: Group> SignatureScheme<'a, G> {
    pub fn new(group: &'a G) -> Self {
        SignatureScheme { group }
    }

    pub fn group(&self) -> &G {
        self.group
    }

    /// Secret uniform in `[1, order-1]`, public = secret applied to the base
    pub fn keygen(&self) -> KeyPair<G::Element> {
        let upper = self.group.order() - BigUint::one();
        let secret = random_in_range(&BigUint::one(), &upper);
        let public = self.group.base_mul(&secret);
        KeyPair { secret, public }
    }

    pub fn sign(&self, message: &[u8], secret: &BigUint) -> Signature {
        let order = self.group.order();
        let (low, high) = self.group.nonce_range();
        let k = random_in_range(&low, &high);
        let r = self.group.commitment(&self.group.base_mul(&k));
        let h = hash_to_scalar(message, &r, order);

        // s = (k - secret*h) mod order, kept non-negative
        let sh = (secret * &h) % order;
        let s = ((k % order) + order - sh) % order;
        Signature { s, h }
    }

    /// Returns `false` for any signature that does not verify, including
    /// components outside `[1, order-1]`.
    pub fn verify(&self, message: &[u8], signature: &Signature, public: &G::Element) -> bool {
        let order = self.group.order();
        if !Self::in_scalar_range(&signature.s, order) || !Self::in_scalar_range(&signature.h, order)
        {
            debug!("Signature component outside [1, order-1]");
            return false;
        }

        let v = self.group.combine(
            &self.group.base_mul(&signature.s),
            &self.group.mul(public, &signature.h),
        );
        let u = hash_to_scalar(message, &self.group.commitment(&v), order);
        u == signature.h
    }

    fn in_scalar_range(value: &BigUint, order: &BigUint) -> bool {
        !value.is_zero() && value < order
    }
}
