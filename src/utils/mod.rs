//! Utility functions and helpers
//!
//! This module contains the hashing and integer-encoding helpers shared by
//! the signature scheme, the Merkle commitment and proof-of-work, plus
//! primality testing for domain-parameter generation.

pub mod crypto;
pub mod prime;

pub use crypto::{
    hash_to_scalar, random_bits, random_in_range, sha3_256_digest, sha3_256_hex,
    to_minimal_be_bytes, DIGEST_LEN,
};
pub use prime::{is_probable_prime, random_prime, MILLER_RABIN_ROUNDS};
