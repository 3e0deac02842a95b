use data_encoding::HEXLOWER;
use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use sha3::{Digest, Sha3_256};

/// Length in bytes of a SHA3-256 digest
pub const DIGEST_LEN: usize = 32;

/// Minimal big-endian encoding of an unsigned integer.
///
/// Uses exactly `ceil(bits / 8)` bytes, so zero encodes as the empty string.
/// Every integer that is fed into a hash goes through this function.
pub fn to_minimal_be_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }
    value.to_bytes_be()
}

pub fn sha3_256_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn sha3_256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(sha3_256_digest(data).as_slice())
}

/// `SHA3-256(message || minimal_be(commitment)) mod modulus`
pub fn hash_to_scalar(message: &[u8], commitment: &BigUint, modulus: &BigUint) -> BigUint {
    let mut data = message.to_vec();
    data.extend(to_minimal_be_bytes(commitment));
    let digest = sha3_256_digest(&data);
    BigUint::from_bytes_be(&digest) % modulus
}

/// Uniform integer in `[low, high]` (both inclusive)
pub fn random_in_range(low: &BigUint, high: &BigUint) -> BigUint {
    let upper = high + 1u32;
    rand::thread_rng().gen_biguint_range(low, &upper)
}

/// Uniform integer of at most `bits` bits
pub fn random_bits(bits: u64) -> BigUint {
    rand::thread_rng().gen_biguint(bits)
}
