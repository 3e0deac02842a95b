//! Core chain functionality
//!
//! This module contains the cryptographic and consensus engine: domain
//! parameters, the discrete-log signature scheme over two groups, the
//! transaction codec, Merkle commitment, proof-of-work and chain linkage.

pub mod block;
pub mod blockchain;
pub mod elliptic_curve;
pub mod finite_field;
pub mod merkle;
pub mod params;
pub mod proof_of_work;
pub mod signature;
pub mod transaction;

pub use block::{Block, BlockLayout};
pub use blockchain::{ChainLinker, LinkedBlock, GENESIS_PREVIOUS_DIGEST};
pub use elliptic_curve::Secp256k1;
pub use merkle::{merkle_root, MerkleProof, MerkleTree, ProofElement};
pub use params::{GroupParams, ParamSpec};
pub use proof_of_work::{meets_difficulty, pow_digest, MiningOutcome, PowSolution, ProofOfWork};
pub use signature::{Group, KeyPair, Signature, SignatureScheme};
pub use transaction::{
    generate_candidate_block, tx_line_count, verify_transaction_texts, Transaction,
};
