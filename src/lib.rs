//! # dlog-chain - a discrete-log signed proof-of-work chain simulator
//!
//! Generates signed pseudo-transactions, commits to them with a Merkle root,
//! mines blocks against a leading-zero difficulty target and links blocks by
//! embedding the predecessor's PoW digest.
//!
//! ## Layout
//! - `core/`: domain parameters, the signature scheme over a finite-field
//!   subgroup or an elliptic curve, transaction codec, Merkle tree,
//!   proof-of-work and chain linkage
//! - `utils/`: hashing, minimal big-endian integer encoding, primality
//! - `config/`: TOML + environment settings
//! - `cli/`: command-line parsing for the `dlog-chain` binary
//!
//! Everything is text: transactions, candidate blocks and mined blocks are
//! fixed line layouts, and those exact bytes are what gets hashed and signed.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, VariantArg};
pub use config::Settings;
pub use core::{
    generate_candidate_block, merkle_root, pow_digest, Block, BlockLayout, ChainLinker, Group,
    GroupParams, LinkedBlock, MerkleTree, MiningOutcome, ParamSpec, ProofOfWork, Secp256k1,
    Signature, SignatureScheme, Transaction, GENESIS_PREVIOUS_DIGEST,
};
pub use error::{BlockchainError, Result};
pub use utils::{sha3_256_digest, sha3_256_hex, to_minimal_be_bytes};
