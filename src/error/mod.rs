//! Error handling for the chain simulator
//!
//! This module provides the error types for every fallible operation.
//! Signature mismatches are not errors: verification returns `bool`.

use std::fmt;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for chain operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// No valid prime or generator found within the retry budget, or a
    /// persisted parameter set failed validation
    ParameterGeneration(String),
    /// Wrong line count, missing header prefix or unparsable integer
    MalformedBlock(String),
    /// A transaction text block that does not follow the canonical layout
    MalformedTransaction(String),
    /// The stored predecessor digest does not match the recomputed one
    ChainLinkageBroken {
        height: usize,
        expected: String,
        found: String,
    },
    /// A block whose PoW digest does not meet the difficulty target
    InsufficientWork { height: usize, digest: String },
    /// Mining gave up after the configured attempt cap
    MiningExhausted { attempts: u64 },
    /// Cryptographic operation errors
    Crypto(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::ParameterGeneration(msg) => {
                write!(f, "Parameter generation error: {msg}")
            }
            BlockchainError::MalformedBlock(msg) => write!(f, "Malformed block: {msg}"),
            BlockchainError::MalformedTransaction(msg) => {
                write!(f, "Malformed transaction: {msg}")
            }
            BlockchainError::ChainLinkageBroken {
                height,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Chain linkage broken at height {height}: expected previous PoW {expected}, found {found}"
                )
            }
            BlockchainError::InsufficientWork { height, digest } => {
                write!(f, "Block at height {height} does not meet the difficulty target: {digest}")
            }
            BlockchainError::MiningExhausted { attempts } => {
                write!(f, "Mining gave up after {attempts} attempts")
            }
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
