use crate::core::merkle::merkle_root;
use crate::core::proof_of_work::pow_digest;
use crate::core::signature::Group;
use crate::core::transaction::tx_line_count;
use crate::error::{BlockchainError, Result};
use num_bigint::BigUint;

pub const NONCE_PREFIX: &str = "Nonce:";
pub const PREVIOUS_POW_PREFIX: &str = "Previous PoW:";

/// Transactions per block and lines per transaction.
/// Codec, Merkle and PoW stages must all agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub tx_count: usize,
    pub tx_len: usize,
}

impl BlockLayout {
    pub fn new(tx_count: usize, tx_len: usize) -> BlockLayout {
        BlockLayout { tx_count, tx_len }
    }

    /// Layout whose transaction length matches the text encoding of group `G`
    pub fn for_group<G: Group>(tx_count: usize) -> BlockLayout {
        BlockLayout::new(tx_count, tx_line_count::<G>())
    }

    pub fn total_lines(&self) -> usize {
        self.tx_count * self.tx_len
    }

    /// Group raw lines into one text per transaction, keeping every byte.
    /// The line count must match the layout exactly.
    pub fn split_transactions(&self, lines: &[&str]) -> Result<Vec<String>> {
        if self.tx_len == 0 {
            return Err(BlockchainError::MalformedBlock(
                "transaction length must be positive".to_string(),
            ));
        }
        if lines.len() != self.total_lines() {
            return Err(BlockchainError::MalformedBlock(format!(
                "expected {} transaction lines ({} x {}), found {}",
                self.total_lines(),
                self.tx_count,
                self.tx_len,
                lines.len()
            )));
        }
        Ok(lines.chunks(self.tx_len).map(|chunk| chunk.concat()).collect())
    }

    /// Transactions of a candidate-block file (no header lines)
    pub fn split_candidate(&self, text: &str) -> Result<Vec<String>> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        self.split_transactions(&lines)
    }
}

/// A mined block as stored on disk. The PoW digest is always recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// `None` for a standalone mined block, which has no `Previous PoW` line
    previous_digest: Option<String>,
    nonce: BigUint,
    transactions: Vec<String>,
}

impl Block {
    pub fn new(previous_digest: Option<String>, nonce: BigUint, transactions: Vec<String>) -> Block {
        Block {
            previous_digest,
            nonce,
            transactions,
        }
    }

    pub fn parse(text: &str, layout: &BlockLayout) -> Result<Block> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut cursor = 0;

        let first = lines
            .first()
            .ok_or_else(|| BlockchainError::MalformedBlock("empty block file".to_string()))?;
        let previous_digest = match header_value(first, PREVIOUS_POW_PREFIX) {
            Some(value) => {
                cursor += 1;
                if value.is_empty() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(BlockchainError::MalformedBlock(format!(
                        "previous PoW is not a hex digest: {value:?}"
                    )));
                }
                Some(value.to_string())
            }
            None => None,
        };

        let nonce_line = lines.get(cursor).ok_or_else(|| {
            BlockchainError::MalformedBlock("missing 'Nonce:' line".to_string())
        })?;
        let nonce_text = header_value(nonce_line, NONCE_PREFIX).ok_or_else(|| {
            BlockchainError::MalformedBlock(format!(
                "expected '{NONCE_PREFIX}' line, found {:?}",
                nonce_line.trim()
            ))
        })?;
        let nonce = nonce_text.parse::<BigUint>().map_err(|_| {
            BlockchainError::MalformedBlock(format!("unparsable nonce: {nonce_text:?}"))
        })?;
        cursor += 1;

        let transactions = layout.split_transactions(&lines[cursor..])?;
        Ok(Block {
            previous_digest,
            nonce,
            transactions,
        })
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        if let Some(previous) = &self.previous_digest {
            text.push_str(&format!("{PREVIOUS_POW_PREFIX} {previous}\n"));
        }
        text.push_str(&format!("{NONCE_PREFIX} {}\n", self.nonce));
        text.push_str(&self.transactions.concat());
        text
    }

    pub fn previous_digest(&self) -> Option<&str> {
        self.previous_digest.as_deref()
    }

    pub fn nonce(&self) -> &BigUint {
        &self.nonce
    }

    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    pub fn merkle_root(&self) -> Vec<u8> {
        merkle_root(&self.transactions)
    }

    /// Recompute this block's PoW digest from its stored fields
    pub fn pow_digest(&self) -> String {
        pow_digest(
            &self.merkle_root(),
            self.previous_digest.as_deref().unwrap_or(""),
            &self.nonce,
        )
    }
}

/// Trimmed value after `prefix`, if the line carries it
fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.trim().strip_prefix(prefix).map(str::trim)
}
