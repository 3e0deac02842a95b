// This is the chain linker - it ties each mined block to the one before it
// Every block stores its predecessor's PoW digest, and I always recompute that
// digest from the predecessor's own stored fields instead of trusting a cache

use crate::core::block::{Block, BlockLayout};
use crate::core::merkle::merkle_root;
use crate::core::proof_of_work::{meets_difficulty, MiningOutcome, ProofOfWork};
use crate::error::{BlockchainError, Result};
use log::{info, warn};

/// Previous PoW stored in the first block of a chain
pub const GENESIS_PREVIOUS_DIGEST: &str = "00000000000000000000";

/// A freshly mined block together with its serialized text and digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedBlock {
    pub block: Block,
    pub text: String,
    pub digest: String,
}

pub struct ChainLinker {
    layout: BlockLayout,
    pow: ProofOfWork,
}

impl ChainLinker {
    pub fn new(layout: BlockLayout, pow: ProofOfWork) -> ChainLinker {
        ChainLinker { layout, pow }
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Mine `candidate` on top of `previous` (or as genesis when `None`)
    pub fn append(&self, candidate: &str, previous: Option<&Block>) -> Result<LinkedBlock> {
        // First I work out what this block has to point back to
        let previous_digest = match previous {
            // With no predecessor this is the genesis block, so I use the sentinel
            None => {
                info!("Appending genesis block");
                GENESIS_PREVIOUS_DIGEST.to_string()
            }
            Some(block) => {
                // A standalone mined block has no link of its own, so I can't chain onto it
                if block.previous_digest().is_none() {
                    return Err(BlockchainError::MalformedBlock(
                        "predecessor has no 'Previous PoW' line".to_string(),
                    ));
                }
                block.pow_digest()
            }
        };

        // I commit to the candidate's transactions and mine on top of the link
        let transactions = self.layout.split_candidate(candidate)?;
        let root = merkle_root(&transactions);
        let solution = match self.pow.mine(&root, &previous_digest) {
            MiningOutcome::Found(solution) => solution,
            MiningOutcome::Exhausted { attempts } => {
                return Err(BlockchainError::MiningExhausted { attempts })
            }
        };

        // The stored text keeps the candidate lines byte for byte
        let block = Block::new(Some(previous_digest), solution.nonce, transactions);
        info!("Linked block with PoW {}", solution.digest);
        Ok(LinkedBlock {
            text: block.to_text(),
            block,
            digest: solution.digest,
        })
    }

    /// File-level `append`: the predecessor is given as mined-block text
    pub fn append_text(&self, candidate: &str, previous: Option<&str>) -> Result<LinkedBlock> {
        let previous = previous
            .map(|text| Block::parse(text, &self.layout))
            .transpose()?;
        self.append(candidate, previous.as_ref())
    }

    /// Check sentinel, difficulty and every link; returns each block's digest
    pub fn verify_chain(&self, blocks: &[Block]) -> Result<Vec<String>> {
        let mut digests: Vec<String> = Vec::with_capacity(blocks.len());
        for (height, block) in blocks.iter().enumerate() {
            // Block 0 must carry the sentinel, every later block the digest I just computed
            let expected = match digests.last() {
                Some(digest) => digest.as_str(),
                None => GENESIS_PREVIOUS_DIGEST,
            };
            let found = block.previous_digest().unwrap_or_default();
            if found != expected {
                warn!("Linkage broken at height {height}");
                return Err(BlockchainError::ChainLinkageBroken {
                    height,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }

            // Then I check the block carries enough work itself
            let digest = block.pow_digest();
            if !meets_difficulty(&digest, self.pow.difficulty()) {
                return Err(BlockchainError::InsufficientWork { height, digest });
            }
            digests.push(digest);
        }
        Ok(digests)
    }

    pub fn verify_chain_texts<T: AsRef<str>>(&self, texts: &[T]) -> Result<Vec<String>> {
        let blocks = texts
            .iter()
            .map(|text| Block::parse(text.as_ref(), &self.layout))
            .collect::<Result<Vec<_>>>()?;
        self.verify_chain(&blocks)
    }
}
