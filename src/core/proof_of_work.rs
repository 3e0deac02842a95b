use crate::core::block::{Block, BlockLayout};
use crate::core::merkle::merkle_root;
use crate::error::Result;
use crate::utils::{random_bits, sha3_256_hex, to_minimal_be_bytes};
use log::{debug, info};
use num_bigint::BigUint;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

const NONCE_BITS: u64 = 256;

/// `hex(SHA3-256(root || previous_digest || minimal_be(nonce)))`
pub fn pow_digest(merkle_root: &[u8], previous_digest: &str, nonce: &BigUint) -> String {
    let mut data_bytes = merkle_root.to_vec();
    data_bytes.extend(previous_digest.as_bytes());
    data_bytes.extend(to_minimal_be_bytes(nonce));
    sha3_256_hex(&data_bytes)
}

/// At least `difficulty` leading ASCII '0' hex characters
pub fn meets_difficulty(digest: &str, difficulty: usize) -> bool {
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|b| b == b'0')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    pub nonce: BigUint,
    pub digest: String,
    pub attempts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningOutcome {
    Found(PowSolution),
    /// The attempt cap was reached without a digest meeting the target
    Exhausted { attempts: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    max_attempts: Option<u64>,
    workers: usize,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> ProofOfWork {
        ProofOfWork {
            difficulty,
            max_attempts: None,
            workers: 1,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> ProofOfWork {
        self.workers = workers.max(1);
        self
    }

    /// Cap on total hash attempts across all workers; `None` searches forever
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> ProofOfWork {
        self.max_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn verify(&self, merkle_root: &[u8], previous_digest: &str, nonce: &BigUint) -> bool {
        meets_difficulty(
            &pow_digest(merkle_root, previous_digest, nonce),
            self.difficulty,
        )
    }

    /// Race `workers` threads sampling random 256-bit nonces. The first
    /// success raises the shared flag and the other workers stop.
    pub fn mine(&self, merkle_root: &[u8], previous_digest: &str) -> MiningOutcome {
        let start = Instant::now();
        let found = AtomicBool::new(false);
        let attempts = AtomicU64::new(0);
        info!(
            "Mining with difficulty {} on {} worker(s)",
            self.difficulty, self.workers
        );

        let solutions: Vec<Option<(BigUint, String)>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|_| scope.spawn(|| self.search(merkle_root, previous_digest, &found, &attempts)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        let total = match self.max_attempts {
            Some(cap) => attempts.load(Ordering::Relaxed).min(cap),
            None => attempts.load(Ordering::Relaxed),
        };
        match solutions.into_iter().flatten().next() {
            Some((nonce, digest)) => {
                info!(
                    "Found PoW {digest} after {total} attempts in {}ms",
                    start.elapsed().as_millis()
                );
                MiningOutcome::Found(PowSolution {
                    nonce,
                    digest,
                    attempts: total,
                })
            }
            None => {
                info!("Mining exhausted after {total} attempts");
                MiningOutcome::Exhausted { attempts: total }
            }
        }
    }

    fn search(
        &self,
        merkle_root: &[u8],
        previous_digest: &str,
        found: &AtomicBool,
        attempts: &AtomicU64,
    ) -> Option<(BigUint, String)> {
        while !found.load(Ordering::Relaxed) {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed);
            if self.max_attempts.is_some_and(|cap| attempt >= cap) {
                return None;
            }
            let nonce = random_bits(NONCE_BITS);
            let digest = pow_digest(merkle_root, previous_digest, &nonce);
            if meets_difficulty(&digest, self.difficulty) {
                found.store(true, Ordering::Relaxed);
                return Some((nonce, digest));
            }
        }
        None
    }

    /// Mine a candidate-block text into a standalone block (`Nonce:` line
    /// followed by the candidate lines verbatim).
    pub fn mine_candidate(&self, candidate: &str, layout: &BlockLayout) -> Result<Option<Block>> {
        let transactions = layout.split_candidate(candidate)?;
        let root = merkle_root(&transactions);
        match self.mine(&root, "") {
            MiningOutcome::Found(solution) => {
                Ok(Some(Block::new(None, solution.nonce, transactions)))
            }
            MiningOutcome::Exhausted { .. } => Ok(None),
        }
    }

    /// PoW digest of a mined-block text, or `None` when the text is malformed
    /// or the digest misses the target. Never fails.
    pub fn check_pow(&self, block_text: &str, layout: &BlockLayout) -> Option<String> {
        let block = match Block::parse(block_text, layout) {
            Ok(block) => block,
            Err(e) => {
                debug!("Rejecting block: {e}");
                return None;
            }
        };
        let digest = block.pow_digest();
        if meets_difficulty(&digest, self.difficulty) {
            Some(digest)
        } else {
            debug!("Block digest {digest} misses difficulty {}", self.difficulty);
            None
        }
    }
}
