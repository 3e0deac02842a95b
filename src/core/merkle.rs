use crate::error::{BlockchainError, Result};
use crate::utils::{sha3_256_digest, DIGEST_LEN};

/// Merkle tree over raw transaction texts
///
/// Leaves are SHA3-256 digests of each transaction's text. Each level pairs
/// consecutive digests as `SHA3-256(left || right)`; an odd level repeats its
/// last digest. All levels are kept so inclusion proofs can be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` are the leaves, the last level holds the root
    levels: Vec<Vec<Vec<u8>>>,
}

/// Merkle proof for transaction inclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Leaf digest being proven
    pub leaf_hash: Vec<u8>,
    pub merkle_root: Vec<u8>,
    /// Sibling digests from the leaf level upwards
    pub proof_path: Vec<ProofElement>,
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofElement {
    pub hash: Vec<u8>,
    /// Direction: true if sibling is on the right, false if on the left
    pub is_right: bool,
}

impl MerkleTree {
    pub fn new<T: AsRef<str>>(transactions: &[T]) -> MerkleTree {
        let leaves = transactions
            .iter()
            .map(|tx| sha3_256_digest(tx.as_ref().as_bytes()))
            .collect();
        Self::from_hashes(leaves)
    }

    pub fn from_hashes(leaves: Vec<Vec<u8>>) -> MerkleTree {
        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => Self::hash_pair(left, right),
                    [last] => Self::hash_pair(last, last),
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }
        MerkleTree { levels }
    }

    /// Root digest; 32 zero bytes for an empty tree
    pub fn root(&self) -> Vec<u8> {
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_else(|| vec![0u8; DIGEST_LEN])
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    pub fn generate_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        if transaction_index >= self.leaf_count() {
            return Err(BlockchainError::MalformedBlock(format!(
                "Transaction index {} out of bounds ({} transactions)",
                transaction_index,
                self.leaf_count()
            )));
        }

        let mut proof_path = Vec::new();
        let mut index = transaction_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            // A missing right sibling is the repeated last digest
            let hash = level.get(sibling_index).unwrap_or(&level[index]).clone();
            proof_path.push(ProofElement {
                hash,
                is_right: index % 2 == 0,
            });
            index /= 2;
        }

        Ok(MerkleProof {
            leaf_hash: self.levels[0][transaction_index].clone(),
            merkle_root: self.root(),
            proof_path,
            transaction_index,
        })
    }

    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let computed = proof
            .proof_path
            .iter()
            .fold(proof.leaf_hash.clone(), |current, element| {
                if element.is_right {
                    Self::hash_pair(&current, &element.hash)
                } else {
                    Self::hash_pair(&element.hash, &current)
                }
            });
        computed == proof.merkle_root
    }

    fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut combined = Vec::with_capacity(left.len() + right.len());
        combined.extend_from_slice(left);
        combined.extend_from_slice(right);
        sha3_256_digest(&combined)
    }
}

/// Merkle root of an ordered list of raw transaction texts
pub fn merkle_root<T: AsRef<str>>(transactions: &[T]) -> Vec<u8> {
    MerkleTree::new(transactions).root()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txs(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("*** Bitcoin transaction ***\nSerial number: {i}\n"))
            .collect()
    }

    fn leaf(text: &str) -> Vec<u8> {
        sha3_256_digest(text.as_bytes())
    }

    #[test]
    fn test_empty_root_is_zero_sentinel() {
        let empty: Vec<String> = vec![];
        assert_eq!(merkle_root(&empty), vec![0u8; 32]);
        assert!(MerkleTree::new(&empty).is_empty());
    }

    #[test]
    fn test_single_transaction_root_is_leaf() {
        let list = txs(1);
        assert_eq!(merkle_root(&list), leaf(&list[0]));
    }

    #[test]
    fn test_two_transactions_hash_in_order() {
        let list = txs(2);
        let expected = MerkleTree::hash_pair(&leaf(&list[0]), &leaf(&list[1]));
        assert_eq!(merkle_root(&list), expected);
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let list = txs(3);
        let (a, b, c) = (leaf(&list[0]), leaf(&list[1]), leaf(&list[2]));
        let left = MerkleTree::hash_pair(&a, &b);
        let right = MerkleTree::hash_pair(&c, &c);
        assert_eq!(merkle_root(&list), MerkleTree::hash_pair(&left, &right));
    }

    #[test]
    fn test_root_is_deterministic_and_order_sensitive() {
        let list = txs(4);
        assert_eq!(merkle_root(&list), merkle_root(&list));

        let mut reordered = list.clone();
        reordered.swap(0, 1);
        assert_ne!(merkle_root(&list), merkle_root(&reordered));

        let mut reversed = list.clone();
        reversed.reverse();
        assert_ne!(merkle_root(&list), merkle_root(&reversed));
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for n in [1, 2, 3, 5, 8] {
            let tree = MerkleTree::new(&txs(n));
            for index in 0..n {
                let proof = tree.generate_proof(index).unwrap();
                assert!(MerkleTree::verify_proof(&proof), "leaf {index} of {n}");
            }
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = MerkleTree::new(&txs(4));
        let mut proof = tree.generate_proof(2).unwrap();
        proof.leaf_hash = leaf("forged");
        assert!(!MerkleTree::verify_proof(&proof));
    }

    #[test]
    fn test_proof_index_out_of_bounds() {
        let tree = MerkleTree::new(&txs(2));
        assert!(tree.generate_proof(2).is_err());
    }
}
