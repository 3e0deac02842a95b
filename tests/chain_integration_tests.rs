//! Chain integration tests
//!
//! Exercises the full flow: domain parameters, signed transactions,
//! Merkle commitment, proof-of-work and chain linkage, through the same
//! text files the command-line driver reads and writes.

use dlog_chain::core::{verify_transaction_texts, ProofElement};
use dlog_chain::{
    generate_candidate_block, merkle_root, pow_digest, Block, BlockLayout, BlockchainError,
    ChainLinker, GroupParams, MerkleTree, MiningOutcome, ParamSpec, ProofOfWork, Secp256k1,
    GENESIS_PREVIOUS_DIGEST,
};
use std::fs;
use tempfile::tempdir;

fn small_spec() -> ParamSpec {
    ParamSpec {
        q_bits: 64,
        p_bits: 256,
        retry_budget: 100_000,
    }
}

fn dummy_transactions() -> String {
    (0..4)
        .map(|i| {
            format!(
                "*** Bitcoin transaction ***\n\
                 Signature (s): {}\n\
                 Signature (h): {}\n\
                 Serial number: {}\n\
                 Amount: {}\n\
                 Payee public key (beta): {}\n\
                 Payer public key (beta): {}\n",
                11 + i,
                22 + i,
                1000 + i,
                5 * (i + 1),
                7 + i,
                9 + i
            )
        })
        .collect()
}

#[test]
fn test_four_dummy_transactions_difficulty_one() {
    let layout = BlockLayout::new(4, 7);
    let pow = ProofOfWork::new(1).with_max_attempts(Some(10_000));
    let transactions = layout.split_candidate(&dummy_transactions()).unwrap();
    let root = merkle_root(&transactions);

    let MiningOutcome::Found(solution) = pow.mine(&root, "") else {
        panic!("difficulty 1 should be found within 10000 attempts");
    };
    assert!(pow.verify(&root, "", &solution.nonce));
    assert!(solution.digest.starts_with('0'));
}

#[test]
fn test_finite_field_chain_through_files() {
    let dir = tempdir().unwrap();
    let param_path = dir.path().join("pubparams.txt");
    let params = GroupParams::generate_or_load(&param_path, &small_spec()).unwrap();
    let reloaded = GroupParams::generate_or_load(&param_path, &small_spec()).unwrap();
    assert_eq!(params, reloaded);

    let layout = BlockLayout::for_group::<GroupParams>(4);
    let linker = ChainLinker::new(layout, ProofOfWork::new(2).with_workers(2));

    let mut texts = Vec::new();
    let mut previous: Option<String> = None;
    for height in 0..3 {
        let candidate = generate_candidate_block(&params, 4, 2);
        let candidate_path = dir.path().join(format!("candidate{height}.txt"));
        fs::write(&candidate_path, &candidate).unwrap();

        let candidate = fs::read_to_string(&candidate_path).unwrap();
        let linked = linker
            .append_text(&candidate, previous.as_deref())
            .unwrap();

        let block_path = dir.path().join(format!("block{height}.txt"));
        fs::write(&block_path, &linked.text).unwrap();
        let stored = fs::read_to_string(&block_path).unwrap();
        assert_eq!(stored, linked.text);

        texts.push(stored.clone());
        previous = Some(stored);
    }

    let digests = linker.verify_chain_texts(&texts).unwrap();
    assert_eq!(digests.len(), 3);

    let genesis = Block::parse(&texts[0], &layout).unwrap();
    assert_eq!(genesis.previous_digest(), Some(GENESIS_PREVIOUS_DIGEST));
    for height in 1..3 {
        let block = Block::parse(&texts[height], &layout).unwrap();
        assert_eq!(block.previous_digest(), Some(digests[height - 1].as_str()));
        let results = verify_transaction_texts(block.transactions(), &params).unwrap();
        assert!(results.into_iter().all(|ok| ok));
    }
}

#[test]
fn test_elliptic_curve_block_round_trip() {
    let curve = Secp256k1::new();
    let layout = BlockLayout::for_group::<Secp256k1>(2);
    let candidate = generate_candidate_block(&curve, 2, 2);
    assert_eq!(candidate.lines().count(), 18);

    let pow = ProofOfWork::new(1).with_max_attempts(Some(100_000));
    let block = pow
        .mine_candidate(&candidate, &layout)
        .unwrap()
        .expect("difficulty 1 is found within the cap");
    let text = block.to_text();

    assert_eq!(pow.check_pow(&text, &layout), Some(block.pow_digest()));
    let results = verify_transaction_texts(block.transactions(), &curve).unwrap();
    assert_eq!(results, vec![true, true]);
}

#[test]
fn test_tampered_block_breaks_next_link() {
    let layout = BlockLayout::new(4, 7);
    // Difficulty 0, so the forged block still passes its own work check
    let linker = ChainLinker::new(layout, ProofOfWork::new(0));
    let first = linker.append(&dummy_transactions(), None).unwrap();
    let second = linker
        .append(&dummy_transactions(), Some(&first.block))
        .unwrap();

    let forged = first.text.replace("Amount: 5\n", "Amount: 6\n");
    assert_ne!(forged, first.text);
    let forged_digest = Block::parse(&forged, &layout).unwrap().pow_digest();
    assert_ne!(forged_digest, first.digest);

    assert_eq!(
        linker.verify_chain_texts(&[forged, second.text]),
        Err(BlockchainError::ChainLinkageBroken {
            height: 1,
            expected: forged_digest,
            found: first.digest,
        })
    );
}

#[test]
fn test_tampered_block_fails_its_own_work_check() {
    let layout = BlockLayout::new(4, 7);
    let linker = ChainLinker::new(layout, ProofOfWork::new(1));
    let first = linker.append(&dummy_transactions(), None).unwrap();

    // Try amounts until the recomputed digest misses the target
    let forged = (6..1000)
        .map(|amount| first.text.replace("Amount: 5\n", &format!("Amount: {amount}\n")))
        .find(|text| !Block::parse(text, &layout).unwrap().pow_digest().starts_with('0'))
        .unwrap();

    assert!(matches!(
        linker.verify_chain_texts(&[forged]),
        Err(BlockchainError::InsufficientWork { height: 0, .. })
    ));
}

#[test]
fn test_missing_nonce_is_invalid_not_a_crash() {
    let layout = BlockLayout::new(4, 7);
    let pow = ProofOfWork::new(1);
    let without_prefix = format!("12345\n{}", dummy_transactions());
    assert_eq!(pow.check_pow(&without_prefix, &layout), None);

    let truncated = format!("Nonce: 12345\n{}", &dummy_transactions()[..40]);
    assert_eq!(pow.check_pow(&truncated, &layout), None);
}

#[test]
fn test_harder_difficulty_rejects_mined_triple() {
    let root = merkle_root(&[dummy_transactions()]);
    let easy = ProofOfWork::new(1);
    let MiningOutcome::Found(solution) = easy.mine(&root, GENESIS_PREVIOUS_DIGEST) else {
        panic!("unbounded mining must succeed");
    };
    let digest = pow_digest(&root, GENESIS_PREVIOUS_DIGEST, &solution.nonce);
    assert_eq!(digest, solution.digest);
    assert_eq!(
        ProofOfWork::new(2).verify(&root, GENESIS_PREVIOUS_DIGEST, &solution.nonce),
        digest.starts_with("00")
    );
}

#[test]
fn test_merkle_inclusion_for_block_transactions() {
    let layout = BlockLayout::new(4, 7);
    let transactions = layout.split_candidate(&dummy_transactions()).unwrap();
    let tree = MerkleTree::new(&transactions);
    assert_eq!(tree.root(), merkle_root(&transactions));

    let mut proof = tree.generate_proof(3).unwrap();
    assert!(MerkleTree::verify_proof(&proof));

    proof.proof_path.push(ProofElement {
        hash: vec![0u8; 32],
        is_right: true,
    });
    assert!(!MerkleTree::verify_proof(&proof));
}
