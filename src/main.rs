// This is my entry point for the dlog-chain command-line simulator
// Every command is thin file I/O around the library: parameters, candidate
// blocks and mined blocks all live in plain text files
use clap::Parser;
use dlog_chain::core::verify_transaction_texts;
use dlog_chain::{
    generate_candidate_block, BlockLayout, ChainLinker, Command, Group, GroupParams, Opt,
    ProofOfWork, Secp256k1, Settings, VariantArg,
};
use log::{error, info, LevelFilter};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    // I initialize logging at Info so I can follow parameter generation and mining
    env_logger::builder().filter_level(LevelFilter::Info).init();

    // I parse the command line arguments using clap
    let opt = Opt::parse();

    // If anything fails, I log the error and exit with code 1
    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// This is where I dispatch every CLI command
// Settings come from the optional --config file first, then DLOG_* environment overrides
fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(opt.config.as_deref())?;

    match opt.command {
        // When I want the finite-field domain parameters (q, p, g) on disk
        Command::GenParams { file } => {
            // An existing file is loaded and validated instead of regenerated
            let path = file.unwrap_or_else(|| settings.param_file.clone());
            let params = GroupParams::generate_or_load(&path, &settings.param_spec())?;
            println!(
                "Domain parameters ready in {} (q: {} bits, p: {} bits)",
                path.display(),
                params.q().bits(),
                params.p().bits()
            );
        }
        // When I want a fresh block of random signed transactions
        Command::GenCandidate {
            variant,
            out,
            count,
        } => {
            let count = count.unwrap_or(settings.tx_count);
            // I sign over whichever group the variant selects
            let candidate = match variant {
                VariantArg::FiniteField => {
                    let params = load_params(&settings)?;
                    generate_candidate_block(&params, count, settings.workers)
                }
                VariantArg::EllipticCurve => {
                    generate_candidate_block(&Secp256k1::new(), count, settings.workers)
                }
            };
            fs::write(&out, candidate)?;
            println!("Wrote {count} transactions to {}", out.display());
        }
        // When I want to check every signature in a candidate block
        Command::VerifyCandidate {
            variant,
            input,
            count,
        } => {
            let candidate = fs::read_to_string(&input)?;
            let count = count.unwrap_or(settings.tx_count);
            let results = match variant {
                VariantArg::FiniteField => {
                    verify_candidate(&load_params(&settings)?, &candidate, count)?
                }
                VariantArg::EllipticCurve => {
                    verify_candidate(&Secp256k1::new(), &candidate, count)?
                }
            };
            // I report each bad transaction by index, then the total
            let valid = results.iter().filter(|ok| **ok).count();
            for (index, _) in results.iter().enumerate().filter(|(_, ok)| !**ok) {
                println!("Transaction {index}: signature does not verify");
            }
            println!("{valid}/{} signatures verified", results.len());
            if valid != results.len() {
                return Err("candidate block contains invalid signatures".into());
            }
        }
        // When I want to mine a standalone block (no Previous PoW line)
        Command::Mine {
            variant,
            input,
            out,
            difficulty,
        } => {
            let candidate = fs::read_to_string(&input)?;
            let layout = layout_for(&settings, variant);
            // A --difficulty flag wins over the configured pow_len
            let pow = ProofOfWork::new(difficulty.unwrap_or(settings.pow_len))
                .with_workers(settings.workers)
                .with_max_attempts(settings.max_attempts);
            match pow.mine_candidate(&candidate, &layout)? {
                Some(block) => {
                    fs::write(&out, block.to_text())?;
                    println!("PoW: {}", block.pow_digest());
                }
                None => return Err("no nonce found within the attempt cap".into()),
            }
        }
        // When I want the PoW digest of a mined block, or "invalid"
        Command::CheckPow {
            variant,
            input,
            difficulty,
        } => {
            let text = fs::read_to_string(&input)?;
            let layout = layout_for(&settings, variant);
            let pow = ProofOfWork::new(difficulty.unwrap_or(settings.pow_len));
            // Malformed files and under-target digests both print "invalid"
            match pow.check_pow(&text, &layout) {
                Some(digest) => println!("{digest}"),
                None => println!("invalid"),
            }
        }
        // When I want to mine a candidate onto the chain
        Command::AddBlock {
            variant,
            candidate,
            previous,
            out,
        } => {
            let candidate = fs::read_to_string(&candidate)?;
            // Without --previous this becomes the genesis block
            let previous = previous.map(fs::read_to_string).transpose()?;
            let linker = ChainLinker::new(layout_for(&settings, variant), settings.proof_of_work());
            let linked = linker.append_text(&candidate, previous.as_deref())?;
            fs::write(&out, &linked.text)?;
            println!("PoW: {}", linked.digest);
        }
        // When I want to check a whole chain, genesis first
        Command::VerifyChain { variant, blocks } => {
            let texts = blocks
                .iter()
                .map(fs::read_to_string)
                .collect::<Result<Vec<_>, _>>()?;
            let linker = ChainLinker::new(layout_for(&settings, variant), settings.proof_of_work());
            let digests = linker.verify_chain_texts(&texts)?;
            for (height, (path, digest)) in blocks.iter().zip(&digests).enumerate() {
                println!("{height}: {} {digest}", path.display());
            }
            println!("Chain of {} blocks verified", digests.len());
        }
    }
    Ok(())
}

// I load the configured parameter file, generating it on first use
fn load_params(settings: &Settings) -> dlog_chain::Result<GroupParams> {
    let path: &Path = &settings.param_file;
    info!("Using domain parameters from {}", path.display());
    GroupParams::generate_or_load(path, &settings.param_spec())
}

// Transaction length depends on the variant: 7 lines for ff, 9 for ec
fn layout_for(settings: &Settings, variant: VariantArg) -> BlockLayout {
    match variant {
        VariantArg::FiniteField => settings.layout_for::<GroupParams>(),
        VariantArg::EllipticCurve => settings.layout_for::<Secp256k1>(),
    }
}

fn verify_candidate<G: Group>(
    group: &G,
    candidate: &str,
    count: usize,
) -> dlog_chain::Result<Vec<bool>> {
    let layout = BlockLayout::for_group::<G>(count);
    let texts = layout.split_candidate(candidate)?;
    verify_transaction_texts(&texts, group)
}
