use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Which group the signature scheme runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantArg {
    FiniteField,
    EllipticCurve,
}

impl FromStr for VariantArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ff" | "finite-field" => Ok(VariantArg::FiniteField),
            "ec" | "elliptic-curve" => Ok(VariantArg::EllipticCurve),
            _ => Err(format!("Invalid variant: {s}. Valid options: ff, ec")),
        }
    }
}

impl std::fmt::Display for VariantArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantArg::FiniteField => write!(f, "ff"),
            VariantArg::EllipticCurve => write!(f, "ec"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "dlog-chain")]
pub struct Opt {
    #[arg(long = "config", global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "gen-params",
        about = "Generate the finite-field domain parameters, or load them if present"
    )]
    GenParams {
        #[arg(long = "file", help = "Parameter file (defaults to the configured one)")]
        file: Option<PathBuf>,
    },
    #[command(name = "gen-candidate", about = "Write a block of random signed transactions")]
    GenCandidate {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(long = "out", help = "Candidate-block file to write")]
        out: PathBuf,
        #[arg(long = "count", help = "Number of transactions")]
        count: Option<usize>,
    },
    #[command(
        name = "verify-candidate",
        about = "Verify every transaction signature in a candidate block"
    )]
    VerifyCandidate {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(long = "input", help = "Candidate-block file")]
        input: PathBuf,
        #[arg(long = "count", help = "Number of transactions")]
        count: Option<usize>,
    },
    #[command(name = "mine", about = "Mine a candidate block into a standalone block")]
    Mine {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(long = "input", help = "Candidate-block file")]
        input: PathBuf,
        #[arg(long = "out", help = "Mined-block file to write")]
        out: PathBuf,
        #[arg(long = "difficulty", help = "Leading zero hex digits required")]
        difficulty: Option<usize>,
    },
    #[command(name = "check-pow", about = "Print a block's PoW digest, or 'invalid'")]
    CheckPow {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(long = "input", help = "Mined-block file")]
        input: PathBuf,
        #[arg(long = "difficulty", help = "Leading zero hex digits required")]
        difficulty: Option<usize>,
    },
    #[command(name = "add-block", about = "Mine a candidate block onto a chain")]
    AddBlock {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(long = "candidate", help = "Candidate-block file")]
        candidate: PathBuf,
        #[arg(long = "previous", help = "Previous mined block; omit for genesis")]
        previous: Option<PathBuf>,
        #[arg(long = "out", help = "Mined-block file to write")]
        out: PathBuf,
    },
    #[command(name = "verify-chain", about = "Verify linkage and PoW of chained blocks")]
    VerifyChain {
        #[arg(long = "variant", default_value = "ff", help = "Signature group (ff, ec)")]
        variant: VariantArg,
        #[arg(required = true, help = "Block files, genesis first")]
        blocks: Vec<PathBuf>,
    },
}
