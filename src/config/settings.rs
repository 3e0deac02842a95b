use crate::core::params::{ParamSpec, DEFAULT_P_BITS, DEFAULT_Q_BITS, DEFAULT_RETRY_BUDGET};
use crate::core::{BlockLayout, Group, ProofOfWork};
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;

const DEFAULT_TX_COUNT: usize = 8;
const DEFAULT_POW_LEN: usize = 5;
const DEFAULT_PARAM_FILE: &str = "pubparams.txt";

const TX_COUNT_KEY: &str = "DLOG_TX_COUNT";
const POW_LEN_KEY: &str = "DLOG_POW_LEN";
const WORKERS_KEY: &str = "DLOG_WORKERS";
const MAX_ATTEMPTS_KEY: &str = "DLOG_MAX_ATTEMPTS";
const PARAM_FILE_KEY: &str = "DLOG_PARAM_FILE";

/// Simulator settings, read from an optional TOML file and then
/// overridden by `DLOG_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Transactions per block
    pub tx_count: usize,
    /// Required leading zero hex digits of a block's PoW digest
    pub pow_len: usize,
    /// Mining / transaction-generation threads
    pub workers: usize,
    /// Cap on mining attempts; unset means search until found
    pub max_attempts: Option<u64>,
    pub param_file: PathBuf,
    pub q_bits: u64,
    pub p_bits: u64,
    pub retry_budget: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tx_count: DEFAULT_TX_COUNT,
            pow_len: DEFAULT_POW_LEN,
            workers: thread::available_parallelism().map_or(1, |n| n.get()),
            max_attempts: None,
            param_file: PathBuf::from(DEFAULT_PARAM_FILE),
            q_bits: DEFAULT_Q_BITS,
            p_bits: DEFAULT_P_BITS,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl Settings {
    /// Settings from `path` (defaults when `None`) with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let settings = match path {
            Some(path) => Self::from_toml_str(&fs::read_to_string(path)?)?,
            None => Settings::default(),
        };
        settings.with_overrides(|key| env::var(key).ok())
    }

    pub fn from_toml_str(text: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `DLOG_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(TX_COUNT_KEY) {
            self.tx_count = parse_override(TX_COUNT_KEY, &value)?;
        }
        if let Some(value) = lookup(POW_LEN_KEY) {
            self.pow_len = parse_override(POW_LEN_KEY, &value)?;
        }
        if let Some(value) = lookup(WORKERS_KEY) {
            self.workers = parse_override(WORKERS_KEY, &value)?;
        }
        if let Some(value) = lookup(MAX_ATTEMPTS_KEY) {
            self.max_attempts = Some(parse_override(MAX_ATTEMPTS_KEY, &value)?);
        }
        if let Some(value) = lookup(PARAM_FILE_KEY) {
            self.param_file = PathBuf::from(value);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.tx_count == 0 {
            return Err(BlockchainError::Config(
                "tx_count must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BlockchainError::Config("workers must be positive".to_string()));
        }
        if self.pow_len > 64 {
            return Err(BlockchainError::Config(format!(
                "pow_len {} exceeds the 64 hex digits of a SHA3-256 digest",
                self.pow_len
            )));
        }
        if self.p_bits <= self.q_bits + 1 {
            return Err(BlockchainError::Config(format!(
                "p_bits ({}) must exceed q_bits ({})",
                self.p_bits, self.q_bits
            )));
        }
        Ok(())
    }

    pub fn param_spec(&self) -> ParamSpec {
        ParamSpec {
            q_bits: self.q_bits,
            p_bits: self.p_bits,
            retry_budget: self.retry_budget,
        }
    }

    pub fn proof_of_work(&self) -> ProofOfWork {
        ProofOfWork::new(self.pow_len)
            .with_workers(self.workers)
            .with_max_attempts(self.max_attempts)
    }

    pub fn layout_for<G: Group>(&self) -> BlockLayout {
        BlockLayout::for_group::<G>(self.tx_count)
    }
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| BlockchainError::Config(format!("invalid value for {key}: {value:?}")))
}
