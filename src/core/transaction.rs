// Canonical text form of a transaction.
// The same lines are the on-disk format, the Merkle leaf input and (minus the
// header and signature lines) the signed payload, so the layout is byte-exact.

use crate::core::signature::{Group, Signature, SignatureScheme};
use crate::error::{BlockchainError, Result};
use log::debug;
use num_bigint::BigUint;
use rand::Rng;
use std::thread;

pub const TX_HEADER: &str = "*** Bitcoin transaction ***";
pub const MIN_AMOUNT: u32 = 1;
pub const MAX_AMOUNT: u32 = 1_000_000;

const SIGNATURE_S_LABEL: &str = "Signature (s)";
const SIGNATURE_H_LABEL: &str = "Signature (h)";
const SERIAL_LABEL: &str = "Serial number";
const AMOUNT_LABEL: &str = "Amount";
const PAYEE: &str = "Payee";
const PAYER: &str = "Payer";

/// Lines per transaction for group `G`: header, two signature lines, serial,
/// amount and one line per key field for each of the two public keys.
pub fn tx_line_count<G: Group>() -> usize {
    5 + 2 * G::KEY_FIELDS.len()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction<E> {
    signature: Signature,
    serial: u128,
    amount: u32,
    payee_key: E,
    payer_key: E,
}

impl<E: Clone + PartialEq + std::fmt::Debug> Transaction<E> {
    /// Fresh payer and payee key pairs, random serial and amount, signed by the payer
    pub fn new_random<G: Group<Element = E>>(scheme: &SignatureScheme<'_, G>) -> Transaction<E> {
        // Both parties get fresh keys; only the payer's secret signs
        let payer = scheme.keygen();
        let payee = scheme.keygen();
        let mut rng = rand::thread_rng();
        let serial: u128 = rng.gen();
        let amount = rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT);

        Self::new_signed(
            scheme,
            serial,
            amount,
            payee.public().clone(),
            payer.public().clone(),
            payer.secret(),
        )
    }

    pub fn new_signed<G: Group<Element = E>>(
        scheme: &SignatureScheme<'_, G>,
        serial: u128,
        amount: u32,
        payee_key: E,
        payer_key: E,
        payer_secret: &BigUint,
    ) -> Transaction<E> {
        let payload = Self::payload_text(scheme.group(), serial, amount, &payee_key, &payer_key);
        let signature = scheme.sign(payload.as_bytes(), payer_secret);
        Transaction {
            signature,
            serial,
            amount,
            payee_key,
            payer_key,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn serial(&self) -> u128 {
        self.serial
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn payee_key(&self) -> &E {
        &self.payee_key
    }

    pub fn payer_key(&self) -> &E {
        &self.payer_key
    }

    /// The serial, amount, payee-key and payer-key lines, in that order
    pub fn signed_payload<G: Group<Element = E>>(&self, group: &G) -> String {
        Self::payload_text(
            group,
            self.serial,
            self.amount,
            &self.payee_key,
            &self.payer_key,
        )
    }

    pub fn to_text<G: Group<Element = E>>(&self, group: &G) -> String {
        let mut text = format!("{TX_HEADER}\n");
        text.push_str(&format!("{SIGNATURE_S_LABEL}: {}\n", self.signature.s));
        text.push_str(&format!("{SIGNATURE_H_LABEL}: {}\n", self.signature.h));
        text.push_str(&self.signed_payload(group));
        text
    }

    /// Whether the payer's key verifies the signature over the payload
    pub fn verify<G: Group<Element = E>>(&self, group: &G) -> bool {
        let payload = self.signed_payload(group);
        SignatureScheme::new(group).verify(payload.as_bytes(), &self.signature, &self.payer_key)
    }

    pub fn parse<G: Group<Element = E>>(text: &str, group: &G) -> Result<Transaction<E>> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let expected = tx_line_count::<G>();
        if lines.len() != expected {
            return Err(BlockchainError::MalformedTransaction(format!(
                "expected {expected} lines, found {}",
                lines.len()
            )));
        }

        if !lines[0].trim_start().starts_with('*') {
            return Err(BlockchainError::MalformedTransaction(format!(
                "missing transaction header, found {:?}",
                lines[0].trim()
            )));
        }
        let s = parse_field::<BigUint>(lines[1], SIGNATURE_S_LABEL)?;
        let h = parse_field::<BigUint>(lines[2], SIGNATURE_H_LABEL)?;
        let serial = parse_field::<u128>(lines[3], SERIAL_LABEL)?;
        let amount = parse_field::<u32>(lines[4], AMOUNT_LABEL)?;
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
            return Err(BlockchainError::MalformedTransaction(format!(
                "amount {amount} outside [{MIN_AMOUNT}, {MAX_AMOUNT}]"
            )));
        }

        let fields = G::KEY_FIELDS.len();
        let payee_key = parse_key(group, &lines[5..5 + fields], PAYEE)?;
        let payer_key = parse_key(group, &lines[5 + fields..5 + 2 * fields], PAYER)?;

        Ok(Transaction {
            signature: Signature { s, h },
            serial,
            amount,
            payee_key,
            payer_key,
        })
    }

    fn payload_text<G: Group<Element = E>>(
        group: &G,
        serial: u128,
        amount: u32,
        payee_key: &E,
        payer_key: &E,
    ) -> String {
        let mut text = format!("{SERIAL_LABEL}: {serial}\n{AMOUNT_LABEL}: {amount}\n");
        text.push_str(&key_lines(group, PAYEE, payee_key));
        text.push_str(&key_lines(group, PAYER, payer_key));
        text
    }
}

fn key_label(role: &str, field: &str) -> String {
    format!("{role} public key ({field})")
}

fn key_lines<G: Group>(group: &G, role: &str, key: &G::Element) -> String {
    G::KEY_FIELDS
        .iter()
        .zip(group.element_fields(key))
        .map(|(field, value)| format!("{}: {value}\n", key_label(role, field)))
        .collect()
}

fn parse_key<G: Group>(group: &G, lines: &[&str], role: &str) -> Result<G::Element> {
    let values = G::KEY_FIELDS
        .iter()
        .zip(lines)
        .map(|(field, line)| parse_field::<BigUint>(line, &key_label(role, field)))
        .collect::<Result<Vec<_>>>()?;
    group
        .element_from_fields(&values)
        .map_err(|e| BlockchainError::MalformedTransaction(format!("{role} key: {e}")))
}

fn parse_field<T: std::str::FromStr>(line: &str, label: &str) -> Result<T> {
    let value = line
        .trim()
        .strip_prefix(label)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| {
            BlockchainError::MalformedTransaction(format!(
                "expected '{label}:' line, found {:?}",
                line.trim()
            ))
        })?;
    value.trim().parse::<T>().map_err(|_| {
        BlockchainError::MalformedTransaction(format!("unparsable value for '{label}': {value:?}"))
    })
}

/// `tx_count` random transactions concatenated into one candidate-block text.
/// Work is split across `workers` threads; output order is stable per worker.
pub fn generate_candidate_block<G>(group: &G, tx_count: usize, workers: usize) -> String
where
    G: Group + Sync,
{
    // I never start more workers than there are transactions to sign
    let workers = workers.clamp(1, tx_count.max(1));
    let per_worker = tx_count.div_ceil(workers);
    debug!("Generating {tx_count} transactions on {workers} workers");

    let chunks: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let count = per_worker.min(tx_count.saturating_sub(worker * per_worker));
                // Each worker signs its own slice with fresh key pairs
                scope.spawn(move || {
                    let scheme = SignatureScheme::new(group);
                    (0..count)
                        .map(|_| Transaction::new_random(&scheme).to_text(group))
                        .collect::<String>()
                })
            })
            .collect();
        // I join in spawn order so the block keeps a stable worker order
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });
    chunks.concat()
}

/// Parse and verify every transaction; returns one flag per transaction
pub fn verify_transaction_texts<G: Group>(texts: &[String], group: &G) -> Result<Vec<bool>> {
    texts
        .iter()
        .map(|text| Transaction::parse(text, group).map(|tx| tx.verify(group)))
        .collect()
}
