//! CSV output for parsed statements.
//!
//! Column contract (order is stable, downstream tooling depends on it):
//! Date,Reference,Description,Amount,Balance,Currency,Account
//!
//! The preview variant drops the Account column for human-facing tables;
//! grouping still uses it.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::{AccountGroup, AccountKey, Transaction};
use tracing::debug;

pub const HEADERS: [&str; 7] = [
    "Date",
    "Reference",
    "Description",
    "Amount",
    "Balance",
    "Currency",
    "Account",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Reference")]
    reference: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "Balance")]
    balance: Decimal,
    #[serde(rename = "Currency")]
    currency: &'a str,
    #[serde(rename = "Account")]
    account: &'a str,
}

#[derive(Debug, Serialize)]
struct PreviewRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Reference")]
    reference: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "Balance")]
    balance: Decimal,
    #[serde(rename = "Currency")]
    currency: &'a str,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            date: &t.date,
            reference: &t.reference,
            description: &t.description,
            amount: t.amount,
            balance: t.balance,
            currency: &t.currency,
            account: &t.account_id,
        }
    }
}

impl<'a> From<&'a Transaction> for PreviewRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            date: &t.date,
            reference: &t.reference,
            description: &t.description,
            amount: t.amount,
            balance: t.balance,
            currency: &t.currency,
        }
    }
}

/// Write every field of `txns`, header row included even when empty.
pub fn write_transactions<W: Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADERS).context("writing CSV header")?;
    for t in txns {
        wtr.serialize(CsvRow::from(t))
            .with_context(|| format!("writing row {} {}", t.date, t.reference))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Like [`write_transactions`] without the account column.
pub fn write_preview<W: Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(&HEADERS[..6]).context("writing CSV header")?;
    for t in txns {
        wtr.serialize(PreviewRow::from(t))
            .with_context(|| format!("writing row {} {}", t.date, t.reference))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub fn transactions_to_string(txns: &[Transaction]) -> Result<String> {
    let mut buf = Vec::new();
    write_transactions(&mut buf, txns)?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}

/// File name for one group: `<account>_<currency>.csv`, with anything
/// outside `[A-Za-z0-9-]` replaced by `-`.
pub fn group_file_name(key: &AccountKey) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
            .collect()
    };
    format!("{}_{}.csv", clean(&key.account_id), clean(&key.currency))
}

/// Write one CSV per account group into `dir`, creating it if needed.
/// Returns the written paths in group order.
pub fn write_groups(dir: &Path, groups: &BTreeMap<AccountKey, AccountGroup>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::with_capacity(groups.len());
    for (key, group) in groups {
        let path = dir.join(group_file_name(key));
        let file = fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
        write_transactions(file, &group.transactions)
            .with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), rows = group.len(), "wrote account group");
        written.push(path);
    }
    Ok(written)
}
