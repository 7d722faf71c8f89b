//! Parser configuration: which currencies count, what to do with rows
//! whose context never resolves, and how signs are read.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::currency::{CurrencyCode, CurrencySet};

/// Behaviour for a context field that no page ever resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
    /// Stamp `UNKNOWN` on unresolved currency and account.
    #[default]
    Sentinel,
    /// Start the document with `code` as the active currency. The account
    /// is still stamped `UNKNOWN` until one is found.
    DefaultCurrency { code: CurrencyCode },
}

impl UnresolvedPolicy {
    pub fn seed_currency(&self) -> Option<CurrencyCode> {
        match self {
            UnresolvedPolicy::Sentinel => None,
            UnresolvedPolicy::DefaultCurrency { code } => Some(*code),
        }
    }
}

/// How the amount column's sign is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignPolicy {
    /// Use the sign printed on the amount token as-is.
    #[default]
    PassThrough,
    /// A standalone `-` token anywhere on the row marks it as a debit.
    DashMarksDebit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub currencies: CurrencySet,
    pub sign: SignPolicy,
    // Table-valued; keep last so TOML output stays valid.
    pub unresolved: UnresolvedPolicy,
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        if self.currencies.is_empty() {
            bail!("currency set is empty; at least one currency code is required");
        }
        if let UnresolvedPolicy::DefaultCurrency { code } = &self.unresolved {
            if !self.currencies.contains(*code) {
                bail!("default currency {} is not in the configured currency set", code);
            }
        }
        Ok(())
    }
}
