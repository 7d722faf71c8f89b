//! Record types flowing through the statement engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::UnresolvedPolicy;
use crate::currency::CurrencyCode;

/// Marker stamped on a transaction field whose context was never resolved.
pub const UNRESOLVED: &str = "UNKNOWN";

/// One page of extracted statement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPage {
    /// Zero-based page position in the document
    pub index: usize,
    /// `None` for pages with no extractable text (scanned images)
    pub text: Option<String>,
}

impl RawPage {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: Some(text.into()),
        }
    }

    pub fn blank(index: usize) -> Self {
        Self { index, text: None }
    }

    /// Page text, or `None` when the page is absent or whitespace only.
    pub fn usable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// The account/currency in force for transaction lines.
///
/// Fields are sticky: a resolver only ever replaces a field with a newly
/// detected valid value, never clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseContext {
    pub currency: Option<CurrencyCode>,
    pub account_id: Option<String>,
}

impl ParseContext {
    /// Context before the first page, as dictated by the unresolved policy.
    pub fn initial(policy: &UnresolvedPolicy) -> Self {
        Self {
            currency: policy.seed_currency(),
            account_id: None,
        }
    }

    pub fn currency_label(&self) -> String {
        self.currency
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNRESOLVED.to_string())
    }

    pub fn account_label(&self) -> String {
        self.account_id
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNRESOLVED.to_string())
    }
}

/// A tokenized transaction row before context is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub date: String,
    pub reference: String,
    pub description: String,
    /// Literal sign from the statement; negative means money out
    pub amount: Decimal,
    /// Running balance after this row
    pub balance: Decimal,
}

/// A finished statement transaction.
///
/// Field order is the CSV column contract; keep it stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub reference: String,
    pub description: String,
    pub amount: Decimal,
    pub balance: Decimal,
    /// Resolved currency code or [`UNRESOLVED`]
    pub currency: String,
    /// Resolved account identifier (IBAN or account number) or [`UNRESOLVED`]
    pub account_id: String,
}

impl Transaction {
    pub fn key(&self) -> AccountKey {
        AccountKey {
            account_id: self.account_id.clone(),
            currency: self.currency.clone(),
        }
    }

    pub fn has_unresolved_currency(&self) -> bool {
        self.currency == UNRESOLVED
    }

    pub fn has_unresolved_account(&self) -> bool {
        self.account_id == UNRESOLVED
    }
}

/// Parse a `DD/MM/YYYY` or `DD-MM-YYYY` date; separators may differ.
pub fn parse_statement_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    if b.len() != 10 || !matches!(b[2], b'/' | b'-') || !matches!(b[5], b'/' | b'-') {
        return None;
    }
    let day: u32 = s.get(0..2)?.parse().ok()?;
    let month: u32 = s.get(3..5)?.parse().ok()?;
    let year: i32 = s.get(6..10)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Grouping key: one statement account in one currency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub account_id: String,
    pub currency: String,
}

impl std::fmt::Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.account_id, self.currency)
    }
}

/// All transactions for one account key, in statement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub key: AccountKey,
    pub transactions: Vec<Transaction>,
}

impl AccountGroup {
    pub fn new(key: AccountKey) -> Self {
        Self {
            key,
            transactions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sum of signed amounts
    pub fn net_amount(&self) -> Decimal {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Running balance printed on the last row of the group
    pub fn closing_balance(&self) -> Option<Decimal> {
        self.transactions.last().map(|t| t.balance)
    }
}
