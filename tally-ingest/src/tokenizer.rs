//! Transaction line tokenizer (whitespace columns)
//!
//! Expected extracted-text rows:
//!   DATE        REF        DESCRIPTION                 AMOUNT      BALANCE
//!   01/03/2024  REF001     Grocery Store               150.00      4,200.00
//!   02/03/2024  P0019384   Salary Credit Invoice 12    -5,000.00   9,200.00
//!
//! Columns are not delimited, so the amount and balance are found from the
//! right: the last numeric token is the balance and the one before it is the
//! amount. Everything between the date and the amount is reference followed
//! by description.
//!
//! The leading date must be a real calendar date, not just the right shape:
//! `31/02/2024 ...` or `01/13/2024 ...` is not a row.

use std::str::FromStr;

use anyhow::Result;
use regex::Regex;
use rust_decimal::Decimal;
use tally_core::{parse_statement_date, SignPolicy, TransactionLine};

/// Splits one line of statement text into transaction fields.
///
/// Returning `None` means "not a transaction": headers, footers and wrapped
/// description lines are normal input, not errors.
pub trait LineTokenizer {
    fn tokenize(&self, line: &str) -> Option<TransactionLine>;
}

/// Tokenizer for date-anchored rows whose columns are separated by runs of
/// whitespace.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    row_re: Regex,
    number_re: Regex,
    sign: SignPolicy,
}

impl WhitespaceTokenizer {
    pub fn new(sign: SignPolicy) -> Result<Self> {
        // DD/MM/YYYY or DD-MM-YYYY, separators independent of each other
        let row_re = Regex::new(r"^\s*(?P<date>\d{2}[/-]\d{2}[/-]\d{4})(?:\s+(?P<rest>.*))?$")?;
        let number_re = Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)$")?;
        Ok(Self {
            row_re,
            number_re,
            sign,
        })
    }

    /// Thousands separators stripped, or `None` when the token is text.
    fn numeric(&self, token: &str) -> Option<String> {
        let cleaned = token.replace(',', "");
        self.number_re.is_match(&cleaned).then_some(cleaned)
    }
}

impl LineTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, line: &str) -> Option<TransactionLine> {
        let caps = self.row_re.captures(line)?;
        let date = &caps["date"];
        parse_statement_date(date)?;

        let tokens: Vec<&str> = caps
            .name("rest")
            .map(|m| m.as_str().split_whitespace().collect())
            .unwrap_or_default();

        let numeric_positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| self.numeric(t).is_some())
            .map(|(i, _)| i)
            .collect();
        let &[.., amount_at, balance_at] = numeric_positions.as_slice() else {
            return None;
        };

        let mut amount = Decimal::from_str(&self.numeric(tokens[amount_at])?).ok()?;
        let balance = Decimal::from_str(&self.numeric(tokens[balance_at])?).ok()?;

        let mut leading: Vec<&str> = tokens[..amount_at].to_vec();
        if self.sign == SignPolicy::DashMarksDebit && tokens.contains(&"-") {
            leading.retain(|t| *t != "-");
            amount = -amount.abs();
        }

        let (reference, description) = match leading.split_first() {
            Some((first, rest)) => (first.to_string(), rest.join(" ")),
            None => (String::new(), String::new()),
        };

        Some(TransactionLine {
            date: date.to_string(),
            reference,
            description,
            amount,
            balance,
        })
    }
}
