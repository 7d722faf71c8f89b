//! Currency codes and the closed set of codes a statement may use.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A three-letter, upper-case currency code.
///
/// Construction only checks the shape. Whether a code is acceptable for a
/// statement is decided by [`CurrencySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const AED: CurrencyCode = CurrencyCode(*b"AED");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const GBP: CurrencyCode = CurrencyCode(*b"GBP");

    /// Parse a code, upper-casing it. Anything other than three ASCII
    /// letters is rejected.
    pub fn parse(s: &str) -> Result<Self, InvalidCurrencyCode> {
        let s = s.trim();
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(InvalidCurrencyCode(s.to_string()));
        }
        Ok(CurrencyCode([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters ever reach the array.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCurrencyCode(pub String);

impl fmt::Display for InvalidCurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid currency code {:?} (expected three letters)", self.0)
    }
}

impl std::error::Error for InvalidCurrencyCode {}

/// The closed set of currencies a statement is allowed to declare.
///
/// Detection strategies routinely pick up three-letter fragments of company
/// names ("DSO FZCO"), so every candidate goes through [`CurrencySet::accept`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencySet(BTreeSet<CurrencyCode>);

impl Default for CurrencySet {
    fn default() -> Self {
        Self::from_codes([
            CurrencyCode::AED,
            CurrencyCode::USD,
            CurrencyCode::EUR,
            CurrencyCode::GBP,
        ])
    }
}

impl CurrencySet {
    pub fn from_codes(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.0.contains(&code)
    }

    /// Return the code for `candidate` if it is a member of the set.
    ///
    /// The candidate must already be upper case: statement headers print
    /// codes in capitals, and lower-case words like "the" must not pass.
    pub fn accept(&self, candidate: &str) -> Option<CurrencyCode> {
        let candidate = candidate.trim();
        if !candidate.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let code = CurrencyCode::parse(candidate).ok()?;
        self.contains(code).then_some(code)
    }

    pub fn insert(&mut self, code: CurrencyCode) -> bool {
        self.0.insert(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = CurrencyCode> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
