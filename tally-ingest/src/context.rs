//! Page context resolution: which currency and account the transaction rows
//! on a page belong to.
//!
//! Detection runs over the whole page text rather than line by line, because
//! text extraction frequently breaks a label and its value onto separate
//! lines ("CURRENCY\nAED"). Detectors are tried in priority order and the
//! first one that yields a valid value wins for its field.
//!
//! The engine hands the resolver only the lines its tokenizer did not take
//! as transaction rows, so a payee IBAN or "to USD account" inside a
//! description never switches the page context.

use anyhow::{Context, Result};
use regex::Regex;
use tally_core::{CurrencyCode, CurrencySet, ParseContext};

/// One regex-driven detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    /// `Balance (AED)` column header
    TableHeader,
    /// `CURRENCY AED`, `CURRENCY: AED` or the code on the next line
    ExplicitLabel,
    /// `AED account` section title on a line of its own
    AccountTitle,
    /// IBAN printed anywhere on the page
    Iban,
    /// `Account Number: 0123-4567-89`, one token with optional `-` groups
    AccountNumber,
}

/// Currency detectors, highest priority first.
pub const CURRENCY_DETECTORS: [Detector; 3] = [
    Detector::TableHeader,
    Detector::ExplicitLabel,
    Detector::AccountTitle,
];

/// Account detectors, highest priority first.
pub const ACCOUNT_DETECTORS: [Detector; 2] = [Detector::Iban, Detector::AccountNumber];

impl Detector {
    pub fn name(&self) -> &'static str {
        match self {
            Detector::TableHeader => "table-header",
            Detector::ExplicitLabel => "explicit-label",
            Detector::AccountTitle => "account-title",
            Detector::Iban => "iban",
            Detector::AccountNumber => "account-number",
        }
    }

    /// Capture group 1 holds the candidate value.
    fn pattern(&self) -> &'static str {
        match self {
            Detector::TableHeader => r"\bBalance\s*\(\s*([A-Z]{3})\s*\)",
            Detector::ExplicitLabel => r"\bCURRENCY\s*:?\s*([A-Z]{3})\b",
            Detector::AccountTitle => r"(?m)^[ \t]*([A-Z]{3})[ \t]+(?i:account)[ \t]*$",
            Detector::Iban => r"\b([A-Z]{2}\d{2}(?:[ ]?[A-Z0-9]){11,30})\b",
            Detector::AccountNumber => {
                r"(?i:\baccount\s+(?:number|no\.?))\s*:?\s*([0-9A-Z]+(?:-[0-9A-Z]+)*)\b"
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledDetector {
    detector: Detector,
    regex: Regex,
}

fn compile(detectors: &[Detector]) -> Result<Vec<CompiledDetector>> {
    detectors
        .iter()
        .map(|&detector| {
            let regex = Regex::new(detector.pattern())
                .with_context(|| format!("compiling {} detector", detector.name()))?;
            Ok(CompiledDetector { detector, regex })
        })
        .collect()
}

/// Run `detectors` in order; within a detector try every match in reading
/// order. The first candidate `accept` keeps wins.
fn first_valid<T>(
    detectors: &[CompiledDetector],
    text: &str,
    accept: impl Fn(Detector, &str) -> Option<T>,
) -> Option<(Detector, T)> {
    detectors.iter().find_map(|d| {
        d.regex
            .captures_iter(text)
            .find_map(|caps| accept(d.detector, caps.get(1)?.as_str()))
            .map(|value| (d.detector, value))
    })
}

/// What a single page declared, before merging with the carried context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDetection {
    pub currency: Option<(Detector, CurrencyCode)>,
    pub account: Option<(Detector, String)>,
}

impl PageDetection {
    /// Overlay detected fields on `previous`; undetected fields carry forward.
    pub fn apply(&self, previous: &ParseContext) -> ParseContext {
        ParseContext {
            currency: self.currency.map(|(_, c)| c).or(previous.currency),
            account_id: self
                .account
                .as_ref()
                .map(|(_, a)| a.clone())
                .or_else(|| previous.account_id.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.currency.is_none() && self.account.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ContextResolver {
    currencies: CurrencySet,
    currency_detectors: Vec<CompiledDetector>,
    account_detectors: Vec<CompiledDetector>,
}

impl ContextResolver {
    pub fn new(currencies: CurrencySet) -> Result<Self> {
        Ok(Self {
            currencies,
            currency_detectors: compile(&CURRENCY_DETECTORS)?,
            account_detectors: compile(&ACCOUNT_DETECTORS)?,
        })
    }

    /// Detect the fields a page declares on its own.
    pub fn detect(&self, page_text: &str) -> PageDetection {
        PageDetection {
            currency: first_valid(&self.currency_detectors, page_text, |_, c| {
                self.currencies.accept(c)
            }),
            account: first_valid(&self.account_detectors, page_text, normalize_account),
        }
    }

    /// Context in force after `page_text`, given the context before it.
    pub fn resolve(&self, page_text: &str, previous: &ParseContext) -> ParseContext {
        self.detect(page_text).apply(previous)
    }
}

/// Registered IBAN lengths by country.
const IBAN_LENGTHS: &[(&str, usize)] = &[
    ("AD", 24), ("AE", 23), ("AL", 28), ("AT", 20), ("AZ", 28), ("BA", 20),
    ("BE", 16), ("BG", 22), ("BH", 22), ("BR", 29), ("CH", 21), ("CR", 22),
    ("CY", 28), ("CZ", 24), ("DE", 22), ("DK", 18), ("DO", 28), ("EE", 20),
    ("EG", 29), ("ES", 24), ("FI", 18), ("FO", 18), ("FR", 27), ("GB", 22),
    ("GE", 22), ("GI", 23), ("GL", 18), ("GR", 27), ("GT", 28), ("HR", 21),
    ("HU", 28), ("IE", 22), ("IL", 23), ("IQ", 23), ("IS", 26), ("IT", 27),
    ("JO", 30), ("KW", 30), ("KZ", 20), ("LB", 28), ("LI", 21), ("LT", 20),
    ("LU", 20), ("LV", 21), ("MC", 27), ("MD", 24), ("ME", 22), ("MK", 19),
    ("MR", 27), ("MT", 31), ("MU", 30), ("NL", 18), ("NO", 15), ("PK", 24),
    ("PL", 28), ("PS", 29), ("PT", 25), ("QA", 29), ("RO", 24), ("RS", 22),
    ("SA", 24), ("SE", 24), ("SI", 19), ("SK", 24), ("SM", 27), ("TN", 24),
    ("TR", 26), ("UA", 29), ("VG", 24), ("XK", 20),
];

/// Strip print spacing from an IBAN candidate and cut it to the country's
/// registered length. Unknown countries are rejected, which keeps
/// transaction references like `TX12ABCDEFGHIJK` out.
fn normalize_iban(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let country = compact.get(0..2)?;
    let (_, len) = IBAN_LENGTHS.iter().find(|(cc, _)| *cc == country)?;
    compact.get(0..*len).map(str::to_string)
}

/// Labeled account numbers: `-` separators dropped, at least six
/// characters, at least one digit.
fn normalize_account_number(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| *c != '-').collect();
    let has_digit = compact.chars().any(|c| c.is_ascii_digit());
    (compact.len() >= 6 && has_digit).then_some(compact)
}

fn normalize_account(detector: Detector, raw: &str) -> Option<String> {
    match detector {
        Detector::Iban => normalize_iban(raw),
        _ => normalize_account_number(raw),
    }
}
