//! Statement parser: the sequential fold over pages.
//!
//! For every page, in order:
//! 1. tokenize each line
//! 2. resolve the page's context from the lines that are not transaction
//!    rows (carrying forward whatever the page doesn't declare)
//! 3. stamp recognised rows with the context
//!
//! Context must be folded strictly in page order. If page extraction ever
//! runs in parallel, resolve contexts sequentially first and only then fan
//! out per-page tokenization.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use tally_core::{AccountGroup, AccountKey, ParseContext, ParserConfig, RawPage, Transaction};
use tracing::{debug, info, trace};

use crate::assembler::assemble;
use crate::context::ContextResolver;
use crate::segmenter::segment;
use crate::source::{FormFeedPages, PageTextSource};
use crate::tokenizer::{LineTokenizer, WhitespaceTokenizer};

/// Counters describing one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub pages: usize,
    pub pages_without_text: usize,
    pub lines_scanned: usize,
    pub transactions: usize,
    pub unresolved_currency: usize,
    pub unresolved_account: usize,
}

/// Data-quality conditions for the caller to surface. None of these are
/// errors; the parse result is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWarning {
    NoTransactions,
    UnresolvedCurrency(usize),
    UnresolvedAccount(usize),
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWarning::NoTransactions => write!(f, "no transactions found"),
            ReportWarning::UnresolvedCurrency(n) => {
                write!(f, "{} transaction(s) have no detected currency", n)
            }
            ReportWarning::UnresolvedAccount(n) => {
                write!(f, "{} transaction(s) have no detected account", n)
            }
        }
    }
}

impl ParseReport {
    pub fn warnings(&self) -> Vec<ReportWarning> {
        let mut out = Vec::new();
        if self.transactions == 0 {
            out.push(ReportWarning::NoTransactions);
        }
        if self.unresolved_currency > 0 {
            out.push(ReportWarning::UnresolvedCurrency(self.unresolved_currency));
        }
        if self.unresolved_account > 0 {
            out.push(ReportWarning::UnresolvedAccount(self.unresolved_account));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    pub report: ParseReport,
    /// Context after the last page
    pub final_context: ParseContext,
}

impl ParseOutcome {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn segment(&self) -> BTreeMap<AccountKey, AccountGroup> {
        segment(self.transactions.iter().cloned())
    }

    pub fn into_groups(self) -> BTreeMap<AccountKey, AccountGroup> {
        segment(self.transactions)
    }
}

/// Drives context resolution and tokenization over a document's pages.
#[derive(Debug, Clone)]
pub struct StatementParser<T: LineTokenizer = WhitespaceTokenizer> {
    config: ParserConfig,
    resolver: ContextResolver,
    tokenizer: T,
}

impl StatementParser {
    pub fn new(config: ParserConfig) -> Result<Self> {
        let tokenizer = WhitespaceTokenizer::new(config.sign)?;
        Self::with_tokenizer(config, tokenizer)
    }
}

impl<T: LineTokenizer> StatementParser<T> {
    pub fn with_tokenizer(config: ParserConfig, tokenizer: T) -> Result<Self> {
        config.validate()?;
        let resolver = ContextResolver::new(config.currencies.clone())?;
        Ok(Self {
            config,
            resolver,
            tokenizer,
        })
    }

    /// Parse an in-memory page sequence.
    pub fn parse_pages(&self, pages: impl IntoIterator<Item = RawPage>) -> ParseOutcome {
        let mut out = ParseOutcome::default();
        let mut context = ParseContext::initial(&self.config.unresolved);
        for page in pages {
            context = self.fold_page(&page, context, &mut out);
        }
        self.finish(out, context)
    }

    /// Parse pages pulled from `source`. Source errors abort the parse and
    /// are returned as-is.
    pub fn parse_source<S: PageTextSource + ?Sized>(&self, source: &mut S) -> Result<ParseOutcome> {
        let mut out = ParseOutcome::default();
        let mut context = ParseContext::initial(&self.config.unresolved);
        while let Some(page) = source.next_page()? {
            context = self.fold_page(&page, context, &mut out);
        }
        Ok(self.finish(out, context))
    }

    /// Parse a whole document of form-feed separated page text.
    pub fn parse_text(&self, text: &str) -> ParseOutcome {
        self.parse_pages(FormFeedPages::new(text).into_pages())
    }

    fn fold_page(&self, page: &RawPage, context: ParseContext, out: &mut ParseOutcome) -> ParseContext {
        out.report.pages += 1;
        let Some(text) = page.usable_text() else {
            debug!(page = page.index, "page has no text; keeping context");
            out.report.pages_without_text += 1;
            return context;
        };

        let mut rows = Vec::new();
        let mut context_text = String::new();
        for line in text.lines() {
            out.report.lines_scanned += 1;
            match self.tokenizer.tokenize(line) {
                Some(row) => rows.push(row),
                None => {
                    trace!(page = page.index, line, "not a transaction");
                    context_text.push_str(line);
                    context_text.push('\n');
                }
            }
        }

        let detection = self.resolver.detect(&context_text);
        if let Some((detector, code)) = detection.currency {
            if context.currency != Some(code) {
                debug!(page = page.index, detector = detector.name(), currency = %code, "currency changed");
            }
        }
        if let Some((detector, account)) = &detection.account {
            if context.account_id.as_ref() != Some(account) {
                debug!(page = page.index, detector = detector.name(), account = %account, "account changed");
            }
        }
        let context = detection.apply(&context);

        for row in rows {
            let txn = assemble(row, &context);
            if txn.has_unresolved_currency() {
                out.report.unresolved_currency += 1;
            }
            if txn.has_unresolved_account() {
                out.report.unresolved_account += 1;
            }
            out.transactions.push(txn);
        }
        context
    }

    fn finish(&self, mut out: ParseOutcome, context: ParseContext) -> ParseOutcome {
        out.report.transactions = out.transactions.len();
        info!(
            pages = out.report.pages,
            transactions = out.report.transactions,
            currency = %context.currency_label(),
            "statement parsed"
        );
        out.final_context = context;
        out
    }
}
