//! Page text sources.
//!
//! The engine never touches PDFs. A source hands over already-extracted text
//! one page at a time, in document order.

use std::io::Read;

use anyhow::{Context, Result};
use tally_core::RawPage;

/// Supplies statement pages in order. `Ok(None)` ends the document.
///
/// Errors are the source's own (I/O, extraction) and are passed through to
/// the caller untouched.
pub trait PageTextSource {
    fn next_page(&mut self) -> Result<Option<RawPage>>;
}

/// Pages already held in memory.
#[derive(Debug, Clone, Default)]
pub struct PageList {
    pages: std::vec::IntoIter<RawPage>,
}

impl PageList {
    pub fn new(pages: Vec<RawPage>) -> Self {
        Self {
            pages: pages.into_iter(),
        }
    }
}

impl PageTextSource for PageList {
    fn next_page(&mut self) -> Result<Option<RawPage>> {
        Ok(self.pages.next())
    }
}

/// `pdftotext`-style output: one document, pages separated by form feeds.
#[derive(Debug, Clone)]
pub struct FormFeedPages {
    segments: Vec<String>,
    next: usize,
}

impl FormFeedPages {
    pub fn new(text: &str) -> Self {
        let mut segments: Vec<String> = text.split('\x0c').map(str::to_string).collect();
        // pdftotext terminates every page, including the last, with \f
        if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
            segments.pop();
        }
        Self { segments, next: 0 }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("reading statement text")?;
        Ok(Self::new(&text))
    }

    pub fn page_count(&self) -> usize {
        self.segments.len()
    }

    /// The remaining pages as a plain iterator. Splitting already happened,
    /// so nothing here can fail.
    pub fn into_pages(self) -> impl Iterator<Item = RawPage> {
        let start = self.next;
        self.segments
            .into_iter()
            .enumerate()
            .skip(start)
            .map(|(index, segment)| to_page(index, segment))
    }
}

fn to_page(index: usize, segment: String) -> RawPage {
    if segment.trim().is_empty() {
        RawPage::blank(index)
    } else {
        RawPage::new(index, segment)
    }
}

impl PageTextSource for FormFeedPages {
    fn next_page(&mut self) -> Result<Option<RawPage>> {
        let Some(segment) = self.segments.get(self.next) else {
            return Ok(None);
        };
        let page = to_page(self.next, segment.clone());
        self.next += 1;
        Ok(Some(page))
    }
}
