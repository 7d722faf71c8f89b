//! tally-ingest: statement text ingestion. Page sources, context resolution,
//! line tokenization, assembly and per-account segmentation.

pub mod assembler;
pub mod context;
pub mod engine;
pub mod segmenter;
pub mod source;
pub mod tokenizer;

pub use assembler::assemble;
pub use context::{ContextResolver, Detector, PageDetection};
pub use engine::{ParseOutcome, ParseReport, ReportWarning, StatementParser};
pub use segmenter::segment;
pub use source::{FormFeedPages, PageList, PageTextSource};
pub use tokenizer::{LineTokenizer, WhitespaceTokenizer};
