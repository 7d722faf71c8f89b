//! tally-core: statement record types, currency set and parser configuration

pub mod config;
pub mod currency;
pub mod model;

pub use config::{ParserConfig, SignPolicy, UnresolvedPolicy};
pub use currency::{CurrencyCode, CurrencySet, InvalidCurrencyCode};
pub use model::{
    parse_statement_date, AccountGroup, AccountKey, ParseContext, RawPage, Transaction,
    TransactionLine, UNRESOLVED,
};
