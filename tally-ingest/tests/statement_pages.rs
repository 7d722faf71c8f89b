use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use rust_decimal::Decimal;
use tally_core::{ParserConfig, RawPage, UNRESOLVED};
use tally_ingest::{FormFeedPages, PageList, PageTextSource, StatementParser};

const AED_IBAN: &str = "AE070331234567890123456";
const USD_IBAN: &str = "AE460331234567890123457";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn parse_fixture() -> tally_ingest::ParseOutcome {
    let file = std::fs::File::open(fixture("two_accounts.txt")).unwrap();
    let mut source = FormFeedPages::from_reader(file).unwrap();
    StatementParser::new(ParserConfig::default())
        .unwrap()
        .parse_source(&mut source)
        .unwrap()
}

/// Real-layout regression: two currency accounts, a continuation page
/// without headers and an empty scanned page.
#[test]
fn test_two_account_statement() {
    let out = parse_fixture();

    assert_eq!(out.report.pages, 4);
    assert_eq!(out.report.pages_without_text, 1);
    assert_eq!(out.transactions.len(), 6);
    assert!(out.report.warnings().is_empty(), "{:?}", out.report.warnings());

    let first = &out.transactions[0];
    assert_eq!(first.date, "01/03/2024");
    assert_eq!(first.reference, "P00192831");
    assert_eq!(first.description, "Grocery Store");
    assert_eq!(first.amount, dec("-150.00"));
    assert_eq!(first.balance, dec("4200.00"));
    assert_eq!(first.currency, "AED");
    assert_eq!(first.account_id, AED_IBAN);

    let transfer = &out.transactions[2];
    assert_eq!(transfer.description, "Transfer to 0044 1234");
    assert_eq!(transfer.amount, dec("-1200.50"));

    // page 2 repeats no header: carried forward
    let utility = &out.transactions[3];
    assert_eq!(utility.reference, "P00192834");
    assert_eq!(utility.currency, "AED");
    assert_eq!(utility.account_id, AED_IBAN);

    let aws = &out.transactions[5];
    assert_eq!(aws.currency, "USD");
    assert_eq!(aws.account_id, USD_IBAN);
    assert_eq!(aws.balance, dec("2300.01"));
}

#[test]
fn test_two_account_statement_groups() {
    let groups = parse_fixture().into_groups();
    assert_eq!(groups.len(), 2);

    let sizes: Vec<(String, usize)> = groups
        .values()
        .map(|g| (g.key.currency.clone(), g.len()))
        .collect();
    assert_eq!(sizes, vec![("AED".to_string(), 4), ("USD".to_string(), 2)]);

    let aed = groups.values().next().unwrap();
    assert_eq!(aed.closing_balance(), Some(dec("7679.50")));
    assert_eq!(aed.net_amount(), dec("3329.50"));
}

#[test]
fn test_priority_header_over_label() {
    let out = StatementParser::new(ParserConfig::default())
        .unwrap()
        .parse_pages(vec![RawPage::new(
            0,
            "CURRENCY EUR\nDate Description Amount Balance (USD)\n01/03/2024 R Shop 1.00 2.00",
        )]);
    assert_eq!(out.transactions[0].currency, "USD");
}

#[test]
fn test_unresolved_document() {
    let out = StatementParser::new(ParserConfig::default())
        .unwrap()
        .parse_pages(vec![
            RawPage::new(0, "01/03/2024 R1 Shop 1.00 2.00"),
            RawPage::new(1, "02/03/2024 R2 Shop 1.00 3.00"),
        ]);
    assert!(out.transactions.iter().all(|t| t.currency == UNRESOLVED));
    let groups = out.segment();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.values().next().unwrap().len(), 2);
}

struct FailingSource {
    inner: PageList,
    fail_at: usize,
    served: usize,
}

impl PageTextSource for FailingSource {
    fn next_page(&mut self) -> anyhow::Result<Option<RawPage>> {
        if self.served == self.fail_at {
            return Err(anyhow!("extractor crashed on page {}", self.served));
        }
        self.served += 1;
        self.inner.next_page()
    }
}

#[test]
fn test_source_errors_propagate() {
    let mut source = FailingSource {
        inner: PageList::new(vec![
            RawPage::new(0, "CURRENCY AED\n01/03/2024 R Shop 1.00 2.00"),
            RawPage::new(1, "02/03/2024 R Shop 1.00 3.00"),
        ]),
        fail_at: 1,
        served: 0,
    };
    let err = StatementParser::new(ParserConfig::default())
        .unwrap()
        .parse_source(&mut source)
        .unwrap_err();
    assert!(err.to_string().contains("extractor crashed on page 1"));
}
