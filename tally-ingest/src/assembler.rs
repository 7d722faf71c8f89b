//! Stamp tokenized rows with the context in force for their page.

use tally_core::{ParseContext, Transaction, TransactionLine};

/// Attach currency and account from `context` to a tokenized row.
///
/// Unresolved fields become [`tally_core::UNRESOLVED`]; whether a currency
/// was seeded up front is already reflected in `context`.
pub fn assemble(line: TransactionLine, context: &ParseContext) -> Transaction {
    Transaction {
        date: line.date,
        reference: line.reference,
        description: line.description,
        amount: line.amount,
        balance: line.balance,
        currency: context.currency_label(),
        account_id: context.account_label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tally_core::{CurrencyCode, UNRESOLVED};

    fn line() -> TransactionLine {
        TransactionLine {
            date: "01/03/2024".to_string(),
            reference: "REF001".to_string(),
            description: "Grocery Store".to_string(),
            amount: Decimal::new(15000, 2),
            balance: Decimal::new(420000, 2),
        }
    }

    #[test]
    fn test_stamps_resolved_context() {
        let ctx = ParseContext {
            currency: Some(CurrencyCode::AED),
            account_id: Some("AE070331234567890123456".to_string()),
        };
        let txn = assemble(line(), &ctx);
        assert_eq!(txn.currency, "AED");
        assert_eq!(txn.account_id, "AE070331234567890123456");
        assert_eq!(txn.reference, "REF001");
        assert_eq!(txn.amount, Decimal::new(15000, 2));
        // context untouched
        assert_eq!(ctx.currency, Some(CurrencyCode::AED));
    }

    #[test]
    fn test_unresolved_fields_get_marker() {
        let txn = assemble(line(), &ParseContext::default());
        assert_eq!(txn.currency, UNRESOLVED);
        assert_eq!(txn.account_id, UNRESOLVED);
        assert!(txn.has_unresolved_currency());
        assert!(txn.has_unresolved_account());
    }

    #[test]
    fn test_never_empty_strings() {
        let ctx = ParseContext {
            currency: None,
            account_id: Some(String::new()),
        };
        let txn = assemble(line(), &ctx);
        assert!(!txn.currency.is_empty());
        assert_eq!(txn.account_id, UNRESOLVED);
    }
}
