//! Partition transactions into per-account groups.

use std::collections::BTreeMap;

use tally_core::{AccountGroup, AccountKey, Transaction};

/// Group transactions by `(account_id, currency)`.
///
/// Each transaction lands in exactly one group and keeps its relative order.
/// Groups iterate in key order so output files come out deterministic.
pub fn segment(
    transactions: impl IntoIterator<Item = Transaction>,
) -> BTreeMap<AccountKey, AccountGroup> {
    let mut groups: BTreeMap<AccountKey, AccountGroup> = BTreeMap::new();
    for txn in transactions {
        let key = txn.key();
        groups
            .entry(key.clone())
            .or_insert_with(|| AccountGroup::new(key))
            .transactions
            .push(txn);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn txn(reference: &str, account: &str, currency: &str) -> Transaction {
        Transaction {
            date: "01/03/2024".to_string(),
            reference: reference.to_string(),
            description: String::new(),
            amount: Decimal::ONE,
            balance: Decimal::TEN,
            currency: currency.to_string(),
            account_id: account.to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(segment(Vec::new()).is_empty());
    }

    #[test]
    fn test_groups_and_order() {
        let groups = segment(vec![
            txn("a1", "ACC1", "AED"),
            txn("b1", "ACC1", "USD"),
            txn("a2", "ACC1", "AED"),
            txn("c1", "ACC2", "AED"),
            txn("b2", "ACC1", "USD"),
        ]);
        assert_eq!(groups.len(), 3);

        let aed = &groups[&AccountKey {
            account_id: "ACC1".to_string(),
            currency: "AED".to_string(),
        }];
        let refs: Vec<_> = aed.transactions.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(refs, vec!["a1", "a2"]);

        let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["ACC1 (AED)", "ACC1 (USD)", "ACC2 (AED)"]);
    }

    #[test]
    fn test_unresolved_rows_form_their_own_group() {
        let groups = segment(vec![
            txn("x", "UNKNOWN", "UNKNOWN"),
            txn("y", "ACC1", "AED"),
        ]);
        assert_eq!(groups.len(), 2);
        assert!(groups.keys().any(|k| k.account_id == "UNKNOWN"));
    }

    proptest! {
        #[test]
        fn every_transaction_lands_in_exactly_one_group(
            rows in proptest::collection::vec((0u8..3, 0u8..3), 0..60)
        ) {
            let input: Vec<Transaction> = rows
                .iter()
                .enumerate()
                .map(|(i, (a, c))| txn(&i.to_string(), &format!("ACC{}", a), ["AED", "USD", "EUR"][*c as usize]))
                .collect();
            let groups = segment(input.clone());

            let total: usize = groups.values().map(|g| g.len()).sum();
            prop_assert_eq!(total, input.len());

            for t in &input {
                let hits = groups
                    .values()
                    .filter(|g| g.transactions.iter().any(|x| x.reference == t.reference))
                    .count();
                prop_assert_eq!(hits, 1);
            }

            for g in groups.values() {
                prop_assert!(g.transactions.iter().all(|t| t.key() == g.key));
                let idx: Vec<usize> = g.transactions.iter().map(|t| t.reference.parse().unwrap()).collect();
                prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
