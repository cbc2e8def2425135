use std::fmt;

use crate::models::Transaction;
use crate::rules::{ReviewPolicy, RuleTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewReason {
    Forced(&'static str),
    Unclassified,
    MissingCategory,
    MissingField(&'static str),
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced(reason) => f.write_str(reason),
            Self::Unclassified => f.write_str("no matching rule"),
            Self::MissingCategory => f.write_str("category not found"),
            Self::MissingField(field) => write!(f, "missing {field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flagged {
    pub transaction: Transaction,
    pub reason: ReviewReason,
}

/// Every input record lands in exactly one of the two sets.
#[derive(Debug, Default)]
pub struct Triage {
    pub accepted: Vec<Transaction>,
    pub needs_review: Vec<Flagged>,
}

impl Triage {
    /// Cut descriptions in both sets. Only call once matching is done.
    pub fn truncate_descriptions(&mut self, limit: usize) {
        for txn in &mut self.accepted {
            txn.truncate_description(limit);
        }
        for flagged in &mut self.needs_review {
            flagged.transaction.truncate_description(limit);
        }
    }

    pub fn len(&self) -> usize {
        self.accepted.len() + self.needs_review.len()
    }
}

fn generic_review(policy: ReviewPolicy, txn: &Transaction) -> Option<ReviewReason> {
    match policy {
        ReviewPolicy::BothUnassigned => (txn.transaction_type.is_none()
            && txn.category.is_unassigned())
        .then_some(ReviewReason::Unclassified),
        ReviewPolicy::EitherUnassigned => {
            if txn.transaction_type.is_none() {
                Some(ReviewReason::Unclassified)
            } else if txn.source_type.is_none() {
                // typed only by the sign fallback
                Some(ReviewReason::MissingField("type"))
            } else if txn.category.is_unassigned() && txn.vendor_category.is_none() {
                Some(ReviewReason::MissingField("category"))
            } else if txn.category.is_unassigned() {
                Some(ReviewReason::MissingCategory)
            } else if txn.description.trim().is_empty() {
                Some(ReviewReason::MissingField("description"))
            } else {
                None
            }
        }
    }
}

/// Partition classified records. Forced-review records come first, then the
/// generic review cases; both keep their input order.
pub fn triage(table: &RuleTable, transactions: Vec<Transaction>) -> Triage {
    let mut forced = Vec::new();
    let mut generic = Vec::new();
    let mut accepted = Vec::new();

    for txn in transactions {
        if let Some(rule) = table.review_rule_for(&txn) {
            forced.push(Flagged { transaction: txn, reason: ReviewReason::Forced(rule.reason) });
        } else if let Some(reason) = generic_review(table.policy, &txn) {
            generic.push(Flagged { transaction: txn, reason });
        } else {
            debug_assert!(txn.transaction_type.is_some());
            accepted.push(txn);
        }
    }

    forced.extend(generic);
    Triage { accepted, needs_review: forced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Categorizer;
    use crate::lookup::CategoryLookup;
    use crate::models::{AccountType, Category, TransactionType};
    use crate::rules::{CHECKING, CREDIT_CARD, SAVINGS};
    use chrono::NaiveDate;

    fn txn(account: AccountType, description: &str, amount: f64) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        Transaction::new(account, date, description, amount)
    }

    fn card(description: &str, source_type: &str, vendor_category: &str, amount: f64) -> Transaction {
        let mut t = txn(AccountType::CreditCard, description, amount);
        t.source_type = Some(source_type.to_string());
        t.vendor_category = Some(vendor_category.to_string());
        t
    }

    fn run(table: &RuleTable, lookup: &CategoryLookup, mut batch: Vec<Transaction>) -> Triage {
        for (i, t) in batch.iter_mut().enumerate() {
            t.line = i + 2;
        }
        Categorizer::new(table, lookup).categorize(&mut batch);
        triage(table, batch)
    }

    #[test]
    fn test_checking_transfer_is_accepted() {
        let result = run(&CHECKING, &CategoryLookup::default(), vec![
            txn(AccountType::Checking, "online transfer to chase savings", -500.0),
        ]);
        assert_eq!(result.accepted.len(), 1);
        assert!(result.needs_review.is_empty());
        assert_eq!(result.accepted[0].transaction_type, Some(TransactionType::TransferOut));
        assert_eq!(result.accepted[0].category, Category::NoCategory);
    }

    #[test]
    fn test_venmo_payment_forced_to_review() {
        let result = run(&CHECKING, &CategoryLookup::default(), vec![
            txn(AccountType::Checking, "venmo payment to j smith", -42.5),
        ]);
        assert!(result.accepted.is_empty());
        assert_eq!(result.needs_review.len(), 1);
        assert!(matches!(result.needs_review[0].reason, ReviewReason::Forced(_)));
    }

    #[test]
    fn test_forced_review_precedes_generic_and_keeps_order() {
        let result = run(&CHECKING, &CategoryLookup::default(), vec![
            txn(AccountType::Checking, "mystery a", 0.0),
            txn(AccountType::Checking, "venmo payment one", -10.0),
            txn(AccountType::Checking, "mystery b", 0.0),
            txn(AccountType::Checking, "venmo payment two", -20.0),
        ]);
        let order: Vec<&str> = result
            .needs_review
            .iter()
            .map(|f| f.transaction.description.as_str())
            .collect();
        assert_eq!(order, vec!["venmo payment one", "venmo payment two", "mystery a", "mystery b"]);
    }

    #[test]
    fn test_zero_amount_lands_in_review() {
        let result = run(&SAVINGS, &CategoryLookup::default(), vec![
            txn(AccountType::Savings, "pending hold", 0.0),
        ]);
        assert_eq!(result.needs_review.len(), 1);
        assert_eq!(result.needs_review[0].reason, ReviewReason::Unclassified);
    }

    #[test]
    fn test_savings_interest_accepted() {
        let result = run(&SAVINGS, &CategoryLookup::default(), vec![
            txn(AccountType::Savings, "interest payment", 1.23),
        ]);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].transaction_type, Some(TransactionType::Interest));
    }

    #[test]
    fn test_card_lookup_miss_goes_to_review() {
        let lookup: CategoryLookup = [("restaurants", 4)].into_iter().collect();
        let result = run(&CREDIT_CARD, &lookup, vec![
            card("chipotle 1234", "sale", "restaurants", -12.0),
            card("pg&e web online", "sale", "bills & utilities", -80.0),
        ]);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].category, Category::Id(4));
        assert_eq!(result.needs_review.len(), 1);
        assert_eq!(result.needs_review[0].reason, ReviewReason::MissingCategory);
        assert_eq!(
            result.needs_review[0].transaction.transaction_type,
            Some(TransactionType::Purchase)
        );
    }

    #[test]
    fn test_card_blank_description_goes_to_review() {
        let lookup: CategoryLookup = [("restaurants", 4)].into_iter().collect();
        let result = run(&CREDIT_CARD, &lookup, vec![card("", "sale", "restaurants", -12.0)]);
        assert_eq!(result.needs_review[0].reason, ReviewReason::MissingField("description"));
    }

    #[test]
    fn test_card_blank_type_goes_to_review() {
        let lookup: CategoryLookup = [("restaurants", 4)].into_iter().collect();
        let mut blank_type = card("chipotle 1234", "", "restaurants", -12.4);
        blank_type.source_type = None;
        let result = run(&CREDIT_CARD, &lookup, vec![blank_type]);
        assert!(result.accepted.is_empty());
        assert_eq!(result.needs_review.len(), 1);
        assert_eq!(result.needs_review[0].reason, ReviewReason::MissingField("type"));
    }

    #[test]
    fn test_card_sale_blank_category_goes_to_review() {
        let lookup: CategoryLookup = [("restaurants", 4)].into_iter().collect();
        let mut blank_category = card("corner store", "sale", "", -8.0);
        blank_category.vendor_category = None;
        let result = run(&CREDIT_CARD, &lookup, vec![blank_category]);
        assert_eq!(result.needs_review.len(), 1);
        assert_eq!(result.needs_review[0].reason, ReviewReason::MissingField("category"));
        assert_eq!(
            result.needs_review[0].transaction.transaction_type,
            Some(TransactionType::Purchase)
        );
    }

    #[test]
    fn test_card_payment_without_category_is_accepted() {
        let mut payment = card("payment thank you", "payment", "", 500.0);
        payment.vendor_category = None;
        let result = run(&CREDIT_CARD, &CategoryLookup::default(), vec![payment]);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].category, Category::NoCategory);
    }

    #[test]
    fn test_partition_is_exhaustive_and_accepted_is_typed() {
        let batch = vec![
            txn(AccountType::Checking, "gusto payroll", 2000.0),
            txn(AccountType::Checking, "venmo payment", -5.0),
            txn(AccountType::Checking, "", 0.0),
            txn(AccountType::Checking, "coffee shop", -4.5),
            txn(AccountType::Checking, "allstate", -99.0),
        ];
        let total = batch.len();
        let result = run(&CHECKING, &CategoryLookup::default(), batch);
        assert_eq!(result.len(), total);
        assert!(result.accepted.iter().all(|t| t.transaction_type.is_some()));
        let mut lines: Vec<usize> = result
            .accepted
            .iter()
            .map(|t| t.line)
            .chain(result.needs_review.iter().map(|f| f.transaction.line))
            .collect();
        lines.sort_unstable();
        assert_eq!(lines, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_truncation_after_matching() {
        let long = format!("{} venmo payment", "x".repeat(120));
        let mut result = run(&CHECKING, &CategoryLookup::default(), vec![
            txn(AccountType::Checking, &long, -15.0),
        ]);
        // keyword sits past the limit but still matched
        assert!(matches!(result.needs_review[0].reason, ReviewReason::Forced(_)));
        result.truncate_descriptions(100);
        assert_eq!(result.needs_review[0].transaction.description.chars().count(), 100);
    }
}
