//! Rule tables for each account type.
//!
//! A table is plain data: an ordered list of rules evaluated first match
//! wins, a sign fallback, optional forced-review rules and the review policy
//! the triager applies afterwards. Keywords are lower-case because record
//! text is lower-cased during normalization.

use crate::models::{AccountType, Category, Classification, Transaction, TransactionType};

/// Category id of `insurance` in the seeded category table.
pub const INSURANCE_CATEGORY_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Inflow,
    Outflow,
}

impl Sign {
    /// Strict comparison: a zero amount is neither inflow nor outflow.
    pub fn matches(&self, amount: f64) -> bool {
        match self {
            Self::Inflow => amount > 0.0,
            Self::Outflow => amount < 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TextMatch {
    Any,
    Contains(&'static str),
    AnyOf(&'static [&'static str]),
    AllOf(&'static [&'static str]),
}

impl TextMatch {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(keyword) => text.contains(keyword),
            Self::AnyOf(keywords) => keywords.iter().any(|k| text.contains(k)),
            Self::AllOf(keywords) => keywords.iter().all(|k| text.contains(k)),
        }
    }
}

/// Test against the vendor-supplied transaction type (card exports only).
#[derive(Debug, Clone, Copy)]
pub enum SourceMatch {
    Exact(&'static str),
    ContainsAny(&'static [&'static str]),
}

impl SourceMatch {
    fn matches(&self, source_type: Option<&str>) -> bool {
        let Some(source) = source_type else {
            return false;
        };
        match self {
            Self::Exact(label) => source == *label,
            Self::ContainsAny(labels) => labels.iter().any(|l| source.contains(l)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Predicate {
    pub text: TextMatch,
    pub sign: Option<Sign>,
    pub source: Option<SourceMatch>,
}

impl Predicate {
    pub const fn contains(keyword: &'static str) -> Self {
        Self { text: TextMatch::Contains(keyword), sign: None, source: None }
    }

    pub const fn any_of(keywords: &'static [&'static str]) -> Self {
        Self { text: TextMatch::AnyOf(keywords), sign: None, source: None }
    }

    pub const fn all_of(keywords: &'static [&'static str]) -> Self {
        Self { text: TextMatch::AllOf(keywords), sign: None, source: None }
    }

    pub const fn source_is(label: &'static str) -> Self {
        Self { text: TextMatch::Any, sign: None, source: Some(SourceMatch::Exact(label)) }
    }

    pub const fn source_contains_any(labels: &'static [&'static str]) -> Self {
        Self {
            text: TextMatch::Any,
            sign: None,
            source: Some(SourceMatch::ContainsAny(labels)),
        }
    }

    pub const fn inflow(self) -> Self {
        Self { sign: Some(Sign::Inflow), ..self }
    }

    pub const fn outflow(self) -> Self {
        Self { sign: Some(Sign::Outflow), ..self }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(sign) = self.sign {
            if !sign.matches(txn.amount) {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if !source.matches(txn.source_type.as_deref()) {
                return false;
            }
        }
        self.text.matches(&txn.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryEffect {
    /// Explicitly categoryless.
    None,
    Fixed(i64),
    /// Whatever the category lookup produced for this record.
    Lookup,
}

#[derive(Debug, Clone, Copy)]
pub struct Effect {
    pub transaction_type: TransactionType,
    pub category: CategoryEffect,
}

impl Effect {
    pub const fn uncategorized(transaction_type: TransactionType) -> Self {
        Self { transaction_type, category: CategoryEffect::None }
    }

    /// Overwrites both fields; `looked_up` is used only by `CategoryEffect::Lookup`.
    pub fn apply(&self, looked_up: Category, rule: &'static str) -> Classification {
        let category = match self.category {
            CategoryEffect::None => Category::NoCategory,
            CategoryEffect::Fixed(id) => Category::Id(id),
            CategoryEffect::Lookup => looked_up,
        };
        Classification {
            transaction_type: Some(self.transaction_type),
            category,
            rule: Some(rule),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub when: Predicate,
    pub then: Effect,
}

/// Routes a matching record to review regardless of its classification.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRule {
    pub name: &'static str,
    pub when: Predicate,
    pub reason: &'static str,
}

/// Terminal step applied when no rule matched.
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub inflow: Effect,
    pub outflow: Effect,
}

impl Fallback {
    pub fn apply(&self, amount: f64, looked_up: Category) -> Option<Classification> {
        if Sign::Inflow.matches(amount) {
            Some(self.inflow.apply(looked_up, "fallback-inflow"))
        } else if Sign::Outflow.matches(amount) {
            Some(self.outflow.apply(looked_up, "fallback-outflow"))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPolicy {
    /// Review only when neither type nor category was assigned.
    BothUnassigned,
    /// Review when type or category is unassigned, or a required field is blank.
    EitherUnassigned,
}

#[derive(Debug)]
pub struct RuleTable {
    pub account: AccountType,
    pub rules: &'static [Rule],
    pub fallback: Fallback,
    pub forced_review: &'static [ReviewRule],
    pub policy: ReviewPolicy,
    /// Pre-assign category from the vendor category text before rules run.
    pub uses_lookup: bool,
}

impl RuleTable {
    pub fn for_account(account: AccountType) -> &'static RuleTable {
        match account {
            AccountType::Savings => &SAVINGS,
            AccountType::Checking => &CHECKING,
            AccountType::CreditCard => &CREDIT_CARD,
        }
    }

    pub fn first_match(&self, txn: &Transaction) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.when.matches(txn))
    }

    pub fn review_rule_for(&self, txn: &Transaction) -> Option<&ReviewRule> {
        self.forced_review.iter().find(|rule| rule.when.matches(txn))
    }
}

const MISC_FALLBACK: Fallback = Fallback {
    inflow: Effect::uncategorized(TransactionType::Deposit),
    outflow: Effect::uncategorized(TransactionType::Withdrawal),
};

const INTEREST: Rule = Rule {
    name: "interest",
    when: Predicate::contains("interest"),
    then: Effect::uncategorized(TransactionType::Interest),
};

const TRANSFER_OUT: Rule = Rule {
    name: "transfer-out",
    when: Predicate::contains("transfer").outflow(),
    then: Effect::uncategorized(TransactionType::TransferOut),
};

const TRANSFER_IN: Rule = Rule {
    name: "transfer-in",
    when: Predicate::contains("transfer").inflow(),
    then: Effect::uncategorized(TransactionType::TransferIn),
};

const DEPOSIT: Rule = Rule {
    name: "deposit",
    when: Predicate::contains("deposit").inflow(),
    then: Effect::uncategorized(TransactionType::Deposit),
};

const WITHDRAWAL: Rule = Rule {
    name: "withdrawal",
    when: Predicate::contains("withdraw").outflow(),
    then: Effect::uncategorized(TransactionType::Withdrawal),
};

pub static SAVINGS: RuleTable = RuleTable {
    account: AccountType::Savings,
    rules: &[INTEREST, TRANSFER_OUT, TRANSFER_IN, DEPOSIT, WITHDRAWAL],
    fallback: MISC_FALLBACK,
    forced_review: &[],
    policy: ReviewPolicy::BothUnassigned,
    uses_lookup: false,
};

// Named vendors come before the generic keywords they can collide with.
pub static CHECKING: RuleTable = RuleTable {
    account: AccountType::Checking,
    rules: &[
        Rule {
            name: "venmo-cashout",
            when: Predicate::contains("venmo").inflow(),
            then: Effect::uncategorized(TransactionType::Deposit),
        },
        Rule {
            name: "insurance",
            when: Predicate::contains("allstate").outflow(),
            then: Effect {
                transaction_type: TransactionType::InsurancePayment,
                category: CategoryEffect::Fixed(INSURANCE_CATEGORY_ID),
            },
        },
        Rule {
            name: "reimbursement",
            when: Predicate::contains("certify").inflow(),
            then: Effect::uncategorized(TransactionType::Deposit),
        },
        Rule {
            name: "payroll",
            when: Predicate::any_of(&["gusto", "exel"]).inflow(),
            then: Effect::uncategorized(TransactionType::Deposit),
        },
        Rule {
            name: "atm-deposit",
            when: Predicate::all_of(&["atm", "chase"]).inflow(),
            then: Effect::uncategorized(TransactionType::Deposit),
        },
        Rule {
            name: "atm-withdrawal",
            when: Predicate::all_of(&["atm", "chase"]).outflow(),
            then: Effect::uncategorized(TransactionType::Withdrawal),
        },
        INTEREST,
        TRANSFER_OUT,
        TRANSFER_IN,
        Rule {
            name: "card-bill-payment",
            when: Predicate::all_of(&["pay", "chase"]).outflow(),
            then: Effect::uncategorized(TransactionType::CardBillPayment),
        },
        DEPOSIT,
        WITHDRAWAL,
    ],
    fallback: MISC_FALLBACK,
    forced_review: &[ReviewRule {
        name: "venmo-payment",
        when: Predicate::contains("venmo").outflow(),
        reason: "peer payment, purpose unknown",
    }],
    policy: ReviewPolicy::BothUnassigned,
    uses_lookup: false,
};

pub static CREDIT_CARD: RuleTable = RuleTable {
    account: AccountType::CreditCard,
    rules: &[
        Rule {
            name: "sale",
            when: Predicate::source_is("sale"),
            then: Effect {
                transaction_type: TransactionType::Purchase,
                category: CategoryEffect::Lookup,
            },
        },
        Rule {
            name: "payment",
            when: Predicate::source_is("payment"),
            then: Effect::uncategorized(TransactionType::CardPaymentReceived),
        },
        Rule {
            name: "fee-adjustment",
            when: Predicate::source_contains_any(&["fee", "adjustment"]),
            then: Effect::uncategorized(TransactionType::FeeAdjustment),
        },
    ],
    fallback: MISC_FALLBACK,
    forced_review: &[],
    policy: ReviewPolicy::EitherUnassigned,
    uses_lookup: true,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(account: AccountType, description: &str, amount: f64) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        Transaction::new(account, date, description, amount)
    }

    fn card(source_type: &str, amount: f64) -> Transaction {
        let mut t = txn(AccountType::CreditCard, "merchant", amount);
        t.source_type = Some(source_type.to_string());
        t
    }

    #[test]
    fn test_sign_is_strict() {
        assert!(Sign::Inflow.matches(0.01));
        assert!(!Sign::Inflow.matches(0.0));
        assert!(Sign::Outflow.matches(-0.01));
        assert!(!Sign::Outflow.matches(0.0));
    }

    #[test]
    fn test_all_of_requires_every_keyword() {
        let p = Predicate::all_of(&["pay", "chase"]).outflow();
        assert!(p.matches(&txn(AccountType::Checking, "chase credit crd autopay", -300.0)));
        assert!(!p.matches(&txn(AccountType::Checking, "chase atm", -300.0)));
        assert!(!p.matches(&txn(AccountType::Checking, "chase credit crd autopay", 300.0)));
    }

    #[test]
    fn test_source_predicates() {
        assert!(Predicate::source_is("sale").matches(&card("sale", -5.0)));
        assert!(!Predicate::source_is("sale").matches(&card("sales tax", -5.0)));
        let fee = Predicate::source_contains_any(&["fee", "adjustment"]);
        assert!(fee.matches(&card("fee", -39.0)));
        assert!(fee.matches(&card("adjustment", 2.0)));
        assert!(!fee.matches(&txn(AccountType::CreditCard, "late fee", -39.0)));
    }

    #[test]
    fn test_first_match_on_checking_prefers_named_vendor() {
        let t = txn(AccountType::Checking, "atm withdrawal chase 123 main st", -60.0);
        assert_eq!(CHECKING.first_match(&t).map(|r| r.name), Some("atm-withdrawal"));
    }

    #[test]
    fn test_venmo_outflow_is_forced_review_on_checking_only() {
        let t = txn(AccountType::Checking, "venmo payment to j smith", -42.5);
        assert!(CHECKING.review_rule_for(&t).is_some());
        assert!(SAVINGS.review_rule_for(&t).is_none());
        let cashout = txn(AccountType::Checking, "venmo cashout", 42.5);
        assert!(CHECKING.review_rule_for(&cashout).is_none());
    }

    #[test]
    fn test_fallback_skips_zero() {
        assert!(MISC_FALLBACK.apply(0.0, Category::Unassigned).is_none());
        let c = MISC_FALLBACK.apply(-1.0, Category::Unassigned).unwrap();
        assert_eq!(c.transaction_type, Some(TransactionType::Withdrawal));
        assert_eq!(c.category, Category::NoCategory);
    }

    #[test]
    fn test_tables_are_keyed_by_account() {
        for account in AccountType::ALL {
            assert_eq!(RuleTable::for_account(account).account, account);
        }
        assert!(CREDIT_CARD.uses_lookup);
        assert!(!CHECKING.uses_lookup);
    }
}
