use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::SpendSaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    CreditCard,
    Checking,
    Savings,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [Self::CreditCard, Self::Checking, Self::Savings];

    /// Fixed `account_id` stamped on every record from this account.
    pub fn id(&self) -> i64 {
        match self {
            Self::CreditCard => 1,
            Self::Checking => 2,
            Self::Savings => 3,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::Checking => "checking",
            Self::Savings => "savings",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit card",
            Self::Checking => "checking account",
            Self::Savings => "savings account",
        }
    }
}

impl FromStr for AccountType {
    type Err = SpendSaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit-card" | "credit_card" | "cc" => Ok(Self::CreditCard),
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            other => Err(SpendSaveError::UnknownAccountType(other.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Purchase,
    InsurancePayment,
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
    CardPaymentReceived,
    CardBillPayment,
    Interest,
    FeeAdjustment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 10] = [
        Self::Purchase,
        Self::InsurancePayment,
        Self::Deposit,
        Self::Withdrawal,
        Self::TransferOut,
        Self::TransferIn,
        Self::CardPaymentReceived,
        Self::CardBillPayment,
        Self::Interest,
        Self::FeeAdjustment,
    ];

    /// Row id in the `transaction_type` table. 10 is retired.
    pub fn id(&self) -> i64 {
        match self {
            Self::Purchase => 1,
            Self::InsurancePayment => 2,
            Self::Deposit => 3,
            Self::Withdrawal => 4,
            Self::TransferOut => 5,
            Self::TransferIn => 6,
            Self::CardPaymentReceived => 7,
            Self::CardBillPayment => 8,
            Self::Interest => 9,
            Self::FeeAdjustment => 11,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::InsurancePayment => "insurance payment",
            Self::Deposit => "miscellaneous deposit",
            Self::Withdrawal => "miscellaneous withdrawal",
            Self::TransferOut => "transfer out",
            Self::TransferIn => "transfer in",
            Self::CardPaymentReceived => "credit card payment received",
            Self::CardBillPayment => "credit card bill payment",
            Self::Interest => "interest",
            Self::FeeAdjustment => "fee / adjustment",
        }
    }
}

/// Category assignment. `NoCategory` is a deliberate outcome for transfers,
/// interest, fees and payments; `Unassigned` means nothing has decided yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Unassigned,
    NoCategory,
    Id(i64),
}

impl Category {
    pub fn is_unassigned(&self) -> bool {
        matches!(self, Self::Unassigned)
    }

    /// Value for the nullable `category_id` column.
    pub fn to_sql(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Unassigned | Self::NoCategory => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => f.write_str("?"),
            Self::NoCategory => f.write_str("-"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// One normalized record. Text fields are lower-cased; `description` is kept
/// at full length until the pipeline boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub line: usize,
    pub account: AccountType,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub source_type: Option<String>,
    pub vendor_category: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub category: Category,
}

impl Transaction {
    pub fn new(account: AccountType, date: NaiveDate, description: &str, amount: f64) -> Self {
        Self {
            line: 0,
            account,
            date,
            description: description.to_string(),
            amount,
            source_type: None,
            vendor_category: None,
            transaction_type: None,
            category: Category::Unassigned,
        }
    }

    pub fn account_id(&self) -> i64 {
        self.account.id()
    }

    pub fn apply(&mut self, classification: &Classification) {
        self.transaction_type = classification.transaction_type;
        self.category = classification.category;
    }

    /// Cut `description` to at most `limit` characters.
    pub fn truncate_description(&mut self, limit: usize) {
        if let Some((idx, _)) = self.description.char_indices().nth(limit) {
            self.description.truncate(idx);
        }
    }
}

/// Output of the classifier for one record, with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub transaction_type: Option<TransactionType>,
    pub category: Category,
    pub rule: Option<&'static str>,
}

impl Classification {
    pub fn unassigned(category: Category) -> Self {
        Self {
            transaction_type: None,
            category,
            rule: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_account_ids_are_fixed() {
        assert_eq!(AccountType::CreditCard.id(), 1);
        assert_eq!(AccountType::Checking.id(), 2);
        assert_eq!(AccountType::Savings.id(), 3);
    }

    #[test]
    fn test_account_type_from_str() {
        assert_eq!("Checking".parse::<AccountType>().unwrap(), AccountType::Checking);
        assert_eq!("credit_card".parse::<AccountType>().unwrap(), AccountType::CreditCard);
        assert!("brokerage".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_transaction_type_ids_roundtrip() {
        for t in TransactionType::ALL {
            assert_eq!(TransactionType::from_id(t.id()), Some(t));
        }
        assert_eq!(TransactionType::from_id(0), None);
        assert_eq!(TransactionType::from_id(10), None);
    }

    #[test]
    fn test_no_category_is_not_unassigned() {
        assert!(Category::Unassigned.is_unassigned());
        assert!(!Category::NoCategory.is_unassigned());
        assert_eq!(Category::NoCategory.to_sql(), None);
        assert_eq!(Category::Id(0).to_sql(), Some(0));
    }

    #[test]
    fn test_truncate_description_counts_chars() {
        let mut txn = Transaction::new(AccountType::Checking, date(), &"é".repeat(120), -1.0);
        txn.truncate_description(100);
        assert_eq!(txn.description.chars().count(), 100);

        let mut short = Transaction::new(AccountType::Checking, date(), "coffee", -1.0);
        short.truncate_description(100);
        assert_eq!(short.description, "coffee");
    }
}
