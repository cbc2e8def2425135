use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::lookup::CategoryLookup;
use crate::models::{Category, Classification, Transaction};
use crate::rules::RuleTable;

pub struct Categorizer<'a> {
    table: &'a RuleTable,
    lookup: &'a CategoryLookup,
}

#[derive(Debug, Default)]
pub struct CategorizeResult {
    pub categorized: usize,
    pub unassigned: usize,
    /// Hit count per rule name, fallback included.
    pub hits: BTreeMap<&'static str, usize>,
}

impl<'a> Categorizer<'a> {
    pub fn new(table: &'a RuleTable, lookup: &'a CategoryLookup) -> Self {
        Self { table, lookup }
    }

    /// Classify one record. Reads only description, amount, source type and
    /// vendor category, never the record's current classification.
    pub fn classify(&self, txn: &Transaction) -> Classification {
        let looked_up = if self.table.uses_lookup {
            let category = self.lookup.resolve(txn.vendor_category.as_deref());
            if let (Category::Unassigned, Some(text)) = (category, txn.vendor_category.as_deref()) {
                warn!(line = txn.line, vendor_category = text, "no category matches vendor category");
            }
            category
        } else {
            Default::default()
        };

        if let Some(rule) = self.table.first_match(txn) {
            return rule.then.apply(looked_up, rule.name);
        }
        self.table
            .fallback
            .apply(txn.amount, looked_up)
            .unwrap_or_else(|| Classification::unassigned(looked_up))
    }

    pub fn categorize(&self, transactions: &mut [Transaction]) -> CategorizeResult {
        let mut result = CategorizeResult::default();
        for txn in transactions.iter_mut() {
            let classification = self.classify(txn);
            match classification.rule {
                Some(rule) => {
                    debug!(line = txn.line, rule, "rule matched");
                    *result.hits.entry(rule).or_default() += 1;
                    result.categorized += 1;
                }
                None => result.unassigned += 1,
            }
            txn.apply(&classification);
        }
        result
    }
}
