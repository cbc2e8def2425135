use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::models::AccountType;
use crate::rules::{CategoryEffect, Predicate, RuleTable, Sign, SourceMatch, TextMatch};

fn describe(p: &Predicate) -> String {
    let mut parts = Vec::new();
    match p.text {
        TextMatch::Any => {}
        TextMatch::Contains(k) => parts.push(format!("'{k}'")),
        TextMatch::AnyOf(ks) => parts.push(format!("any of {ks:?}")),
        TextMatch::AllOf(ks) => parts.push(format!("all of {ks:?}")),
    }
    match p.source {
        Some(SourceMatch::Exact(label)) => parts.push(format!("type = {label}")),
        Some(SourceMatch::ContainsAny(labels)) => parts.push(format!("type ~ {labels:?}")),
        None => {}
    }
    match p.sign {
        Some(Sign::Inflow) => parts.push("amount > 0".to_string()),
        Some(Sign::Outflow) => parts.push("amount < 0".to_string()),
        None => {}
    }
    parts.join(" & ")
}

pub fn list(account: &str) -> Result<()> {
    let account: AccountType = account.parse()?;
    let table = RuleTable::for_account(account);

    let mut out = Table::new();
    out.set_header(vec!["#", "Rule", "When", "Type", "Category"]);
    for (i, rule) in table.rules.iter().enumerate() {
        let category = match rule.then.category {
            CategoryEffect::None => "none".to_string(),
            CategoryEffect::Fixed(id) => id.to_string(),
            CategoryEffect::Lookup => "lookup".to_string(),
        };
        out.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.name),
            Cell::new(describe(&rule.when)),
            Cell::new(rule.then.transaction_type.description()),
            Cell::new(category),
        ]);
    }
    out.add_row(vec![
        Cell::new(""),
        Cell::new("fallback"),
        Cell::new("amount > 0 / amount < 0"),
        Cell::new(format!(
            "{} / {}",
            table.fallback.inflow.transaction_type.description(),
            table.fallback.outflow.transaction_type.description()
        )),
        Cell::new("none"),
    ]);
    println!("Rules for {}\n{out}", table.account.name());

    for review in table.forced_review {
        println!("Always review: {} ({}): {}", review.name, describe(&review.when), review.reason);
    }
    Ok(())
}
