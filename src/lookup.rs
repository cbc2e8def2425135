use std::collections::HashMap;

use crate::models::Category;

/// Read-only snapshot of `category_description -> category_id`, loaded once per
/// run and shared by every record. Keys are matched exactly after lower-casing.
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    by_description: HashMap<String, i64>,
}

impl CategoryLookup {
    pub fn get(&self, description: &str) -> Option<i64> {
        self.by_description.get(description.trim()).copied()
    }

    /// A missing or unknown description leaves the category unassigned.
    pub fn resolve(&self, description: Option<&str>) -> Category {
        description
            .and_then(|d| self.get(d))
            .map_or(Category::Unassigned, Category::Id)
    }

    pub fn len(&self) -> usize {
        self.by_description.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_description.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, i64)> for CategoryLookup {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let by_description = iter
            .into_iter()
            .map(|(desc, id)| (desc.as_ref().trim().to_lowercase(), id))
            .collect();
        Self { by_description }
    }
}
