//! First-match keyword classifier.

use tracing::trace;

use super::categories::BucketConfig;
use crate::types::{AarItem, Bucket};

/// Items grouped by category, in the bucket config's evaluation order with
/// the default category last. Categories that received no items are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedItems {
    bucket: Bucket,
    groups: Vec<(String, Vec<AarItem>)>,
}

impl ClassifiedItems {
    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn get(&self, category: &str) -> Option<&[AarItem]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, items)| items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AarItem])> {
        self.groups
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// Item count across all categories.
    pub fn total_items(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    /// Number of non-empty categories
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn frequencies(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|(name, items)| (name.as_str(), items.len()))
            .collect()
    }
}

/// Assign each item to the first category whose keywords appear in its text,
/// or to the default category. Every input item lands in exactly one group.
pub fn classify(items: &[AarItem], config: &BucketConfig) -> ClassifiedItems {
    let default_slot = config.categories.len();
    let mut slots: Vec<Vec<AarItem>> = vec![Vec::new(); default_slot + 1];

    for item in items {
        let lowered = item.text.to_lowercase();
        let slot = config
            .categories
            .iter()
            .position(|c| c.matches(&lowered))
            .unwrap_or(default_slot);
        slots[slot].push(item.clone());
    }

    let groups: Vec<(String, Vec<AarItem>)> = config
        .category_names()
        .into_iter()
        .zip(slots)
        .filter(|(_, items)| !items.is_empty())
        .map(|(name, items)| (name.to_string(), items))
        .collect();

    trace!(
        bucket = %config.bucket,
        items = items.len(),
        categories = groups.len(),
        "Classified items"
    );

    ClassifiedItems {
        bucket: config.bucket,
        groups,
    }
}
