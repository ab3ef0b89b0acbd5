use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::unit::{Echelon, UnitId};
use super::user::UserId;

pub type AarId = i64;
pub type EventId = i64;

/// One of the three parallel item collections on an AAR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Sustain,
    Improve,
    Action,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Sustain, Bucket::Improve, Bucket::Action];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Sustain => "sustain",
            Bucket::Improve => "improve",
            Bucket::Action => "action",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable review item. Identity is independent of the owning AAR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AarItem {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub text: String,
    pub author_id: UserId,
    #[serde(default)]
    pub author_rank: String,
    pub unit_id: UnitId,
    pub unit_level: Echelon,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl AarItem {
    /// New item with a fresh id, stamped now.
    pub fn new(
        text: impl Into<String>,
        author_id: UserId,
        unit_id: UnitId,
        unit_level: Echelon,
    ) -> Self {
        Self {
            id: new_item_id(),
            text: text.into(),
            author_id,
            author_rank: String::new(),
            unit_id,
            unit_level,
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.author_rank = rank.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// After-Action Review: one per (event, author).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aar {
    pub id: AarId,
    pub event_id: EventId,
    pub unit_id: UnitId,
    pub created_by: UserId,
    #[serde(default)]
    pub sustain_items: Vec<AarItem>,
    #[serde(default)]
    pub improve_items: Vec<AarItem>,
    #[serde(default)]
    pub action_items: Vec<AarItem>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Aar {
    pub fn new(id: AarId, event_id: EventId, unit_id: UnitId, created_by: UserId) -> Self {
        Self {
            id,
            event_id,
            unit_id,
            created_by,
            sustain_items: Vec::new(),
            improve_items: Vec::new(),
            action_items: Vec::new(),
            is_deleted: false,
        }
    }

    pub fn items(&self, bucket: Bucket) -> &[AarItem] {
        match bucket {
            Bucket::Sustain => &self.sustain_items,
            Bucket::Improve => &self.improve_items,
            Bucket::Action => &self.action_items,
        }
    }

    /// Replaces a whole bucket. Items themselves are never edited in place.
    pub fn replace_items(&mut self, bucket: Bucket, items: Vec<AarItem>) {
        match bucket {
            Bucket::Sustain => self.sustain_items = items,
            Bucket::Improve => self.improve_items = items,
            Bucket::Action => self.action_items = items,
        }
    }

    pub fn with_items(mut self, bucket: Bucket, items: Vec<AarItem>) -> Self {
        self.replace_items(bucket, items);
        self
    }
}

/// Flatten one bucket across many AARs.
pub fn collect_bucket<'a, I>(aars: I, bucket: Bucket) -> Vec<AarItem>
where
    I: IntoIterator<Item = &'a Aar>,
{
    aars.into_iter()
        .flat_map(|aar| aar.items(bucket).iter().cloned())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingEvent {
    pub id: EventId,
    pub name: String,
    pub unit_id: UnitId,
    pub starts_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_items_is_wholesale() {
        let first = AarItem::new("Radio checks were on time.", 1, 10, Echelon::Squad);
        let second = AarItem::new("Rehearsal helped.", 1, 10, Echelon::Squad);

        let mut aar = Aar::new(1, 7, 10, 1).with_items(Bucket::Sustain, vec![first]);
        aar.replace_items(Bucket::Sustain, vec![second.clone()]);

        assert_eq!(aar.items(Bucket::Sustain), &[second]);
        assert!(aar.items(Bucket::Improve).is_empty());
    }

    #[test]
    fn test_collect_bucket_flattens_in_order() {
        let a = Aar::new(1, 1, 10, 1).with_items(
            Bucket::Improve,
            vec![AarItem::new("one", 1, 10, Echelon::Team)],
        );
        let b = Aar::new(2, 1, 10, 2).with_items(
            Bucket::Improve,
            vec![
                AarItem::new("two", 2, 10, Echelon::Team),
                AarItem::new("three", 2, 10, Echelon::Team),
            ],
        );

        let texts: Vec<String> = collect_bucket([&a, &b], Bucket::Improve)
            .into_iter()
            .map(|i| i.text)
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
