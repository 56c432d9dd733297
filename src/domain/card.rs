use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::KanbanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub column_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub position: i64,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Overwrites the mutable fields named by `patch`. Identity, column
    /// membership and `created_at` are never touched here.
    pub fn apply_patch(&mut self, patch: &CardPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = assignee.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }

    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(needle_lower))
                .unwrap_or(false)
    }
}

/// Row shape of the `cards` table; tags are stored as a JSON array.
#[derive(Debug, Clone, FromRow)]
pub struct CardRow {
    pub id: String,
    pub column_id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub position: i64,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = KanbanError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let priority = row.priority.parse::<Priority>().map_err(|e| {
            KanbanError::Internal(format!("Invalid priority in DB for card {}: {}", row.id, e))
        })?;
        let tags = row
            .tags
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()?;

        Ok(Self {
            id: row.id,
            column_id: row.column_id,
            title: row.title,
            description: row.description,
            priority,
            assignee: row.assignee,
            due_date: row.due_date,
            position: row.position,
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// User-supplied fields for a card that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NewCard {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Trims the title and rejects it when nothing is left. Empty tags are
    /// dropped the way the add-card form drops them.
    pub fn validated(mut self) -> Result<Self, KanbanError> {
        self.title = require_title(&self.title)?;
        if let Some(tags) = self.tags.take() {
            self.tags = Some(tags.into_iter().filter(|t| !t.trim().is_empty()).collect());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub column_id: String,
    #[serde(flatten)]
    pub card: NewCard,
    #[serde(default)]
    pub position: Option<i64>,
}

/// Partial card update. Outer `None` leaves a field alone; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Option<Vec<String>>>,
}

impl CardPatch {
    /// Replaces every mutable field with the values in `fields`.
    pub fn replace_all(fields: NewCard) -> Self {
        Self {
            title: Some(fields.title),
            description: Some(fields.description),
            priority: Some(fields.priority.unwrap_or_default()),
            assignee: Some(fields.assignee),
            due_date: Some(fields.due_date),
            tags: Some(fields.tags),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validated(mut self) -> Result<Self, KanbanError> {
        if let Some(title) = self.title.take() {
            self.title = Some(require_title(&title)?);
        }
        Ok(self)
    }
}

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn require_title(title: &str) -> Result<String, KanbanError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::InvalidInput("Card title is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Splits comma-separated tag input, trimming each entry and dropping blanks
/// and repeats. First occurrence wins.
pub fn normalize_tags(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_rejected() {
        let err = NewCard::titled("   ").validated().unwrap_err();
        assert!(matches!(err, KanbanError::InvalidInput(_)));
    }

    #[test]
    fn test_title_trimmed() {
        let card = NewCard::titled("  Ship it ").validated().unwrap();
        assert_eq!(card.title, "Ship it");
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(
            normalize_tags(" setup, production,,setup , qa "),
            vec!["setup", "production", "qa"]
        );
        assert!(normalize_tags(" , ").is_empty());
    }

    #[test]
    fn test_patch_null_clears_field() {
        let patch: CardPatch =
            serde_json::from_str(r#"{"assignee": null, "priority": "high"}"#).unwrap();
        assert_eq!(patch.assignee, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.priority, Some(Priority::High));
    }

    #[test]
    fn test_patch_blank_title_rejected() {
        let patch = CardPatch {
            title: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(
            patch.validated(),
            Err(KanbanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!("critical".parse::<Priority>(), Ok(Priority::Critical));
    }
}
