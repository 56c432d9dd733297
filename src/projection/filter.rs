use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{Card, Column, Priority};

/// A dropdown choice: everything, or exactly one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => value == Some(expected),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T> FromStr for Selection<T>
where
    T: FromStr,
{
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(Selection::All),
            other => other.parse().map(Selection::Only),
        }
    }
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("all"),
            Selection::Only(value) => serializer.collect_str(value),
        }
    }
}

/// Search text plus dropdown selections. All active predicates must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub assignee: Selection<String>,
    #[serde(default)]
    pub priority: Selection<Priority>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub due_date: Option<NaiveDate>,
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(de::Error::custom),
        _ => Ok(None),
    }
}

impl CardFilter {
    pub fn is_default(&self) -> bool {
        self.search.trim().is_empty()
            && self.assignee.is_all()
            && self.priority.is_all()
            && self.due_date.is_none()
    }

    pub fn matches(&self, card: &Card) -> bool {
        let needle = self.search.trim().to_lowercase();
        (needle.is_empty() || card.matches_text(&needle))
            && self.assignee.matches(card.assignee.as_ref())
            && self.priority.matches(Some(&card.priority))
            && self
                .due_date
                .map(|due| card.due_date == Some(due))
                .unwrap_or(true)
    }

    /// Same columns in the same order, each reduced to its matching cards.
    /// The input is left untouched.
    pub fn apply(&self, columns: &[Column]) -> Vec<Column> {
        if self.is_default() {
            return columns.to_vec();
        }
        columns
            .iter()
            .map(|column| {
                let mut filtered = column.clone();
                filtered.cards.retain(|card| self.matches(card));
                filtered
            })
            .collect()
    }
}

/// Distinct values present on the board, for populating filter dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOptions {
    pub assignees: Vec<String>,
    pub priorities: Vec<Priority>,
    pub due_dates: Vec<NaiveDate>,
}

impl FilterOptions {
    pub fn from_columns(columns: &[Column]) -> Self {
        let mut assignees = BTreeSet::new();
        let mut priorities = BTreeSet::new();
        let mut due_dates = BTreeSet::new();

        for card in columns.iter().flat_map(|c| c.cards.iter()) {
            if let Some(assignee) = card.assignee.as_deref().filter(|a| !a.trim().is_empty()) {
                assignees.insert(assignee.to_string());
            }
            priorities.insert(card.priority);
            if let Some(due) = card.due_date {
                due_dates.insert(due);
            }
        }

        Self {
            assignees: assignees.into_iter().collect(),
            priorities: priorities.into_iter().collect(),
            due_dates: due_dates.into_iter().collect(),
        }
    }
}
