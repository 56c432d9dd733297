use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::card::double_option;
use super::Card;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Column {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub position: i64,
    /// Advisory work-in-progress limit; never enforced.
    pub card_limit: Option<i64>,
    #[sqlx(skip)]
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn card_ids(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn is_over_limit(&self) -> bool {
        self.card_limit
            .map(|limit| self.cards.len() as i64 > limit)
            .unwrap_or(false)
    }
}

/// A board with its columns in position order, each holding its cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullBoard {
    pub board: Board,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Lay the board out with the standard stage columns.
    #[serde(default = "default_with_columns")]
    pub with_default_columns: bool,
}

fn default_with_columns() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateColumnRequest {
    pub title: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub card_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// `Some(None)` removes the limit.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub card_limit: Option<Option<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCardRequest {
    pub column_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderCardsRequest {
    pub card_ids: Vec<String>,
}
