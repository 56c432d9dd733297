use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::BoardGateway;
use crate::domain::{
    Board, BoardPatch, Card, CardPatch, CardRow, Column, ColumnPatch, CreateCardRequest,
    CreateColumnRequest, KanbanError,
};

const BOARD_FIELDS: &str = "id, user_id, title, description, created_at, updated_at";
const COLUMN_FIELDS: &str = "id, board_id, title, position, card_limit";

/// Gateway backed directly by the SQLite store, scoped to one user.
#[derive(Clone, Debug)]
pub struct SqliteGateway {
    pool: SqlitePool,
    user_id: Option<String>,
}

impl SqliteGateway {
    /// A gateway with no session; every call fails as unauthenticated.
    pub fn anonymous(pool: SqlitePool) -> Self {
        Self {
            pool,
            user_id: None,
        }
    }

    pub fn for_user(pool: SqlitePool, user_id: impl Into<String>) -> Self {
        Self {
            pool,
            user_id: Some(user_id.into()),
        }
    }

    fn require_user(&self) -> Result<&str, KanbanError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| KanbanError::Unauthenticated("User must be authenticated".into()))
    }

    async fn fetch_column(&self, column_id: &str) -> Result<Column, KanbanError> {
        let user_id = self.require_user()?;
        let column: Column = sqlx::query_as(
            "SELECT c.id, c.board_id, c.title, c.position, c.card_limit FROM board_columns c JOIN boards b ON b.id = c.board_id WHERE c.id = ? AND b.user_id = ?",
        )
        .bind(column_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("Column not found: {}", column_id)))?;

        Ok(column)
    }

    async fn fetch_card(&self, card_id: &str) -> Result<Card, KanbanError> {
        let user_id = self.require_user()?;
        let row: CardRow = sqlx::query_as(
            "SELECT k.* FROM cards k JOIN board_columns c ON c.id = k.column_id JOIN boards b ON b.id = c.board_id WHERE k.id = ? AND b.user_id = ?",
        )
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", card_id)))?;

        Card::try_from(row)
    }
}

fn encode_tags(tags: &Option<Vec<String>>) -> Result<Option<String>, KanbanError> {
    Ok(tags.as_ref().map(serde_json::to_string).transpose()?)
}

fn into_cards(rows: Vec<CardRow>) -> Result<Vec<Card>, KanbanError> {
    rows.into_iter().map(Card::try_from).collect()
}

#[async_trait]
impl BoardGateway for SqliteGateway {
    async fn create_board(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Board, KanbanError> {
        let user_id = self.require_user()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(KanbanError::InvalidInput("Board title is required".into()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let board: Board = sqlx::query_as(&format!(
            "INSERT INTO boards (id, user_id, title, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING {BOARD_FIELDS}"
        ))
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(board)
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, KanbanError> {
        let user_id = self.require_user()?;
        let board: Board = sqlx::query_as(&format!(
            "SELECT {BOARD_FIELDS} FROM boards WHERE id = ? AND user_id = ?"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("Board not found: {}", board_id)))?;

        Ok(board)
    }

    async fn list_boards(&self) -> Result<Vec<Board>, KanbanError> {
        let user_id = self.require_user()?;
        let boards: Vec<Board> = sqlx::query_as(&format!(
            "SELECT {BOARD_FIELDS} FROM boards WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(boards)
    }

    async fn update_board(
        &self,
        board_id: &str,
        patch: &BoardPatch,
    ) -> Result<Board, KanbanError> {
        let existing = self.get_board(board_id).await?;
        let title = match &patch.title {
            Some(t) if t.trim().is_empty() => {
                return Err(KanbanError::InvalidInput("Board title is required".into()))
            }
            Some(t) => t.trim().to_string(),
            None => existing.title,
        };
        let description = match &patch.description {
            Some(description) => description.clone(),
            None => existing.description,
        };

        let board: Board = sqlx::query_as(&format!(
            "UPDATE boards SET title = ?, description = ?, updated_at = ? WHERE id = ? RETURNING {BOARD_FIELDS}"
        ))
        .bind(&title)
        .bind(&description)
        .bind(Utc::now())
        .bind(board_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(board)
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), KanbanError> {
        let user_id = self.require_user()?;
        let result = sqlx::query("DELETE FROM boards WHERE id = ? AND user_id = ?")
            .bind(board_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(KanbanError::NotFound(format!("Board not found: {}", board_id)));
        }

        Ok(())
    }

    async fn create_column(
        &self,
        board_id: &str,
        req: &CreateColumnRequest,
    ) -> Result<Column, KanbanError> {
        self.get_board(board_id).await?;
        if req.title.trim().is_empty() {
            return Err(KanbanError::InvalidInput("Column title is required".into()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let column: Column = sqlx::query_as(&format!(
            "INSERT INTO board_columns (id, board_id, title, position, card_limit, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMN_FIELDS}"
        ))
        .bind(&id)
        .bind(board_id)
        .bind(req.title.trim())
        .bind(req.position)
        .bind(req.card_limit)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(column)
    }

    async fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, KanbanError> {
        self.get_board(board_id).await?;
        let columns: Vec<Column> = sqlx::query_as(&format!(
            "SELECT {COLUMN_FIELDS} FROM board_columns WHERE board_id = ? ORDER BY position ASC, created_at ASC"
        ))
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(columns)
    }

    async fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column, KanbanError> {
        let existing = self.fetch_column(column_id).await?;
        let title = match &patch.title {
            Some(t) if t.trim().is_empty() => {
                return Err(KanbanError::InvalidInput("Column title is required".into()))
            }
            Some(t) => t.trim().to_string(),
            None => existing.title,
        };
        let position = patch.position.unwrap_or(existing.position);
        let card_limit = patch.card_limit.unwrap_or(existing.card_limit);

        let column: Column = sqlx::query_as(&format!(
            "UPDATE board_columns SET title = ?, position = ?, card_limit = ?, updated_at = ? WHERE id = ? RETURNING {COLUMN_FIELDS}"
        ))
        .bind(&title)
        .bind(position)
        .bind(card_limit)
        .bind(Utc::now())
        .bind(column_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(column)
    }

    async fn delete_column(&self, column_id: &str) -> Result<(), KanbanError> {
        self.fetch_column(column_id).await?;
        sqlx::query("DELETE FROM board_columns WHERE id = ?")
            .bind(column_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_card(&self, req: &CreateCardRequest) -> Result<Card, KanbanError> {
        let user_id = self.require_user()?;
        let fields = req.card.clone().validated()?;
        self.fetch_column(&req.column_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let priority = fields.priority.unwrap_or_default();
        let position = req.position.unwrap_or(0);

        sqlx::query(
            "INSERT INTO cards (id, column_id, user_id, title, description, priority, assignee, due_date, position, tags, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&req.column_id)
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(priority.as_str())
        .bind(&fields.assignee)
        .bind(fields.due_date)
        .bind(position)
        .bind(encode_tags(&fields.tags)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_card(&id).await
    }

    async fn list_cards_for_column(&self, column_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.fetch_column(column_id).await?;
        let rows: Vec<CardRow> = sqlx::query_as(
            "SELECT * FROM cards WHERE column_id = ? ORDER BY position ASC, created_at ASC",
        )
        .bind(column_id)
        .fetch_all(&self.pool)
        .await?;

        into_cards(rows)
    }

    async fn list_cards_for_board(&self, board_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.get_board(board_id).await?;
        let rows: Vec<CardRow> = sqlx::query_as(
            "SELECT k.* FROM cards k JOIN board_columns c ON c.id = k.column_id WHERE c.board_id = ? ORDER BY c.position ASC, k.position ASC, k.created_at ASC",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;

        into_cards(rows)
    }

    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<Card, KanbanError> {
        let patch = patch.clone().validated()?;
        let mut card = self.fetch_card(card_id).await?;
        card.apply_patch(&patch);

        sqlx::query(
            "UPDATE cards SET title = ?, description = ?, priority = ?, assignee = ?, due_date = ?, tags = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.priority.as_str())
        .bind(&card.assignee)
        .bind(card.due_date)
        .bind(encode_tags(&card.tags)?)
        .bind(Utc::now())
        .bind(card_id)
        .execute(&self.pool)
        .await?;

        self.fetch_card(card_id).await
    }

    async fn move_card(
        &self,
        card_id: &str,
        column_id: &str,
        position: i64,
    ) -> Result<Card, KanbanError> {
        let existing = self.fetch_card(card_id).await?;
        self.fetch_column(column_id).await?;

        sqlx::query("UPDATE cards SET column_id = ?, position = ?, updated_at = ? WHERE id = ?")
            .bind(column_id)
            .bind(position)
            .bind(Utc::now())
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            card_id,
            from_column = existing.column_id.as_str(),
            to_column = column_id,
            position,
            "Card moved"
        );

        self.fetch_card(card_id).await
    }

    async fn reorder_cards(
        &self,
        column_id: &str,
        card_ids: &[String],
    ) -> Result<(), KanbanError> {
        self.fetch_column(column_id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        for (index, card_id) in card_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE cards SET position = ?, updated_at = ? WHERE id = ? AND column_id = ?",
            )
            .bind(index as i64)
            .bind(now)
            .bind(card_id)
            .bind(column_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(KanbanError::NotFound(format!(
                    "Card {} not found in column {}",
                    card_id, column_id
                )));
            }
        }
        tx.commit().await?;

        Ok(())
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), KanbanError> {
        self.fetch_card(card_id).await?;
        sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
