//! Persistence gateway.
//!
//! One trait covering board, column and card CRUD against the backing store.
//! Implementations perform no retries and keep no cache; whatever the store
//! rejects comes back to the caller as-is. Every call requires an
//! authenticated session and fails with `KanbanError::Unauthenticated`
//! before touching the store otherwise.

pub mod http;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::{
    Board, BoardPatch, Card, CardPatch, Column, ColumnPatch, CreateCardRequest,
    CreateColumnRequest, FullBoard, KanbanError, Stage,
};

pub use http::HttpGateway;
pub use sqlite::SqliteGateway;

#[async_trait]
pub trait BoardGateway: Send + Sync {
    async fn create_board(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Board, KanbanError>;

    async fn get_board(&self, board_id: &str) -> Result<Board, KanbanError>;

    /// Boards owned by the current user, newest first.
    async fn list_boards(&self) -> Result<Vec<Board>, KanbanError>;

    async fn update_board(&self, board_id: &str, patch: &BoardPatch)
        -> Result<Board, KanbanError>;

    async fn delete_board(&self, board_id: &str) -> Result<(), KanbanError>;

    async fn create_column(
        &self,
        board_id: &str,
        req: &CreateColumnRequest,
    ) -> Result<Column, KanbanError>;

    /// Columns of a board by ascending position, without cards.
    async fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, KanbanError>;

    async fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column, KanbanError>;

    async fn delete_column(&self, column_id: &str) -> Result<(), KanbanError>;

    /// Priority falls back to medium and position to 0 when not given.
    async fn create_card(&self, req: &CreateCardRequest) -> Result<Card, KanbanError>;

    async fn list_cards_for_column(&self, column_id: &str) -> Result<Vec<Card>, KanbanError>;

    async fn list_cards_for_board(&self, board_id: &str) -> Result<Vec<Card>, KanbanError>;

    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<Card, KanbanError>;

    /// Sets column membership and position together.
    async fn move_card(
        &self,
        card_id: &str,
        column_id: &str,
        position: i64,
    ) -> Result<Card, KanbanError>;

    /// Rewrites positions in `column_id` so each card's position is its index.
    async fn reorder_cards(&self, column_id: &str, card_ids: &[String])
        -> Result<(), KanbanError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), KanbanError>;

    /// Board, columns and cards in one read, cards grouped under their column.
    async fn get_full_board(&self, board_id: &str) -> Result<FullBoard, KanbanError> {
        let board = self.get_board(board_id).await?;
        let columns = self.list_columns(board_id).await?;
        let cards = self.list_cards_for_board(board_id).await?;
        Ok(assemble_full_board(board, columns, cards))
    }
}

/// Groups a flat, position-ordered card list under its columns. Cards whose
/// column is not on the board are dropped.
pub fn assemble_full_board(board: Board, mut columns: Vec<Column>, cards: Vec<Card>) -> FullBoard {
    for column in columns.iter_mut() {
        column.cards.clear();
    }
    for card in cards {
        match columns.iter_mut().find(|col| col.id == card.column_id) {
            Some(column) => column.cards.push(card),
            None => tracing::warn!(
                card_id = card.id.as_str(),
                column_id = card.column_id.as_str(),
                "Card references a column outside the board, skipping"
            ),
        }
    }
    FullBoard { board, columns }
}

/// Creates a board laid out with the standard stage columns.
pub async fn create_board_with_default_columns<G>(
    gateway: &G,
    title: &str,
    description: Option<&str>,
) -> Result<FullBoard, KanbanError>
where
    G: BoardGateway + ?Sized,
{
    let board = gateway.create_board(title, description).await?;
    let mut columns = Vec::with_capacity(Stage::all().len());
    for (position, stage) in Stage::all().iter().enumerate() {
        let column = gateway
            .create_column(
                &board.id,
                &CreateColumnRequest {
                    title: stage.label().to_string(),
                    position: position as i64,
                    card_limit: None,
                },
            )
            .await?;
        columns.push(column);
    }

    tracing::info!(board_id = board.id.as_str(), "Board created with default columns");
    Ok(FullBoard { board, columns })
}
