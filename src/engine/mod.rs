//! Board reconciliation engine.
//!
//! Every mutation follows the same path: validate against a staged copy of
//! the canonical state, persist through the gateway, and only then commit the
//! staged copy. A failed store call leaves the committed state exactly as it
//! was before the call.

pub mod state;

use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardPatch, CreateCardRequest, KanbanError, NewCard};
use crate::gateway::BoardGateway;

pub use state::BoardState;

/// End of a drag gesture as reported by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub card_id: String,
    /// Column under the pointer when the drag ended, if any.
    pub over_column_id: Option<String>,
    /// Index within that column the card was dropped at, if reported.
    pub over_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragResult {
    /// Dropped outside any known column.
    Cancelled,
    /// Dropped back where it started.
    Unchanged,
    Reordered { column_id: String, index: usize },
    Moved(Card),
}

pub struct BoardEngine<G> {
    gateway: G,
    state: BoardState,
}

impl<G: BoardGateway> BoardEngine<G> {
    pub fn new(gateway: G, state: BoardState) -> Self {
        Self { gateway, state }
    }

    /// Starts a session from the store's composite board read.
    pub async fn load(gateway: G, board_id: &str) -> Result<Self, KanbanError> {
        let full = gateway.get_full_board(board_id).await?;
        tracing::info!(board_id, columns = full.columns.len(), "Board loaded");
        Ok(Self::new(gateway, BoardState::from(full)))
    }

    pub async fn reload(&mut self) -> Result<(), KanbanError> {
        let board_id = self.state.board().id.clone();
        let full = self.gateway.get_full_board(&board_id).await?;
        self.state = BoardState::from(full);
        Ok(())
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Swaps in the staged state. A staged state that breaks card membership
    /// is refused and the committed state stays as it was; `reload` resyncs.
    fn commit(&mut self, staged: BoardState) -> Result<(), KanbanError> {
        if let Err(violation) = staged.check_invariants() {
            tracing::error!(
                board_id = self.state.board().id.as_str(),
                violation = violation.as_str(),
                "Refusing to commit inconsistent board state"
            );
            return Err(KanbanError::Internal(violation));
        }
        self.state = staged;
        Ok(())
    }

    /// Appends a new card to the end of `column_id`.
    pub async fn create_card(
        &mut self,
        column_id: &str,
        fields: NewCard,
    ) -> Result<Card, KanbanError> {
        let fields = fields.validated()?;
        let mut staged = self.state.clone();
        let column_index = staged.column_index(column_id)?;

        let req = CreateCardRequest {
            column_id: column_id.to_string(),
            card: fields,
            position: Some(staged.next_position(column_index)),
        };

        let card = self
            .gateway
            .create_card(&req)
            .await
            .inspect_err(|e| tracing::warn!(column_id, error = %e, "Failed to create card"))?;

        staged.push_card(column_index, card.clone());
        self.commit(staged)?;

        tracing::info!(card_id = card.id.as_str(), column_id, "Card created");
        Ok(card)
    }

    /// Applies `patch` to a card. When the store reports the card in another
    /// column than the session had it, the session follows the store.
    pub async fn update_card(
        &mut self,
        card_id: &str,
        patch: CardPatch,
    ) -> Result<Card, KanbanError> {
        let patch = patch.validated()?;
        let current = self
            .state
            .find_card(card_id)
            .cloned()
            .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", card_id)))?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut staged = self.state.clone();

        let card = self
            .gateway
            .update_card(card_id, &patch)
            .await
            .inspect_err(|e| tracing::warn!(card_id, error = %e, "Failed to update card"))?;

        let previous = staged.place_card(card.clone())?;
        if previous.column_id != card.column_id {
            tracing::info!(
                card_id,
                from_column = previous.column_id.as_str(),
                to_column = card.column_id.as_str(),
                "Card was moved elsewhere, following the store"
            );
        }
        self.commit(staged)?;

        tracing::info!(card_id, "Card updated");
        Ok(card)
    }

    pub async fn delete_card(&mut self, card_id: &str) -> Result<Card, KanbanError> {
        let mut staged = self.state.clone();
        let removed = staged.remove_card(card_id)?;

        self.gateway
            .delete_card(card_id)
            .await
            .inspect_err(|e| tracing::warn!(card_id, error = %e, "Failed to delete card"))?;

        self.commit(staged)?;

        tracing::info!(card_id, column_id = removed.column_id.as_str(), "Card deleted");
        Ok(removed)
    }

    /// Moves a card to `target_column_id`.
    ///
    /// A cross-column move always appends: the persisted position is one past
    /// the largest position in the target column, which is its length while
    /// positions are contiguous. Within the same column this is a reorder to
    /// `target_position`.
    pub async fn move_card(
        &mut self,
        card_id: &str,
        target_column_id: &str,
        target_position: usize,
    ) -> Result<Card, KanbanError> {
        let (source_index, _) = self.state.locate(card_id)?;
        let target_index = self.state.column_index(target_column_id)?;

        if source_index == target_index {
            self.reorder_card(card_id, target_position).await?;
            return self
                .state
                .find_card(card_id)
                .cloned()
                .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", card_id)));
        }

        let mut staged = self.state.clone();
        let original = staged.remove_card(card_id)?;
        let position = staged.next_position(target_index);

        let card = self
            .gateway
            .move_card(card_id, target_column_id, position)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    card_id,
                    from_column = original.column_id.as_str(),
                    to_column = target_column_id,
                    error = %e,
                    "Failed to move card, keeping original column"
                )
            })?;

        staged.push_card(target_index, card.clone());
        self.commit(staged)?;

        tracing::info!(
            card_id,
            from_column = original.column_id.as_str(),
            to_column = target_column_id,
            position,
            "Card moved"
        );
        Ok(card)
    }

    /// Moves a card within its own column and persists the new order.
    pub async fn reorder_card(
        &mut self,
        card_id: &str,
        new_index: usize,
    ) -> Result<usize, KanbanError> {
        let (_, current_index) = self.state.locate(card_id)?;
        let mut staged = self.state.clone();
        let (column_index, index) = staged.reposition(card_id, new_index)?;
        if index == current_index {
            return Ok(index);
        }

        let column_id = staged.column_id_at(column_index).to_string();
        let card_ids = staged.card_ids_in(column_index);

        self.gateway
            .reorder_cards(&column_id, &card_ids)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    card_id,
                    column_id = column_id.as_str(),
                    error = %e,
                    "Failed to reorder column"
                )
            })?;

        self.commit(staged)?;

        tracing::debug!(card_id, column_id = column_id.as_str(), index, "Card reordered");
        Ok(index)
    }

    /// Resolves a finished drag into a move, a reorder or nothing at all.
    pub async fn handle_drag_end(&mut self, drag: DragEnd) -> Result<DragResult, KanbanError> {
        let Some(target_column_id) = drag.over_column_id.as_deref() else {
            return Ok(DragResult::Cancelled);
        };
        if self.state.column(target_column_id).is_none() {
            return Ok(DragResult::Cancelled);
        }
        let Ok((source_index, current_index)) = self.state.locate(&drag.card_id) else {
            return Ok(DragResult::Cancelled);
        };

        if self.state.column_id_at(source_index) != target_column_id {
            let card = self
                .move_card(&drag.card_id, target_column_id, usize::MAX)
                .await?;
            return Ok(DragResult::Moved(card));
        }

        match drag.over_index {
            Some(index) if index != current_index => {
                let index = self.reorder_card(&drag.card_id, index).await?;
                Ok(DragResult::Reordered {
                    column_id: target_column_id.to_string(),
                    index,
                })
            }
            _ => Ok(DragResult::Unchanged),
        }
    }
}
