use std::collections::HashSet;

use crate::domain::{Board, Card, Column, FullBoard, KanbanError};

/// Canonical in-memory board for a session. Only the engine mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    board: Board,
    columns: Vec<Column>,
}

impl From<FullBoard> for BoardState {
    fn from(full: FullBoard) -> Self {
        Self {
            board: full.board,
            columns: full.columns,
        }
    }
}

impl BoardState {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Card> {
        self.columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .find(|card| card.id == card_id)
    }

    /// Column currently holding `card_id`.
    pub fn column_of(&self, card_id: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.cards.iter().any(|card| card.id == card_id))
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    pub fn to_full_board(&self) -> FullBoard {
        FullBoard {
            board: self.board.clone(),
            columns: self.columns.clone(),
        }
    }

    /// Every card id appears once, in the column its `column_id` names.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            for card in &column.cards {
                if !seen.insert(card.id.as_str()) {
                    return Err(format!("card {} appears more than once", card.id));
                }
                if card.column_id != column.id {
                    return Err(format!(
                        "card {} sits in column {} but references {}",
                        card.id, column.id, card.column_id
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn column_index(&self, column_id: &str) -> Result<usize, KanbanError> {
        self.columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| KanbanError::NotFound(format!("Column not found: {}", column_id)))
    }

    /// (column index, index within column) of a card.
    pub(crate) fn locate(&self, card_id: &str) -> Result<(usize, usize), KanbanError> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, col)| {
                col.cards
                    .iter()
                    .position(|card| card.id == card_id)
                    .map(|pi| (ci, pi))
            })
            .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", card_id)))
    }

    pub(crate) fn column_id_at(&self, column_index: usize) -> &str {
        &self.columns[column_index].id
    }

    /// Position for a card appended to a column: one past the largest stored
    /// position, so it sorts last in the store as well as in memory.
    pub(crate) fn next_position(&self, column_index: usize) -> i64 {
        self.columns[column_index]
            .cards
            .iter()
            .map(|card| card.position + 1)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn push_card(&mut self, column_index: usize, card: Card) {
        self.columns[column_index].cards.push(card);
    }

    /// Stores a fresh copy of a card. If its `column_id` no longer matches
    /// the column holding it, the card moves to the end of that column, or
    /// leaves the board when the column is not on it.
    pub(crate) fn place_card(&mut self, card: Card) -> Result<Card, KanbanError> {
        let (ci, pi) = self.locate(&card.id)?;
        if self.columns[ci].id == card.column_id {
            return Ok(std::mem::replace(&mut self.columns[ci].cards[pi], card));
        }

        let previous = self.columns[ci].cards.remove(pi);
        match self.columns.iter_mut().find(|c| c.id == card.column_id) {
            Some(column) => column.cards.push(card),
            None => tracing::warn!(
                card_id = previous.id.as_str(),
                column_id = card.column_id.as_str(),
                "Card now belongs to a column outside the board, dropping it"
            ),
        }
        Ok(previous)
    }

    pub(crate) fn remove_card(&mut self, card_id: &str) -> Result<Card, KanbanError> {
        let (ci, pi) = self.locate(card_id)?;
        Ok(self.columns[ci].cards.remove(pi))
    }

    /// Moves a card inside its own column and renumbers positions by index.
    pub(crate) fn reposition(
        &mut self,
        card_id: &str,
        new_index: usize,
    ) -> Result<(usize, usize), KanbanError> {
        let (ci, pi) = self.locate(card_id)?;
        let cards = &mut self.columns[ci].cards;
        let card = cards.remove(pi);
        let index = new_index.min(cards.len());
        cards.insert(index, card);
        for (position, card) in cards.iter_mut().enumerate() {
            card.position = position as i64;
        }
        Ok((ci, index))
    }

    pub(crate) fn card_ids_in(&self, column_index: usize) -> Vec<String> {
        self.columns[column_index]
            .cards
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }
}
