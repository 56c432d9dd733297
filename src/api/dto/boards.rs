use serde::Serialize;

use crate::domain::{Board, Column};
use crate::projection::{CardFilter, FilterOptions};

/// Board view reduced by a filter, plus the dropdown choices for the
/// unfiltered board.
#[derive(Debug, Serialize)]
pub struct FilteredBoardResponse {
    pub board: Board,
    pub columns: Vec<Column>,
    pub options: FilterOptions,
    pub filter: CardFilter,
}
