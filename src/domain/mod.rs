pub mod board;
pub mod card;
pub mod error;
pub mod stage;

pub use board::{
    Board, BoardPatch, Column, ColumnPatch, CreateBoardRequest, CreateColumnRequest, FullBoard,
    MoveCardRequest, ReorderCardsRequest,
};
pub use card::{normalize_tags, Card, CardPatch, CardRow, CreateCardRequest, NewCard, Priority};
pub use error::KanbanError;
pub use stage::Stage;
