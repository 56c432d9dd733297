//! Read-only views derived from the canonical board state.

pub mod dashboard;
pub mod filter;

pub use dashboard::{ColumnCount, DashboardStats, PriorityCount};
pub use filter::{CardFilter, FilterOptions, Selection};
