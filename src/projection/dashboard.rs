use serde::Serialize;

use crate::domain::{Column, Priority, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCount {
    pub column_id: String,
    pub title: String,
    pub count: usize,
    /// Whole percent of the board's cards held by this column.
    pub share: u32,
    pub card_limit: Option<i64>,
    pub over_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Summary counts shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub columns: Vec<ColumnCount>,
    /// Only priorities with at least one card, low to critical.
    pub priorities: Vec<PriorityCount>,
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Whole percent of cards in the terminal column; 0 for an empty board.
    pub completion_rate: u32,
}

impl DashboardStats {
    pub fn from_columns(columns: &[Column]) -> Self {
        let total = columns.iter().map(|c| c.cards.len()).sum();
        let column_counts = columns
            .iter()
            .map(|column| ColumnCount {
                column_id: column.id.clone(),
                title: column.title.clone(),
                count: column.cards.len(),
                share: percent(column.cards.len(), total),
                card_limit: column.card_limit,
                over_limit: column.is_over_limit(),
            })
            .collect();

        let priorities = Priority::all()
            .iter()
            .map(|priority| PriorityCount {
                priority: *priority,
                count: columns
                    .iter()
                    .flat_map(|c| c.cards.iter())
                    .filter(|card| card.priority == *priority)
                    .count(),
            })
            .filter(|stat| stat.count > 0)
            .collect();

        let in_progress = cards_in(columns, Stage::InProgress.label());
        let completed = cards_in(columns, Stage::TERMINAL_LABEL);

        Self {
            columns: column_counts,
            priorities,
            total,
            in_progress,
            completed,
            completion_rate: percent(completed, total),
        }
    }
}

fn cards_in(columns: &[Column], title: &str) -> usize {
    columns
        .iter()
        .find(|c| c.title == title)
        .map(|c| c.cards.len())
        .unwrap_or(0)
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}
