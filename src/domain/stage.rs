use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of workflow stages a new board is laid out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ToDo,
    InProgress,
    Testing,
    Done,
}

impl Stage {
    /// Column title that marks cards as completed on the dashboard.
    pub const TERMINAL_LABEL: &'static str = "Done";

    pub fn label(&self) -> &'static str {
        match self {
            Stage::ToDo => "To Do",
            Stage::InProgress => "In Progress",
            Stage::Testing => "Testing",
            Stage::Done => Self::TERMINAL_LABEL,
        }
    }

    pub fn all() -> &'static [Stage] {
        &[Stage::ToDo, Stage::InProgress, Stage::Testing, Stage::Done]
    }

    pub fn is_terminal(&self) -> bool {
        *self == Stage::Done
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" | "to_do" | "todo" => Ok(Stage::ToDo),
            "In Progress" | "in_progress" | "in-progress" => Ok(Stage::InProgress),
            "Testing" | "testing" => Ok(Stage::Testing),
            "Done" | "done" => Ok(Stage::Done),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}
