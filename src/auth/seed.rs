use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::credentials;
use crate::domain::{CreateCardRequest, NewCard, Priority};
use crate::gateway::{create_board_with_default_columns, BoardGateway, SqliteGateway};

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo-board";

/// (column index, title, description, priority, assignee, due date, tags)
const DEMO_CARDS: &[(usize, &str, &str, Priority, &str, &str, &[&str])] = &[
    (
        0,
        "Setup Production Line A",
        "Configure and calibrate the new assembly line for Widget A production",
        Priority::High,
        "John Smith",
        "2024-01-15",
        &["setup", "production"],
    ),
    (
        0,
        "Quality Control Review",
        "Review and update quality control procedures for compliance",
        Priority::Medium,
        "Sarah Johnson",
        "2024-01-20",
        &["quality", "compliance"],
    ),
    (
        1,
        "Machine Maintenance",
        "Scheduled maintenance on CNC Machine #3",
        Priority::Critical,
        "Mike Wilson",
        "2024-01-12",
        &["maintenance", "critical"],
    ),
    (
        2,
        "Batch Testing #2024-001",
        "Testing 500 units from morning production run",
        Priority::High,
        "Lisa Chen",
        "2024-01-11",
        &["testing", "batch"],
    ),
    (
        3,
        "Equipment Calibration",
        "Monthly calibration of measuring instruments completed",
        Priority::Medium,
        "Tom Davis",
        "2024-01-05",
        &["calibration", "monthly"],
    ),
];

/// Creates a demo user owning one populated board. Does nothing if the demo
/// user already exists.
pub async fn seed_demo(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(DEMO_USERNAME)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        tracing::debug!("Demo user '{}' already exists, skipping seed", DEMO_USERNAME);
        return Ok(());
    }

    let password_hash = credentials::hash_password(DEMO_PASSWORD)?;
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, username, display_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(DEMO_USERNAME)
    .bind("Demo")
    .bind("")
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let gateway = SqliteGateway::for_user(pool.clone(), &user_id);
    let full = create_board_with_default_columns(
        &gateway,
        "Manufacturing Control Board",
        Some("Production workflow management system"),
    )
    .await?;

    let mut positions = vec![0_i64; full.columns.len()];
    for (column_index, title, description, priority, assignee, due, tags) in DEMO_CARDS {
        let column = &full.columns[*column_index];
        gateway
            .create_card(&CreateCardRequest {
                column_id: column.id.clone(),
                card: NewCard {
                    title: title.to_string(),
                    description: Some(description.to_string()),
                    priority: Some(*priority),
                    assignee: Some(assignee.to_string()),
                    due_date: due.parse::<NaiveDate>().ok(),
                    tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                },
                position: Some(positions[*column_index]),
            })
            .await?;
        positions[*column_index] += 1;
    }

    tracing::info!(
        "Demo user '{}' created with board {}",
        DEMO_USERNAME,
        full.board.id
    );
    Ok(())
}
