#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::SqlitePool;
use tower::ServiceExt;

use kanban_board::api::{create_router, AppState};
use kanban_board::auth::{jwt, seed};
use kanban_board::config::Config;
use kanban_board::domain::{
    Board, BoardPatch, Card, CardPatch, Column, ColumnPatch, CreateCardRequest,
    CreateColumnRequest, FullBoard, KanbanError,
};
use kanban_board::gateway::{BoardGateway, SqliteGateway};
use kanban_board::infrastructure::db;

pub async fn setup_test_db() -> SqlitePool {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

pub async fn create_test_user(pool: &SqlitePool, username: &str) -> String {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, username, display_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, '', 'not-a-hash', ?, ?)",
    )
    .bind(&user_id)
    .bind(username)
    .bind(username)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("Failed to create test user");
    user_id
}

pub async fn token_for(pool: &SqlitePool, user_id: &str) -> String {
    let key = jwt::get_or_create_signing_key(pool)
        .await
        .expect("Failed to load signing key");
    jwt::create_token(&key, user_id).expect("Failed to create token")
}

/// Router over a fresh store plus a bearer token for one user.
pub async fn setup_app() -> (Router, SqlitePool, String) {
    let pool = setup_test_db().await;
    let user_id = create_test_user(&pool, "tester").await;
    let token = token_for(&pool, &user_id).await;

    let config = Arc::new(Config {
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        ..Config::default()
    });
    let state = AppState::new(Some(pool.clone()), config.clone());

    (create_router(state, &config), pool, token)
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

/// Seeds the demo board and returns a gateway scoped to its owner together
/// with the board id.
pub async fn seed_demo_board(pool: &SqlitePool) -> (SqliteGateway, String) {
    seed::seed_demo(pool).await.expect("Failed to seed demo board");
    let (user_id,): (String,) = sqlx::query_as("SELECT id FROM users WHERE username = 'demo'")
        .fetch_one(pool)
        .await
        .unwrap();
    let gateway = SqliteGateway::for_user(pool.clone(), user_id);
    let boards = gateway.list_boards().await.unwrap();
    let board_id = boards[0].id.clone();
    (gateway, board_id)
}

pub fn column_id_titled(full: &FullBoard, title: &str) -> String {
    full.columns
        .iter()
        .find(|c| c.title == title)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| panic!("no column titled {}", title))
}

pub fn card_id_titled(full: &FullBoard, title: &str) -> String {
    full.columns
        .iter()
        .flat_map(|c| c.cards.iter())
        .find(|card| card.title == title)
        .map(|card| card.id.clone())
        .unwrap_or_else(|| panic!("no card titled {}", title))
}

pub fn titles_in(full: &FullBoard, column_title: &str) -> Vec<String> {
    full.columns
        .iter()
        .find(|c| c.title == column_title)
        .map(|c| c.cards.iter().map(|card| card.title.clone()).collect())
        .unwrap_or_default()
}

/// Wraps a gateway so writes can be made to fail on demand. Reads always
/// pass through. Every write attempt is recorded by name.
#[derive(Clone)]
pub struct FlakyGateway<G> {
    inner: G,
    failing: Arc<AtomicBool>,
    writes: Arc<Mutex<Vec<&'static str>>>,
}

impl<G> FlakyGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            failing: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn handle(&self) -> FlakyHandle {
        FlakyHandle {
            failing: Arc::clone(&self.failing),
            writes: Arc::clone(&self.writes),
        }
    }

    fn write(&self, name: &'static str) -> Result<(), KanbanError> {
        self.writes.lock().unwrap().push(name);
        if self.failing.load(Ordering::SeqCst) {
            return Err(KanbanError::PersistenceFailure(format!(
                "{} rejected by store",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct FlakyHandle {
    failing: Arc<AtomicBool>,
    writes: Arc<Mutex<Vec<&'static str>>>,
}

impl FlakyHandle {
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<&'static str> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl<G: BoardGateway> BoardGateway for FlakyGateway<G> {
    async fn create_board(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Board, KanbanError> {
        self.write("create_board")?;
        self.inner.create_board(title, description).await
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, KanbanError> {
        self.inner.get_board(board_id).await
    }

    async fn list_boards(&self) -> Result<Vec<Board>, KanbanError> {
        self.inner.list_boards().await
    }

    async fn update_board(
        &self,
        board_id: &str,
        patch: &BoardPatch,
    ) -> Result<Board, KanbanError> {
        self.write("update_board")?;
        self.inner.update_board(board_id, patch).await
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), KanbanError> {
        self.write("delete_board")?;
        self.inner.delete_board(board_id).await
    }

    async fn create_column(
        &self,
        board_id: &str,
        req: &CreateColumnRequest,
    ) -> Result<Column, KanbanError> {
        self.write("create_column")?;
        self.inner.create_column(board_id, req).await
    }

    async fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, KanbanError> {
        self.inner.list_columns(board_id).await
    }

    async fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column, KanbanError> {
        self.write("update_column")?;
        self.inner.update_column(column_id, patch).await
    }

    async fn delete_column(&self, column_id: &str) -> Result<(), KanbanError> {
        self.write("delete_column")?;
        self.inner.delete_column(column_id).await
    }

    async fn create_card(&self, req: &CreateCardRequest) -> Result<Card, KanbanError> {
        self.write("create_card")?;
        self.inner.create_card(req).await
    }

    async fn list_cards_for_column(&self, column_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.inner.list_cards_for_column(column_id).await
    }

    async fn list_cards_for_board(&self, board_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.inner.list_cards_for_board(board_id).await
    }

    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<Card, KanbanError> {
        self.write("update_card")?;
        self.inner.update_card(card_id, patch).await
    }

    async fn move_card(
        &self,
        card_id: &str,
        column_id: &str,
        position: i64,
    ) -> Result<Card, KanbanError> {
        self.write("move_card")?;
        self.inner.move_card(card_id, column_id, position).await
    }

    async fn reorder_cards(
        &self,
        column_id: &str,
        card_ids: &[String],
    ) -> Result<(), KanbanError> {
        self.write("reorder_cards")?;
        self.inner.reorder_cards(column_id, card_ids).await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), KanbanError> {
        self.write("delete_card")?;
        self.inner.delete_card(card_id).await
    }
}
