use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::FilteredBoardResponse;
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{
    Board, BoardPatch, Card, Column, CreateBoardRequest, CreateColumnRequest, FullBoard,
    KanbanError,
};
use crate::gateway::{create_board_with_default_columns, BoardGateway};
use crate::projection::{CardFilter, DashboardStats, FilterOptions};

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Board>>, KanbanError> {
    let boards = state.gateway(&user)?.list_boards().await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<FullBoard>), KanbanError> {
    let gateway = state.gateway(&user)?;
    let full = if req.with_default_columns {
        create_board_with_default_columns(&gateway, &req.title, req.description.as_deref())
            .await?
    } else {
        let board = gateway
            .create_board(&req.title, req.description.as_deref())
            .await?;
        FullBoard {
            board,
            columns: Vec::new(),
        }
    };

    tracing::info!(
        board_id = full.board.id.as_str(),
        user_id = user.user_id.as_str(),
        "Board created"
    );
    Ok((StatusCode::CREATED, Json(full)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Board>, KanbanError> {
    let board = state.gateway(&user)?.get_board(&id).await?;
    Ok(Json(board))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<BoardPatch>,
) -> Result<Json<Board>, KanbanError> {
    let board = state.gateway(&user)?.update_board(&id, &patch).await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    state.gateway(&user)?.delete_board(&id).await?;
    tracing::info!(board_id = id.as_str(), "Board deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_full_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<FullBoard>, KanbanError> {
    let full = state.gateway(&user)?.get_full_board(&id).await?;
    Ok(Json(full))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DashboardStats>, KanbanError> {
    let full = state.gateway(&user)?.get_full_board(&id).await?;
    Ok(Json(DashboardStats::from_columns(&full.columns)))
}

pub async fn get_filtered_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(filter): Query<CardFilter>,
) -> Result<Json<FilteredBoardResponse>, KanbanError> {
    let full = state.gateway(&user)?.get_full_board(&id).await?;
    let options = FilterOptions::from_columns(&full.columns);
    let columns = filter.apply(&full.columns);

    Ok(Json(FilteredBoardResponse {
        board: full.board,
        columns,
        options,
        filter,
    }))
}

pub async fn list_columns(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Column>>, KanbanError> {
    let columns = state.gateway(&user)?.list_columns(&id).await?;
    Ok(Json(columns))
}

pub async fn create_column(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<Column>), KanbanError> {
    let column = state.gateway(&user)?.create_column(&id, &req).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn list_board_cards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Card>>, KanbanError> {
    let cards = state.gateway(&user)?.list_cards_for_board(&id).await?;
    Ok(Json(cards))
}
