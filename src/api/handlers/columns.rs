use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Card, Column, ColumnPatch, KanbanError, ReorderCardsRequest};
use crate::gateway::BoardGateway;

pub async fn update_column(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<ColumnPatch>,
) -> Result<Json<Column>, KanbanError> {
    let column = state.gateway(&user)?.update_column(&id, &patch).await?;
    Ok(Json(column))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    state.gateway(&user)?.delete_column(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_column_cards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Card>>, KanbanError> {
    let cards = state.gateway(&user)?.list_cards_for_column(&id).await?;
    Ok(Json(cards))
}

pub async fn reorder_column(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<ReorderCardsRequest>,
) -> Result<StatusCode, KanbanError> {
    state
        .gateway(&user)?
        .reorder_cards(&id, &req.card_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
