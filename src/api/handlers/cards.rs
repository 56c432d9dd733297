use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Card, CardPatch, CreateCardRequest, KanbanError, MoveCardRequest};
use crate::gateway::BoardGateway;

pub async fn create_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), KanbanError> {
    let card = state.gateway(&user)?.create_card(&req).await?;
    tracing::debug!(
        card_id = card.id.as_str(),
        column_id = card.column_id.as_str(),
        "Card created"
    );
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<CardPatch>,
) -> Result<Json<Card>, KanbanError> {
    let card = state.gateway(&user)?.update_card(&id, &patch).await?;
    Ok(Json(card))
}

pub async fn move_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<Card>, KanbanError> {
    let card = state
        .gateway(&user)?
        .move_card(&id, &req.column_id, req.position)
        .await?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    state.gateway(&user)?.delete_card(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
