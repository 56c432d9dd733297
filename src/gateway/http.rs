use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::BoardGateway;
use crate::config::Config;
use crate::domain::{
    Board, BoardPatch, Card, CardPatch, Column, ColumnPatch, CreateCardRequest,
    CreateColumnRequest, FullBoard, KanbanError, MoveCardRequest, ReorderCardsRequest,
};

/// Client for the board REST service.
///
/// Holds the bearer token of the current session. Without one every call
/// fails with `Unauthenticated` and no request is sent.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KanbanError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &Config) -> Result<Self, KanbanError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, KanbanError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| KanbanError::Unauthenticated("User must be authenticated".into()))?;
        Ok(req.bearer_auth(token))
    }

    async fn dispatch(&self, req: RequestBuilder) -> Result<reqwest::Response, KanbanError> {
        let response = self
            .authorized(req)?
            .send()
            .await
            .map_err(|e| KanbanError::PersistenceFailure(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        tracing::warn!(
            status = status.as_u16(),
            error = message.as_str(),
            "Store rejected request"
        );

        Err(match status {
            StatusCode::BAD_REQUEST => KanbanError::InvalidInput(message),
            StatusCode::UNAUTHORIZED => KanbanError::Unauthenticated(message),
            StatusCode::NOT_FOUND => KanbanError::NotFound(message),
            _ => KanbanError::PersistenceFailure(format!("{}: {}", status, message)),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, KanbanError> {
        self.dispatch(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| KanbanError::PersistenceFailure(e.to_string()))
    }
}

#[async_trait]
impl BoardGateway for HttpGateway {
    async fn create_board(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Board, KanbanError> {
        let body = json!({
            "title": title,
            "description": description,
            "with_default_columns": false,
        });
        let full: FullBoard = self
            .fetch(self.client.post(self.url("/api/boards")).json(&body))
            .await?;
        Ok(full.board)
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, KanbanError> {
        self.fetch(self.client.get(self.url(&format!("/api/boards/{}", board_id))))
            .await
    }

    async fn list_boards(&self) -> Result<Vec<Board>, KanbanError> {
        self.fetch(self.client.get(self.url("/api/boards"))).await
    }

    async fn update_board(
        &self,
        board_id: &str,
        patch: &BoardPatch,
    ) -> Result<Board, KanbanError> {
        self.fetch(
            self.client
                .patch(self.url(&format!("/api/boards/{}", board_id)))
                .json(patch),
        )
        .await
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), KanbanError> {
        self.dispatch(
            self.client
                .delete(self.url(&format!("/api/boards/{}", board_id))),
        )
        .await?;
        Ok(())
    }

    async fn create_column(
        &self,
        board_id: &str,
        req: &CreateColumnRequest,
    ) -> Result<Column, KanbanError> {
        self.fetch(
            self.client
                .post(self.url(&format!("/api/boards/{}/columns", board_id)))
                .json(req),
        )
        .await
    }

    async fn list_columns(&self, board_id: &str) -> Result<Vec<Column>, KanbanError> {
        self.fetch(
            self.client
                .get(self.url(&format!("/api/boards/{}/columns", board_id))),
        )
        .await
    }

    async fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column, KanbanError> {
        self.fetch(
            self.client
                .patch(self.url(&format!("/api/columns/{}", column_id)))
                .json(patch),
        )
        .await
    }

    async fn delete_column(&self, column_id: &str) -> Result<(), KanbanError> {
        self.dispatch(
            self.client
                .delete(self.url(&format!("/api/columns/{}", column_id))),
        )
        .await?;
        Ok(())
    }

    async fn create_card(&self, req: &CreateCardRequest) -> Result<Card, KanbanError> {
        self.fetch(self.client.post(self.url("/api/cards")).json(req))
            .await
    }

    async fn list_cards_for_column(&self, column_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.fetch(
            self.client
                .get(self.url(&format!("/api/columns/{}/cards", column_id))),
        )
        .await
    }

    async fn list_cards_for_board(&self, board_id: &str) -> Result<Vec<Card>, KanbanError> {
        self.fetch(
            self.client
                .get(self.url(&format!("/api/boards/{}/cards", board_id))),
        )
        .await
    }

    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<Card, KanbanError> {
        self.fetch(
            self.client
                .patch(self.url(&format!("/api/cards/{}", card_id)))
                .json(patch),
        )
        .await
    }

    async fn move_card(
        &self,
        card_id: &str,
        column_id: &str,
        position: i64,
    ) -> Result<Card, KanbanError> {
        let body = MoveCardRequest {
            column_id: column_id.to_string(),
            position,
        };
        self.fetch(
            self.client
                .patch(self.url(&format!("/api/cards/{}/move", card_id)))
                .json(&body),
        )
        .await
    }

    async fn reorder_cards(
        &self,
        column_id: &str,
        card_ids: &[String],
    ) -> Result<(), KanbanError> {
        let body = ReorderCardsRequest {
            card_ids: card_ids.to_vec(),
        };
        self.dispatch(
            self.client
                .put(self.url(&format!("/api/columns/{}/order", column_id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), KanbanError> {
        self.dispatch(
            self.client
                .delete(self.url(&format!("/api/cards/{}", card_id))),
        )
        .await?;
        Ok(())
    }

    async fn get_full_board(&self, board_id: &str) -> Result<FullBoard, KanbanError> {
        self.fetch(
            self.client
                .get(self.url(&format!("/api/boards/{}/full", board_id))),
        )
        .await
    }
}
