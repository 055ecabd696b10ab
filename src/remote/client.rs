// ABOUTME: reqwest-based implementation of the remote write API
// ABOUTME: Bearer authentication, multipart exercise upload, JSON plan and session writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::http_client::shared_client;
use super::RemoteWriteApi;
use crate::constants::{defaults, endpoints};
use crate::errors::RemoteError;
use crate::models::{NewExercise, NewTrainingPlan, TrainingSessionRecord};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Supplies the access token attached to each request
///
/// Token refresh lives outside the queue; a provider simply returns whatever
/// token is current.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token, if signed in
    async fn access_token(&self) -> Option<String>;
}

/// Fixed token, typically from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Write API client for the fitness backend
#[derive(Clone)]
pub struct HttpWriteApi {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpWriteApi {
    /// Client using the process-wide shared HTTP client
    #[must_use]
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_client(shared_client().clone(), base_url, tokens)
    }

    /// Client using a caller-provided HTTP client
    #[must_use]
    pub fn with_client(client: Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
        }
    }

    /// Backend base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), RemoteError> {
        self.send(path, self.client.post(self.url(path)).json(body))
            .await
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<(), RemoteError> {
        let request = match self.tokens.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(http.path = %path, http.status = status.as_u16(), "Backend write completed");
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::status(
            status.as_u16(),
            body.chars().take(defaults::ERROR_BODY_MAX_LEN).collect::<String>(),
        ))
    }

    async fn exercise_form(exercise: &NewExercise) -> Result<Form, RemoteError> {
        let mut form = Form::new()
            .text("name", exercise.name.clone())
            .text("description", exercise.description.clone())
            .text("category", exercise.category.to_string())
            .text("public", exercise.public.to_string());

        if let Some(path) = &exercise.image_path {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| RemoteError::Attachment {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            let file_name = exercise
                .image_file_name()
                .unwrap_or_else(|| "image".to_owned());
            let mut part = Part::bytes(bytes).file_name(file_name);
            // A bare "image" (no extension) is not a valid MIME string; leave the default then
            if let Some(mime) = exercise.image_mime_type().filter(|m| m.contains('/')) {
                part = part.mime_str(&mime).map_err(|e| RemoteError::Attachment {
                    path: path.display().to_string(),
                    reason: format!("unusable image type {mime}: {e}"),
                })?;
            }
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl RemoteWriteApi for HttpWriteApi {
    async fn create_exercise(&self, exercise: &NewExercise) -> Result<(), RemoteError> {
        let form = Self::exercise_form(exercise).await?;
        self.send(
            endpoints::EXERCISE_CREATE,
            self.client
                .post(self.url(endpoints::EXERCISE_CREATE))
                .multipart(form),
        )
        .await
    }

    async fn create_training_plan(&self, plan: &NewTrainingPlan) -> Result<(), RemoteError> {
        self.post_json(endpoints::TRAINING_CREATE, plan).await
    }

    async fn save_training_session(
        &self,
        session: &TrainingSessionRecord,
    ) -> Result<(), RemoteError> {
        self.post_json(endpoints::TRAINING_SAVE, session).await
    }
}
