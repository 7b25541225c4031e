//! HTTP side of task toggles and goal actions.
//!
//! Each call is a single request with no retry. The board is locked only to
//! allocate a sequence number and to apply the confirmed result, never across
//! the network round trip.

use crate::board::{Board, BoardError, SyncOutcome};
use crate::goals::GoalAction;
use crate::models::{
    GoalActionForm, GoalActionResponse, GoalId, GoalsResponse, LoginForm, TaskId, TaskUpdateForm,
    TaskUpdateResponse,
};
use reqwest::{Client, StatusCode, redirect::Policy};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("login rejected")]
    LoginRejected,
    /// The server answered with a failure envelope; carries its message.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Clone)]
pub struct GoalClient {
    http: Client,
    base_url: String,
    board: Arc<Mutex<Board>>,
}

impl GoalClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            board: Arc::new(Mutex::new(Board::default())),
        })
    }

    pub fn board(&self) -> Arc<Mutex<Board>> {
        Arc::clone(&self.board)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Signs in; the session cookie is kept for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.http.post(self.url("/login")).form(&form).send().await?;
        if response.status().is_redirection() {
            info!(username, "logged in");
            Ok(())
        } else {
            warn!(username, status = %response.status(), "login rejected");
            Err(ClientError::LoginRejected)
        }
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/logout")).send().await?;
        if !response.status().is_redirection() {
            return Err(ClientError::Status(response.status()));
        }
        *self.board.lock().await = Board::default();
        Ok(())
    }

    /// Rebuilds the board from the server's snapshot.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.url("/api/goals")).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        let snapshot: GoalsResponse = response.json().await?;
        self.board.lock().await.replace_snapshot(snapshot);
        Ok(())
    }

    pub async fn toggle_task(&self, task_id: TaskId, completed: bool) -> Result<SyncOutcome, ClientError> {
        let pending = self.board.lock().await.begin_toggle(task_id, completed)?;
        let form = TaskUpdateForm {
            task_id,
            completed: u8::from(completed),
        };

        let reply = self.post_form::<_, TaskUpdateResponse>("/api/tasks/update", &form).await;
        match reply {
            Ok(body) if body.is_success() => Ok(self.board.lock().await.confirm_toggle(&pending)),
            Ok(body) => {
                let message = body
                    .message
                    .unwrap_or_else(|| "Error updating task status".to_string());
                error!(task_id, "{message}");
                Err(ClientError::Rejected(message))
            }
            Err(err) => {
                error!(task_id, "task update failed: {err}");
                Err(err)
            }
        }
    }

    pub async fn dispatch_goal_action(
        &self,
        goal_id: GoalId,
        action: GoalAction,
    ) -> Result<SyncOutcome, ClientError> {
        let pending = self.board.lock().await.begin_action(goal_id, action)?;
        let form = GoalActionForm {
            action: action.tag().to_string(),
            goal_id,
        };

        let reply = self.post_form::<_, GoalActionResponse>("/api/goals/action", &form).await;
        match reply {
            Ok(body) if body.success => {
                if let Some(message) = &body.message {
                    info!(goal_id, %action, "{message}");
                }
                Ok(self.board.lock().await.confirm_action(&pending))
            }
            Ok(body) => {
                let message = body.error.unwrap_or_else(|| "Unknown error".to_string());
                warn!(goal_id, %action, "goal action rejected: {message}");
                Err(ClientError::Rejected(message))
            }
            Err(err) => {
                error!(goal_id, %action, "goal action failed: {err}");
                Err(err)
            }
        }
    }

    async fn post_form<F, R>(&self, path: &str, form: &F) -> Result<R, ClientError>
    where
        F: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).form(form).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
