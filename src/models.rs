use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type UserId = u64;
pub type GoalId = u64;
pub type TaskId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Completed,
    Missed,
    OnHold,
}

impl GoalStatus {
    /// Text shown in the status line of a goal card.
    pub fn label(self) -> &'static str {
        match self {
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Completed => "Completed",
            GoalStatus::Missed => "MISSED",
            GoalStatus::OnHold => "ON_HOLD",
        }
    }

    /// Value used for `data-status` attributes and on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::Missed => "MISSED",
            GoalStatus::OnHold => "ON_HOLD",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<UserId, User>,
    #[serde(default)]
    pub goals: BTreeMap<GoalId, Goal>,
    #[serde(default)]
    pub next_user_id: UserId,
    #[serde(default)]
    pub next_goal_id: GoalId,
    #[serde(default)]
    pub next_task_id: TaskId,
}

impl AppData {
    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    pub fn goals_for_user(&self, user_id: UserId) -> impl Iterator<Item = &Goal> {
        self.goals.values().filter(move |goal| goal.user_id == user_id)
    }

    pub fn insert_user(&mut self, username: String, email: String, password_hash: String) -> UserId {
        self.next_user_id += 1;
        let id = self.next_user_id;
        self.users.insert(
            id,
            User {
                id,
                username,
                email,
                password_hash,
            },
        );
        id
    }

    pub fn insert_goal(&mut self, user_id: UserId, title: String, task_titles: Vec<String>) -> GoalId {
        self.next_goal_id += 1;
        let id = self.next_goal_id;
        let tasks = task_titles
            .into_iter()
            .map(|title| {
                self.next_task_id += 1;
                Task {
                    id: self.next_task_id,
                    title,
                    completed: false,
                }
            })
            .collect();
        self.goals.insert(
            id,
            Goal {
                id,
                user_id,
                title,
                status: GoalStatus::InProgress,
                tasks,
                created_at: Utc::now(),
            },
        );
        id
    }
}

/// Identity stored in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdateForm {
    pub task_id: TaskId,
    pub completed: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalActionForm {
    pub action: String,
    #[serde(rename = "goalId")]
    pub goal_id: GoalId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdateResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskUpdateResponse {
    pub const SUCCESS: &'static str = "success";

    pub fn success() -> Self {
        Self {
            status: Self::SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GoalActionResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSnapshot {
    pub id: GoalId,
    pub title: String,
    pub status: GoalStatus,
    pub tasks: Vec<Task>,
}

impl From<&Goal> for GoalSnapshot {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id,
            title: goal.title.clone(),
            status: goal.status,
            tasks: goal.tasks.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoalsResponse {
    pub goals: Vec<GoalSnapshot>,
}
