//! Goal lifecycle actions and the server-side mutations behind the task and
//! goal endpoints.

use crate::models::{AppData, GoalId, GoalStatus, TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GoalAction {
    Complete,
    Missed,
    Pause,
    Resume,
    Delete,
}

/// What a confirmed action does to a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SetStatus(GoalStatus),
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown goal action: {0:?}")]
pub struct ParseGoalActionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    #[error("Goal not found")]
    GoalNotFound(GoalId),
    #[error("Task not found")]
    TaskNotFound(TaskId),
    #[error("Unknown action")]
    UnknownAction(#[from] ParseGoalActionError),
}

impl GoalAction {
    pub const ALL: [GoalAction; 5] = [
        GoalAction::Complete,
        GoalAction::Missed,
        GoalAction::Pause,
        GoalAction::Resume,
        GoalAction::Delete,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            GoalAction::Complete => "mark-complete",
            GoalAction::Missed => "missed",
            GoalAction::Pause => "pause",
            GoalAction::Resume => "resume",
            GoalAction::Delete => "delete",
        }
    }

    pub fn transition(self) -> Transition {
        match self {
            GoalAction::Complete => Transition::SetStatus(GoalStatus::Completed),
            GoalAction::Missed => Transition::SetStatus(GoalStatus::Missed),
            GoalAction::Pause => Transition::SetStatus(GoalStatus::OnHold),
            GoalAction::Resume => Transition::SetStatus(GoalStatus::InProgress),
            GoalAction::Delete => Transition::Remove,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            GoalAction::Complete => "Goal marked as complete",
            GoalAction::Missed => "Goal marked as missed",
            GoalAction::Pause => "Goal paused",
            GoalAction::Resume => "Goal resumed",
            GoalAction::Delete => "Goal deleted",
        }
    }

    /// Menu text for the card dropdown.
    pub fn menu_label(self) -> &'static str {
        match self {
            GoalAction::Complete => "Mark complete",
            GoalAction::Missed => "Mark missed",
            GoalAction::Pause => "Pause",
            GoalAction::Resume => "Resume",
            GoalAction::Delete => "Delete",
        }
    }
}

impl fmt::Display for GoalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GoalAction {
    type Err = ParseGoalActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        GoalAction::ALL
            .into_iter()
            .find(|action| action.tag() == tag)
            .ok_or_else(|| ParseGoalActionError(tag.to_string()))
    }
}

impl TryFrom<String> for GoalAction {
    type Error = ParseGoalActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GoalAction> for String {
    fn from(action: GoalAction) -> Self {
        action.tag().to_string()
    }
}

/// Sets the completion flag of one of `user_id`'s tasks. Re-applying the
/// current value succeeds.
pub fn set_task_completion(
    data: &mut AppData,
    user_id: UserId,
    task_id: TaskId,
    completed: bool,
) -> Result<GoalId, GoalError> {
    data.goals
        .values_mut()
        .filter(|goal| goal.user_id == user_id)
        .find_map(|goal| {
            let goal_id = goal.id;
            goal.tasks
                .iter_mut()
                .find(|task| task.id == task_id)
                .map(|task| {
                    task.completed = completed;
                    goal_id
                })
        })
        .ok_or(GoalError::TaskNotFound(task_id))
}

/// Applies `action` to one of `user_id`'s goals and returns the message shown
/// to the user.
pub fn apply_goal_action(
    data: &mut AppData,
    user_id: UserId,
    goal_id: GoalId,
    action: GoalAction,
) -> Result<&'static str, GoalError> {
    let owned = data
        .goals
        .get(&goal_id)
        .is_some_and(|goal| goal.user_id == user_id);
    if !owned {
        return Err(GoalError::GoalNotFound(goal_id));
    }

    match action.transition() {
        Transition::SetStatus(status) => {
            if let Some(goal) = data.goals.get_mut(&goal_id) {
                goal.status = status;
            }
        }
        Transition::Remove => {
            data.goals.remove(&goal_id);
        }
    }
    Ok(action.success_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (AppData, UserId, UserId) {
        let mut data = AppData::default();
        let owner = data.insert_user("ana".into(), "ana@example.com".into(), "x".into());
        let other = data.insert_user("ben".into(), "ben@example.com".into(), "x".into());
        data.insert_goal(owner, "Read".into(), vec!["Book one".into(), "Book two".into()]);
        data.insert_goal(other, "Swim".into(), vec!["Lap".into()]);
        (data, owner, other)
    }

    #[test]
    fn parses_every_tag_and_rejects_unknown() {
        for action in GoalAction::ALL {
            assert_eq!(action.tag().parse::<GoalAction>(), Ok(action));
        }
        assert_eq!(
            "archive".parse::<GoalAction>(),
            Err(ParseGoalActionError("archive".into()))
        );
    }

    #[test]
    fn transition_table_matches_status_labels() {
        let labels: Vec<_> = GoalAction::ALL
            .into_iter()
            .filter_map(|action| match action.transition() {
                Transition::SetStatus(status) => Some(status.label()),
                Transition::Remove => None,
            })
            .collect();
        assert_eq!(labels, ["Completed", "MISSED", "ON_HOLD", "IN_PROGRESS"]);
        assert_eq!(GoalAction::Delete.transition(), Transition::Remove);
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&GoalAction::Complete).unwrap();
        assert_eq!(json, "\"mark-complete\"");
        assert!(serde_json::from_str::<GoalAction>("\"nope\"").is_err());
    }

    #[test]
    fn task_toggle_is_idempotent() {
        let (mut data, owner, _) = fixture();
        assert_eq!(set_task_completion(&mut data, owner, 1, true), Ok(1));
        assert_eq!(set_task_completion(&mut data, owner, 1, true), Ok(1));
        assert!(data.goals[&1].tasks[0].completed);
        set_task_completion(&mut data, owner, 1, false).unwrap();
        assert!(!data.goals[&1].tasks[0].completed);
    }

    #[test]
    fn foreign_task_is_not_found() {
        let (mut data, owner, _) = fixture();
        assert_eq!(
            set_task_completion(&mut data, owner, 3, true),
            Err(GoalError::TaskNotFound(3))
        );
        assert!(!data.goals[&2].tasks[0].completed);
    }

    #[test]
    fn pause_then_resume() {
        let (mut data, owner, _) = fixture();
        apply_goal_action(&mut data, owner, 1, GoalAction::Pause).unwrap();
        assert_eq!(data.goals[&1].status, GoalStatus::OnHold);
        let message = apply_goal_action(&mut data, owner, 1, GoalAction::Resume).unwrap();
        assert_eq!(message, "Goal resumed");
        assert_eq!(data.goals[&1].status, GoalStatus::InProgress);
    }

    #[test]
    fn delete_removes_only_that_goal() {
        let (mut data, owner, other) = fixture();
        apply_goal_action(&mut data, owner, 1, GoalAction::Delete).unwrap();
        assert!(!data.goals.contains_key(&1));
        assert!(data.goals.contains_key(&2));
        assert_eq!(
            apply_goal_action(&mut data, other, 1, GoalAction::Complete),
            Err(GoalError::GoalNotFound(1))
        );
    }

    #[test]
    fn cannot_act_on_foreign_goal() {
        let (mut data, owner, _) = fixture();
        assert_eq!(
            apply_goal_action(&mut data, owner, 2, GoalAction::Delete),
            Err(GoalError::GoalNotFound(2))
        );
        assert!(data.goals.contains_key(&2));
    }
}
