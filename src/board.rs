//! Client-side mirror of the user's goals.
//!
//! The board only changes when the server confirms a change. Every request is
//! stamped with a per-entity sequence number; a confirmation older than the
//! last one applied for the same task or goal is dropped, so responses that
//! arrive out of order cannot roll the board back. Rendering goes through
//! [`Board::view`], a pure projection of the stored state.

use crate::goals::{GoalAction, Transition};
use crate::models::{GoalId, GoalSnapshot, GoalStatus, GoalsResponse, TaskId};
use crate::progress::Progress;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

pub const ALL_COMPLETE_BANNER: &str = "Congratulations! You have completed all tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Entity {
    Task(TaskId),
    Goal(GoalId),
}

#[derive(Debug, Clone, Copy, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
}

#[derive(Debug, Clone)]
struct TaskEntry {
    id: TaskId,
    title: String,
    completed: bool,
}

#[derive(Debug, Clone)]
struct GoalEntry {
    title: String,
    status: GoalStatus,
    tasks: Vec<TaskEntry>,
}

/// A task toggle waiting for the server's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    pub task_id: TaskId,
    pub completed: bool,
    pub seq: u64,
}

/// A goal action waiting for the server's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAction {
    pub goal_id: GoalId,
    pub action: GoalAction,
    pub seq: u64,
}

/// Result of applying a confirmed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// A newer request for the same entity was already applied.
    Stale,
    /// The task or goal left the board while the request was in flight.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("task {0} is not on the board")]
    UnknownTask(TaskId),
    #[error("goal {0} is not on the board")]
    UnknownGoal(GoalId),
}

#[derive(Debug, Default)]
pub struct Board {
    goals: BTreeMap<GoalId, GoalEntry>,
    task_goal: HashMap<TaskId, GoalId>,
    sequences: HashMap<Entity, Sequence>,
}

impl Board {
    pub fn from_snapshot(snapshot: GoalsResponse) -> Self {
        let mut board = Self::default();
        board.replace_snapshot(snapshot);
        board
    }

    /// Replaces goals and tasks with the server's view. Sequence counters
    /// survive so confirmations for requests issued earlier still compare
    /// correctly.
    pub fn replace_snapshot(&mut self, snapshot: GoalsResponse) {
        self.goals.clear();
        self.task_goal.clear();
        for goal in snapshot.goals {
            self.insert_goal(goal);
        }
        debug!(goals = self.goals.len(), tasks = self.task_goal.len(), "board rebuilt");
    }

    fn insert_goal(&mut self, goal: GoalSnapshot) {
        let tasks = goal
            .tasks
            .into_iter()
            .map(|task| {
                self.task_goal.insert(task.id, goal.id);
                TaskEntry {
                    id: task.id,
                    title: task.title,
                    completed: task.completed,
                }
            })
            .collect();
        self.goals.insert(
            goal.id,
            GoalEntry {
                title: goal.title,
                status: goal.status,
                tasks,
            },
        );
    }

    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.task_goal.contains_key(&task_id)
    }

    pub fn contains_goal(&self, goal_id: GoalId) -> bool {
        self.goals.contains_key(&goal_id)
    }

    pub fn task_completed(&self, task_id: TaskId) -> Option<bool> {
        let goal_id = self.task_goal.get(&task_id)?;
        self.goals
            .get(goal_id)?
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .map(|task| task.completed)
    }

    pub fn goal_status(&self, goal_id: GoalId) -> Option<GoalStatus> {
        self.goals.get(&goal_id).map(|goal| goal.status)
    }

    fn next_seq(&mut self, entity: Entity) -> u64 {
        let seq = self.sequences.entry(entity).or_default();
        seq.issued += 1;
        seq.issued
    }

    /// Returns `false` if a newer request for `entity` has already been applied.
    fn accept(&mut self, entity: Entity, seq: u64) -> bool {
        let entry = self.sequences.entry(entity).or_default();
        if seq <= entry.applied {
            return false;
        }
        entry.applied = seq;
        true
    }

    pub fn begin_toggle(&mut self, task_id: TaskId, completed: bool) -> Result<PendingToggle, BoardError> {
        if !self.contains_task(task_id) {
            return Err(BoardError::UnknownTask(task_id));
        }
        let seq = self.next_seq(Entity::Task(task_id));
        Ok(PendingToggle {
            task_id,
            completed,
            seq,
        })
    }

    /// Applies a toggle the server accepted.
    pub fn confirm_toggle(&mut self, pending: &PendingToggle) -> SyncOutcome {
        let Some(goal_id) = self.task_goal.get(&pending.task_id).copied() else {
            debug!(task_id = pending.task_id, "toggle confirmed for a task no longer on the board");
            return SyncOutcome::Missing;
        };
        if !self.accept(Entity::Task(pending.task_id), pending.seq) {
            debug!(task_id = pending.task_id, seq = pending.seq, "stale toggle dropped");
            return SyncOutcome::Stale;
        }
        let task = self
            .goals
            .get_mut(&goal_id)
            .and_then(|goal| goal.tasks.iter_mut().find(|task| task.id == pending.task_id));
        match task {
            Some(task) => {
                task.completed = pending.completed;
                SyncOutcome::Applied
            }
            None => SyncOutcome::Missing,
        }
    }

    pub fn begin_action(&mut self, goal_id: GoalId, action: GoalAction) -> Result<PendingAction, BoardError> {
        if !self.contains_goal(goal_id) {
            return Err(BoardError::UnknownGoal(goal_id));
        }
        let seq = self.next_seq(Entity::Goal(goal_id));
        Ok(PendingAction {
            goal_id,
            action,
            seq,
        })
    }

    /// Applies a goal action the server accepted.
    pub fn confirm_action(&mut self, pending: &PendingAction) -> SyncOutcome {
        if !self.contains_goal(pending.goal_id) {
            debug!(goal_id = pending.goal_id, "action confirmed for a goal no longer on the board");
            return SyncOutcome::Missing;
        }
        if !self.accept(Entity::Goal(pending.goal_id), pending.seq) {
            debug!(goal_id = pending.goal_id, seq = pending.seq, "stale action dropped");
            return SyncOutcome::Stale;
        }
        match pending.action.transition() {
            Transition::SetStatus(status) => {
                if let Some(goal) = self.goals.get_mut(&pending.goal_id) {
                    goal.status = status;
                }
            }
            Transition::Remove => {
                // Deleted ids are never reissued, so their counters can go too.
                if let Some(goal) = self.goals.remove(&pending.goal_id) {
                    for task in goal.tasks {
                        self.task_goal.remove(&task.id);
                        self.sequences.remove(&Entity::Task(task.id));
                    }
                }
                self.sequences.remove(&Entity::Goal(pending.goal_id));
            }
        }
        SyncOutcome::Applied
    }

    pub fn overall_progress(&self) -> Progress {
        self.goals.values().map(GoalEntry::progress).sum()
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            overall: ProgressView::from(self.overall_progress()),
            goals: self
                .goals
                .iter()
                .map(|(id, goal)| goal.view(*id))
                .collect(),
        }
    }
}

impl GoalEntry {
    fn progress(&self) -> Progress {
        Progress::from_flags(self.tasks.iter().map(|task| task.completed))
    }

    fn view(&self, id: GoalId) -> GoalView {
        let progress = self.progress();
        let all_complete = progress.is_complete();
        GoalView {
            id,
            title: self.title.clone(),
            status: self.status,
            status_label: self.status.label(),
            progress: ProgressView::from(progress),
            banner: all_complete.then_some(ALL_COMPLETE_BANNER),
            tasks: self
                .tasks
                .iter()
                .map(|task| TaskView {
                    id: task.id,
                    title: task.title.clone(),
                    completed: task.completed,
                    struck_through: task.completed,
                })
                .collect(),
        }
    }
}

/// Everything the dashboard draws, derived from a [`Board`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub overall: ProgressView,
    pub goals: Vec<GoalView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    pub id: GoalId,
    pub title: String,
    pub status: GoalStatus,
    pub status_label: &'static str,
    pub progress: ProgressView,
    pub banner: Option<&'static str>,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub struck_through: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub percent: u32,
    pub label: String,
    pub width: String,
}

impl From<Progress> for ProgressView {
    fn from(progress: Progress) -> Self {
        Self {
            percent: progress.floor_percent(),
            label: progress.label(),
            width: progress.width(),
        }
    }
}

impl BoardView {
    pub fn goal(&self, goal_id: GoalId) -> Option<&GoalView> {
        self.goals.iter().find(|goal| goal.id == goal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn goal(id: GoalId, first_task: TaskId, done: &[bool]) -> GoalSnapshot {
        GoalSnapshot {
            id,
            title: format!("Goal {id}"),
            status: GoalStatus::InProgress,
            tasks: done
                .iter()
                .enumerate()
                .map(|(i, completed)| Task {
                    id: first_task + i as TaskId,
                    title: format!("Task {}", first_task + i as TaskId),
                    completed: *completed,
                })
                .collect(),
        }
    }

    /// Goal 1 has tasks 1..=4 with two done; goal 2 has tasks 11..=16 with three done.
    fn sample_board() -> Board {
        Board::from_snapshot(GoalsResponse {
            goals: vec![
                goal(1, 1, &[true, true, false, false]),
                goal(2, 11, &[true, false, true, false, true, false]),
            ],
        })
    }

    fn toggle(board: &mut Board, task_id: TaskId, completed: bool) -> SyncOutcome {
        let pending = board.begin_toggle(task_id, completed).unwrap();
        board.confirm_toggle(&pending)
    }

    #[test]
    fn ten_tasks_across_two_goals_all_at_half() {
        let view = sample_board().view();
        assert_eq!(view.overall.label, "50%");
        assert_eq!(view.goal(1).unwrap().progress.label, "50%");
        assert_eq!(view.goal(2).unwrap().progress.label, "50%");
        assert_eq!(view.overall.width, "50%");
    }

    #[test]
    fn per_goal_percent_is_floored_and_banner_tracks_completion() {
        let mut board = Board::from_snapshot(GoalsResponse {
            goals: vec![goal(1, 1, &[true, false, false])],
        });
        assert_eq!(board.view().goal(1).unwrap().progress.percent, 33);
        assert_eq!(board.view().goal(1).unwrap().banner, None);

        toggle(&mut board, 2, true);
        assert_eq!(board.view().goal(1).unwrap().progress.percent, 66);
        toggle(&mut board, 3, true);
        let view = board.view();
        let goal = view.goal(1).unwrap();
        assert_eq!(goal.progress.label, "100%");
        assert_eq!(goal.banner, Some(ALL_COMPLETE_BANNER));
    }

    #[test]
    fn nothing_changes_before_confirmation() {
        let mut board = sample_board();
        let before = board.view();
        let _pending = board.begin_toggle(3, true).unwrap();
        assert_eq!(board.view(), before);
        assert_eq!(board.task_completed(3), Some(false));
    }

    #[test]
    fn toggle_round_trip_restores_view() {
        let mut board = sample_board();
        let before = board.view();
        assert_eq!(toggle(&mut board, 3, true), SyncOutcome::Applied);
        let after = board.view();
        assert!(after.goal(1).unwrap().tasks[2].struck_through);
        assert_eq!(after.overall.label, "60%");
        assert_eq!(toggle(&mut board, 3, false), SyncOutcome::Applied);
        assert_eq!(board.view(), before);
    }

    #[test]
    fn stale_confirmation_is_dropped() {
        let mut board = sample_board();
        let older = board.begin_toggle(3, true).unwrap();
        let newer = board.begin_toggle(3, false).unwrap();
        assert!(newer.seq > older.seq);

        assert_eq!(board.confirm_toggle(&newer), SyncOutcome::Applied);
        assert_eq!(board.confirm_toggle(&older), SyncOutcome::Stale);
        assert_eq!(board.task_completed(3), Some(false));
    }

    #[test]
    fn in_order_confirmations_all_apply() {
        let mut board = sample_board();
        let first = board.begin_action(1, GoalAction::Pause).unwrap();
        let second = board.begin_action(1, GoalAction::Resume).unwrap();
        assert_eq!(board.confirm_action(&first), SyncOutcome::Applied);
        assert_eq!(board.goal_status(1), Some(GoalStatus::OnHold));
        assert_eq!(board.confirm_action(&second), SyncOutcome::Applied);
        assert_eq!(board.goal_status(1), Some(GoalStatus::InProgress));
    }

    #[test]
    fn status_actions_set_labels() {
        let mut board = sample_board();
        for (action, label) in [
            (GoalAction::Complete, "Completed"),
            (GoalAction::Missed, "MISSED"),
            (GoalAction::Pause, "ON_HOLD"),
            (GoalAction::Resume, "IN_PROGRESS"),
        ] {
            let pending = board.begin_action(2, action).unwrap();
            board.confirm_action(&pending);
            assert_eq!(board.view().goal(2).unwrap().status_label, label);
        }
    }

    #[test]
    fn delete_removes_exactly_one_goal() {
        let mut board = sample_board();
        let before = board.view();
        let pending = board.begin_action(1, GoalAction::Delete).unwrap();
        assert_eq!(board.confirm_action(&pending), SyncOutcome::Applied);

        let after = board.view();
        assert!(after.goal(1).is_none());
        assert_eq!(after.goal(2), before.goal(2));
        assert!(!board.contains_task(1));
        assert_eq!(after.overall.label, "50%");
    }

    #[test]
    fn delete_drops_sequence_counters_for_goal_and_tasks() {
        let mut board = sample_board();
        let unchecked = board.begin_toggle(1, false).unwrap();
        board.confirm_toggle(&unchecked);
        board.begin_action(2, GoalAction::Pause).unwrap();
        let delete = board.begin_action(1, GoalAction::Delete).unwrap();
        board.confirm_action(&delete);

        assert!(!board.sequences.contains_key(&Entity::Goal(1)));
        assert!(!board.sequences.contains_key(&Entity::Task(1)));
        assert!(board.sequences.contains_key(&Entity::Goal(2)));
        assert_eq!(board.sequences.len(), 1);
        // A late answer for the removed goal still finds nothing to change.
        assert_eq!(board.confirm_action(&delete), SyncOutcome::Missing);
        assert_eq!(board.confirm_toggle(&unchecked), SyncOutcome::Missing);
    }

    #[test]
    fn toggle_for_deleted_goal_is_a_no_op() {
        let mut board = sample_board();
        let toggle = board.begin_toggle(2, false).unwrap();
        let delete = board.begin_action(1, GoalAction::Delete).unwrap();
        board.confirm_action(&delete);

        assert_eq!(board.confirm_toggle(&toggle), SyncOutcome::Missing);
        assert_eq!(board.confirm_action(&delete), SyncOutcome::Missing);
        assert_eq!(board.begin_toggle(2, true), Err(BoardError::UnknownTask(2)));
    }

    #[test]
    fn snapshot_keeps_sequence_counters() {
        let mut board = sample_board();
        let applied = board.begin_toggle(3, true).unwrap();
        board.confirm_toggle(&applied);
        let stale = applied;

        board.replace_snapshot(GoalsResponse {
            goals: vec![goal(1, 1, &[true, true, false, false])],
        });
        assert_eq!(board.confirm_toggle(&stale), SyncOutcome::Stale);
        assert_eq!(board.begin_toggle(3, true).unwrap().seq, applied.seq + 1);
    }

    #[test]
    fn empty_board_reports_zero() {
        let view = Board::default().view();
        assert_eq!(view.overall.label, "0%");
        assert!(view.goals.is_empty());
    }
}
