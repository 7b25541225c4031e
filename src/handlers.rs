use crate::auth::{self, LoginError};
use crate::board::Board;
use crate::errors::AppError;
use crate::goals::{self, GoalAction, GoalError};
use crate::models::{
    GoalActionForm, GoalActionResponse, GoalSnapshot, GoalsResponse, LoginForm, SessionUser,
    TaskUpdateForm, TaskUpdateResponse,
};
use crate::session;
use crate::state::AppState;
use crate::ui::{render_dashboard, render_login};
use axum::{
    Form, Json,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, warn};

pub async fn login_page(session: Session) -> Result<Response, AppError> {
    if session::current_user(&session).await?.is_some() {
        return Ok(Redirect::to(session::LANDING_PATH).into_response());
    }
    Ok(Html(render_login(&[], "")).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = match auth::validate(&form) {
        Ok(credentials) => credentials,
        Err(err) => return Ok(login_failed(&err, &form)),
    };

    let stored = state
        .read()
        .await
        .find_user_by_username(&credentials.username)
        .cloned();
    let verified =
        tokio::task::spawn_blocking(move || auth::verify_credentials(&credentials, stored.as_ref()))
            .await?;

    match verified {
        Ok(user) => Ok(session::establish(&session, user).await?.into_response()),
        Err(err) => Ok(login_failed(&err, &form)),
    }
}

fn login_failed(err: &LoginError, form: &LoginForm) -> Response {
    Html(render_login(&err.messages(), form.username.trim())).into_response()
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    session::destroy(&session).await?;
    Ok(Redirect::to(session::LOGIN_PATH))
}

pub async fn dashboard(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let Some(user) = session::current_user(&session).await? else {
        return Ok(Redirect::to(session::LOGIN_PATH).into_response());
    };
    let board = Board::from_snapshot(snapshot_for(&state, &user).await);
    Ok(Html(render_dashboard(&user, &board.view())).into_response())
}

pub async fn list_goals(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<GoalsResponse>, AppError> {
    let user = session::require_user(&session).await?;
    Ok(Json(snapshot_for(&state, &user).await))
}

pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<TaskUpdateForm>,
) -> Result<Json<TaskUpdateResponse>, AppError> {
    let user = session::require_user(&session).await?;
    let completed = match form.completed {
        0 => false,
        1 => true,
        other => {
            warn!(task_id = form.task_id, completed = other, "invalid completion flag");
            return Ok(Json(TaskUpdateResponse::error("completed must be 0 or 1")));
        }
    };

    let result = state
        .mutate(|data| goals::set_task_completion(data, user.id, form.task_id, completed))
        .await?;
    match result {
        Ok(goal_id) => {
            info!(user_id = user.id, goal_id, task_id = form.task_id, completed, "task updated");
            Ok(Json(TaskUpdateResponse::success()))
        }
        Err(err) => {
            warn!(user_id = user.id, task_id = form.task_id, "task update rejected: {err}");
            Ok(Json(TaskUpdateResponse::error(err.to_string())))
        }
    }
}

pub async fn goal_action(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GoalActionForm>,
) -> Result<Json<GoalActionResponse>, AppError> {
    let user = session::require_user(&session).await?;
    let action = match form.action.parse::<GoalAction>() {
        Ok(action) => action,
        Err(err) => {
            warn!(user_id = user.id, goal_id = form.goal_id, "{err}");
            return Ok(Json(GoalActionResponse::error(GoalError::from(err).to_string())));
        }
    };

    let result = state
        .mutate(|data| goals::apply_goal_action(data, user.id, form.goal_id, action))
        .await?;
    match result {
        Ok(message) => {
            info!(user_id = user.id, goal_id = form.goal_id, %action, "goal action applied");
            Ok(Json(GoalActionResponse::success(message)))
        }
        Err(err) => {
            warn!(user_id = user.id, goal_id = form.goal_id, %action, "goal action rejected: {err}");
            Ok(Json(GoalActionResponse::error(err.to_string())))
        }
    }
}

async fn snapshot_for(state: &AppState, user: &SessionUser) -> GoalsResponse {
    let data = state.read().await;
    GoalsResponse {
        goals: data.goals_for_user(user.id).map(GoalSnapshot::from).collect(),
    }
}
