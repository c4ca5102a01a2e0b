//! Page routes and form handlers
//!
//! Conventional plumbing: session-gated static shells, form POSTs, and the
//! redirects between them. The pages pull their data from `api` and live
//! updates from `ws`.

use axum::{
    body::Body,
    extract::{Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use crate::auth::{self, AuthError, SessionUser, SESSION_USER_KEY};
use crate::engine::{CreatePollError, VoteError};
use crate::error::AppError;
use crate::state::AppState;

/// Serve a static page shell from the static/ directory.
async fn serve_page(name: &str) -> Response {
    match tokio::fs::read_to_string(format!("static/{name}")).await {
        Ok(content) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Body::from(content))
            .unwrap(),
        Err(_) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Page not found"))
            .unwrap(),
    }
}

/// GET / - landing page, or straight to the dashboard when signed in
pub async fn index(session: Session) -> Response {
    if auth::current_user(&session).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    serve_page("index.html").await
}

/// GET /login
pub async fn login_page(session: Session) -> Response {
    if auth::current_user(&session).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    serve_page("login.html").await
}

/// GET /signup
pub async fn signup_page(session: Session) -> Response {
    if auth::current_user(&session).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    serve_page("signup.html").await
}

/// GET /dashboard
pub async fn dashboard(session: Session) -> Response {
    if auth::current_user(&session).await.is_none() {
        return Redirect::to("/").into_response();
    }
    serve_page("dashboard.html").await
}

/// GET /profile
pub async fn profile(session: Session) -> Response {
    if auth::current_user(&session).await.is_none() {
        return Redirect::to("/").into_response();
    }
    serve_page("profile.html").await
}

/// GET /createPoll
pub async fn create_poll_page(session: Session) -> Response {
    if auth::current_user(&session).await.is_none() {
        return Redirect::to("/").into_response();
    }
    serve_page("createPoll.html").await
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match auth::login(state.users.as_ref(), &form.username, &form.password).await {
        Ok(user) => {
            session
                .insert(SESSION_USER_KEY, SessionUser::from(&user))
                .await?;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(AuthError::Storage(e)) => Err(AppError::Storage(e)),
        Err(_) => {
            // Same generic page marker for every credential failure
            Ok(Redirect::to("/login?error=credentials").into_response())
        }
    }
}

/// POST /signup
pub async fn signup(
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match auth::signup(state.users.as_ref(), &form.username, &form.password).await {
        Ok(user) => {
            session
                .insert(SESSION_USER_KEY, SessionUser::from(&user))
                .await?;
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(AuthError::MissingFields) => Ok(Redirect::to("/signup?error=missing").into_response()),
        Err(AuthError::UsernameTaken) => Ok(Redirect::to("/signup?error=taken").into_response()),
        Err(AuthError::Storage(e)) => Err(AppError::Storage(e)),
        Err(_) => Ok(Redirect::to("/signup?error=failed").into_response()),
    }
}

/// GET /logout
pub async fn logout(session: Session) -> Result<Response, AppError> {
    session.flush().await?;
    Ok(Redirect::to("/").into_response())
}

/// POST /createPoll
///
/// The form arrives as `question` plus any number of `options[...]` fields;
/// taking the raw pairs keeps the option keys free-form.
pub async fn create_poll(
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    if auth::current_user(&session).await.is_none() {
        return Ok(Redirect::to("/").into_response());
    }

    let question = fields
        .iter()
        .find(|(key, _)| key == "question")
        .map(|(_, value)| value.clone())
        .unwrap_or_default();
    let answers: Vec<String> = fields
        .into_iter()
        .filter(|(key, _)| key.starts_with("options"))
        .map(|(_, value)| value)
        .collect();

    match state.engine.create_poll(&question, answers).await {
        Ok(_) => Ok(Redirect::to("/dashboard").into_response()),
        Err(CreatePollError::Storage(e)) => Err(AppError::Storage(e)),
        Err(CreatePollError::EmptyQuestion) => {
            Ok(Redirect::to("/createPoll?error=question").into_response())
        }
        Err(CreatePollError::NoOptions) | Err(CreatePollError::EmptyOption) => {
            Ok(Redirect::to("/createPoll?error=options").into_response())
        }
        Err(CreatePollError::DuplicateOption(_)) => {
            Ok(Redirect::to("/createPoll?error=duplicate").into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteForm {
    pub poll_id: String,
    pub selected_option: String,
}

/// POST /vote
pub async fn vote(
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<VoteForm>,
) -> Result<Response, AppError> {
    let Some(identity) = auth::current_user(&session).await else {
        return Ok(Redirect::to("/").into_response());
    };

    match state
        .engine
        .apply_vote(&form.poll_id, &form.selected_option, Some(&identity.id))
        .await
    {
        Ok(_) => Ok(Redirect::to("/dashboard").into_response()),
        Err(VoteError::PollNotFound) => {
            Err(AppError::NotFound("Poll not found".to_string()))
        }
        Err(VoteError::OptionNotFound) | Err(VoteError::AlreadyVoted) => {
            // Not a hard failure: the dashboard simply shows unchanged counts
            tracing::warn!(
                "vote by {} on poll {} not applied: no counter moved",
                identity.username,
                form.poll_id
            );
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(VoteError::Storage(_)) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error processing vote",
        )
            .into_response()),
    }
}
