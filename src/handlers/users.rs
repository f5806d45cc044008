use axum::{extract::State, response::Response, Form};
use serde::Deserialize;

use crate::auth::{self, Registration, INVALID_CREDENTIALS};
use crate::database::StoreError;
use crate::error::AppError;
use crate::middleware::Session;
use crate::state::AppState;
use crate::views;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Only same-site paths are followed after login.
fn local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

pub async fn signup_form(mut session: Session) -> Response {
    let page = session.page();
    session.respond(views::users::signup(&page))
}

pub async fn signup(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
    };

    if let Some(message) = registration.missing_field() {
        session.flash_error(message);
        return Ok(session.redirect("/signup"));
    }

    let cost = state.config.security.password_hash_cost;
    let user = match auth::register(state.store.as_ref(), registration, cost).await {
        Ok(user) => user,
        Err(AppError::Store(err @ StoreError::UsernameTaken(_))) => {
            session.flash_error(err.to_string());
            return Ok(session.redirect("/signup"));
        }
        Err(err) => return Err(err),
    };

    session.log_in(&user);
    session.flash_success("Welcome to Wanderlust!");
    Ok(session.redirect("/listings"))
}

pub async fn login_form(mut session: Session) -> Response {
    let page = session.page();
    session.respond(views::users::login(&page))
}

pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = auth::authenticate(state.store.as_ref(), &form.username, form.password).await? else {
        tracing::debug!("Failed login for {:?}", form.username);
        session.flash_error(INVALID_CREDENTIALS);
        return Ok(session.redirect("/login"));
    };

    session.log_in(&user);
    let target = session
        .take_redirect()
        .filter(|url| local_path(url))
        .unwrap_or_else(|| "/listings".to_string());

    tracing::info!("User {} logged in", user.id);
    session.flash_success("Welcome back to Wanderlust!");
    Ok(session.redirect(&target))
}

pub async fn logout(mut session: Session) -> Response {
    if let Some(user) = session.user() {
        tracing::info!("User {} logged out", user.id);
    }
    session.log_out();
    session.flash_success("You are logged out");
    session.redirect("/listings")
}
