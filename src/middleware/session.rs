use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::AppError;
use crate::state::AppState;
use crate::views::Page;

pub const SESSION_COOKIE: &str = "wanderlust.sid";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Session cookie is not a valid header value")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Everything the server keeps between requests for one browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl SessionData {
    fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.notices.is_empty() && self.redirect_url.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    iat: i64,
    exp: i64,
}

/// Signs and verifies the session cookie.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    max_age: Duration,
    secure: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, max_age_days: i64, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            max_age: Duration::days(max_age_days),
            secure,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.session_secret, config.session_max_age_days, config.secure_cookies)
    }

    pub fn encode(&self, data: &SessionData) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            data: data.clone(),
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn decode(&self, token: &str) -> Result<SessionData, SessionError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims.data)
    }

    /// `Set-Cookie` value for `data`; an empty session expires the cookie.
    pub fn set_cookie(&self, data: &SessionData) -> Result<HeaderValue, SessionError> {
        let secure = if self.secure { "; Secure" } else { "" };
        let cookie = if data.is_empty() {
            format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
        } else {
            format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
                self.encode(data)?,
                self.max_age.num_seconds()
            )
        };
        Ok(HeaderValue::from_str(&cookie)?)
    }
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

/// Per-request context: identity, one-shot notices and redirect memory.
///
/// Extracted from the signed cookie at the start of the request, mutated by
/// guards and handlers, and written back by [`Session::respond`].
pub struct Session {
    data: SessionData,
    user: Option<CurrentUser>,
    keys: Arc<SessionKeys>,
    dirty: bool,
}

impl Session {
    pub fn new(data: SessionData, user: Option<CurrentUser>, keys: Arc<SessionKeys>) -> Self {
        Self { data, user, keys, dirty: false }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn flash(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.data.notices.push(Notice { kind, message: message.into() });
        self.dirty = true;
    }

    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.flash(NoticeKind::Success, message);
    }

    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flash(NoticeKind::Error, message);
    }

    /// Context for a rendered page. Consumes the pending notices.
    pub fn page(&mut self) -> Page {
        if !self.data.notices.is_empty() {
            self.dirty = true;
        }
        Page {
            user: self.user.clone(),
            notices: std::mem::take(&mut self.data.notices),
        }
    }

    pub fn remember_redirect(&mut self, url: impl Into<String>) {
        self.data.redirect_url = Some(url.into());
        self.dirty = true;
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.data.redirect_url.as_deref()
    }

    pub fn take_redirect(&mut self) -> Option<String> {
        let url = self.data.redirect_url.take();
        if url.is_some() {
            self.dirty = true;
        }
        url
    }

    pub fn log_in(&mut self, user: &User) {
        self.data.user_id = Some(user.id);
        self.user = Some(CurrentUser::from(user));
        self.dirty = true;
    }

    pub fn log_out(&mut self) {
        self.data.user_id = None;
        self.user = None;
        self.dirty = true;
    }

    /// Attaches the session cookie to `response` when the session changed.
    pub fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.dirty {
            match self.keys.set_cookie(&self.data) {
                Ok(cookie) => {
                    response.headers_mut().append(header::SET_COOKIE, cookie);
                }
                Err(e) => tracing::error!("Failed to write session cookie: {}", e),
            }
        }
        response
    }

    pub fn redirect(self, location: &str) -> Response {
        self.respond(Redirect::to(location))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut data = match cookie_value(&parts.headers, SESSION_COOKIE) {
            Some(token) if !token.is_empty() => state.sessions.decode(token).unwrap_or_else(|e| {
                tracing::debug!("Discarding session cookie: {}", e);
                SessionData::default()
            }),
            _ => SessionData::default(),
        };

        // Re-resolve the identity on every request so removed users are logged out.
        let mut dirty = false;
        let user = match data.user_id {
            Some(id) => match state.store.find_user(id).await? {
                Some(user) => Some(CurrentUser::from(&user)),
                None => {
                    data.user_id = None;
                    dirty = true;
                    None
                }
            },
            None => None,
        };

        let mut session = Session::new(data, user, state.sessions.clone());
        session.dirty = dirty;
        Ok(session)
    }
}
