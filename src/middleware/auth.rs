use axum::http::Uri;
use uuid::Uuid;

use super::session::Session;
use super::Halt;
use crate::database::models::User;

pub const LOGIN_REQUIRED: &str = "You must be logged in to do that!";

/// Authenticated identity resolved from the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Auth gate. Returns the logged-in user, or remembers the requested URL and
/// sends the browser to the login page.
pub fn require_login(session: &mut Session, uri: &Uri) -> Result<CurrentUser, Halt> {
    if let Some(user) = session.user() {
        return Ok(user.clone());
    }

    let original = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    tracing::debug!("Anonymous request to {} redirected to login", original);

    session.remember_redirect(original);
    session.flash_error(LOGIN_REQUIRED);
    Err(Halt::redirect("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::session::{SessionData, SessionKeys};
    use crate::middleware::NoticeKind;
    use std::sync::Arc;

    fn session(user: Option<CurrentUser>) -> Session {
        Session::new(SessionData::default(), user, Arc::new(SessionKeys::new("s", 1, false)))
    }

    #[test]
    fn passes_authenticated_user_through() {
        let user = CurrentUser { id: Uuid::new_v4(), username: "ann".to_string(), email: "a@x.io".to_string() };
        let mut session = session(Some(user.clone()));

        let result = require_login(&mut session, &Uri::from_static("/listing/new"));
        assert_eq!(result.unwrap(), user);
        assert!(session.data().notices.is_empty());
        assert!(session.redirect_url().is_none());
    }

    #[test]
    fn anonymous_request_is_sent_to_login_and_remembered() {
        let mut session = session(None);

        let result = require_login(&mut session, &Uri::from_static("/listings/abc/edit?tab=photos"));
        assert!(matches!(result, Err(Halt::Redirect(ref to)) if to == "/login"));
        assert_eq!(session.redirect_url(), Some("/listings/abc/edit?tab=photos"));
        assert_eq!(session.data().notices[0].kind, NoticeKind::Error);
        assert_eq!(session.data().notices[0].message, LOGIN_REQUIRED);
    }
}
