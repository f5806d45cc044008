//! Request context and the guard chain run in front of the handlers.
//!
//! Guards are plain functions over the explicit [`Session`]. A guard either
//! returns the value the handler needs (the logged-in user, the owned
//! listing) or a [`Halt`], which the [`guard!`](crate::guard) macro turns
//! into an early redirect carrying the session's notices.

pub mod auth;
pub mod method_override;
pub mod ownership;
pub mod session;

pub use auth::{require_login, CurrentUser};
pub use method_override::method_override;
pub use ownership::{require_listing_owner, require_review_author};
pub use session::{Notice, NoticeKind, Session, SessionKeys};

use crate::database::StoreError;
use crate::error::AppError;

/// Why a guard stopped the request.
#[derive(Debug)]
pub enum Halt {
    /// Redirect to this location; the guard has already set a notice.
    Redirect(String),
    /// Hand the error to the error translator.
    Error(AppError),
}

impl Halt {
    pub fn redirect(location: impl Into<String>) -> Self {
        Halt::Redirect(location.into())
    }
}

impl From<StoreError> for Halt {
    fn from(err: StoreError) -> Self {
        Halt::Error(err.into())
    }
}

impl From<AppError> for Halt {
    fn from(err: AppError) -> Self {
        Halt::Error(err)
    }
}

/// Runs a guard inside a handler returning `Result<Response, AppError>`.
#[macro_export]
macro_rules! guard {
    ($session:ident, $check:expr) => {
        match $check {
            Ok(value) => value,
            Err($crate::middleware::Halt::Redirect(location)) => return Ok($session.redirect(&location)),
            Err($crate::middleware::Halt::Error(err)) => return Err(err),
        }
    };
}
