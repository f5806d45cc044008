use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::Uri,
    response::Response,
    Form,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::LISTING_MISSING;
use crate::error::AppError;
use crate::guard;
use crate::middleware::ownership::REVIEW_NOT_FOUND;
use crate::middleware::{require_login, require_review_author, Session};
use crate::state::AppState;
use crate::validation::ReviewInput;

/// POST /listings/:id/reviews
pub async fn create(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    Path(id): Path<String>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));
    let Form(fields) = form.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let input = ReviewInput::from_form(&fields)?;

    let review = match Uuid::parse_str(&id) {
        Ok(listing_id) => state.store.add_review(listing_id, input.authored_by(user.id)).await?,
        Err(_) => None,
    };

    let Some(review) = review else {
        session.flash_error(LISTING_MISSING);
        return Ok(session.redirect("/listings"));
    };

    tracing::info!("User {} reviewed listing {} ({})", user.id, id, review.id);
    session.flash_success("New Review Created!");
    Ok(session.redirect(&format!("/listings/{id}")))
}

/// DELETE /listings/:id/reviews/:review_id
pub async fn destroy(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));

    let Ok(listing_id) = Uuid::parse_str(&id) else {
        session.flash_error(LISTING_MISSING);
        return Ok(session.redirect("/listings"));
    };
    let review = guard!(
        session,
        require_review_author(state.store.as_ref(), &mut session, &user, listing_id, &review_id).await
    );

    if !state.store.remove_review(listing_id, review.id).await? {
        session.flash_error(REVIEW_NOT_FOUND);
        return Ok(session.redirect(&format!("/listings/{listing_id}")));
    }

    tracing::info!("User {} deleted review {} on listing {}", user.id, review.id, listing_id);
    session.flash_success("Review Deleted!");
    Ok(session.redirect(&format!("/listings/{listing_id}")))
}
