use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::Uri,
    response::Response,
};
use uuid::Uuid;

use super::form::ListingSubmission;
use super::LISTING_MISSING;
use crate::database::models::NewListing;
use crate::error::AppError;
use crate::guard;
use crate::images::{ImageUpload, StoredImage};
use crate::middleware::{require_listing_owner, require_login, Session};
use crate::state::AppState;
use crate::validation::ListingInput;
use crate::views;

async fn store_image(state: &AppState, upload: Option<ImageUpload>) -> Result<Option<StoredImage>, AppError> {
    match upload {
        Some(upload) => Ok(Some(state.images.upload(upload).await?)),
        None => Ok(None),
    }
}

/// Best-effort cleanup of an upload whose listing write did not happen.
async fn discard_image(state: &AppState, image: Option<StoredImage>) {
    let Some(image) = image else { return };
    if let Err(err) = state.images.remove(&image).await {
        tracing::warn!("Orphaned image {} left behind: {}", image.filename, err);
    }
}

fn multipart_body(multipart: Result<Multipart, MultipartRejection>) -> Result<Multipart, AppError> {
    multipart.map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// GET /listings
pub async fn index(State(state): State<AppState>, mut session: Session) -> Result<Response, AppError> {
    let listings = state.store.list_listings().await?;
    let page = session.page();
    Ok(session.respond(views::listings::index(&page, &listings)))
}

/// GET /listing/new
pub async fn new_form(mut session: Session, uri: Uri) -> Result<Response, AppError> {
    guard!(session, require_login(&mut session, &uri));

    let page = session.page();
    Ok(session.respond(views::listings::new_form(&page)))
}

/// POST /listings
pub async fn create(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));
    let submission = ListingSubmission::read(multipart_body(multipart)?).await?;
    let fields = ListingInput::from_form(&submission.fields)?.into_changes();

    let image = store_image(&state, submission.image).await?;
    let created = state
        .store
        .create_listing(NewListing { fields, image: image.clone(), owner_id: user.id })
        .await;
    let listing = match created {
        Ok(listing) => listing,
        Err(err) => {
            discard_image(&state, image).await;
            return Err(err.into());
        }
    };

    tracing::info!("User {} created listing {}", user.id, listing.id);
    session.flash_success("New Listing Created!");
    Ok(session.redirect("/listings"))
}

/// GET /listings/:id
pub async fn show(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let details = match Uuid::parse_str(&id) {
        Ok(id) => state.store.listing_details(id).await?,
        Err(_) => None,
    };

    let Some(details) = details else {
        session.flash_error(LISTING_MISSING);
        return Ok(session.redirect("/listings"));
    };

    let page = session.page();
    let html = views::listings::show(&page, &details, state.config.map_token.as_deref());
    Ok(session.respond(html))
}

/// GET /listings/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));
    let listing = guard!(session, require_listing_owner(state.store.as_ref(), &mut session, &user, &id).await);

    let page = session.page();
    Ok(session.respond(views::listings::edit_form(&page, &listing)))
}

/// PUT /listings/:id
pub async fn update(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));
    let listing = guard!(session, require_listing_owner(state.store.as_ref(), &mut session, &user, &id).await);
    let submission = ListingSubmission::read(multipart_body(multipart)?).await?;
    let changes = ListingInput::from_form(&submission.fields)?.into_changes();

    let image = store_image(&state, submission.image).await?;
    let updated = match state.store.update_listing(listing.id, changes, image.clone()).await {
        Ok(updated) => updated,
        Err(err) => {
            discard_image(&state, image).await;
            return Err(err.into());
        }
    };
    if updated.is_none() {
        discard_image(&state, image).await;
        session.flash_error(LISTING_MISSING);
        return Ok(session.redirect("/listings"));
    }

    tracing::info!("User {} updated listing {}", user.id, listing.id);
    session.flash_success("Listing Updated");
    Ok(session.redirect(&format!("/listings/{}", listing.id)))
}

/// DELETE /listings/:id
pub async fn destroy(
    State(state): State<AppState>,
    mut session: Session,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = guard!(session, require_login(&mut session, &uri));
    let listing = guard!(session, require_listing_owner(state.store.as_ref(), &mut session, &user, &id).await);

    state.store.delete_listing(listing.id).await?;

    tracing::info!("User {} deleted listing {} with {} reviews", user.id, listing.id, listing.reviews.len());
    session.flash_success("Listing Deleted!");
    Ok(session.redirect("/listings"))
}
