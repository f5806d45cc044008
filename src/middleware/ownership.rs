use uuid::Uuid;

use super::auth::CurrentUser;
use super::session::Session;
use super::Halt;
use crate::database::models::{Listing, Review};
use crate::database::Store;

pub const LISTING_NOT_FOUND: &str = "Listing not found!";
pub const NOT_LISTING_OWNER: &str = "You don't have permission to edit this listing.";
pub const REVIEW_NOT_FOUND: &str = "Review not found";
pub const NOT_REVIEW_AUTHOR: &str = "You don't have permission to do that";

/// Ownership guard for listings. Must run after the auth gate, whose user it takes.
pub async fn require_listing_owner(
    store: &dyn Store,
    session: &mut Session,
    user: &CurrentUser,
    listing_id: &str,
) -> Result<Listing, Halt> {
    let listing = match Uuid::parse_str(listing_id) {
        Ok(id) => store.find_listing(id).await?,
        Err(_) => None,
    };

    let Some(listing) = listing else {
        session.flash_error(LISTING_NOT_FOUND);
        return Err(Halt::redirect("/listings"));
    };

    if !listing.is_owned_by(user.id) {
        tracing::warn!("User {} denied access to listing {} owned by {}", user.id, listing.id, listing.owner_id);
        session.flash_error(NOT_LISTING_OWNER);
        return Err(Halt::redirect(format!("/listings/{}", listing.id)));
    }

    Ok(listing)
}

/// Ownership guard for reviews. The review must be listed under `listing_id`;
/// failures go back to that listing's page.
pub async fn require_review_author(
    store: &dyn Store,
    session: &mut Session,
    user: &CurrentUser,
    listing_id: Uuid,
    review_id: &str,
) -> Result<Review, Halt> {
    let review = match Uuid::parse_str(review_id) {
        Ok(id) => store.find_review(id).await?,
        Err(_) => None,
    };
    let listed = match &review {
        Some(review) => store
            .find_listing(listing_id)
            .await?
            .is_some_and(|listing| listing.reviews.contains(&review.id)),
        None => false,
    };
    let review = review.filter(|_| listed);

    let Some(review) = review else {
        session.flash_error(REVIEW_NOT_FOUND);
        return Err(Halt::redirect(format!("/listings/{listing_id}")));
    };

    if review.author_id != user.id {
        tracing::warn!("User {} denied deleting review {} by {}", user.id, review.id, review.author_id);
        session.flash_error(NOT_REVIEW_AUTHOR);
        return Err(Halt::redirect(format!("/listings/{listing_id}")));
    }

    Ok(review)
}
