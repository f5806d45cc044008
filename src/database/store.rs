use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Listing, ListingChanges, ListingDetails, NewListing, NewReview, NewUser, Review, ReviewDetails, User,
};
use crate::images::StoredImage;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A user with the given username is already registered")]
    UsernameTaken(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Document-store operations used by the handlers and guards.
///
/// Every mutating method is a single logical operation: implementations
/// must keep a listing's review list and the review documents consistent
/// (no dangling ids, no orphaned reviews) even when a call fails midway.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError>;

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, StoreError>;

    /// Overwrites the editable fields; `image` replaces the current image only when present.
    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
        image: Option<StoredImage>,
    ) -> Result<Option<Listing>, StoreError>;

    /// Deletes the listing and every review it references.
    async fn delete_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;

    /// Deletes all listings and their reviews. Returns the number of listings removed.
    async fn clear_listings(&self) -> Result<u64, StoreError>;

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    /// Stores the review and appends it to the listing. `None` when the listing does not exist.
    async fn add_review(&self, listing_id: Uuid, review: NewReview) -> Result<Option<Review>, StoreError>;

    /// Pulls the review id from the listing and deletes the review document.
    /// Returns `false`, touching nothing, when the listing does not hold that review.
    async fn remove_review(&self, listing_id: Uuid, review_id: Uuid) -> Result<bool, StoreError>;

    /// Loads a listing with its owner and the authors of its reviews.
    async fn listing_details(&self, id: Uuid) -> Result<Option<ListingDetails>, StoreError> {
        let Some(listing) = self.find_listing(id).await? else {
            return Ok(None);
        };

        let owner = self.find_user(listing.owner_id).await?;

        let mut reviews = Vec::with_capacity(listing.reviews.len());
        for review_id in &listing.reviews {
            if let Some(review) = self.find_review(*review_id).await? {
                let author = self.find_user(review.author_id).await?;
                reviews.push(ReviewDetails { review, author });
            }
        }

        Ok(Some(ListingDetails { listing, owner, reviews }))
    }
}
