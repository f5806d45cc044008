use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Listing, ListingChanges, NewListing, NewReview, NewUser, Review, User};
use super::store::{Store, StoreError};
use crate::images::StoredImage;

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    listings: HashMap<Uuid, Listing>,
    reviews: HashMap<Uuid, Review>,
}

/// Process-local store, used by `serve --memory` and the test suites.
///
/// All collections sit behind one lock so multi-document operations
/// (cascade delete, review push/pull) are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn review_count(&self) -> usize {
        self.inner.read().await.reviews.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UsernameTaken(user.username));
        }

        let user = user.into_user();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let inner = self.inner.read().await;
        let mut listings: Vec<Listing> = inner.listings.values().cloned().collect();
        listings.sort_by_key(|l| (l.created_at, l.id));
        Ok(listings)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        Ok(self.inner.read().await.listings.get(&id).cloned())
    }

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let listing = listing.into_listing();
        self.inner.write().await.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
        image: Option<StoredImage>,
    ) -> Result<Option<Listing>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.listings.get_mut(&id).map(|listing| {
            listing.apply(changes, image);
            listing.clone()
        }))
    }

    async fn delete_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(listing) = inner.listings.remove(&id) else {
            return Ok(None);
        };

        for review_id in &listing.reviews {
            inner.reviews.remove(review_id);
        }
        Ok(Some(listing))
    }

    async fn clear_listings(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let listings: Vec<Listing> = inner.listings.drain().map(|(_, l)| l).collect();
        for review_id in listings.iter().flat_map(|l| l.reviews.iter()) {
            inner.reviews.remove(review_id);
        }
        Ok(listings.len() as u64)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn add_review(&self, listing_id: Uuid, review: NewReview) -> Result<Option<Review>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(listing) = inner.listings.get_mut(&listing_id) else {
            return Ok(None);
        };

        let review = review.into_review();
        listing.reviews.push(review.id);
        inner.reviews.insert(review.id, review.clone());
        Ok(Some(review))
    }

    async fn remove_review(&self, listing_id: Uuid, review_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(listing) = inner.listings.get_mut(&listing_id) else {
            return Ok(false);
        };
        if !listing.reviews.contains(&review_id) {
            return Ok(false);
        }

        listing.reviews.retain(|id| *id != review_id);
        inner.reviews.remove(&review_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    async fn seeded_user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap()
    }

    fn new_listing(owner_id: Uuid) -> NewListing {
        NewListing {
            fields: ListingChanges {
                title: "Cabin".to_string(),
                description: "Quiet".to_string(),
                price: Decimal::from(120),
                location: "Aspen".to_string(),
                country: "United States".to_string(),
            },
            image: None,
            owner_id,
        }
    }

    fn new_review(author_id: Uuid) -> NewReview {
        NewReview { comment: "Lovely".to_string(), rating: 5, author_id }
    }

    #[tokio::test]
    async fn rejects_duplicate_usernames() {
        let store = MemoryStore::new();
        seeded_user(&store, "alice").await;

        let err = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "y".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "alice"));
    }

    #[tokio::test]
    async fn delete_listing_removes_its_reviews() {
        let store = MemoryStore::new();
        let owner = seeded_user(&store, "owner").await;
        let listing = store.create_listing(new_listing(owner.id)).await.unwrap();
        let other = store.create_listing(new_listing(owner.id)).await.unwrap();

        for _ in 0..3 {
            store.add_review(listing.id, new_review(owner.id)).await.unwrap().unwrap();
        }
        let kept = store.add_review(other.id, new_review(owner.id)).await.unwrap().unwrap();

        let deleted = store.delete_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(deleted.reviews.len(), 3);
        assert!(store.find_listing(listing.id).await.unwrap().is_none());
        assert_eq!(store.review_count().await, 1);
        assert!(store.find_review(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn add_review_to_missing_listing_stores_nothing() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "bob").await;

        let review = store.add_review(Uuid::new_v4(), new_review(user.id)).await.unwrap();
        assert!(review.is_none());
        assert_eq!(store.review_count().await, 0);
    }

    #[tokio::test]
    async fn remove_review_pulls_id_and_deletes_document() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "carol").await;
        let listing = store.create_listing(new_listing(user.id)).await.unwrap();
        let first = store.add_review(listing.id, new_review(user.id)).await.unwrap().unwrap();
        let second = store.add_review(listing.id, new_review(user.id)).await.unwrap().unwrap();

        assert!(store.remove_review(listing.id, first.id).await.unwrap());

        let listing = store.find_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(listing.reviews, vec![second.id]);
        assert!(store.find_review(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_review_through_the_wrong_listing_changes_nothing() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "cyrus").await;
        let home = store.create_listing(new_listing(user.id)).await.unwrap();
        let elsewhere = store.create_listing(new_listing(user.id)).await.unwrap();
        let review = store.add_review(home.id, new_review(user.id)).await.unwrap().unwrap();

        assert!(!store.remove_review(elsewhere.id, review.id).await.unwrap());
        assert!(!store.remove_review(Uuid::new_v4(), review.id).await.unwrap());

        let home = store.find_listing(home.id).await.unwrap().unwrap();
        assert_eq!(home.reviews, vec![review.id]);
        assert!(store.find_review(review.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_keeps_owner_reviews_and_image_when_none_given() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "dave").await;
        let mut draft = new_listing(user.id);
        draft.image = Some(StoredImage { url: "/uploads/a.png".to_string(), filename: "a.png".to_string() });
        let listing = store.create_listing(draft).await.unwrap();
        let review = store.add_review(listing.id, new_review(user.id)).await.unwrap().unwrap();

        let mut changes = new_listing(user.id).fields;
        changes.title = "Renamed".to_string();
        let updated = store.update_listing(listing.id, changes, None).await.unwrap().unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.owner_id, user.id);
        assert_eq!(updated.reviews, vec![review.id]);
        assert_eq!(updated.image.unwrap().filename, "a.png");
    }

    #[tokio::test]
    async fn listing_details_populates_owner_and_authors() {
        let store = MemoryStore::new();
        let owner = seeded_user(&store, "erin").await;
        let guest = seeded_user(&store, "frank").await;
        let listing = store.create_listing(new_listing(owner.id)).await.unwrap();
        store.add_review(listing.id, new_review(guest.id)).await.unwrap();

        let details = store.listing_details(listing.id).await.unwrap().unwrap();
        assert_eq!(details.owner.unwrap().username, "erin");
        assert_eq!(details.reviews.len(), 1);
        assert_eq!(details.reviews[0].author.as_ref().unwrap().username, "frank");
    }
}
