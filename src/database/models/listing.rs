use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::review::ReviewDetails;
use super::user::User;
use crate::images::StoredImage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<StoredImage>,
    pub price: Decimal,
    pub location: String,
    pub country: String,
    /// Review ids in the order they were posted.
    pub reviews: Vec<Uuid>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Editable listing fields. Owner and review list are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingChanges {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub fields: ListingChanges,
    pub image: Option<StoredImage>,
    pub owner_id: Uuid,
}

impl NewListing {
    pub fn into_listing(self) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: self.fields.title,
            description: self.fields.description,
            image: self.image,
            price: self.fields.price,
            location: self.fields.location,
            country: self.fields.country,
            reviews: Vec::new(),
            owner_id: self.owner_id,
            created_at: Utc::now(),
        }
    }
}

impl Listing {
    pub fn apply(&mut self, changes: ListingChanges, image: Option<StoredImage>) {
        self.title = changes.title;
        self.description = changes.description;
        self.price = changes.price;
        self.location = changes.location;
        self.country = changes.country;
        if let Some(image) = image {
            self.image = Some(image);
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Listing with owner and review authors populated.
#[derive(Debug, Clone)]
pub struct ListingDetails {
    pub listing: Listing,
    pub owner: Option<User>,
    pub reviews: Vec<ReviewDetails>,
}

/// Flat row shape of the `listings` table.
#[derive(Debug, FromRow)]
pub(crate) struct ListingRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_filename: Option<String>,
    pub price: Decimal,
    pub location: String,
    pub country: String,
    pub reviews: Vec<Uuid>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        let image = match (row.image_url, row.image_filename) {
            (Some(url), Some(filename)) => Some(StoredImage { url, filename }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image,
            price: row.price,
            location: row.location,
            country: row.country,
            reviews: row.reviews,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}
