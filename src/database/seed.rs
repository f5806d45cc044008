use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::models::{ListingChanges, NewListing};
use super::store::{Store, StoreError};
use crate::images::StoredImage;

const SEED_DATA: &str = include_str!("../../data/seed.yaml");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid seed data: {0}")]
    InvalidData(#[from] serde_yaml::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedListing {
    pub title: String,
    pub description: String,
    pub image: Option<StoredImage>,
    pub price: Decimal,
    pub location: String,
    pub country: String,
}

impl SeedListing {
    fn into_new_listing(self, owner_id: Uuid) -> NewListing {
        NewListing {
            fields: ListingChanges {
                title: self.title,
                description: self.description,
                price: self.price,
                location: self.location,
                country: self.country,
            },
            image: self.image,
            owner_id,
        }
    }
}

pub fn sample_listings() -> Result<Vec<SeedListing>, SeedError> {
    Ok(serde_yaml::from_str(SEED_DATA)?)
}

/// Replaces every listing (and its reviews) with the sample data, owned by `owner_id`.
pub async fn reseed(store: &dyn Store, owner_id: Uuid) -> Result<usize, SeedError> {
    let samples = sample_listings()?;

    let removed = store.clear_listings().await?;
    tracing::info!("Removed {} existing listings", removed);

    let count = samples.len();
    for sample in samples {
        store.create_listing(sample.into_new_listing(owner_id)).await?;
    }

    tracing::info!("Inserted {} sample listings", count);
    Ok(count)
}
