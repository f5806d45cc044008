use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use super::models::listing::ListingRow;
use super::models::{Listing, ListingChanges, NewListing, NewReview, NewUser, Review, User};
use super::store::{Store, StoreError};
use crate::images::StoredImage;

/// Table definitions, applied in order by [`PgStore::migrate`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        image_url TEXT,
        image_filename TEXT,
        price NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
        location TEXT NOT NULL,
        country TEXT NOT NULL,
        reviews UUID[] NOT NULL DEFAULT '{}',
        owner_id UUID NOT NULL REFERENCES users (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY,
        comment TEXT NOT NULL,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        author_id UUID NOT NULL REFERENCES users (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

const LISTING_COLUMNS: &str =
    "id, title, description, image_url, image_filename, price, location, country, reviews, owner_id, created_at";

/// Postgres-backed store. Multi-row operations run inside one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Created database pool ({} max connections)", max_connections);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationError(e.to_string()))?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user();
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(StoreError::UsernameTaken(user.username)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, ListingRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Listing::from))
    }

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let listing = listing.into_listing();
        let (image_url, image_filename) = match &listing.image {
            Some(image) => (Some(image.url.as_str()), Some(image.filename.as_str())),
            None => (None, None),
        };

        sqlx::query(&format!(
            "INSERT INTO listings ({LISTING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(image_url)
        .bind(image_filename)
        .bind(listing.price)
        .bind(&listing.location)
        .bind(&listing.country)
        .bind(&listing.reviews)
        .bind(listing.owner_id)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
        image: Option<StoredImage>,
    ) -> Result<Option<Listing>, StoreError> {
        let (image_url, image_filename) = match image {
            Some(image) => (Some(image.url), Some(image.filename)),
            None => (None, None),
        };

        let sql = format!(
            r#"
            UPDATE listings SET
                title = $2,
                description = $3,
                price = $4,
                location = $5,
                country = $6,
                image_url = COALESCE($7, image_url),
                image_filename = COALESCE($8, image_filename)
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.price)
            .bind(&changes.location)
            .bind(&changes.country)
            .bind(image_url)
            .bind(image_filename)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Listing::from))
    }

    async fn delete_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM listings WHERE id = $1 RETURNING {LISTING_COLUMNS}");
        let Some(row) = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };
        let listing = Listing::from(row);

        let removed = sqlx::query("DELETE FROM reviews WHERE id = ANY($1)")
            .bind(&listing.reviews)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        info!("Deleted listing {} and {} reviews", listing.id, removed);
        Ok(Some(listing))
    }

    async fn clear_listings(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE id IN (SELECT unnest(reviews) FROM listings)")
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM listings")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, comment, rating, author_id, created_at FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn add_review(&self, listing_id: Uuid, review: NewReview) -> Result<Option<Review>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM listings WHERE id = $1 FOR UPDATE")
            .bind(listing_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let review = review.into_review();
        sqlx::query(
            "INSERT INTO reviews (id, comment, rating, author_id, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(review.id)
        .bind(&review.comment)
        .bind(review.rating)
        .bind(review.author_id)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE listings SET reviews = array_append(reviews, $2) WHERE id = $1")
            .bind(listing_id)
            .bind(review.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(review))
    }

    async fn remove_review(&self, listing_id: Uuid, review_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let pulled = sqlx::query(
            "UPDATE listings SET reviews = array_remove(reviews, $2) WHERE id = $1 AND $2 = ANY(reviews)",
        )
        .bind(listing_id)
        .bind(review_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if pulled == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
