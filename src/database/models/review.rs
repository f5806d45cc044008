use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub comment: String,
    pub rating: i32,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub comment: String,
    pub rating: i32,
    pub author_id: Uuid,
}

impl NewReview {
    pub fn into_review(self) -> Review {
        Review {
            id: Uuid::new_v4(),
            comment: self.comment,
            rating: self.rating,
            author_id: self.author_id,
            created_at: Utc::now(),
        }
    }
}

/// A review with its author resolved, as shown on the listing page.
#[derive(Debug, Clone)]
pub struct ReviewDetails {
    pub review: Review,
    pub author: Option<User>,
}
