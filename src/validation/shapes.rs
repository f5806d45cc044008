use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use uuid::Uuid;

use super::{FieldKind, FieldRule, Shape, ValidationError};
use crate::database::models::{ListingChanges, NewReview};

/// Largest whole price the `NUMERIC(12, 2)` price column holds.
pub const MAX_PRICE: i64 = 9_999_999_999;

pub const LISTING_SHAPE: Shape = Shape {
    rules: &[
        FieldRule { key: "listing[title]", label: "listing.title", kind: FieldKind::Text, required: true },
        FieldRule { key: "listing[description]", label: "listing.description", kind: FieldKind::Text, required: true },
        FieldRule {
            key: "listing[price]",
            label: "listing.price",
            kind: FieldKind::Number { min: Some(0), max: Some(MAX_PRICE), integer: false, scale: Some(2) },
            required: true,
        },
        FieldRule { key: "listing[location]", label: "listing.location", kind: FieldKind::Text, required: true },
        FieldRule { key: "listing[country]", label: "listing.country", kind: FieldKind::Text, required: true },
    ],
};

pub const REVIEW_SHAPE: Shape = Shape {
    rules: &[
        FieldRule { key: "review[comment]", label: "review.comment", kind: FieldKind::Text, required: true },
        FieldRule {
            key: "review[rating]",
            label: "review.rating",
            kind: FieldKind::Number { min: Some(1), max: Some(5), integer: true, scale: None },
            required: true,
        },
    ],
};

/// Listing fields that passed [`LISTING_SHAPE`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListingInput(pub ListingChanges);

impl ListingInput {
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let checked = LISTING_SHAPE.check(fields)?;
        Ok(Self(ListingChanges {
            title: checked.text("listing[title]"),
            description: checked.text("listing[description]"),
            price: checked.number("listing[price]"),
            location: checked.text("listing[location]"),
            country: checked.text("listing[country]"),
        }))
    }

    pub fn into_changes(self) -> ListingChanges {
        self.0
    }
}

/// Review fields that passed [`REVIEW_SHAPE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub comment: String,
    pub rating: i32,
}

impl ReviewInput {
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let checked = REVIEW_SHAPE.check(fields)?;
        Ok(Self {
            comment: checked.text("review[comment]"),
            // Range already checked against 1..=5.
            rating: checked.number("review[rating]").to_i32().unwrap_or_default(),
        })
    }

    pub fn authored_by(self, author_id: Uuid) -> NewReview {
        NewReview { comment: self.comment, rating: self.rating, author_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn listing_form(price: &str) -> HashMap<String, String> {
        [
            ("listing[title]", "Treehouse"),
            ("listing[description]", "Up high"),
            ("listing[price]", price),
            ("listing[location]", "Portland"),
            ("listing[country]", "United States"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = ListingInput::from_form(&listing_form("-1")).unwrap_err();
        assert_eq!(err.to_string(), "\"listing.price\" must be greater than or equal to 0");
    }

    #[test]
    fn zero_price_is_accepted() {
        let input = ListingInput::from_form(&listing_form("0")).unwrap();
        assert_eq!(input.0.price, Decimal::ZERO);
        assert_eq!(input.0.title, "Treehouse");
    }

    #[test]
    fn price_must_fit_the_stored_precision() {
        assert!(ListingInput::from_form(&listing_form("9999999999")).is_ok());
        assert!(ListingInput::from_form(&listing_form("12.50")).is_ok());

        let err = ListingInput::from_form(&listing_form("10000000000")).unwrap_err();
        assert_eq!(err.to_string(), "\"listing.price\" must be less than or equal to 9999999999");

        let err = ListingInput::from_form(&listing_form("0.005")).unwrap_err();
        assert_eq!(err.to_string(), "\"listing.price\" must have no more than 2 decimal places");
    }

    #[test]
    fn empty_listing_reports_all_required_fields() {
        let err = ListingInput::from_form(&HashMap::new()).unwrap_err();
        assert_eq!(err.messages.len(), 5);
        assert!(err.to_string().starts_with("\"listing.title\" is required,\"listing.description\" is required"));
    }

    #[test]
    fn review_rating_must_be_within_bounds() {
        let form: HashMap<String, String> = [("review[comment]", "ok"), ("review[rating]", "0")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let err = ReviewInput::from_form(&form).unwrap_err();
        assert_eq!(err.messages, vec!["\"review.rating\" must be greater than or equal to 1".to_string()]);
    }

    #[test]
    fn valid_review_builds_new_review_for_author() {
        let form: HashMap<String, String> = [("review[comment]", "Great stay"), ("review[rating]", "4")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let author = Uuid::new_v4();
        let review = ReviewInput::from_form(&form).unwrap().authored_by(author);
        assert_eq!(review.rating, 4);
        assert_eq!(review.comment, "Great stay");
        assert_eq!(review.author_id, author);
    }
}
