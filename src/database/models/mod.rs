pub mod listing;
pub mod review;
pub mod user;

pub use listing::{Listing, ListingChanges, ListingDetails, NewListing};
pub use review::{NewReview, Review, ReviewDetails};
pub use user::{NewUser, User};
