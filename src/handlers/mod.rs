pub mod form;
pub mod listings;
pub mod reviews;
pub mod system;
pub mod users;

pub use system::not_found;

pub const LISTING_MISSING: &str = "Listing does not exist!";
