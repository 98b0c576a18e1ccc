pub mod listing;
pub mod session;
pub mod user;
pub mod verification_code;

pub use listing::{Listing, ListingImage, ListingImageRow, ListingPatch, ListingRow, NewImage, NewListing};
pub use session::Session;
pub use user::{User, UserProfile};
pub use verification_code::{is_expired, VerificationCode};
