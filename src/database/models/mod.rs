pub mod book;
pub mod comment;
pub mod permission;
pub mod purchase;
pub mod rating;
pub mod user;

pub use book::{Book, BookChanges, NewBook};
pub use comment::{Comment, NewComment};
pub use permission::Permissions;
pub use purchase::{Purchase, PurchaseOutcome};
pub use rating::{NewRating, Rating, RatingSummary};
pub use user::User;
