pub mod accounts;
pub mod catalog;
pub mod comments;
pub mod error;
pub mod purchases;
pub mod ratings;

pub use accounts::AccountService;
pub use catalog::CatalogQueryEngine;
pub use comments::CommentService;
pub use error::ServiceError;
pub use purchases::PurchaseService;
pub use ratings::RatingAggregator;
