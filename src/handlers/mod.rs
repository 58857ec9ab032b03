pub mod books;
pub mod comments;
pub mod health;
pub mod ratings;
pub mod users;
