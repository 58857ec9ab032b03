pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::{FilterError, InvalidFilters};
pub use filter::{BookListParams, BookQuery, Filters};
pub use filter_order::{FilterOrder, Safelist, BOOK_SORT_SAFELIST};
pub use types::*;
