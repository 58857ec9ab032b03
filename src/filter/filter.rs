use serde::Deserialize;

use super::error::{FilterError, InvalidFilters};
use super::filter_order::{FilterOrder, BOOK_SORT_SAFELIST};
use super::filter_where::FilterWhere;
use super::types::{BookSortColumn, PageRequest, Sort, SqlParam, SqlResult};
use crate::config::CatalogConfig;
use crate::database::models::book::BOOK_COLUMNS;

pub const MAX_PAGE: i64 = 10_000_000;
pub const DEFAULT_SORT: &str = "id";

/// Listing query string exactly as the client sent it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookListParams {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "priceFrom")]
    pub price_from: Option<f64>,
    #[serde(rename = "priceTo")]
    pub price_to: Option<f64>,
    #[serde(rename = "minRating")]
    pub min_rating: Option<f64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<String>,
}

/// Request-scoped listing filters with defaults applied. Zero numeric
/// bounds and empty strings mean "no constraint".
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub title: String,
    pub author: String,
    pub price_from: f64,
    pub price_to: f64,
    pub min_rating: f64,
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl Filters {
    pub fn from_params(params: BookListParams, limits: &CatalogConfig) -> Self {
        Self {
            title: params.title.unwrap_or_default().trim().to_string(),
            author: params.author.unwrap_or_default().trim().to_string(),
            price_from: params.price_from.unwrap_or(0.0),
            price_to: params.price_to.unwrap_or(0.0),
            min_rating: params.min_rating.unwrap_or(0.0),
            page: params.page.unwrap_or(1),
            page_size: params.page_size.unwrap_or(limits.default_page_size),
            sort: params.sort.unwrap_or_else(|| DEFAULT_SORT.to_string()),
        }
    }

    /// Checks every parameter and resolves the sort key. Nothing here
    /// touches storage; an unknown sort key never gets past this point.
    pub fn validate(&self, max_page_size: i64) -> Result<BookQuery, InvalidFilters> {
        let mut errors = Vec::new();

        if self.page < 1 {
            errors.push(FilterError::InvalidPage("must be greater than zero".to_string()));
        } else if self.page > MAX_PAGE {
            errors.push(FilterError::InvalidPage(format!("must be a maximum of {}", MAX_PAGE)));
        }

        if self.page_size < 1 {
            errors.push(FilterError::InvalidPageSize("must be greater than zero".to_string()));
        } else if self.page_size > max_page_size {
            errors.push(FilterError::InvalidPageSize(format!("must be a maximum of {}", max_page_size)));
        }

        let sort = match FilterOrder::resolve(&self.sort, BOOK_SORT_SAFELIST) {
            Ok(sort) => Some(sort),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        for (field, value) in [("priceFrom", self.price_from), ("priceTo", self.price_to), ("minRating", self.min_rating)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(FilterError::InvalidRange { field, message: "must be a non-negative number".to_string() });
            }
        }
        if self.min_rating > 5.0 {
            errors.push(FilterError::InvalidRange { field: "minRating", message: "must be at most 5".to_string() });
        }
        if self.price_from > 0.0 && self.price_to > 0.0 && self.price_from > self.price_to {
            errors.push(FilterError::InvalidRange {
                field: "priceTo",
                message: "must not be less than priceFrom".to_string(),
            });
        }

        match sort {
            Some(sort) if errors.is_empty() => Ok(BookQuery {
                title: non_empty(&self.title),
                author: non_empty(&self.author),
                price_from: non_zero(self.price_from),
                price_to: non_zero(self.price_to),
                min_rating: non_zero(self.min_rating),
                page: PageRequest { page: self.page, page_size: self.page_size },
                sort,
            }),
            _ => Err(InvalidFilters(errors)),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn non_zero(v: f64) -> Option<f64> {
    if v == 0.0 { None } else { Some(v) }
}

/// A validated catalog query. Only constructed by `Filters::validate`, so
/// its sort column is always a safelisted identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
    pub min_rating: Option<f64>,
    pub page: PageRequest,
    pub sort: Sort<BookSortColumn>,
}

impl BookQuery {
    /// Single statement returning the requested page with the total match
    /// count attached to every row via a window aggregate.
    pub fn to_sql(&self) -> SqlResult {
        let mut filter_where = FilterWhere::new();
        if let Some(title) = &self.title {
            filter_where.contains("title", title);
        }
        if let Some(author) = &self.author {
            filter_where.contains("author", author);
        }
        if let Some(from) = self.price_from {
            filter_where.at_least("price", from);
        }
        if let Some(to) = self.price_to {
            filter_where.at_most("price", to);
        }
        if let Some(min) = self.min_rating {
            filter_where.at_least("avg_rating", min);
        }
        let limit = filter_where.param(SqlParam::Int(self.page.limit()));
        let offset = filter_where.param(SqlParam::Int(self.page.offset()));
        let (where_clause, params) = filter_where.finish();

        let query = [
            format!("SELECT count(*) OVER() AS total_records, {}", BOOK_COLUMNS),
            "FROM books".to_string(),
            format!("WHERE {}", where_clause),
            FilterOrder::generate(&self.sort),
            format!("LIMIT {} OFFSET {}", limit, offset),
        ]
        .join(" ");

        SqlResult { query, params }
    }
}
