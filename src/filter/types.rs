use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A trusted column a listing may be ordered by. Implementors map each
/// variant to a fixed identifier; user text never becomes a column name.
pub trait SortKey: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn column(&self) -> &'static str;

    /// Whether this key already is the unique tiebreak column
    fn is_id(&self) -> bool {
        self.column() == "id"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSortColumn {
    Id,
    Title,
    Author,
    Price,
    AvgRating,
}

impl SortKey for BookSortColumn {
    fn column(&self) -> &'static str {
        match self {
            BookSortColumn::Id => "id",
            BookSortColumn::Title => "title",
            BookSortColumn::Author => "author",
            BookSortColumn::Price => "price",
            BookSortColumn::AvgRating => "avg_rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<C: SortKey> {
    pub column: C,
    pub direction: SortDirection,
}

/// Validated page coordinates (page >= 1, page_size >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Bind value for a numbered placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Page summary derived from the windowed total-row count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: PageRequest) -> Self {
        let total_pages = if total_records <= 0 {
            0
        } else {
            (total_records + page.page_size - 1) / page.page_size
        };
        Self {
            page: page.page,
            page_size: page.page_size,
            total_pages,
            total_records: total_records.max(0),
        }
    }
}

/// One page of results plus its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}
