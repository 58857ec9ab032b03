use super::error::FilterError;
use super::types::{BookSortColumn, Sort, SortDirection, SortKey};

/// Closed mapping from public sort key to trusted column. The descending
/// form of each key is the same key prefixed with `-`.
pub type Safelist<C> = &'static [(&'static str, C)];

pub const BOOK_SORT_SAFELIST: Safelist<BookSortColumn> = &[
    ("id", BookSortColumn::Id),
    ("title", BookSortColumn::Title),
    ("author", BookSortColumn::Author),
    ("price", BookSortColumn::Price),
    ("avg_rating", BookSortColumn::AvgRating),
];

pub struct FilterOrder;

impl FilterOrder {
    /// Resolves `raw` against the safelist. Anything not listed is rejected
    /// here, before a query exists.
    pub fn resolve<C: SortKey>(raw: &str, safelist: Safelist<C>) -> Result<Sort<C>, FilterError> {
        let (key, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (raw, SortDirection::Asc),
        };

        safelist
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, column)| Sort { column: *column, direction })
            .ok_or_else(|| FilterError::InvalidSort {
                value: raw.to_string(),
                accepted: Self::accepted_values(safelist),
            })
    }

    /// Public keys accepted by a safelist, both directions
    pub fn accepted_values<C: SortKey>(safelist: Safelist<C>) -> Vec<String> {
        safelist
            .iter()
            .flat_map(|(name, _)| [name.to_string(), format!("-{}", name)])
            .collect()
    }

    /// ORDER BY on the resolved column, then `id ASC` so equal keys page
    /// deterministically.
    pub fn generate<C: SortKey>(sort: &Sort<C>) -> String {
        let primary = format!("\"{}\" {}", sort.column.column(), sort.direction.to_sql());
        if sort.column.is_id() {
            format!("ORDER BY {}", primary)
        } else {
            format!("ORDER BY {}, \"id\" ASC", primary)
        }
    }
}
