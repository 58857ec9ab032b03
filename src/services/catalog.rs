use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, Span};

use super::error::ServiceError;
use crate::config::CatalogConfig;
use crate::database::models::{Book, BookChanges, NewBook};
use crate::database::repository::BookStore;
use crate::filter::{BookListParams, Filters, Metadata, Page};

/// Catalog reads and writes. Listing goes through filter validation first,
/// so a rejected request never reaches the store.
pub struct CatalogQueryEngine {
    books: Arc<dyn BookStore>,
    limits: CatalogConfig,
    span: Span,
}

impl CatalogQueryEngine {
    pub fn new(books: Arc<dyn BookStore>, limits: CatalogConfig, span: Span) -> Self {
        Self { books, limits, span }
    }

    pub async fn list(&self, params: BookListParams) -> Result<Page<Book>, ServiceError> {
        let filters = Filters::from_params(params, &self.limits);
        let query = filters.validate(self.limits.max_page_size).map_err(|e| {
            debug!(parent: &self.span, error = %e, "listing rejected");
            e
        })?;

        let (items, total_records) = self.books.list(&query).await?;
        let metadata = Metadata::calculate(total_records, query.page);
        debug!(
            parent: &self.span,
            returned = items.len(),
            total_records,
            page = metadata.page,
            "catalog listed"
        );
        Ok(Page { items, metadata })
    }

    pub async fn get(&self, id: i64) -> Result<Book, ServiceError> {
        self.books
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("the requested book could not be found".to_string()))
    }

    pub async fn create(&self, book: NewBook) -> Result<Book, ServiceError> {
        let mut errors = HashMap::new();
        check_text(&mut errors, "title", &book.title);
        check_text(&mut errors, "author", &book.author);
        check_amounts(&mut errors, Some(book.price), Some(book.stock_quantity));
        if !errors.is_empty() {
            return Err(ServiceError::validation(errors));
        }

        let created = self.books.insert(&book).await?;
        info!(parent: &self.span, book_id = created.id, "book created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, changes: BookChanges) -> Result<Book, ServiceError> {
        let mut errors = HashMap::new();
        if let Some(title) = &changes.title {
            check_text(&mut errors, "title", title);
        }
        if let Some(author) = &changes.author {
            check_text(&mut errors, "author", author);
        }
        check_amounts(&mut errors, changes.price, changes.stock_quantity);
        if !errors.is_empty() {
            return Err(ServiceError::validation(errors));
        }

        let updated = self
            .books
            .update(id, &changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound("the requested book could not be found".to_string()))?;
        info!(parent: &self.span, book_id = id, "book updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.books.delete(id).await? {
            return Err(ServiceError::NotFound("the requested book could not be found".to_string()));
        }
        info!(parent: &self.span, book_id = id, "book deleted");
        Ok(())
    }
}

fn check_text(errors: &mut HashMap<String, String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "must be provided".to_string());
    } else if value.len() > 500 {
        errors.insert(field.to_string(), "must not be more than 500 bytes long".to_string());
    }
}

fn check_amounts(errors: &mut HashMap<String, String>, price: Option<f64>, stock: Option<i32>) {
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            errors.insert("price".to_string(), "must be a non-negative number".to_string());
        }
    }
    if let Some(stock) = stock {
        if stock < 0 {
            errors.insert("stock_quantity".to_string(), "must not be negative".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn engine(store: &Arc<MemoryStore>) -> CatalogQueryEngine {
        CatalogQueryEngine::new(
            store.clone(),
            CatalogConfig { default_page_size: 20, max_page_size: 100 },
            Span::none(),
        )
    }

    fn seed_price_range(store: &MemoryStore) {
        store.add_book("Outside Low", "A", 5.0, 1);
        store.add_book("Dune", "Herbert", 15.0, 1);
        store.add_book("Emma", "Austen", 20.0, 1);
        store.add_book("Ulysses", "Joyce", 12.0, 1);
        store.add_book("Beloved", "Morrison", 20.0, 1);
        store.add_book("Outside High", "B", 25.0, 1);
        store.add_book("Walden", "Thoreau", 10.0, 1);
    }

    #[tokio::test]
    async fn price_range_sorted_descending_with_id_tiebreak() {
        let store = Arc::new(MemoryStore::new());
        seed_price_range(&store);
        let engine = engine(&store);

        let page = engine
            .list(BookListParams {
                price_from: Some(10.0),
                price_to: Some(20.0),
                sort: Some("-price".to_string()),
                page: Some(1),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let titles: Vec<_> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Emma", "Beloved"]);
        assert_eq!(page.metadata, Metadata { page: 1, page_size: 2, total_pages: 3, total_records: 5 });
    }

    #[tokio::test]
    async fn pages_partition_all_matches() {
        let store = Arc::new(MemoryStore::new());
        seed_price_range(&store);
        let engine = engine(&store);

        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = engine
                .list(BookListParams {
                    sort: Some("price".to_string()),
                    page: Some(page),
                    page_size: Some(3),
                    ..Default::default()
                })
                .await
                .unwrap();
            seen.extend(result.items.into_iter().map(|b| b.id));
        }
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(seen.len(), 7);
        assert_eq!(unique.len(), 7);
    }

    #[tokio::test]
    async fn unknown_sort_issues_no_query() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let err = engine
            .list(BookListParams { sort: Some("password_hash".to_string()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Filters(ref f) if f.0.iter().any(|e| e.field() == "sort")));
        assert_eq!(store.book_queries(), 0);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let page = engine
            .list(BookListParams { title: Some("nothing".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.metadata.total_pages, 0);
        assert_eq!(page.metadata.total_records, 0);
    }

    #[tokio::test]
    async fn create_rejects_negative_amounts_and_blank_text() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let err = engine
            .create(NewBook { title: " ".to_string(), author: "X".to_string(), price: -1.0, stock_quantity: -2 })
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("title"));
                assert!(field_errors.contains_key("price"));
                assert!(field_errors.contains_key("stock_quantity"));
                assert!(!field_errors.contains_key("author"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_missing_book_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let err = engine
            .update(42, BookChanges { price: Some(9.5), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
