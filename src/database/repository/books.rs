use async_trait::async_trait;
use sqlx::FromRow;

use super::{bind_params, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::book::BOOK_COLUMNS;
use crate::database::models::{Book, BookChanges, NewBook};
use crate::filter::BookQuery;

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Rows for the requested page plus the total number of matching rows
    async fn list(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), DatabaseError>;

    async fn get(&self, id: i64) -> Result<Option<Book>, DatabaseError>;

    /// First book (lowest id) with exactly this title
    async fn get_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError>;

    async fn insert(&self, book: &NewBook) -> Result<Book, DatabaseError>;

    async fn update(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[derive(FromRow)]
struct BookRow {
    total_records: i64,
    #[sqlx(flatten)]
    book: Book,
}

#[async_trait]
impl BookStore for PgStore {
    async fn list(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), DatabaseError> {
        let sql = query.to_sql();
        self.call(async {
            let q = bind_params(sqlx::query_as::<_, BookRow>(&sql.query), &sql.params);
            let rows = q.fetch_all(self.pool()).await?;

            let total_records = rows.first().map(|r| r.total_records).unwrap_or(0);
            let books = rows.into_iter().map(|r| r.book).collect();
            Ok::<_, DatabaseError>((books, total_records))
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, DatabaseError> {
        self.call(async {
            let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
            Ok::<_, DatabaseError>(book)
        })
        .await
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError> {
        self.call(async {
            let book = sqlx::query_as::<_, Book>(&format!(
                "SELECT {} FROM books WHERE title = $1 ORDER BY id ASC LIMIT 1",
                BOOK_COLUMNS
            ))
            .bind(title)
            .fetch_optional(self.pool())
            .await?;
            Ok::<_, DatabaseError>(book)
        })
        .await
    }

    async fn insert(&self, book: &NewBook) -> Result<Book, DatabaseError> {
        self.call(async {
            let created = sqlx::query_as::<_, Book>(&format!(
                "INSERT INTO books (title, author, price, stock_quantity) \
                 VALUES ($1, $2, $3, $4) RETURNING {}",
                BOOK_COLUMNS
            ))
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.price)
            .bind(book.stock_quantity)
            .fetch_one(self.pool())
            .await?;
            Ok::<_, DatabaseError>(created)
        })
        .await
    }

    async fn update(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, DatabaseError> {
        self.call(async {
            let updated = sqlx::query_as::<_, Book>(&format!(
                "UPDATE books SET \
                   title = COALESCE($1, title), \
                   author = COALESCE($2, author), \
                   price = COALESCE($3, price), \
                   stock_quantity = COALESCE($4, stock_quantity), \
                   updated_at = NOW() \
                 WHERE id = $5 RETURNING {}",
                BOOK_COLUMNS
            ))
            .bind(changes.title.as_deref())
            .bind(changes.author.as_deref())
            .bind(changes.price)
            .bind(changes.stock_quantity)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
            Ok::<_, DatabaseError>(updated)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        self.call(async {
            let result = sqlx::query("DELETE FROM books WHERE id = $1")
                .bind(id)
                .execute(self.pool())
                .await?;
            Ok::<_, DatabaseError>(result.rows_affected() > 0)
        })
        .await
    }
}
