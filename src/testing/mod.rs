//! In-memory doubles for the storage traits, a settable clock and a log
//! capture sink. Compiled only for tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cmp::Ordering;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use crate::auth::token::{TokenRecord, TokenScope};
use crate::auth::Clock;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Book, BookChanges, Comment, NewBook, NewComment, NewRating, Permissions, Purchase, PurchaseOutcome, Rating,
    RatingSummary, User,
};
use crate::database::repository::{
    BookStore, CommentStore, DeleteOutcome, PermissionStore, PurchaseStore, RatingStore, StorageHealth, TokenStore,
    UserStore,
};
use crate::filter::{BookQuery, BookSortColumn, SortDirection};

/// Bcrypt cost used for fixture users; the minimum keeps tests fast
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    grants: Vec<(i64, String)>,
    tokens: Vec<TokenRecord>,
    books: Vec<Book>,
    ratings: Vec<Rating>,
    comments: Vec<Comment>,
    purchases: Vec<Purchase>,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn summary_for(&self, book_id: i64) -> RatingSummary {
        let scores: Vec<i32> = self.ratings.iter().filter(|r| r.book_id == book_id).map(|r| r.rating).collect();
        RatingSummary::from_scores(&scores)
    }
}

/// Implements every store trait over plain vectors. `set_unavailable(true)`
/// makes every call fail the way a timed-out storage call does.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
    book_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, State>, DatabaseError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(DatabaseError::Timeout(std::time::Duration::from_millis(3000)));
        }
        Ok(self.state.lock().unwrap())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    pub fn add_user(&self, email: &str, password: &str, activated: bool) -> User {
        let password_hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        let mut state = self.state.lock().unwrap();
        let user = User {
            id: state.id(),
            created_at: Utc::now(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash,
            activated,
        };
        state.users.push(user.clone());
        user
    }

    pub fn grant(&self, user_id: i64, code: &str) {
        self.state.lock().unwrap().grants.push((user_id, code.to_string()));
    }

    pub fn add_book(&self, title: &str, author: &str, price: f64, stock_quantity: i32) -> Book {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let book = Book {
            id: state.id(),
            created_at: now,
            updated_at: now,
            title: title.to_string(),
            author: author.to_string(),
            price,
            stock_quantity,
            avg_rating: 0.0,
            rating_count: 0,
        };
        state.books.push(book.clone());
        book
    }

    /// Overwrites the derived fields directly, as a stale aggregate would look
    pub fn set_rating_fields(&self, book_id: i64, avg_rating: f64, rating_count: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(book) = state.books.iter_mut().find(|b| b.id == book_id) {
            book.avg_rating = avg_rating;
            book.rating_count = rating_count;
        }
    }

    /// Appends a rating without touching the aggregate
    pub fn add_raw_rating(&self, user_id: i64, book_id: i64, rating: i32) {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.ratings.push(Rating { id, user_id, book_id, rating, created_at: Utc::now() });
    }

    pub fn book(&self, id: i64) -> Option<Book> {
        self.state.lock().unwrap().books.iter().find(|b| b.id == id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    pub fn purchase_count(&self) -> usize {
        self.state.lock().unwrap().purchases.len()
    }

    pub fn rating_count(&self) -> usize {
        self.state.lock().unwrap().ratings.len()
    }

    pub fn token_count(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }

    pub fn token_hashes(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.iter().map(|t| t.hash.clone()).collect()
    }

    /// Number of catalog listing queries that reached storage
    pub fn book_queries(&self) -> usize {
        self.book_queries.load(AtomicOrdering::SeqCst)
    }
}

fn compare_books(a: &Book, b: &Book, column: BookSortColumn) -> Ordering {
    match column {
        BookSortColumn::Id => a.id.cmp(&b.id),
        BookSortColumn::Title => a.title.cmp(&b.title),
        BookSortColumn::Author => a.author.cmp(&b.author),
        BookSortColumn::Price => a.price.total_cmp(&b.price),
        BookSortColumn::AvgRating => a.avg_rating.total_cmp(&b.avg_rating),
    }
}

fn apply_changes(changes: &BookChanges, book: &mut Book) {
    if let Some(title) = &changes.title {
        book.title = title.clone();
    }
    if let Some(author) = &changes.author {
        book.author = author.clone();
    }
    if let Some(price) = changes.price {
        book.price = price;
    }
    if let Some(stock) = changes.stock_quantity {
        book.stock_quantity = stock;
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl StorageHealth for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.guard().map(|_| ())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.guard()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.guard()?.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn codes_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError> {
        let state = self.guard()?;
        let codes = state.grants.iter().filter(|(id, _)| *id == user_id).map(|(_, c)| c.clone()).collect();
        Ok(Permissions::new(codes))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DatabaseError> {
        self.guard()?.tokens.push(record.clone());
        Ok(())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TokenRecord>, DatabaseError> {
        Ok(self.guard()?.tokens.iter().find(|t| t.hash == hash).cloned())
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<u64, DatabaseError> {
        let mut state = self.guard()?;
        let before = state.tokens.len();
        state.tokens.retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self, query: &BookQuery) -> Result<(Vec<Book>, i64), DatabaseError> {
        let state = self.guard()?;
        self.book_queries.fetch_add(1, AtomicOrdering::SeqCst);

        let mut matching: Vec<Book> = state
            .books
            .iter()
            .filter(|b| query.title.as_deref().map_or(true, |t| contains_ci(&b.title, t)))
            .filter(|b| query.author.as_deref().map_or(true, |a| contains_ci(&b.author, a)))
            .filter(|b| query.price_from.map_or(true, |p| b.price >= p))
            .filter(|b| query.price_to.map_or(true, |p| b.price <= p))
            .filter(|b| query.min_rating.map_or(true, |r| b.avg_rating >= r))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let primary = compare_books(a, b, query.sort.column);
            let primary = match query.sort.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, DatabaseError> {
        Ok(self.guard()?.books.iter().find(|b| b.id == id).cloned())
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError> {
        Ok(self.guard()?.books.iter().find(|b| b.title == title).cloned())
    }

    async fn insert(&self, book: &NewBook) -> Result<Book, DatabaseError> {
        drop(self.guard()?);
        Ok(self.add_book(&book.title, &book.author, book.price, book.stock_quantity))
    }

    async fn update(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, DatabaseError> {
        let mut state = self.guard()?;
        Ok(state.books.iter_mut().find(|b| b.id == id).map(|book| {
            apply_changes(changes, book);
            book.updated_at = Utc::now();
            book.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut state = self.guard()?;
        let before = state.books.len();
        state.books.retain(|b| b.id != id);
        Ok(state.books.len() < before)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn insert_and_recompute(&self, rating: &NewRating) -> Result<Option<(Rating, RatingSummary)>, DatabaseError> {
        let mut state = self.guard()?;
        if !state.books.iter().any(|b| b.id == rating.book_id) {
            return Ok(None);
        }
        let id = state.id();
        let inserted = Rating {
            id,
            user_id: rating.user_id,
            book_id: rating.book_id,
            rating: rating.rating,
            created_at: Utc::now(),
        };
        state.ratings.push(inserted.clone());
        let summary = state.summary_for(rating.book_id);
        if let Some(book) = state.books.iter_mut().find(|b| b.id == rating.book_id) {
            book.avg_rating = summary.avg_rating;
            book.rating_count = summary.rating_count;
        }
        Ok(Some((inserted, summary)))
    }

    async fn recompute(&self, book_id: i64) -> Result<Option<RatingSummary>, DatabaseError> {
        let mut state = self.guard()?;
        let summary = state.summary_for(book_id);
        Ok(state.books.iter_mut().find(|b| b.id == book_id).map(|book| {
            book.avg_rating = summary.avg_rating;
            book.rating_count = summary.rating_count;
            summary
        }))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: &NewComment) -> Result<Comment, DatabaseError> {
        let mut state = self.guard()?;
        let created = Comment {
            id: state.id(),
            user_id: comment.user_id,
            book_id: comment.book_id,
            content: comment.content.clone(),
            created_at: Utc::now(),
        };
        state.comments.push(created.clone());
        Ok(created)
    }

    async fn list_for_book(&self, book_id: i64) -> Result<Vec<Comment>, DatabaseError> {
        Ok(self.guard()?.comments.iter().filter(|c| c.book_id == book_id).cloned().collect())
    }

    async fn delete_owned(&self, comment_id: i64, user_id: i64) -> Result<DeleteOutcome, DatabaseError> {
        let mut state = self.guard()?;
        let before = state.comments.len();
        state.comments.retain(|c| !(c.id == comment_id && c.user_id == user_id));
        Ok(DeleteOutcome::from_rows_affected((before - state.comments.len()) as u64))
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn purchase_one(&self, user_id: i64, book_id: i64) -> Result<PurchaseOutcome, DatabaseError> {
        let mut state = self.guard()?;
        let Some(book) = state.books.iter_mut().find(|b| b.id == book_id) else {
            return Ok(PurchaseOutcome::BookNotFound);
        };
        if book.stock_quantity <= 0 {
            return Ok(PurchaseOutcome::OutOfStock);
        }
        book.stock_quantity -= 1;
        let price = book.price;
        let purchase = Purchase {
            id: state.id(),
            user_id,
            book_id,
            quantity: 1,
            total_price: price,
            created_at: Utc::now(),
        };
        state.purchases.push(purchase.clone());
        Ok(PurchaseOutcome::Completed(purchase))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>, DatabaseError> {
        let state = self.guard()?;
        Ok(state.purchases.iter().rev().filter(|p| p.user_id == user_id).cloned().collect())
    }
}

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self { now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()) }
    }
}

impl FixedClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Collects formatted log output for assertions
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Subscriber that records every event at TRACE and above into `writer`
pub fn capture_subscriber(writer: CaptureWriter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish()
}
