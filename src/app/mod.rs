use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info_span;

use crate::auth::{Authenticator, Clock, PermissionAuthorizer};
use crate::config::{AppConfig, RoutePermissions, SecurityConfig};
use crate::database::repository::{
    BookStore, CommentStore, PermissionStore, PurchaseStore, RatingStore, StorageHealth, TokenStore, UserStore,
};
use crate::error::ApiError;
use crate::handlers::{books, comments, health, ratings, users};
use crate::middleware::{require_auth, require_permission, PermissionGate};
use crate::services::{AccountService, CatalogQueryEngine, CommentService, PurchaseService, RatingAggregator};


/// One handle per storage concern. Usually every field points at the same
/// backing store.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub books: Arc<dyn BookStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub comments: Arc<dyn CommentStore>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub health: Arc<dyn StorageHealth>,
}

impl Stores {
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: UserStore
            + TokenStore
            + PermissionStore
            + BookStore
            + RatingStore
            + CommentStore
            + PurchaseStore
            + StorageHealth
            + 'static,
    {
        Self {
            users: store.clone(),
            tokens: store.clone(),
            permissions: store.clone(),
            books: store.clone(),
            ratings: store.clone(),
            comments: store.clone(),
            purchases: store.clone(),
            health: store,
        }
    }
}

/// Handler state. Each component gets its own span so its events can be
/// told apart and captured.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub authorizer: Arc<PermissionAuthorizer>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogQueryEngine>,
    pub ratings: Arc<RatingAggregator>,
    pub comments: Arc<CommentService>,
    pub purchases: Arc<PurchaseService>,
    pub health: Arc<dyn StorageHealth>,
    pub permissions: RoutePermissions,
}

impl AppState {
    pub fn new(stores: Stores, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let authenticator = Arc::new(Authenticator::new(
            stores.tokens.clone(),
            stores.users.clone(),
            clock,
            info_span!("authenticator"),
        ));

        Self {
            authorizer: Arc::new(PermissionAuthorizer::new(
                stores.permissions.clone(),
                info_span!("authorizer"),
            )),
            accounts: Arc::new(AccountService::new(
                stores.users.clone(),
                authenticator.clone(),
                config.security.auth_token_ttl(),
                config.security.password_hash_cost,
                info_span!("accounts"),
            )),
            catalog: Arc::new(CatalogQueryEngine::new(
                stores.books.clone(),
                config.catalog.clone(),
                info_span!("catalog"),
            )),
            ratings: Arc::new(RatingAggregator::new(stores.ratings.clone(), info_span!("ratings"))),
            comments: Arc::new(CommentService::new(
                stores.comments.clone(),
                stores.books.clone(),
                info_span!("comments"),
            )),
            purchases: Arc::new(PurchaseService::new(
                stores.books.clone(),
                stores.purchases.clone(),
                info_span!("purchases"),
            )),
            health: stores.health,
            permissions: config.security.permissions.clone(),
            authenticator,
        }
    }
}

pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_get))
        .merge(user_routes(&state))
        .merge(book_routes(&state))
        .merge(rating_routes(&state))
        .merge(comment_routes(&state))
        .fallback(not_found)
        .with_state(state);

    let router = if security.enable_cors {
        router.layer(cors_layer(&security.cors_origins))
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

fn gate(state: &AppState, code: &str) -> PermissionGate {
    PermissionGate::new(state.authorizer.clone(), code)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let identity = middleware::from_fn_with_state(state.clone(), require_auth);
    let purchase_list = middleware::from_fn_with_state(gate(state, &state.permissions.purchase_list), require_permission);

    Router::new()
        .route("/api/v1/users/login", post(users::login_post))
        .route(
            "/api/v1/users/tokens",
            delete(users::tokens_delete).route_layer(identity.clone()),
        )
        .route(
            "/api/v1/users/purchases",
            get(users::purchases_get).route_layer(purchase_list).route_layer(identity),
        )
}

fn book_routes(state: &AppState) -> Router<AppState> {
    let identity = middleware::from_fn_with_state(state.clone(), require_auth);
    let catalog_write = middleware::from_fn_with_state(gate(state, &state.permissions.catalog_write), require_permission);
    let purchase = middleware::from_fn_with_state(gate(state, &state.permissions.purchase), require_permission);

    Router::new()
        .route("/api/v1/books/list", get(books::list_get))
        .route(
            "/api/v1/books",
            post(books::book_post)
                .route_layer(catalog_write.clone())
                .route_layer(identity.clone()),
        )
        .route(
            "/api/v1/books/buy",
            post(books::buy_post).route_layer(purchase).route_layer(identity.clone()),
        )
        .route(
            "/api/v1/books/:id",
            get(books::book_get).merge(
                put(books::book_put)
                    .delete(books::book_delete)
                    .route_layer(catalog_write)
                    .route_layer(identity),
            ),
        )
}

fn rating_routes(state: &AppState) -> Router<AppState> {
    let identity = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new().route("/api/v1/ratings", post(ratings::rating_post).route_layer(identity))
}

fn comment_routes(state: &AppState) -> Router<AppState> {
    let identity = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route(
            "/api/v1/comments",
            post(comments::comment_post)
                .get(comments::comments_get)
                .route_layer(identity.clone()),
        )
        .route(
            "/api/v1/comments/:id",
            delete(comments::comment_delete).route_layer(identity),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn not_found() -> ApiError {
    ApiError::not_found("the requested resource could not be found")
}
