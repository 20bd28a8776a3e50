use std::sync::Arc;
use std::time::Duration;

use axum::handler::Handler;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{extract::State, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use backoffice_api::auth::{TokenSigner, TokenVerifier};
use backoffice_api::cache::TtlCache;
use backoffice_api::config;
use backoffice_api::database::departments::DepartmentRepository;
use backoffice_api::database::products::ProductRepository;
use backoffice_api::database::profiles::ProfileRepository;
use backoffice_api::database::users::UserRepository;
use backoffice_api::database::{manager, PgAuthStore};
use backoffice_api::handlers::{body_binder, id_binder, query_binder};
use backoffice_api::middleware::{require_auth, AuthGate};
use backoffice_api::services::{
    AuthService, DepartmentService, ProductService, ProfileService, UserService,
};
use backoffice_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, signing keys, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting backoffice API in {:?} mode", config.environment);

    let pool = manager::connect()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
    manager::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to run migrations: {}", e));

    // Token key material is a startup concern: a bad key fails here, never
    // on a request path.
    let security = &config.security;
    let access_signer =
        TokenSigner::from_config(&security.access_token_private_key, security.access_token_minutes)
            .unwrap_or_else(|e| panic!("access token private key: {}", e));
    let refresh_signer = TokenSigner::from_config(
        &security.refresh_token_private_key,
        security.refresh_token_minutes,
    )
    .unwrap_or_else(|e| panic!("refresh token private key: {}", e));
    let access_verifier = TokenVerifier::from_config(&security.access_token_public_key)
        .unwrap_or_else(|e| panic!("access token public key: {}", e));
    let refresh_verifier = TokenVerifier::from_config(&security.refresh_token_public_key)
        .unwrap_or_else(|e| panic!("refresh token public key: {}", e));

    let store = Arc::new(PgAuthStore::new(pool.clone()));

    let login_attempts: TtlCache<String, u32> =
        TtlCache::new(Duration::from_secs(config.api.rate_limit_window_secs));
    login_attempts.spawn_sweeper(Duration::from_secs(60));

    let state = AppState {
        pool: pool.clone(),
        auth: AuthService::new(store.clone(), access_signer, refresh_signer),
        users: UserService::new(UserRepository::new(pool.clone())),
        profiles: ProfileService::new(ProfileRepository::new(pool.clone())),
        departments: DepartmentService::new(DepartmentRepository::new(pool.clone())),
        products: ProductService::new(ProductRepository::new(pool)),
        login_attempts,
    };

    // The two gates are built once and injected into route registration.
    let access_gate =
        AuthGate::new(access_verifier, store.clone(), security.allow_test_bypass);
    let refresh_gate = AuthGate::new(refresh_verifier, store, security.allow_test_bypass);

    let app = app(state, access_gate, refresh_gate);

    // Allow tests or deployments to override port via env
    let port = std::env::var("BACKOFFICE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("backoffice API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState, access_gate: AuthGate, refresh_gate: AuthGate) -> Router {
    Router::new()
        .merge(core_routes(state.clone()))
        .merge(auth_routes(state.clone(), access_gate.clone(), refresh_gate))
        .merge(user_routes(state.clone(), access_gate.clone()))
        .merge(profile_routes(state.clone(), access_gate.clone()))
        .merge(department_routes(state.clone(), access_gate.clone()))
        .merge(product_routes(state, access_gate))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn core_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
}

fn auth_routes(state: AppState, access_gate: AuthGate, refresh_gate: AuthGate) -> Router {
    use backoffice_api::handlers::auth;

    Router::new()
        .route(
            "/auth",
            post(auth::login.layer(body_binder::<auth::LoginRequest>()))
                .get(auth::me.layer(from_fn_with_state(access_gate, require_auth)))
                .put(auth::refresh.layer(from_fn_with_state(refresh_gate, require_auth))),
        )
        .with_state(state)
}

fn user_routes(state: AppState, gate: AuthGate) -> Router {
    use backoffice_api::services::user_service::{CreateUserInput, UpdateUserInput};
    use backoffice_api::handlers::users;

    Router::new()
        .route(
            "/users",
            get(users::list
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(query_binder::<users::ListUsersQuery>()))
            .post(
                users::create
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(body_binder::<CreateUserInput>()),
            ),
        )
        .route(
            "/users/:id",
            get(users::get
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(id_binder()))
                .put(
                    users::update
                        .layer(from_fn_with_state(gate.clone(), require_auth))
                        .layer(body_binder::<UpdateUserInput>())
                        .layer(id_binder()),
                )
            .delete(
                users::delete
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(id_binder()),
            ),
        )
        .with_state(state)
}

fn profile_routes(state: AppState, gate: AuthGate) -> Router {
    use backoffice_api::filter::Filter;
    use backoffice_api::services::profile_service::ProfileInput;
    use backoffice_api::handlers::profiles;

    Router::new()
        .route(
            "/profiles",
            get(profiles::list
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(query_binder::<Filter>()))
            .post(
                profiles::create
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(body_binder::<ProfileInput>()),
            ),
        )
        .route(
            "/profiles/:id",
            get(profiles::get
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(id_binder()))
                .put(
                    profiles::update
                        .layer(from_fn_with_state(gate.clone(), require_auth))
                        .layer(body_binder::<ProfileInput>())
                        .layer(id_binder()),
                )
            .delete(
                profiles::delete
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(id_binder()),
            ),
        )
        .with_state(state)
}

fn department_routes(state: AppState, gate: AuthGate) -> Router {
    use backoffice_api::filter::Filter;
    use backoffice_api::services::department_service::DepartmentInput;
    use backoffice_api::handlers::departments;

    Router::new()
        .route(
            "/departments",
            get(departments::list
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(query_binder::<Filter>()))
            .post(
                departments::create
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(body_binder::<DepartmentInput>()),
            ),
        )
        .route(
            "/departments/:id",
            get(departments::get
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(id_binder()))
                .put(
                    departments::update
                        .layer(from_fn_with_state(gate.clone(), require_auth))
                        .layer(body_binder::<DepartmentInput>())
                        .layer(id_binder()),
                )
            .delete(
                departments::delete
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(id_binder()),
            ),
        )
        .with_state(state)
}

fn product_routes(state: AppState, gate: AuthGate) -> Router {
    use backoffice_api::services::product_service::ProductInput;
    use backoffice_api::handlers::products;

    Router::new()
        .route(
            "/products",
            get(products::list
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(query_binder::<products::ListProductsQuery>()))
            .post(
                products::create
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(body_binder::<ProductInput>()),
            ),
        )
        .route(
            "/products/:id",
            get(products::get
                .layer(from_fn_with_state(gate.clone(), require_auth))
                .layer(id_binder()))
                .put(
                    products::update
                        .layer(from_fn_with_state(gate.clone(), require_auth))
                        .layer(body_binder::<ProductInput>())
                        .layer(id_binder()),
                )
            .delete(
                products::delete
                    .layer(from_fn_with_state(gate.clone(), require_auth))
                    .layer(id_binder()),
            ),
        )
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Backoffice API",
        "version": version,
        "endpoints": {
            "auth": "POST /auth (login), GET /auth (current user), PUT /auth (refresh)",
            "users": "/users[/:id] (protected)",
            "profiles": "/profiles[/:id] (protected)",
            "departments": "/departments[/:id] (protected)",
            "products": "/products[/:id] (protected)",
            "health": "/health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
