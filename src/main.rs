use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use pairchat::{AppState, db, friends, relay};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    env_logger::init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://messenger.db".to_owned());
    let db_pool = db::connect(&database_url).await.unwrap();

    let cors_origin =
        dotenv::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app_state = AppState {
        db_pool,
        registry: relay::Registry::new(),
    };

    let app = Router::new()
        .route("/ws", get(relay::chat_ws))
        .route("/api/friends", post(friends::friends))
        .with_state(app_state)
        .layer(cors);

    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3005".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    log::info!("relay listening on {bind_addr}");
    axum::serve(listener, app).await.unwrap();
}
