mod db;
mod event;
mod presence;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let tokens = services::token::TokenKeys::from_env().expect("token config failed");

    // Google OAuth is optional: login is disabled if env vars are missing.
    let google = services::auth::GoogleConfig::from_env();
    if google.is_none() {
        tracing::warn!("google oauth not configured — login disabled");
    }

    let state = state::AppState::new(pool, tokens, google);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "postboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
