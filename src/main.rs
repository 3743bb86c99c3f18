mod auth;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::auth::{
    AuthGuard, AuthProviderConfig, AuthStore, DirectoryResolver, HttpIdentityProvider, Notifier,
    PgDentistDirectory, TracingNotifier,
};
use crate::routes::auth::env_bool;
use crate::services::notifications::ResendConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let provider_config = AuthProviderConfig::from_env().expect("AUTH_URL and AUTH_API_KEY required");
    let provider = Arc::new(HttpIdentityProvider::new(provider_config));

    let directory = Arc::new(PgDentistDirectory::new(pool.clone()));
    let auto_provision = env_bool("AUTO_PROVISION_DENTISTS").unwrap_or(true);
    let resolver = Arc::new(DirectoryResolver::new(directory, auto_provision));

    let store = AuthStore::new(provider, resolver);
    store.initialize().await;

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let guard = Arc::new(AuthGuard::new(store.subscribe(), notifier));

    // Email notifications (non-fatal: disabled if Resend env vars missing).
    let resend = ResendConfig::from_env();
    if resend.is_none() {
        tracing::warn!("Resend not configured — appointment notifications disabled");
    }

    let state = state::AppState::new(pool, store, guard, resend);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "clinicdesk listening");
    axum::serve(listener, app).await.expect("server failed");
}
