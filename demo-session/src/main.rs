use std::sync::Arc;

use cookie_session::{DEFAULT_SESSION_TTL, SessionAuth, store_from_env};

mod handlers;
mod routes;
mod server;

use crate::{
    routes::{demo_options, router},
    server::{init_tracing, serve_http},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_session");

    let store = store_from_env("demo_sessions", DEFAULT_SESSION_TTL).await?;
    let options = demo_options().with_env()?.store(store);
    let auth = Arc::new(SessionAuth::single(options)?);
    let app = router(auth)?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    serve_http(port, app).await?;
    Ok(())
}
