//! Standalone fake API server for trying snippets by hand.
//!
//! Environment:
//!
//! - `FIXTURES_PATH`: directory searched for `fake-api-fixture.yaml`
//!   (default `fixtures`, relative to the working directory). Without that
//!   file the built-in test fixture is served.
//! - `FAKE_API_BIND`: listen address (default `0.0.0.0:8080`)
//! - `FAKE_API_ADVERTISED_HOST`: host used in the printed base URL
//!   (default `localhost`)
//! - `FAKE_API_KEY`: API key to accept (default: a fresh random key)

use fake_api::{ApiFixture, FakeApiServer};
use std::env;
use std::fs;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let fixtures_path = env::var("FIXTURES_PATH").unwrap_or_else(|_| "fixtures".to_string());
    let bind_addr = env::var("FAKE_API_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let advertised_host =
        env::var("FAKE_API_ADVERTISED_HOST").unwrap_or_else(|_| "localhost".to_string());
    let api_key = env::var("FAKE_API_KEY")
        .unwrap_or_else(|_| format!("seam_apikey_{}", Uuid::new_v4().simple()));

    let fixture = if let Ok(fixture_file) =
        fs::read_to_string(format!("{}/fake-api-fixture.yaml", fixtures_path))
    {
        tracing::info!("Loading fixtures from {}/fake-api-fixture.yaml", fixtures_path);
        ApiFixture::from_yaml(&fixture_file)?
    } else {
        tracing::info!("No fixture file found, using default test fixture");
        ApiFixture::create_test_fixture()
    };

    let server = FakeApiServer::new(fixture, api_key.clone())
        .start(&bind_addr, &advertised_host)
        .await?;

    println!("base_url={}", server.base_url());
    println!("api_key={}", api_key);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down fake API");
    server.shutdown().await?;

    Ok(())
}
