// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Guard Service
//!
//! Receives contact and recruitment submissions from the site, screens
//! them (honeypot, per-client rate limit, field validation), uploads CVs
//! and forwards the result to the external forms.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `FORM_RATE_CAP`: Submissions per window per form (default: 3)
//! - `FORM_RATE_WINDOW_SECS`: Window length (default: 3600)
//! - `FORM_STORE_PATH`: JSON file for submission history (default: in memory)
//! - `FORM_CTA_URL`, `FORM_RECRUITMENT_URL`: External form endpoints
//! - `BACKEND_URL`, `BACKEND_ANON_KEY`, `STORAGE_BUCKET`: CV storage

use chrono::Utc;
use content_gateway::{BackendClient, BackendConfig, ObjectStorage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use form_guard::{
    config::Config,
    guard,
    handlers::{router, AppState},
    store::{FileStore, KeyValueStore, MemoryStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        max_submissions = config.guard.max_submissions,
        window_secs = config.guard.window_secs,
        persistent = config.guard.store_path.is_some(),
        "Starting form guard"
    );

    let store: Arc<dyn KeyValueStore> = match &config.guard.store_path {
        Some(path) => {
            let store = FileStore::open(path)?;
            info!(path = %store.path().display(), "Submission history backed by file");
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new()),
    };
    let storage = object_storage(config.uploads.max_cv_bytes);

    let state = Arc::new(AppState::build(config.clone(), store, storage)?);

    // Spawn compaction task
    let compact_state = state.clone();
    let window = config.guard.window_duration();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(compact_state.config.guard.compact_interval());
        loop {
            interval.tick().await;
            let store = compact_state.store.clone();
            let swept =
                tokio::task::spawn_blocking(move || guard::compact(store.as_ref(), window, Utc::now())).await;
            match swept {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => debug!(removed, "Compacted expired submission history"),
                Ok(Err(e)) => warn!(error = %e, "Submission history compaction failed"),
                Err(e) => warn!(error = %e, "Compaction task failed"),
            }
        }
    });

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// CV storage, if the backend is configured.
fn object_storage(max_cv_bytes: u64) -> Option<ObjectStorage> {
    let backend = BackendConfig::from_env();
    if !backend.is_configured() {
        return None;
    }
    match BackendClient::new(backend) {
        Ok(client) => Some(ObjectStorage::new(client).with_max_bytes(max_cv_bytes)),
        Err(e) => {
            warn!(error = %e, "Backend client unavailable");
            None
        }
    }
}
