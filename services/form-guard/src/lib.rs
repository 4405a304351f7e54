// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Guard
//!
//! Anti-spam protection and delivery for the agency site's public forms:
//!
//! - Honeypot field check (silent drop)
//! - Per-category sliding-window submission limit (3 per hour default)
//! - Field validation against each form's schema
//! - CV upload to object storage for recruitment applications
//! - Best-effort forwarding to the external spreadsheet-backed forms
//!
//! Quota is only consumed by submissions that were actually forwarded.

pub mod config;
pub mod forms;
pub mod forwarder;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod store;

pub use config::Config;
pub use forms::{FormCategory, FormPayload, FormTarget, ValidationError};
pub use forwarder::{FormForwarder, SubmitResult};
pub use guard::{validate_honeypot, Clock, ManualClock, SubmissionGuard, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore, ScopedStore, StoreError};
