// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Forwarding of validated payloads to the external spreadsheet-backed form.
//!
//! The external endpoint gives no usable confirmation, so delivery is
//! optimistic: a completed HTTP exchange is reported as success whatever
//! the status. Only transport failures and timeouts are failures. There is
//! a single attempt and no retry; the visitor resubmits by hand.

use crate::forms::{FormPayload, FormTarget};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub const SENT_MESSAGE: &str = "Thank you, your submission has been sent";
pub const FAILED_MESSAGE: &str = "Could not send your submission, please try again later";

/// Best-effort outcome. `success` means the request went out, not that the
/// form owner received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitResult {
    pub success: bool,
    pub message: String,
}

impl SubmitResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: SENT_MESSAGE.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: FAILED_MESSAGE.to_string(),
        }
    }
}

pub struct FormForwarder {
    client: reqwest::Client,
}

impl FormForwarder {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Encode `payload` with the target's field table and POST it once.
    pub async fn submit_to_google_form(&self, target: &FormTarget, payload: &FormPayload) -> SubmitResult {
        let category = target.category();
        let pairs = target.schema.encode(payload);

        let result = self
            .client
            .post(target.action_url.clone())
            .form(&pairs)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    info!(%category, fields = pairs.len(), "Submission forwarded");
                } else {
                    warn!(%category, %status, "Form endpoint answered with an error status, delivery unconfirmed");
                }
                SubmitResult::sent()
            }
            Err(e) => {
                warn!(%category, error = %e, timeout = e.is_timeout(), "Submission forward failed");
                SubmitResult::failed()
            }
        }
    }
}
