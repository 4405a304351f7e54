// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for form submissions.

use crate::forms::FormCategory;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// How a submission attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    SpamDropped,
    RateLimited,
    Invalid,
    UploadFailed,
    ForwardFailed,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Accepted,
        Outcome::SpamDropped,
        Outcome::RateLimited,
        Outcome::Invalid,
        Outcome::UploadFailed,
        Outcome::ForwardFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::SpamDropped => "spam_dropped",
            Self::RateLimited => "rate_limited",
            Self::Invalid => "invalid",
            Self::UploadFailed => "upload_failed",
            Self::ForwardFailed => "forward_failed",
        }
    }
}

pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let submissions = IntCounterVec::new(
            Opts::new("form_submissions_total", "Form submission attempts by outcome"),
            &["category", "outcome"],
        )?;
        registry.register(Box::new(submissions.clone()))?;

        // Expose zero-valued series from the first scrape.
        for category in FormCategory::ALL {
            for outcome in Outcome::ALL {
                submissions.with_label_values(&[category.as_str(), outcome.as_str()]);
            }
        }

        Ok(Self {
            registry,
            submissions,
        })
    }

    pub fn observe(&self, category: FormCategory, outcome: Outcome) {
        self.submissions
            .with_label_values(&[category.as_str(), outcome.as_str()])
            .inc();
    }

    pub fn count(&self, category: FormCategory, outcome: Outcome) -> u64 {
        self.submissions
            .with_label_values(&[category.as_str(), outcome.as_str()])
            .get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_render() {
        let metrics = Metrics::new().unwrap();
        metrics.observe(FormCategory::Cta, Outcome::Accepted);
        metrics.observe(FormCategory::Cta, Outcome::Accepted);
        metrics.observe(FormCategory::Recruitment, Outcome::SpamDropped);

        assert_eq!(metrics.count(FormCategory::Cta, Outcome::Accepted), 2);
        assert_eq!(metrics.count(FormCategory::Cta, Outcome::RateLimited), 0);

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"form_submissions_total{category="recruitment",outcome="spam_dropped"} 1"#));
        assert!(text.contains(r#"form_submissions_total{category="cta",outcome="forward_failed"} 0"#));
    }
}
