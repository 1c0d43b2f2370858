//! Anti-automation check run before a vote is recorded.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::VerificationConfig;

/// Decides whether a vote submission came from a human.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// `token` is the client-side challenge response, if the form carried one.
    async fn verify(&self, token: Option<&str>) -> bool;
}

/// Accepts everything. Used when verification is turned off.
pub struct DisabledVerifier;

#[async_trait]
impl HumanVerifier for DisabledVerifier {
    async fn verify(&self, _token: Option<&str>) -> bool {
        true
    }
}

/// Checks tokens against Cloudflare Turnstile's `siteverify` endpoint.
///
/// A missing token, a missing secret key or an explicit rejection fails. If
/// the provider cannot be reached the vote is let through, so an outage on
/// their side does not stop annotation.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    endpoint: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl TurnstileVerifier {
    pub fn new(config: &VerificationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn site_verify(&self, token: &str) -> Result<SiteVerifyResponse, reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .form(&[("secret", self.secret_key.as_str()), ("response", token)])
            .send()
            .await?
            .error_for_status()?
            .json::<SiteVerifyResponse>()
            .await
    }
}

#[async_trait]
impl HumanVerifier for TurnstileVerifier {
    async fn verify(&self, token: Option<&str>) -> bool {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!("Vote without verification token");
            return false;
        };

        if self.secret_key.is_empty() {
            warn!("Verification enabled without a secret key, rejecting vote");
            return false;
        }

        match self.site_verify(token).await {
            Ok(response) => {
                if !response.success {
                    debug!(error_codes = ?response.error_codes, "Verification token rejected");
                }
                response.success
            }
            Err(e) => {
                warn!(error = %e, "Verification provider unreachable, accepting vote");
                true
            }
        }
    }
}
