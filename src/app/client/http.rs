//! Core HTTP operations with request-rate limiting
//!
//! Every request passes through a shared `governor` limiter so that a large
//! worker pool cannot hammer the archive server. Requests are sent exactly
//! once: classification of failures is left to the caller.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::errors::{ConfigError, ConfigResult, DownloadError, DownloadResult};

type DirectLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> ConfigResult<DirectLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            ConfigError::invalid_value("rate_limit_rps", rate_limit_rps, "must be at least 1")
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Sends one GET request, waiting for a rate-limit slot first
    ///
    /// The response is returned whatever its status; the body is left
    /// unread so callers can stream it. Headers must arrive within
    /// `header_timeout` of the request being sent.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Timeout` when the server stays silent and
    /// `DownloadError::Http` for transport failures
    pub async fn get_response(
        &self,
        url: &Url,
        header_timeout: Duration,
    ) -> DownloadResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = tokio::time::timeout(header_timeout, self.client.get(url.as_str()).send())
            .await
            .map_err(|_| DownloadError::Timeout {
                waited: header_timeout,
            })??;
        tracing::debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }
}
