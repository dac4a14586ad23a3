//! Prober - executes one outbound health check
//!
//! A probe is a single GET against a service endpoint with a bounded
//! timeout. Transport failures are captured in the returned `ProbeOutcome`
//! rather than propagated; unreachable endpoints are a normal occurrence.
//! No retries happen here.

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use super::messages::ProbeOutcome;

/// Executes health checks against service endpoints
///
/// The HTTP client is built once and reused across requests.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    /// Create a prober whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Perform one health check against `url`.
    ///
    /// Always returns an outcome:
    /// - response received: `error = false`, the actual status code, and the
    ///   body size (any status counts as reachable)
    /// - transport failure: `error = true`, `status_code = 0`, elapsed set to
    ///   the time spent before giving up
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        trace!("probing {url}");

        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();

                // Reading the body can still hit the timeout mid-stream;
                // that counts as a transport failure like any other.
                match response.bytes().await {
                    Ok(body) => ProbeOutcome {
                        elapsed: start.elapsed().as_secs_f64(),
                        status_code,
                        error: false,
                        response_size: body.len() as u64,
                    },
                    Err(e) => {
                        warn!("{url}: failed to read response body: {e}");
                        ProbeOutcome {
                            elapsed: start.elapsed().as_secs_f64(),
                            status_code: 0,
                            error: true,
                            response_size: 0,
                        }
                    }
                }
            }
            Err(e) => {
                warn!("{url}: request failed: {e}");
                ProbeOutcome {
                    elapsed: start.elapsed().as_secs_f64(),
                    status_code: 0,
                    error: true,
                    response_size: 0,
                }
            }
        }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::util::get_default_timeout()))
    }
}
