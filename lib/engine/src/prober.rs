use crate::config::IndexerConfig;
use crate::error::ProbeError;
use sparql_index_common::{EndpointClient, EndpointQuery};
use std::time::Duration;

/// Discovers the largest result window an endpoint answers within a timeout.
///
/// The prober fetches the single row at offset `n - 1` for growing `n`. The window doubles while
/// the endpoint answers and is bisected between the last success and the last failure once it does
/// not. Both timeouts and empty answers count as failures. The result is a lower bound: it has
/// been answered successfully, and the window one larger has failed.
#[derive(Debug, Clone)]
pub struct ResultLimitProber {
    timeout: Duration,
    start_size: u64,
    max_steps: usize,
}

impl ResultLimitProber {
    pub fn new(timeout: Duration, start_size: u64, max_steps: usize) -> Self {
        Self {
            timeout,
            start_size: start_size.max(1),
            max_steps,
        }
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(
            config.probe_timeout(),
            config.probe_start_size,
            config.probe_max_steps,
        )
    }

    pub async fn probe(&self, client: &dyn EndpointClient) -> Result<u64, ProbeError> {
        let endpoint = client.endpoint();
        let mut current = self.start_size;
        let mut last_success = 0_u64;
        let mut last_failure: Option<u64> = None;

        for _ in 0..self.max_steps {
            let query = EndpointQuery::RowAtOffset {
                offset: current - 1,
            };
            let timed_out = match client.select(&query, self.timeout).await {
                Ok(rows) if !rows.is_empty() => {
                    tracing::debug!(%endpoint, window = current, "Probe succeeded");
                    last_success = current;
                    current = match last_failure {
                        Some(failure) if current + 1 >= failure => return Ok(current),
                        Some(failure) => current + (failure - current) / 2,
                        None => current.saturating_mul(2),
                    };
                    continue;
                }
                Ok(_) => {
                    tracing::debug!(%endpoint, window = current, "Probe window exceeds the data");
                    false
                }
                Err(error) if error.is_timeout() => {
                    tracing::debug!(%endpoint, window = current, "Probe timed out");
                    true
                }
                Err(error) => return Err(error.into()),
            };

            if current == last_success {
                let shrunk = shrink(current);
                tracing::debug!(%endpoint, window = shrunk, "Previously successful window failed");
                return Ok(shrunk);
            }
            last_failure = Some(current);
            current = if last_success > 0 {
                last_success + (current - last_success) / 2
            } else {
                current / 2
            };
            if current == 0 {
                return Err(if timed_out {
                    ProbeError::Timeout
                } else {
                    ProbeError::Empty
                });
            }
            if current == last_success {
                return Ok(last_success);
            }
        }

        if last_success > 0 {
            tracing::warn!(
                %endpoint,
                steps = self.max_steps,
                window = last_success,
                "Probing did not converge, using last successful window"
            );
            Ok(last_success)
        } else {
            Err(ProbeError::StepLimit {
                steps: self.max_steps,
            })
        }
    }
}

/// Shrinks a window by 5%, rounded up so that small windows shrink too. Never below 1.
fn shrink(window: u64) -> u64 {
    window.saturating_sub(window.div_ceil(20)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparql_index_common::QueryKind;
    use sparql_index_testsuite::fixtures::numbered_triples;
    use sparql_index_testsuite::{FailureMode, SimulatedEndpoint};

    fn prober() -> ResultLimitProber {
        ResultLimitProber::new(Duration::from_secs(1), 1, 64)
    }

    fn endpoint(triples: usize) -> SimulatedEndpoint {
        SimulatedEndpoint::new(
            "http://example.com/sparql",
            numbered_triples("http://example.com/s", triples),
        )
    }

    #[tokio::test]
    async fn finds_exact_threshold() {
        let endpoint = endpoint(1000).with_timeout_threshold(300);
        assert_eq!(prober().probe(&endpoint).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn small_endpoint_is_bounded_by_its_size() {
        let endpoint = endpoint(5);
        assert_eq!(prober().probe(&endpoint).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn empty_endpoint_fails() {
        let endpoint = endpoint(0);
        assert!(matches!(
            prober().probe(&endpoint).await,
            Err(ProbeError::Empty)
        ));
    }

    #[tokio::test]
    async fn timeout_on_first_row_fails() {
        let endpoint = endpoint(10).with_timeout_threshold(0);
        assert!(matches!(
            prober().probe(&endpoint).await,
            Err(ProbeError::Timeout)
        ));
    }

    #[tokio::test]
    async fn http_errors_are_not_recoverable() {
        let endpoint =
            endpoint(10).failing(QueryKind::RowAtOffset, FailureMode::HttpStatus(500));
        assert!(matches!(
            prober().probe(&endpoint).await,
            Err(ProbeError::Endpoint(_))
        ));
        assert_eq!(endpoint.query_count(QueryKind::RowAtOffset), 1);
    }

    #[tokio::test]
    async fn step_limit_returns_last_success() {
        let endpoint = endpoint(1_000_000);
        let prober = ResultLimitProber::new(Duration::from_secs(1), 1, 5);
        assert_eq!(prober.probe(&endpoint).await.unwrap(), 16);
        assert_eq!(endpoint.query_count(QueryKind::RowAtOffset), 5);
    }

    #[tokio::test]
    async fn start_size_beyond_window_bisects_down() {
        let endpoint = endpoint(100).with_timeout_threshold(10);
        let prober = ResultLimitProber::new(Duration::from_secs(1), 1000, 64);
        assert_eq!(prober.probe(&endpoint).await.unwrap(), 10);
    }

    #[test]
    fn shrink_always_makes_progress() {
        assert_eq!(shrink(1_000), 950);
        assert_eq!(shrink(19), 18);
        assert_eq!(shrink(10), 9);
        assert_eq!(shrink(2), 1);
        assert_eq!(shrink(1), 1);
    }
}
