use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointQuery};
use sparql_index_model::Triple;
use std::time::Duration;

/// Pages through all triples of an endpoint with `LIMIT`/`OFFSET`.
///
/// Endpoints silently cap their answers, so a page shorter than requested is followed by a check
/// for a row right after the last consumed one. Without such a row the iteration ends. Otherwise
/// the page size shrinks to the length of the short page and paging goes on. The iteration is
/// truncated when a page brings no progress while rows remain, or at the configured triple cap.
pub struct TripleIterator<'a> {
    client: &'a dyn EndpointClient,
    timeout: Duration,
    page_size: u64,
    max_triples: Option<u64>,
    consumed: u64,
    finished: bool,
    truncated: bool,
}

impl<'a> TripleIterator<'a> {
    pub fn new(
        client: &'a dyn EndpointClient,
        timeout: Duration,
        page_size: u64,
        max_triples: Option<u64>,
    ) -> Self {
        Self {
            client,
            timeout,
            page_size: page_size.max(1),
            max_triples,
            consumed: 0,
            finished: false,
            truncated: false,
        }
    }

    /// Returns the next page, or `None` once all triples have been returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Triple>>, EndpointError> {
        if self.finished {
            return Ok(None);
        }

        let mut limit = self.page_size;
        if let Some(max_triples) = self.max_triples {
            let remaining = max_triples.saturating_sub(self.consumed);
            if remaining == 0 {
                self.finished = true;
                self.truncated = self.has_more().await;
                if self.truncated {
                    tracing::warn!(
                        endpoint = %self.client.endpoint(),
                        max_triples,
                        "Stopped iterating at the triple cap"
                    );
                }
                return Ok(None);
            }
            limit = limit.min(remaining);
        }

        let query = EndpointQuery::TriplePage {
            limit,
            offset: self.consumed,
        };
        let page = self.client.construct(&query, self.timeout).await?;
        let len = u64::try_from(page.len()).unwrap_or(u64::MAX);
        self.consumed += len;
        tracing::trace!(endpoint = %self.client.endpoint(), consumed = self.consumed, "Fetched page");

        if len < limit {
            if !self.has_more().await {
                self.finished = true;
            } else if len == 0 {
                self.finished = true;
                self.truncated = true;
                tracing::warn!(
                    endpoint = %self.client.endpoint(),
                    consumed = self.consumed,
                    "Endpoint stopped returning triples, iteration is incomplete"
                );
            } else {
                tracing::debug!(
                    endpoint = %self.client.endpoint(),
                    page_size = len,
                    "Endpoint caps pages, shrinking the page size"
                );
                self.page_size = len;
            }
        }
        Ok((!page.is_empty()).then_some(page))
    }

    /// Whether a row exists right after the consumed ones. Unanswered checks count as yes.
    async fn has_more(&self) -> bool {
        let query = EndpointQuery::RowAtOffset {
            offset: self.consumed,
        };
        match self.client.select(&query, self.timeout).await {
            Ok(rows) => !rows.is_empty(),
            Err(error) => {
                tracing::warn!(endpoint = %self.client.endpoint(), %error, "Could not verify the end of iteration");
                true
            }
        }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Whether the iteration stopped before all triples were seen. Only meaningful once
    /// [Self::next_page] has returned `None`.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparql_index_common::QueryKind;
    use sparql_index_testsuite::fixtures::numbered_triples;
    use sparql_index_testsuite::{FailureMode, SimulatedEndpoint};

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn drain(iterator: &mut TripleIterator<'_>) -> Vec<Triple> {
        let mut triples = Vec::new();
        while let Some(page) = iterator.next_page().await.unwrap() {
            triples.extend(page);
        }
        triples
    }

    fn endpoint(triples: usize) -> SimulatedEndpoint {
        SimulatedEndpoint::new(
            "http://example.com/sparql",
            numbered_triples("http://example.com/s", triples),
        )
    }

    #[tokio::test]
    async fn consumes_all_pages() {
        let endpoint = endpoint(25);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        let triples = drain(&mut iterator).await;

        assert_eq!(triples.len(), 25);
        assert!(!iterator.is_truncated());
        assert_eq!(endpoint.query_count(QueryKind::TriplePage), 3);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size() {
        let endpoint = endpoint(20);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        assert_eq!(drain(&mut iterator).await.len(), 20);
        assert!(!iterator.is_truncated());
        assert_eq!(endpoint.query_count(QueryKind::TriplePage), 3);
    }

    #[tokio::test]
    async fn shrinks_page_size_to_endpoint_row_cap() {
        let endpoint = endpoint(25).with_row_cap(7);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        assert_eq!(drain(&mut iterator).await.len(), 25);
        assert!(!iterator.is_truncated());
        assert_eq!(endpoint.query_count(QueryKind::TriplePage), 4);
        assert!(endpoint.queries().contains(&EndpointQuery::TriplePage {
            limit: 7,
            offset: 21
        }));
    }

    #[tokio::test]
    async fn page_without_progress_truncates() {
        let endpoint = endpoint(25).failing_after(QueryKind::TriplePage, 1, FailureMode::Empty);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        assert_eq!(drain(&mut iterator).await.len(), 10);
        assert!(iterator.is_truncated());
    }

    #[tokio::test]
    async fn triple_cap_truncates() {
        let endpoint = endpoint(25);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, Some(15));

        assert_eq!(drain(&mut iterator).await.len(), 15);
        assert!(iterator.is_truncated());
    }

    #[tokio::test]
    async fn triple_cap_at_exact_size_is_complete() {
        let endpoint = endpoint(15);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, Some(15));

        assert_eq!(drain(&mut iterator).await.len(), 15);
        assert!(!iterator.is_truncated());
    }

    #[tokio::test]
    async fn unverifiable_end_counts_as_truncated() {
        let endpoint = endpoint(5).failing(QueryKind::RowAtOffset, FailureMode::Timeout);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        assert_eq!(drain(&mut iterator).await.len(), 5);
        assert!(iterator.is_truncated());
    }

    #[tokio::test]
    async fn page_failure_is_propagated() {
        let endpoint = endpoint(25).failing_after(QueryKind::TriplePage, 1, FailureMode::Timeout);
        let mut iterator = TripleIterator::new(&endpoint, TIMEOUT, 10, None);

        assert!(iterator.next_page().await.unwrap().is_some());
        assert!(iterator.next_page().await.unwrap_err().is_timeout());
    }
}
