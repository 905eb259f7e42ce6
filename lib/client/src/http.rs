use crate::classify::{classify_status, classify_transport, media_type};
use async_trait::async_trait;
use oxrdfio::{RdfFormat, RdfParser};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointConnector, EndpointQuery, QuerySolution};
use sparql_index_model::{NamedNode, NamedNodeRef, Triple};
use std::sync::Arc;
use std::time::Duration;

const RESULTS_ACCEPT: &str =
    "application/sparql-results+json, application/sparql-results+xml;q=0.9, text/tab-separated-values;q=0.5";
const GRAPH_ACCEPT: &str =
    "application/n-triples, text/turtle;q=0.9, application/rdf+xml;q=0.8, application/n-quads;q=0.5";

const USER_AGENT: &str = concat!("sparql-index/", env!("CARGO_PKG_VERSION"));

/// Builds [HttpClient]s sharing a single connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self, EndpointError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EndpointError::Transport(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Creates a client whose updates are sent to `update_endpoint` instead of `endpoint`.
    pub fn connect_with_update(&self, endpoint: NamedNode, update_endpoint: NamedNode) -> HttpClient {
        HttpClient {
            client: self.client.clone(),
            endpoint,
            update_endpoint,
        }
    }
}

impl EndpointConnector for HttpConnector {
    fn connect(&self, endpoint: &NamedNode) -> Result<Arc<dyn EndpointClient>, EndpointError> {
        Ok(Arc::new(
            self.connect_with_update(endpoint.clone(), endpoint.clone()),
        ))
    }
}

/// An [EndpointClient] for a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: NamedNode,
    update_endpoint: NamedNode,
}

impl HttpClient {
    async fn send_query(
        &self,
        query: &EndpointQuery,
        accept: &str,
        timeout: Duration,
    ) -> Result<(String, Vec<u8>), EndpointError> {
        let text = query.to_string();
        tracing::trace!(endpoint = %self.endpoint, kind = %query.kind(), query = %text, "Sending query");

        let response = self
            .client
            .get(self.endpoint.as_str())
            .query(&[("query", text.as_str())])
            .header(ACCEPT, accept)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport(e, Some(timeout)))?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| media_type(value).to_owned())
            .unwrap_or_default();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport(e, Some(timeout)))?;
        Ok((content_type, body.to_vec()))
    }
}

#[async_trait]
impl EndpointClient for HttpClient {
    fn endpoint(&self) -> NamedNodeRef<'_> {
        self.endpoint.as_ref()
    }

    async fn select(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<QuerySolution>, EndpointError> {
        let (content_type, body) = self.send_query(query, RESULTS_ACCEPT, timeout).await?;
        parse_solutions(&content_type, &body)
    }

    async fn construct(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<Triple>, EndpointError> {
        let (content_type, body) = self.send_query(query, GRAPH_ACCEPT, timeout).await?;
        parse_triples(&content_type, &body)
    }

    async fn update(&self, update: &str) -> Result<(), EndpointError> {
        tracing::trace!(endpoint = %self.update_endpoint, update, "Sending update");

        let response = self
            .client
            .post(self.update_endpoint.as_str())
            .form(&[("update", update)])
            .send()
            .await
            .map_err(|e| classify_transport(e, None))?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, EndpointError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, body))
}

fn parse_solutions(content_type: &str, body: &[u8]) -> Result<Vec<QuerySolution>, EndpointError> {
    let format = QueryResultsFormat::from_media_type(content_type)
        .ok_or_else(|| EndpointError::UnsupportedFormat(content_type.to_owned()))?;
    let parser = QueryResultsParser::from_format(format)
        .for_reader(body)
        .map_err(|e| EndpointError::ResultsParse(Box::new(e)))?;
    match parser {
        ReaderQueryResultsParserOutput::Solutions(solutions) => solutions
            .map(|solution| solution.map_err(|e| EndpointError::ResultsParse(Box::new(e))))
            .collect(),
        ReaderQueryResultsParserOutput::Boolean(_) => Err(EndpointError::UnexpectedResult(
            "expected solutions, got a boolean".to_owned(),
        )),
    }
}

fn parse_triples(content_type: &str, body: &[u8]) -> Result<Vec<Triple>, EndpointError> {
    let format = RdfFormat::from_media_type(content_type)
        .ok_or_else(|| EndpointError::UnsupportedFormat(content_type.to_owned()))?;
    RdfParser::from_format(format)
        .for_reader(body)
        .map(|quad| {
            quad.map(Triple::from)
                .map_err(|e| EndpointError::ResultsParse(Box::new(e)))
        })
        .collect()
}
