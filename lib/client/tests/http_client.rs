use sparql_index_client::{EndpointClient, HttpConnector};
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointConnector, EndpointQuery};
use sparql_index_model::NamedNode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TIMEOUT: Duration = Duration::from_secs(10);

/// A server that answers every request with the same canned response and records the requests.
struct CannedServer {
    endpoint: NamedNode,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(status: &'static str, content_type: &'static str, body: &'static str) -> Self {
        Self::start_with_delay(status, content_type, body, Duration::ZERO).await
    }

    async fn start_with_delay(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let mut stream = stream;
                    let request = read_request(&mut stream).await;
                    recorded.lock().unwrap().push(request);
                    respond(&mut stream, status, content_type, body, delay).await;
                });
            }
        });

        Self {
            endpoint: NamedNode::new(format!("http://{address}/sparql")).unwrap(),
            requests,
        }
    }

    fn client(&self) -> Arc<dyn EndpointClient> {
        HttpConnector::new().unwrap().connect(&self.endpoint).unwrap()
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0; 4096];
    let header_end = loop {
        let read = stream.read(&mut chunk).await.unwrap();
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break position + 4;
        }
        if read == 0 {
            break buffer.len();
        }
    };
    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    String::from_utf8_lossy(&buffer).to_string()
}

async fn respond(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &str,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[tokio::test]
async fn select_sends_query_parameter() {
    let server = CannedServer::start(
        "200 OK",
        "application/sparql-results+json; charset=utf-8",
        r#"{"head":{"vars":["count"]},"results":{"bindings":[{"count":{"type":"literal","value":"3","datatype":"http://www.w3.org/2001/XMLSchema#integer"}}]}}"#,
    )
    .await;

    let solutions = server
        .client()
        .select(&EndpointQuery::CountTriples, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(solutions.len(), 1);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /sparql?query="));
    assert!(requests[0].contains("COUNT"));
}

#[tokio::test]
async fn construct_parses_turtle() {
    let server = CannedServer::start(
        "200 OK",
        "text/turtle",
        "<http://example.com/a> <http://example.com/p> <http://example.com/b> .",
    )
    .await;

    let triples = server
        .client()
        .construct(
            &EndpointQuery::TriplePage {
                limit: 10,
                offset: 0,
            },
            TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].object.to_string(), "<http://example.com/b>");
}

#[tokio::test]
async fn gateway_timeout_is_reported_as_timeout() {
    let server = CannedServer::start("504 Gateway Timeout", "text/plain", "").await;

    let error = server
        .client()
        .select(&EndpointQuery::Ping, TIMEOUT)
        .await
        .unwrap_err();

    assert!(error.is_timeout(), "{error}");
}

#[tokio::test]
async fn slow_answer_is_reported_as_timeout() {
    let server = CannedServer::start_with_delay(
        "200 OK",
        "application/sparql-results+json",
        r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#,
        Duration::from_secs(5),
    )
    .await;

    let error = server
        .client()
        .select(&EndpointQuery::Ping, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(
        matches!(error, EndpointError::Timeout(Some(t)) if t == Duration::from_millis(100)),
        "{error}"
    );
}

#[tokio::test]
async fn ping_fails_on_server_error() {
    let server = CannedServer::start("500 Internal Server Error", "text/plain", "broken").await;

    assert!(!server.client().ping(TIMEOUT).await);
}

#[tokio::test]
async fn rejected_update_is_access_denied() {
    let server = CannedServer::start("403 Forbidden", "text/plain", "").await;

    let error = server
        .client()
        .update("CLEAR SILENT GRAPH <http://example.com/g>")
        .await
        .unwrap_err();

    assert!(error.is_access_denied(), "{error}");
    let requests = server.requests();
    assert!(requests[0].starts_with("POST /sparql"));
    assert!(requests[0].contains("update=CLEAR"));
}

#[tokio::test]
async fn update_goes_to_update_endpoint() {
    let server = CannedServer::start("204 No Content", "text/plain", "").await;
    let query_endpoint = NamedNode::new_unchecked("http://127.0.0.1:1/unused");

    let client = HttpConnector::new()
        .unwrap()
        .connect_with_update(query_endpoint.clone(), server.endpoint.clone());
    client.update("CLEAR SILENT ALL").await.unwrap();

    assert_eq!(client.endpoint(), query_endpoint.as_ref());
    assert_eq!(server.requests().len(), 1);
}
