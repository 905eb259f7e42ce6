//! An [EndpointClient] speaking the [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/).
//!
//! Queries are sent with HTTP GET and updates with HTTP POST. The response format is negotiated
//! with the `Accept` header and parsed according to the `Content-Type` of the response.

mod classify;
mod http;

pub use http::{HttpClient, HttpConnector};
pub use sparql_index_common::EndpointClient;
