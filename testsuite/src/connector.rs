use crate::SimulatedEndpoint;
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointConnector};
use sparql_index_model::NamedNode;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Hands out [SimulatedEndpoint]s by IRI. Unknown IRIs are unreachable.
#[derive(Default, Clone)]
pub struct SimulatedConnector {
    endpoints: BTreeMap<NamedNode, Arc<SimulatedEndpoint>>,
}

impl SimulatedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `endpoint` and returns a handle for inspecting its query log.
    pub fn add(&mut self, endpoint: SimulatedEndpoint) -> Arc<SimulatedEndpoint> {
        let endpoint = Arc::new(endpoint);
        self.endpoints
            .insert(endpoint.endpoint().into_owned(), Arc::clone(&endpoint));
        endpoint
    }

    pub fn get(&self, endpoint: &NamedNode) -> Option<Arc<SimulatedEndpoint>> {
        self.endpoints.get(endpoint).cloned()
    }
}

impl EndpointConnector for SimulatedConnector {
    fn connect(&self, endpoint: &NamedNode) -> Result<Arc<dyn EndpointClient>, EndpointError> {
        match self.endpoints.get(endpoint) {
            Some(simulated) => Ok(Arc::clone(simulated) as Arc<dyn EndpointClient>),
            None => Err(EndpointError::Transport(
                format!("no simulated endpoint at {endpoint}").into(),
            )),
        }
    }
}
