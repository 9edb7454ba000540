//! CMI client over the JSON API

use crate::retry::{fetch_document, RetryPolicy};
use blnet_codec::CmiDocument;
use blnet_core::{BlnetResult, CmiRequest, SensorRecord};
use blnet_transport::JsonExchange;

/// Reads one JSON document per configured CAN node
#[derive(Debug)]
pub struct CmiClient<J: JsonExchange> {
    exchange: J,
    policy: RetryPolicy,
    params: Vec<String>,
    nodes: Vec<u8>,
    /// Record fetched during discovery, served by the next read of its node
    prefetched: Option<(u8, SensorRecord)>,
}

impl<J: JsonExchange> CmiClient<J> {
    /// # Arguments
    /// * `exchange` - HTTP transport
    /// * `policy` - Attempt bound and request spacing
    /// * `params` - Section codes sent as `jsonparam`
    /// * `nodes` - CAN nodes to poll, in order
    pub fn new(exchange: J, policy: RetryPolicy, params: Vec<String>, nodes: Vec<u8>) -> Self {
        Self {
            exchange,
            policy,
            params,
            nodes,
            prefetched: None,
        }
    }

    pub fn nodes(&self) -> &[u8] {
        &self.nodes
    }

    /// Fetch and decode the document of one CAN node
    pub async fn fetch_node(&mut self, node: u8) -> BlnetResult<CmiDocument> {
        let request = CmiRequest::new(node, self.params.clone());
        let document = fetch_document(&mut self.exchange, &request, &self.policy).await?;
        log::debug!("CMI {}: {} status", request, document.status);
        Ok(document)
    }

    pub(crate) fn set_prefetched(&mut self, node: u8, record: SensorRecord) {
        self.prefetched = Some((node, record));
    }

    pub(crate) fn clear_prefetched(&mut self) {
        self.prefetched = None;
    }

    /// Take the prefetched record if it belongs to `node`
    pub(crate) fn take_prefetched(&mut self, node: u8) -> Option<SensorRecord> {
        match self.prefetched.take() {
            Some((n, record)) if n == node => Some(record),
            _ => None,
        }
    }

    /// Fetch every configured node in order; fails as a whole
    pub async fn read_all_nodes(&mut self) -> BlnetResult<Vec<(u8, SensorRecord)>> {
        let nodes = self.nodes.clone();
        let mut records = Vec::with_capacity(nodes.len());
        for node in nodes {
            let document = self.fetch_node(node).await?;
            records.push((node, document.record));
        }
        Ok(records)
    }
}
