//! Main fetcher service that ties all components together.

use std::sync::Arc;

use crate::config::{FetcherConfig, ResolveOptions};
use crate::convert::parse_elements;
use crate::error::{FetcherError, Result};
use crate::http::{FetchGateway, HttpFetcher, ReqwestFetcher};
use crate::resolve::resolve_nodes;
use crate::types::{Element, ElementType, Node, OsmJson, Way};

/// Client for the OSM API that fetches, converts and resolves elements.
#[derive(Debug, Clone)]
pub struct OsmClient {
    gateway: FetchGateway,
    resolve: ResolveOptions,
}

impl OsmClient {
    /// Create a client using `reqwest` for HTTP.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a client using a custom HTTP fetcher.
    pub fn with_fetcher(config: &FetcherConfig, fetcher: Arc<dyn HttpFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway: FetchGateway::new(fetcher, &config.base_url),
            resolve: config.resolve.clone(),
        })
    }

    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    /// Fetch the raw XML for one element.
    pub async fn fetch(&self, element_type: ElementType, id: i64) -> Result<String> {
        self.gateway.fetch(element_type, id).await
    }

    /// Fetch a way, convert it, and resolve all of its nodes.
    ///
    /// The result holds the fetched nodes followed by the way itself (and any
    /// node embedded in the way's own response).
    pub async fn fetch_way_set(&self, id: i64) -> Result<OsmJson> {
        self.fetch_collection(ElementType::Way, id).await
    }

    /// Fetch a single way.
    ///
    /// Goes through the full pipeline and returns the last way in the result.
    pub async fn fetch_way(&self, id: i64) -> Result<Way> {
        let collection = self.fetch_collection(ElementType::Way, id).await?;
        select_last(collection, ElementType::Way, id, |element| match element {
            Element::Way(way) => Some(way),
            Element::Node(_) => None,
        })
    }

    /// Fetch a single node.
    ///
    /// Returns the last node in the response if the service sent several.
    pub async fn fetch_node(&self, id: i64) -> Result<Node> {
        let collection = self.fetch_collection(ElementType::Node, id).await?;
        select_last(collection, ElementType::Node, id, |element| match element {
            Element::Node(node) => Some(node),
            Element::Way(_) => None,
        })
    }

    /// Resolve the node references of an already converted collection.
    pub async fn convert(&self, collection: OsmJson) -> Result<OsmJson> {
        let gateway = self.gateway.clone();
        resolve_nodes(collection, &self.resolve, move |id| {
            fetch_node_record(gateway.clone(), id)
        })
        .await
    }

    async fn fetch_collection(&self, element_type: ElementType, id: i64) -> Result<OsmJson> {
        let xml = self.fetch(element_type, id).await?;
        let collection = parse_elements(&xml)?;
        tracing::debug!(
            %element_type,
            id,
            elements = collection.len(),
            "Converted response"
        );
        self.convert(collection).await
    }
}

/// One resolver round trip: fetch a node document and decode its node.
///
/// Nodes already embedded in the way's document are not reused.
async fn fetch_node_record(gateway: FetchGateway, id: i64) -> Result<Node> {
    let xml = gateway.fetch(ElementType::Node, id).await?;
    let collection = parse_elements(&xml)?;
    select_last(collection, ElementType::Node, id, |element| match element {
        Element::Node(node) => Some(node),
        Element::Way(_) => None,
    })
}

/// Take the last element of the requested kind.
fn select_last<T>(
    collection: OsmJson,
    kind: ElementType,
    id: i64,
    pick: impl Fn(Element) -> Option<T>,
) -> Result<T> {
    collection
        .elements
        .into_iter()
        .filter_map(pick)
        .last()
        .ok_or(FetcherError::ElementNotFound { kind, id })
}
