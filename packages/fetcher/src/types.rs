//! Core data types for the fetcher.
//!
//! These types mirror the OSM-JSON element model: a collection of ways and
//! nodes, each carrying the shared element attributes and its tags.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key/value annotations attached to an element.
pub type Tags = BTreeMap<String, String>;

/// Element kinds served by the map-data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// An ordered path or area boundary.
    Way,

    /// A single point.
    Node,
}

impl ElementType {
    /// Get the name used both as XML tag and as API path segment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Way => "way",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every element.
///
/// Optional fields are `None` when the source attribute was missing or could
/// not be converted, so an absent value is never confused with zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<i64>,

    /// Kept as the raw attribute text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,

    #[serde(default)]
    pub tags: Tags,
}

impl ElementInfo {
    /// Create info with only an id set.
    #[must_use]
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// A way: shared attributes plus its node references in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    #[serde(flatten)]
    pub info: ElementInfo,

    /// Node references; `None` marks a `ref` that was not a valid integer.
    pub nodes: Vec<Option<i64>>,
}

impl Way {
    /// Iterate over the numeric node references, skipping invalid ones.
    pub fn node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.nodes.iter().flatten().copied()
    }
}

/// A node: shared attributes plus its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub info: ElementInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// A single map element, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Way(Way),
    Node(Node),
}

impl Element {
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Way(_) => ElementType::Way,
            Self::Node(_) => ElementType::Node,
        }
    }

    #[must_use]
    pub fn info(&self) -> &ElementInfo {
        match self {
            Self::Way(way) => &way.info,
            Self::Node(node) => &node.info,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.info().id
    }

    #[must_use]
    pub fn as_way(&self) -> Option<&Way> {
        match self {
            Self::Way(way) => Some(way),
            Self::Node(_) => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Way(_) => None,
        }
    }
}

impl From<Way> for Element {
    fn from(way: Way) -> Self {
        Self::Way(way)
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

/// The result of one fetch: an OSM-JSON document with mixed elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OsmJson {
    pub elements: Vec<Element>,
}

impl OsmJson {
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// All ways in collection order.
    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.elements.iter().filter_map(Element::as_way)
    }

    /// All nodes in collection order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.elements.iter().filter_map(Element::as_node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
