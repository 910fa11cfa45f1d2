//! OSM Fetcher - Fetch OpenStreetMap ways together with their nodes.
//!
//! This crate downloads elements from the OSM API v0.6 (XML), converts them
//! to the OSM-JSON element model, and resolves the node references of every
//! way into fetched node records.
//!
//! # Example
//!
//! ```
//! use osm_fetcher::convert::parse_elements;
//!
//! let xml = r#"<osm><way id="1"><nd ref="2"/><tag k="highway" v="path"/></way></osm>"#;
//! let collection = parse_elements(xml).unwrap();
//! assert_eq!(collection.ways().next().map(|w| w.nodes.clone()), Some(vec![Some(2)]));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, URLs and settings
//! - [`types`]: Element model (Way, Node, OsmJson)
//! - [`error`]: Error types and Result alias
//! - [`xml`]: Attribute coercion and tag extraction
//! - [`decode`]: Way and node decoders
//! - [`convert`]: Document to element collection
//! - [`resolve`]: Concurrent node resolution
//! - [`http`]: HTTP fetcher trait and gateway
//! - [`client`]: Main client service
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod convert;
pub mod decode;
pub mod error;
pub mod http;
pub mod resolve;
pub mod types;
pub mod xml;

// Re-export main entry points
pub use client::OsmClient;

// Re-export commonly used items
pub use config::{FetcherConfig, ResolveMode, ResolveOptions};
pub use error::{FetcherError, Result};
pub use http::{HttpFetcher, ReqwestFetcher};
pub use types::{Element, ElementInfo, ElementType, Node, OsmJson, Tags, Way};
