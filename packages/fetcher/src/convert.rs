//! Conversion of a parsed OSM XML document into an element collection.

use roxmltree::Document;

use crate::decode::{decode_node, decode_way};
use crate::error::Result;
use crate::types::{Element, OsmJson};
use crate::xml::find_descendants;

/// Decode every `<way>` and `<node>` in the document, ways first.
///
/// Elements are found at any depth; other element kinds (relations,
/// bounds, notes) are ignored. Within each kind the document order is kept.
///
/// This is the synchronous half of conversion. Node resolution happens in
/// [`crate::client::OsmClient::convert`], after the document is dropped.
pub fn collect_elements(doc: &Document<'_>) -> Result<OsmJson> {
    let root = doc.root_element();

    let ways = find_descendants(root, "way").map(|n| decode_way(n).map(Element::Way));
    let nodes = find_descendants(root, "node").map(|n| decode_node(n).map(Element::Node));

    let elements = ways.chain(nodes).collect::<Result<Vec<_>>>()?;
    Ok(OsmJson::new(elements))
}

/// Parse XML text and collect its elements.
pub fn parse_elements(xml: &str) -> Result<OsmJson> {
    let doc = Document::parse(xml)?;
    collect_elements(&doc)
}
