//! Decoders turning a single `<way>` or `<node>` XML element into a record.

use roxmltree::Node as XmlNode;

use crate::error::{FetcherError, Result};
use crate::types::{ElementInfo, ElementType, Node, Way};
use crate::xml::{
    extract_tags, find_children, get_float_attribute, get_integer_attribute,
    get_string_attribute,
};

/// Decode the attributes shared by ways and nodes.
///
/// Every optional field tolerates a missing or malformed attribute. The id
/// does not: an element without a numeric id cannot be referenced or
/// selected, so it is rejected.
fn decode_info(element: XmlNode<'_, '_>, kind: ElementType) -> Result<ElementInfo> {
    let id = get_integer_attribute(element, "id").ok_or_else(|| FetcherError::InvalidElement {
        kind,
        reason: match element.attribute("id") {
            Some(raw) => format!("id '{raw}' is not an integer"),
            None => "missing id attribute".to_string(),
        },
    })?;

    Ok(ElementInfo {
        id,
        changeset: get_integer_attribute(element, "changeset"),
        timestamp: get_string_attribute(element, "timestamp"),
        version: get_integer_attribute(element, "version"),
        user: get_string_attribute(element, "user"),
        uid: get_integer_attribute(element, "uid"),
        tags: extract_tags(element),
    })
}

/// Decode a `<way>` element.
///
/// The `<nd ref>` children are kept in document order. A `ref` that is not
/// an integer stays in place as `None`.
pub fn decode_way(element: XmlNode<'_, '_>) -> Result<Way> {
    let info = decode_info(element, ElementType::Way)?;
    let nodes = find_children(element, "nd")
        .map(|nd| get_integer_attribute(nd, "ref"))
        .collect();

    Ok(Way { info, nodes })
}

/// Decode a `<node>` element.
pub fn decode_node(element: XmlNode<'_, '_>) -> Result<Node> {
    Ok(Node {
        info: decode_info(element, ElementType::Node)?,
        lat: get_float_attribute(element, "lat"),
        lon: get_float_attribute(element, "lon"),
    })
}
