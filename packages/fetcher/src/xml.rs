//! XML utility functions for reading OSM elements from DOM trees.

use std::str::FromStr;

use roxmltree::Node;

use crate::types::Tags;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use osm_fetcher::xml::get_tag_name;
///
/// let doc = Document::parse(r#"<osm><way id="1"/></osm>"#).unwrap();
/// let way = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(way), "way");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with the given tag name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find all direct child elements with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use osm_fetcher::xml::find_children;
///
/// let xml = r#"<way id="1"><nd ref="1"/><tag k="a" v="b"/><nd ref="2"/></way>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let refs: Vec<_> = find_children(doc.root_element(), "nd").collect();
/// assert_eq!(refs.len(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| has_tag(*child, tag))
}

/// Find all elements with the given tag name anywhere below `node`.
pub fn find_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(move |n| has_tag(*n, tag))
}

/// Get an attribute value as an owned string.
pub fn get_string_attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// Get an attribute converted to an integer.
///
/// Returns `None` when the attribute is missing or is not a valid integer,
/// so callers can tell an omitted value apart from a real zero.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use osm_fetcher::xml::get_integer_attribute;
///
/// let doc = Document::parse(r#"<node id="42" uid="abc"/>"#).unwrap();
/// let node = doc.root_element();
///
/// assert_eq!(get_integer_attribute(node, "id"), Some(42));
/// assert_eq!(get_integer_attribute(node, "uid"), None);
/// assert_eq!(get_integer_attribute(node, "changeset"), None);
/// ```
pub fn get_integer_attribute(node: Node<'_, '_>, name: &str) -> Option<i64> {
    parse_number(node.attribute(name)?)
}

/// Get an attribute converted to a float.
///
/// Returns `None` when the attribute is missing, is not a number, or is not
/// finite (`NaN`, `inf`).
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use osm_fetcher::xml::get_float_attribute;
///
/// let doc = Document::parse(r#"<node lat="3.14" lon="NaN"/>"#).unwrap();
/// let node = doc.root_element();
///
/// assert_eq!(get_float_attribute(node, "lat"), Some(3.14));
/// assert_eq!(get_float_attribute(node, "lon"), None);
/// ```
pub fn get_float_attribute(node: Node<'_, '_>, name: &str) -> Option<f64> {
    parse_number::<f64>(node.attribute(name)?).filter(|value| value.is_finite())
}

fn parse_number<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

/// Collect the direct `<tag k=".." v=".."/>` children of an element.
///
/// Later tags overwrite earlier ones with the same key. A tag without `k`
/// is skipped; a tag without `v` maps to an empty string.
pub fn extract_tags(node: Node<'_, '_>) -> Tags {
    let mut tags = Tags::new();
    for tag in find_children(node, "tag") {
        let Some(key) = tag.attribute("k") else {
            tracing::debug!(element = get_tag_name(node), "Skipping <tag> without key");
            continue;
        };
        let value = tag.attribute("v").unwrap_or_default();
        tags.insert(key.to_string(), value.to_string());
    }
    tags
}
