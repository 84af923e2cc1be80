// ABOUTME: Streaming osmChange writer built on quick-xml
// ABOUTME: Writes sections lazily so an empty section collapses to <create/>

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Write;

use super::Action;
use crate::config::{Config, NodeAttributes};
use crate::pseudo_nodes::PseudoNode;

const ROOT_ELEMENT: &str = "osmChange";

/// Writes one osmChange document to `W` as nodes arrive.
///
/// The call sequence is `begin`, then any number of
/// `begin_section` / `write_node` / `end_section` groups, then `end`.
pub struct OscWriter<W: Write> {
    xml: Writer<W>,
    attributes: NodeAttributes,
    excluded_tags: Vec<String>,
    section: Option<OpenSection>,
}

struct OpenSection {
    action: Action,
    started: bool,
}

impl<W: Write> OscWriter<W> {
    pub fn new(inner: W, config: &Config) -> Self {
        Self {
            xml: Writer::new_with_indent(inner, b' ', 2),
            attributes: config.node.clone(),
            excluded_tags: config.export.excluded_tags.clone(),
            section: None,
        }
    }

    /// Write the XML declaration and open the root element.
    pub fn begin(&mut self) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("Failed to write XML declaration")?;
        self.xml
            .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
            .context("Failed to open osmChange element")?;
        Ok(())
    }

    /// Open a section. Nothing is written until the first node arrives.
    pub fn begin_section(&mut self, action: Action) -> Result<()> {
        if let Some(open) = &self.section {
            bail!(
                "Cannot open <{}> while <{}> is still open",
                action,
                open.action
            );
        }
        self.section = Some(OpenSection {
            action,
            started: false,
        });
        Ok(())
    }

    /// Write one node into the open section.
    ///
    /// Returns `false` without writing anything when the node lacks a coordinate.
    pub fn write_node(&mut self, node: &PseudoNode, include_tags: bool) -> Result<bool> {
        let Some((lat, lon)) = node.position() else {
            tracing::debug!("Skipping node {} without coordinates", node.osm_id);
            return Ok(false);
        };

        self.start_pending_section()?;

        let id = node.osm_id.to_string();
        let uid = self.attributes.uid.to_string();
        let lat = format_coordinate(lat);
        let lon = format_coordinate(lon);

        let mut element = BytesStart::new("node");
        element.push_attribute(("id", id.as_str()));
        element.push_attribute(("user", self.attributes.user.as_str()));
        element.push_attribute(("uid", uid.as_str()));
        element.push_attribute(("timestamp", self.attributes.timestamp.as_str()));
        element.push_attribute(("version", self.attributes.version.as_str()));
        element.push_attribute(("lat", lat.as_str()));
        element.push_attribute(("lon", lon.as_str()));

        let tags = if include_tags {
            self.collect_tags(node)
        } else {
            Vec::new()
        };

        if tags.is_empty() {
            self.xml
                .write_event(Event::Empty(element))
                .with_context(|| format!("Failed to write node {}", node.osm_id))?;
            return Ok(true);
        }

        self.xml
            .write_event(Event::Start(element))
            .with_context(|| format!("Failed to write node {}", node.osm_id))?;
        for (key, value) in tags {
            let mut tag = BytesStart::new("tag");
            tag.push_attribute(("k", key));
            tag.push_attribute(("v", value));
            self.xml
                .write_event(Event::Empty(tag))
                .with_context(|| format!("Failed to write tag '{}' of node {}", key, node.osm_id))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new("node")))
            .with_context(|| format!("Failed to close node {}", node.osm_id))?;

        Ok(true)
    }

    /// Close the open section, writing `<action/>` if it received no node.
    pub fn end_section(&mut self) -> Result<()> {
        let Some(open) = self.section.take() else {
            bail!("No osmChange section is open");
        };
        let name = open.action.element_name();
        let event = if open.started {
            Event::End(BytesEnd::new(name))
        } else {
            Event::Empty(BytesStart::new(name))
        };
        self.xml
            .write_event(event)
            .with_context(|| format!("Failed to close <{}> section", name))?;
        Ok(())
    }

    /// Close the root element and flush.
    pub fn end(&mut self) -> Result<()> {
        if let Some(open) = &self.section {
            bail!("Section <{}> was not closed", open.action);
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
            .context("Failed to close osmChange element")?;
        self.xml
            .get_mut()
            .write_all(b"\n")
            .context("Failed to write trailing newline")?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.xml.get_mut().flush().context("Failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.xml.into_inner()
    }

    fn start_pending_section(&mut self) -> Result<()> {
        let Some(open) = self.section.as_mut() else {
            bail!("Nodes must be written inside an osmChange section");
        };
        if !open.started {
            self.xml
                .write_event(Event::Start(BytesStart::new(open.action.element_name())))
                .with_context(|| format!("Failed to open <{}> section", open.action))?;
            open.started = true;
        }
        Ok(())
    }

    fn collect_tags<'n>(&self, node: &'n PseudoNode) -> Vec<(&'n str, &'n str)> {
        let categories = node
            .categories
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()));
        let extra = node
            .tags
            .iter()
            .filter(|(key, _)| !self.excluded_tags.iter().any(|excluded| excluded == *key))
            .map(|(key, value)| (key.as_str(), value.as_str()));
        categories.chain(extra).collect()
    }
}

/// Format a coordinate as the shortest round-trip decimal, keeping a `.0` on
/// integral values.
///
/// ```
/// use pseudo_node_osc::osc::format_coordinate;
/// assert_eq!(format_coordinate(20.0), "20.0");
/// assert_eq!(format_coordinate(-0.1275), "-0.1275");
/// ```
pub fn format_coordinate(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(xml: &[u8]) -> String {
        String::from_utf8(xml.to_vec())
            .unwrap()
            .lines()
            .map(str::trim)
            .collect()
    }

    fn render(build: impl FnOnce(&mut OscWriter<Vec<u8>>) -> Result<()>) -> String {
        let mut writer = OscWriter::new(Vec::new(), &Config::default());
        writer.begin().unwrap();
        build(&mut writer).unwrap();
        writer.end().unwrap();
        compact(&writer.into_inner())
    }

    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
    const FIXED: &str = r#"user="dummy" uid="0" timestamp="2012-01-01T00:00:00Z" version="1""#;

    #[test]
    fn test_empty_section_collapses() {
        let xml = render(|w| {
            w.begin_section(Action::Create)?;
            w.end_section()
        });
        assert_eq!(xml, format!("{}<osmChange><create/></osmChange>", DECL));
    }

    #[test]
    fn test_node_with_category() {
        let node = PseudoNode::new(1, Some(10.0), Some(20.0)).with_category("shop", "bakery");
        let xml = render(|w| {
            w.begin_section(Action::Create)?;
            assert!(w.write_node(&node, true)?);
            w.end_section()
        });
        assert_eq!(
            xml,
            format!(
                r#"{}<osmChange><create><node id="1" {} lat="20.0" lon="10.0"><tag k="shop" v="bakery"/></node></create></osmChange>"#,
                DECL, FIXED
            )
        );
    }

    #[test]
    fn test_missing_coordinate_writes_nothing() {
        let node = PseudoNode::new(2, None, Some(5.0)).with_category("shop", "bakery");
        let xml = render(|w| {
            w.begin_section(Action::Delete)?;
            assert!(!w.write_node(&node, false)?);
            w.end_section()
        });
        assert_eq!(xml, format!("{}<osmChange><delete/></osmChange>", DECL));
    }

    #[test]
    fn test_tags_excluded_without_include_tags() {
        let node = PseudoNode::new(3, Some(1.5), Some(2.5))
            .with_category("amenity", "cafe")
            .with_tag("name", "Bean");
        let xml = render(|w| {
            w.begin_section(Action::Delete)?;
            w.write_node(&node, false)?;
            w.end_section()
        });
        assert!(xml.contains(&format!(r#"<node id="3" {} lat="2.5" lon="1.5"/>"#, FIXED)));
        assert!(!xml.contains("<tag"));
    }

    #[test]
    fn test_way_area_never_emitted() {
        let node = PseudoNode::new(4, Some(0.0), Some(0.0))
            .with_category("leisure", "park")
            .with_tag("way_area", "9000")
            .with_tag("name", "Green");
        let xml = render(|w| {
            w.begin_section(Action::Modify)?;
            w.write_node(&node, true)?;
            w.end_section()
        });
        assert!(!xml.contains("way_area"));
        assert!(xml.contains(
            r#"<tag k="leisure" v="park"/><tag k="name" v="Green"/></node></modify>"#
        ));
    }

    #[test]
    fn test_categories_precede_decoded_tags() {
        let node = PseudoNode::new(5, Some(1.0), Some(1.0))
            .with_tag("alpha", "first")
            .with_category("tourism", "museum");
        let xml = render(|w| {
            w.begin_section(Action::Create)?;
            w.write_node(&node, true)?;
            w.end_section()
        });
        let museum = xml.find("museum").unwrap();
        let alpha = xml.find("alpha").unwrap();
        assert!(museum < alpha);
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let node = PseudoNode::new(6, Some(1.0), Some(1.0)).with_tag("name", r#"Fish & "Chips" <Ltd>"#);
        let xml = render(|w| {
            w.begin_section(Action::Create)?;
            w.write_node(&node, true)?;
            w.end_section()
        });
        assert!(xml.contains("Fish &amp; &quot;Chips&quot; &lt;Ltd&gt;"));
    }

    #[test]
    fn test_sections_in_sequence() {
        let node = PseudoNode::new(9, Some(3.0), Some(4.0));
        let xml = render(|w| {
            for action in Action::DIFF_ORDER {
                w.begin_section(action)?;
                if action == Action::Modify {
                    w.write_node(&node, true)?;
                }
                w.end_section()?;
            }
            Ok(())
        });
        assert_eq!(
            xml,
            format!(
                r#"{}<osmChange><delete/><modify><node id="9" {} lat="4.0" lon="3.0"/></modify><create/></osmChange>"#,
                DECL, FIXED
            )
        );
    }

    #[test]
    fn test_configured_node_attributes() {
        let mut config = Config::default();
        config.node.user = "importer".to_string();
        config.node.uid = 42;
        config.node.version = "3".to_string();
        let mut writer = OscWriter::new(Vec::new(), &config);
        writer.begin().unwrap();
        writer.begin_section(Action::Create).unwrap();
        writer
            .write_node(&PseudoNode::new(1, Some(1.0), Some(1.0)), false)
            .unwrap();
        writer.end_section().unwrap();
        writer.end().unwrap();
        let xml = compact(&writer.into_inner());
        assert!(xml.contains(r#"user="importer" uid="42""#));
        assert!(xml.contains(r#"version="3""#));
    }

    #[test]
    fn test_section_misuse_is_rejected() {
        let mut writer = OscWriter::new(Vec::new(), &Config::default());
        writer.begin().unwrap();
        assert!(writer
            .write_node(&PseudoNode::new(1, Some(1.0), Some(1.0)), false)
            .is_err());
        assert!(writer.end_section().is_err());
        writer.begin_section(Action::Delete).unwrap();
        assert!(writer.begin_section(Action::Create).is_err());
        assert!(writer.end().is_err());
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(20.0), "20.0");
        assert_eq!(format_coordinate(-3.0), "-3.0");
        assert_eq!(format_coordinate(13.404954), "13.404954");
        assert_eq!(format_coordinate(0.00000001), "0.00000001");
    }
}
