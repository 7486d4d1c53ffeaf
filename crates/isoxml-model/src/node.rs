//! Generic element tree read and written with quick-xml.
//!
//! ISOXML carries all of its payload in attributes, so the tree keeps the
//! element name, the attributes in document order and the child elements.
//! Text content is ignored.

use std::io::Write;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use rust_decimal::Decimal;
use tracing::debug;

use crate::XmlError;

/// One XML element with its attributes and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse a complete document and return its root element.
    pub fn parse(xml: &str) -> Result<XmlNode, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    stack.push(XmlNode::from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let node = XmlNode::from_start(&e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| XmlError::Xml("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::Eof) => break,
                Err(err) => return Err(XmlError::Xml(err.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Xml(format!("element <{}> is never closed", open.name)));
        }
        root.ok_or_else(|| XmlError::Invalid("document has no root element".into()))
    }

    fn from_start(event: &BytesStart<'_>) -> Result<XmlNode, XmlError> {
        let mut node = XmlNode::new(String::from_utf8_lossy(event.name().as_ref()).to_string());
        for attr in event.attributes() {
            let attr = attr.map_err(|err| XmlError::Xml(err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| XmlError::Xml(err.to_string()))?;
            node.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                value.to_string(),
            ));
        }
        Ok(node)
    }

    /// Serialize the element, preceded by an XML declaration.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        self.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|err| XmlError::Xml(format!("invalid UTF-8: {err}")))
    }

    /// Write this element and its subtree into an existing writer.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|err| XmlError::Xml(err.to_string()))?;
            return Ok(());
        }
        writer
            .write_event(Event::Start(start))
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        Ok(())
    }

    /// Attribute value, `None` when absent or empty. Whitespace is kept as
    /// written; only the numeric accessors trim.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn attr_string(&self, name: &str) -> Option<String> {
        self.attr(name).map(str::to_string)
    }

    /// Integer attribute; text that does not parse is treated as absent.
    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        parse_attr(self, name)
    }

    pub fn attr_decimal(&self, name: &str) -> Option<Decimal> {
        parse_attr(self, name)
    }

    /// Append an attribute when a value is present.
    pub fn set_attr<T: ToString>(&mut self, name: &str, value: Option<T>) {
        if let Some(value) = value {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Builder form of [`XmlNode::set_attr`].
    pub fn with_attr<T: ToString>(mut self, name: &str, value: Option<T>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn push_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == tag)
    }

    /// All child elements with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Invalid(format!(
            "second root element <{}>",
            node.name
        )));
    }
    *root = Some(node);
    Ok(())
}

fn parse_attr<T: FromStr>(node: &XmlNode, name: &str) -> Option<T> {
    let raw = node.attr(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(element = %node.name, attribute = name, value = raw, "unparsable attribute ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_attribute_order_and_nesting() {
        let xml = r#"<?xml version="1.0"?>
            <TSK A="TSK1" G="4">
                <PAN A="PDT1" E="DET1"><ASP A="2020-01-01T00:00:00Z" D="4"/></PAN>
                <TLG A="TLG00001" C="1"/>
            </TSK>"#;
        let root = XmlNode::parse(xml).expect("parse");
        assert_eq!(root.name, "TSK");
        assert_eq!(root.attributes[0], ("A".to_string(), "TSK1".to_string()));
        assert_eq!(root.children.len(), 2);
        let pan = root.child("PAN").expect("PAN");
        assert_eq!(pan.attr("E"), Some("DET1"));
        assert_eq!(pan.child("ASP").and_then(|asp| asp.attr_i64("D")), Some(4));
    }

    #[test]
    fn empty_and_unparsable_attributes_read_as_none() {
        let root = XmlNode::parse(r#"<PAN A="" C="lots"/>"#).expect("parse");
        assert_eq!(root.attr("A"), None);
        assert_eq!(root.attr_i64("C"), None);
        assert_eq!(root.attr("Z"), None);
    }

    #[test]
    fn whitespace_attributes_are_kept_verbatim() {
        let root = XmlNode::parse(r#"<PFD A="PFD1" C=" " D=" 42 "/>"#).expect("parse");
        assert_eq!(root.attr("C"), Some(" "));
        assert_eq!(root.attr_i64("D"), Some(42));
    }

    #[test]
    fn rejects_multiple_roots_and_unclosed_elements() {
        assert!(matches!(
            XmlNode::parse("<A/><B/>"),
            Err(XmlError::Invalid(_))
        ));
        assert!(XmlNode::parse("<A><B/>").is_err());
        assert!(matches!(XmlNode::parse("   "), Err(XmlError::Invalid(_))));
    }

    #[test]
    fn write_escapes_values_and_reads_back() {
        let node = XmlNode::new("PDT")
            .with_attr("A", Some("PDT1"))
            .with_attr("B", Some("N & P <mix>"))
            .with_attr::<i64>("F", None);
        let text = node.to_xml_string().expect("write");
        assert!(text.contains("N &amp; P &lt;mix&gt;"));
        assert!(!text.contains("F=\""));
        let back = XmlNode::parse(&text).expect("reparse");
        assert_eq!(back, node);
    }
}
