//! A minimal element tree over quick-xml.
//!
//! Symbol dumps are built as [`XmlNode`] trees, written with indentation, and parsed back
//! for structural comparison. Comments, declarations and whitespace-only text are dropped
//! when parsing.

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::{Error, Result};

/// One XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    /// Element name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Trimmed text content, empty if there is none
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an element without attributes or content.
    pub fn new(name: impl Into<String>) -> Self {
        XmlNode {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element in place.
    pub fn push(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// The value of attribute `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The first child named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Write the tree as indented XML.
    ///
    /// # Errors
    /// Returns [`Error::Error`] if quick-xml fails to write.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_node(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Error(e.to_string()))
    }

    /// Parse the root element of `xml`.
    ///
    /// # Errors
    /// Returns [`Error::Error`] if `xml` is not well-formed or has no root element.
    pub fn parse(xml: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(element(e)?),
                Ok(Event::Empty(ref e)) => {
                    let node = element(e)?;
                    attach(&mut stack, &mut root, node);
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::Error("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, node);
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(xml_error)?;
                    let text = text.trim();
                    if let (false, Some(node)) = (text.is_empty(), stack.last_mut()) {
                        if !node.text.is_empty() {
                            node.text.push(' ');
                        }
                        node.text.push_str(text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(xml_error(e)),
            }
        }

        if !stack.is_empty() {
            return Err(Error::Error(format!(
                "unclosed element <{}>",
                stack.last().map_or("", |n| n.name.as_str())
            )));
        }
        root.ok_or_else(|| Error::Error("no root element".to_string()))
    }
}

fn element(start: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let value = attribute.unescape_value().map_err(xml_error)?;
        node.attributes.push((
            String::from_utf8_lossy(attribute.key.as_ref()).to_string(),
            value.to_string(),
        ));
    }
    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if !node.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&node.text)))
            .map_err(xml_error)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(xml_error)
}

fn xml_error(error: impl std::fmt::Display) -> Error {
    Error::Error(format!("XML: {error}"))
}
