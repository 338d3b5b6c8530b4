//! XML documents and element trees
//!
//! Anything implementing [`XmlDocument`] can be turned into an XML response.
//! [`Element`] is the generic element-tree node; typed document models
//! implement the trait themselves. Serialization is delegated to `quick-xml`.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// A value that can render itself as an XML document
pub trait XmlDocument {
    fn to_xml(&self) -> Result<String>;
}

/// Child node of an [`Element`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Generic element-tree node with ordered attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// HTML elements that never carry content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an existing one of the same name in place
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Serialize using HTML conventions: void elements are written without
    /// a closing tag and every other element is written as an open/close pair
    pub fn to_html(&self) -> Result<String> {
        let mut out = String::new();
        write_html(self, &mut out)?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        for (name, _) in &self.attributes {
            check_name(name)?;
        }
        Ok(())
    }
}

impl XmlDocument for Element {
    fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }
}

/// Raw XML text is passed through after a well-formedness check
impl XmlDocument for str {
    fn to_xml(&self) -> Result<String> {
        check_well_formed(self)?;
        Ok(self.to_owned())
    }
}

impl XmlDocument for String {
    fn to_xml(&self) -> Result<String> {
        self.as_str().to_xml()
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    element.validate()?;

    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(e.to_string()))
}

fn write_html(element: &Element, out: &mut String) -> Result<()> {
    element.validate()?;

    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&quick_xml::escape::escape(value.as_str()));
        out.push('"');
    }
    out.push('>');

    let is_void = VOID_ELEMENTS.contains(&element.name.to_ascii_lowercase().as_str());
    if is_void {
        if !element.children.is_empty() {
            return Err(Error::Xml(format!(
                "void element <{}> cannot have children",
                element.name
            )));
        }
        return Ok(());
    }

    for child in &element.children {
        match child {
            Node::Element(inner) => write_html(inner, out)?,
            Node::Text(text) => out.push_str(&quick_xml::escape::escape(text.as_str())),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
    Ok(())
}

/// Accepts XML names made of letters, digits, `_`, `-`, `.` and `:`
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == ':');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(Error::Xml(format!("invalid XML name: '{name}'")))
    }
}

fn check_well_formed(text: &str) -> Result<()> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::Text(t)) if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) => {
                return Err(Error::Xml("text outside the root element".to_string()));
            }
            Ok(Event::CData(_)) if depth == 0 => {
                return Err(Error::Xml("CDATA outside the root element".to_string()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Xml(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
    }

    match (depth, roots) {
        (0, 1) => Ok(()),
        (0, 0) => Err(Error::Xml("document has no root element".to_string())),
        (0, _) => Err(Error::Xml("document has more than one root element".to_string())),
        _ => Err(Error::Xml("document ends inside an open element".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("root")
            .attr("foo", "42")
            .child(Element::new("bar").attr("spamm", "eggs").text("Hello world."))
    }

    #[test]
    fn test_element_tree_serialization() {
        assert_eq!(
            sample().to_xml().unwrap(),
            r#"<root foo="42"><bar spamm="eggs">Hello world.</bar></root>"#
        );
    }

    #[test]
    fn test_attribute_order_and_replacement() {
        let element = Element::new("a").attr("z", "1").attr("b", "2").attr("z", "3");
        assert_eq!(element.to_xml().unwrap(), r#"<a z="3" b="2"/>"#);
        assert_eq!(element.get_attr("z"), Some("3"));
    }

    #[test]
    fn test_text_is_escaped() {
        let element = Element::new("msg").attr("q", "a<b").text("1 < 2 & 3 > 2");
        let xml = element.to_xml().unwrap();
        assert!(xml.contains("a&lt;b"));
        assert!(xml.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn test_mixed_content() {
        let element = Element::new("p")
            .text("one ")
            .child(Element::new("b").text("two"))
            .text(" three");
        assert_eq!(element.to_xml().unwrap(), "<p>one <b>two</b> three</p>");
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(matches!(Element::new("").to_xml(), Err(Error::Xml(_))));
        assert!(matches!(Element::new("1abc").to_xml(), Err(Error::Xml(_))));
        assert!(matches!(
            Element::new("ok").attr("bad name", "x").to_xml(),
            Err(Error::Xml(_))
        ));
        let nested = Element::new("ok").child(Element::new("no<pe"));
        assert!(matches!(nested.to_xml(), Err(Error::Xml(_))));
    }

    #[test]
    fn test_raw_text_well_formedness() {
        assert!("<a><b/></a>".to_xml().is_ok());
        assert!(matches!("<a><b></a>".to_xml(), Err(Error::Xml(_))));
        assert!(matches!("<a>".to_xml(), Err(Error::Xml(_))));
        assert!(matches!("just text".to_xml(), Err(Error::Xml(_))));
        assert!(matches!("<a/><b/>".to_xml(), Err(Error::Xml(_))));
    }

    #[test]
    fn test_text_outside_root_rejected() {
        assert!(matches!("junk<a/>".to_xml(), Err(Error::Xml(_))));
        assert!(matches!("<a/>trailing".to_xml(), Err(Error::Xml(_))));
        assert!(matches!("<![CDATA[x]]><a/>".to_xml(), Err(Error::Xml(_))));
        assert!("\n  <a>text</a>\n".to_xml().is_ok());
        assert!("<?xml version=\"1.0\"?>\n<a/>".to_xml().is_ok());
    }

    #[test]
    fn test_html_void_elements() {
        let page = Element::new("p")
            .text("line")
            .child(Element::new("br"))
            .child(Element::new("span"));
        assert_eq!(page.to_html().unwrap(), "<p>line<br><span></span></p>");

        let broken = Element::new("img").text("nope");
        assert!(broken.to_html().is_err());
    }
}
