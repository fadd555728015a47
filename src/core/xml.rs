// src/core/xml.rs
//! Small owned element tree on top of quick-xml.
//!
//! Report documents are a few hundred kilobytes, so they are read whole and
//! queried by local element name; namespace prefixes are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{PresenceError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First direct child with this local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Text of the first direct child with this name, trimmed.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|e| e.text().trim().to_string())
    }

    /// All descendants with this local name, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for e in self.elements() {
            if e.name == name {
                out.push(e);
            }
            e.collect_named(name, out);
        }
    }

    /// First descendant with this local name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for e in self.elements() {
            if e.name == name {
                return Some(e);
            }
            if let Some(hit) = e.find(name) {
                return Some(hit);
            }
        }
        None
    }

    /// Concatenated text of this element and everything below it.
    pub fn text(&self) -> String {
        let mut out = s!();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for n in &self.children {
            match n {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.push_text(out),
            }
        }
    }
}

/// Parse a full document into its root element.
pub fn parse(bytes: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    // Open elements; the root stays at index 0.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(open_element(e)),
            Ok(Event::Empty(ref e)) => {
                let el = open_element(e);
                close_into(&mut stack, &mut root, el)?;
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| PresenceError::Parse(s!("unbalanced end tag")))?;
                close_into(&mut stack, &mut root, el)?;
            }
            Ok(Event::Text(ref e)) => {
                push_text(&mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) => {
                push_text(&mut stack, &String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::GeneralRef(ref e)) => {
                let name = String::from_utf8_lossy(e).into_owned();
                match resolve_entity(&name) {
                    Some(text) => push_text(&mut stack, &text),
                    None => push_text(&mut stack, &join!("&", &name, ";")),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PresenceError::Parse(format!(
                    "{e} at byte {}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(PresenceError::Parse(format!(
            "unexpected end of document inside <{}>",
            stack[stack.len() - 1].name
        )));
    }
    root.ok_or_else(|| PresenceError::Parse(s!("document has no root element")))
}

fn open_element(e: &BytesStart) -> Element {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.local_name().as_ref()).into_owned();
            let value = unescape(&String::from_utf8_lossy(&a.value));
            (key, value)
        })
        .collect();
    Element { name, attrs, children: Vec::new() }
}

fn close_into(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None if root.is_none() => *root = Some(el),
        None => return Err(PresenceError::Parse(s!("more than one root element"))),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    // Whitespace outside the root is dropped.
    let Some(top) = stack.last_mut() else { return };
    if let Some(Node::Text(prev)) = top.children.last_mut() {
        prev.push_str(text);
    } else {
        top.children.push(Node::Text(text.to_string()));
    }
}

fn resolve_entity(name: &str) -> Option<String> {
    let predefined = match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some(" "),
        _ => None,
    };
    if let Some(p) = predefined {
        return Some(s!(p));
    }
    let num = name.strip_prefix('#')?;
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}

/// Resolve the predefined and numeric entities inside attribute values.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').and_then(|semi| resolve_entity(&after[..semi]).map(|t| (semi, t))) {
            Some((semi, text)) => {
                out.push_str(&text);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
