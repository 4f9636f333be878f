//! Parse writer output back with quick-xml for structural comparison.

#![allow(dead_code)]

use std::io::Cursor;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Element with namespace-resolved names
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub ns: Option<String>,
    pub name: String,
    /// (namespace, local name, value); xmlns declarations excluded
    pub attributes: Vec<(Option<String>, String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(ns: Option<String>, name: String) -> Self {
        Element {
            ns,
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(ns, local, _)| ns.is_none() && local == name)
            .map(|(_, _, value)| value.as_str())
    }

    pub fn attr_ns(&self, ns: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(a_ns, local, _)| a_ns.as_deref() == Some(ns) && local == name)
            .map(|(_, _, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

fn namespace(resolve: ResolveResult<'_>) -> Option<String> {
    match resolve {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => panic!(
            "unknown prefix {}",
            String::from_utf8_lossy(&prefix)
        ),
    }
}

fn resolve_entity(raw: &str) -> String {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return resolved.to_string();
    }
    let rest = raw.strip_prefix('#').expect("only predefined or numeric references");
    let code = match rest.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).unwrap(),
        None => rest.parse::<u32>().unwrap(),
    };
    char::from_u32(code).unwrap().to_string()
}

/// Parse a complete document into its root element. With `trim`, whitespace
/// around text is dropped (for pretty-printed output).
pub fn parse(xml: &[u8], trim: bool) -> Element {
    let mut reader = NsReader::from_reader(Cursor::new(xml));
    reader.config_mut().trim_text(trim);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        buf.clear();
        let (resolve, event) = reader
            .read_resolved_event_into(&mut buf)
            .expect("writer output must be well-formed");

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let ns = namespace(resolve);
                let local = String::from_utf8(e.local_name().as_ref().to_vec()).unwrap();
                let mut element = Element::new(ns, local);

                for attr in e.attributes() {
                    let attr = attr.expect("attribute must be well-formed");
                    let key = attr.key;
                    if key.as_ref() == b"xmlns" {
                        continue;
                    }
                    if let Some(prefix) = key.prefix() {
                        if prefix.as_ref() == b"xmlns" {
                            continue;
                        }
                    }
                    let (attr_resolve, _) = reader.resolver().resolve_attribute(key);
                    let attr_ns = namespace(attr_resolve);
                    let attr_local = String::from_utf8(key.local_name().as_ref().to_vec()).unwrap();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .unwrap()
                        .into_owned();
                    element.attributes.push((attr_ns, attr_local, value));
                }

                if matches!(event, Event::Start(_)) {
                    stack.push(element);
                } else {
                    attach(&mut stack, element, &mut root);
                }
            }
            Event::End(_) => {
                let element = stack.pop().expect("balanced tags");
                attach(&mut stack, element, &mut root);
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&e.decode().unwrap());
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&resolve_entity(&e.decode().unwrap()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    assert!(stack.is_empty(), "unclosed elements");
    root.expect("document has a root element")
}

fn attach(stack: &mut [Element], element: Element, root: &mut Option<Element>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else {
        assert!(root.is_none(), "more than one root element");
        *root = Some(element);
    }
}

/// Output as a string
pub fn utf8(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("writer output is UTF-8")
}
