//! XML → JSON transcoding.
//!
//! Shape rules:
//! - the document becomes `{ "<root>": <element> }`, preceded by a `"?xml"`
//!   object when the document carries an XML declaration;
//! - an element without attributes or child elements becomes its text, or
//!   `null` when empty;
//! - otherwise it becomes an object: attributes as `@name` fields, child
//!   elements keyed by name (repeated names collapse into an array) and
//!   non-whitespace text under `#text`.

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::ConvertError;

pub use meteo_core::stamp::{stamp, stamp_at};

type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Vec<String>,
}

#[derive(Debug)]
struct Document {
    declaration: Option<Map<String, Value>>,
    root: Element,
}

/// Transcode well-formed XML into a JSON object.
pub fn convert(xml: &str) -> Result<Value> {
    let document = parse_document(xml)?;

    let mut out = Map::new();
    if let Some(decl) = document.declaration {
        out.insert("?xml".to_string(), Value::Object(decl));
    }
    let name = document.root.name.clone();
    out.insert(name, document.root.into_value());
    Ok(Value::Object(out))
}

/// Check that `xml` is a well-formed document without building JSON.
pub fn validate(xml: &str) -> Result<()> {
    parse_document(xml).map(|_| ())
}

fn malformed(msg: impl std::fmt::Display) -> ConvertError {
    ConvertError::Malformed(msg.to_string())
}

fn parse_document(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("{e} (at byte {})", reader.error_position())))?;

        match event {
            Event::Decl(decl) => {
                if root.is_some() || !stack.is_empty() {
                    return Err(malformed("XML declaration after the root element"));
                }
                declaration = Some(declaration_fields(&decl)?);
            }
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                stack.push(Element::from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_some() => return Err(malformed("multiple root elements")),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("closing tag without matching opening tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(malformed)?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let bytes = cdata.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(malformed)?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // comments, processing instructions, DOCTYPE
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    let root = root.ok_or_else(|| malformed("document has no root element"))?;
    Ok(Document { declaration, root })
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) => {
            if !text.is_empty() {
                element.text.push(text.to_string());
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside the root element")),
    }
}

fn declaration_fields(decl: &BytesDecl<'_>) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    let version = decl.version().map_err(malformed)?;
    fields.insert("@version".to_string(), utf8_value(&version)?);
    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(malformed)?;
        fields.insert("@encoding".to_string(), utf8_value(&encoding)?);
    }
    if let Some(standalone) = decl.standalone() {
        let standalone = standalone.map_err(malformed)?;
        fields.insert("@standalone".to_string(), utf8_value(&standalone)?);
    }
    Ok(fields)
}

fn utf8_value(bytes: &[u8]) -> Result<Value> {
    std::str::from_utf8(bytes)
        .map(|s| Value::String(s.to_string()))
        .map_err(malformed)
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(malformed)?
            .to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(malformed)?
                .to_string();
            if attr.value.contains(&b'<') {
                return Err(malformed(format!("'<' in value of attribute {key}")));
            }
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: Vec::new(),
        })
    }

    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            let text = self.text.concat();
            return if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            };
        }

        let mut map = Map::new();
        for (key, value) in self.attributes {
            map.insert(format!("@{key}"), Value::String(value));
        }

        for child in self.children {
            let name = child.name.clone();
            let value = child.into_value();
            match map.get_mut(&name) {
                // element values are never arrays, so an array here is a group
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }

        let mut text: Vec<Value> = self
            .text
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .map(Value::String)
            .collect();
        match text.len() {
            0 => {}
            1 => {
                map.insert("#text".to_string(), text.remove(0));
            }
            _ => {
                map.insert("#text".to_string(), Value::Array(text));
            }
        }

        Value::Object(map)
    }
}
