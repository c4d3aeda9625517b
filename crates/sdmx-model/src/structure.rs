//! Structure document loading.
//!
//! Parses an SDMX Structure file into an owned element tree. Element tag
//! names are stripped of their namespace qualifier while parsing, so
//! downstream lookups can match on bare tag names (`Concept`, `CodeList`)
//! no matter which namespace URI the publisher declared. Attribute keys are
//! stored as written; the reference attributes of the exchange format
//! (`conceptRef`, `codelist`, `id`, `value`) are unprefixed.

use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Result, SdmxError};

/// One element of a parsed structure document.
///
/// Text content is preserved exactly as written: codelist descriptions may
/// carry meaningful leading whitespace (indented census labels), so the
/// loader never trims.
#[derive(Debug, Clone)]
pub struct Element {
    /// Namespace-stripped tag name.
    pub tag: String,
    /// Attribute key/value pairs in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(tag: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            tag,
            attributes,
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Accumulated text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Depth-first iterator over this element and all its descendants.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element in the subtree (including self) with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.iter().find(|e| e.tag == tag)
    }
}

/// Depth-first element iterator.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// A fully parsed structure document.
#[derive(Debug, Clone)]
pub struct StructureDocument {
    root: Element,
}

impl StructureDocument {
    /// Load and parse a structure document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SdmxError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Parse a structure document from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut xml = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(start) => {
                    let element = element_from_start(&start)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| SdmxError::DocumentParse {
                        message: "unexpected closing tag".to_string(),
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.decode().map_err(quick_xml::Error::from)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = format!("&{};", String::from_utf8_lossy(&reference));
                        current.text.push_str(&quick_xml::escape::unescape(&raw)?);
                    }
                }
                Event::Eof => break,
                // Declarations, comments and processing instructions carry
                // no structure information.
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(SdmxError::DocumentParse {
                message: "unclosed element at end of document".to_string(),
            });
        }
        let root = root.ok_or_else(|| SdmxError::DocumentParse {
            message: "document has no root element".to_string(),
        })?;
        Ok(Self { root })
    }

    /// Parse a structure document held in memory.
    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::from_reader(xml.as_bytes())
    }

    /// Root element of the document.
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// Remove a namespace qualifier from a tag, e.g. `{urn:sdmx}Concept`
/// parses with local name `Concept`.
fn element_from_start(start: &quick_xml::events::BytesStart<'_>) -> Result<Element> {
    let tag = String::from_utf8_lossy(start.name().local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element::new(tag, attributes))
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(SdmxError::DocumentParse {
            message: "multiple root elements".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_stripped_tags() {
        let document = StructureDocument::parse_str(
            r#"<message:Structure xmlns:message="urn:sdmx:message">
                 <message:CodeLists><structure:CodeList xmlns:structure="urn:sdmx:structure" id="CL_SEX"/></message:CodeLists>
               </message:Structure>"#,
        )
        .unwrap();
        assert_eq!(document.root().tag, "Structure");
        let code_list = document.root().find("CodeList").unwrap();
        assert_eq!(code_list.attr("id"), Some("CL_SEX"));
    }

    #[test]
    fn test_text_preserved_untrimmed() {
        let document =
            StructureDocument::parse_str("<Code value=\"01\"><Description>   75 years and over</Description></Code>")
                .unwrap();
        let description = document.root().find("Description").unwrap();
        assert_eq!(description.text(), "   75 years and over");
    }

    #[test]
    fn test_entities_unescaped() {
        let document =
            StructureDocument::parse_str("<Name>Mother tongue &amp; language</Name>").unwrap();
        assert_eq!(document.root().text(), "Mother tongue & language");
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            StructureDocument::parse_str("<KeyFamily><Dimension></KeyFamily>"),
            Err(SdmxError::DocumentParse { .. })
        ));
        assert!(matches!(
            StructureDocument::parse_str(""),
            Err(SdmxError::DocumentParse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = StructureDocument::from_path(Path::new("/nonexistent/Structure_X.xml"))
            .unwrap_err();
        assert!(matches!(err, SdmxError::DocumentRead { .. }));
    }

    #[test]
    fn test_descendant_iteration_order() {
        let document = StructureDocument::parse_str(
            "<a><b><c/></b><d/></a>",
        )
        .unwrap();
        let tags: Vec<&str> = document.root().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["a", "b", "c", "d"]);
    }
}
