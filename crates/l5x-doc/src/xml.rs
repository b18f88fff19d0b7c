//! Reading and writing [`Document`]s.
//!
//! Studio 5000 is picky about what it imports back: files start with a UTF-8
//! BOM, use CRLF line endings, and keep descriptions, rung text and L5K data
//! inside CDATA sections. Parsing tolerates all of that (BOM optional, CDATA
//! preserved as [`Text::CData`]); writing reproduces it.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::element::{Element, Text};
use crate::error::DocError;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Elements whose text is always emitted as CDATA, even if it was parsed or
/// set as plain text.
const CDATA_ELEMENTS: &[&str] = &[
    "Description",
    "Comment",
    "Text",
    "Line",
    "RevisionNote",
    "AdditionalHelpText",
];

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A parsed XML document: a single root element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wrap an existing element tree.
    #[must_use]
    pub const fn new(root: Element) -> Self {
        Self { root }
    }

    /// The root element.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable access to the root element.
    pub const fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Consume the document, returning the root element.
    #[must_use]
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Fail with [`DocError::UnexpectedRoot`] unless the root is `expected`.
    pub fn expect_root(&self, expected: &str) -> Result<(), DocError> {
        if self.root.name() == expected {
            Ok(())
        } else {
            Err(DocError::UnexpectedRoot {
                expected: expected.to_owned(),
                found: self.root.name().to_owned(),
            })
        }
    }

    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<Self, DocError> {
        let bytes = fs::read(path).map_err(|source| DocError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded document");
        Self::from_bytes(&bytes)
    }

    /// Parse raw bytes, stripping a leading UTF-8 BOM.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|e| DocError::Xml {
            position: u64::try_from(e.valid_up_to()).unwrap_or(u64::MAX),
            message: format!("invalid UTF-8: {e}"),
        })?;
        Self::parse(text)
    }

    /// Parse a string.
    ///
    /// Comments, processing instructions and whitespace-only text are
    /// discarded.
    pub fn parse(text: &str) -> Result<Self, DocError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| DocError::Xml {
                position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(start) => stack.push(open_element(&start, &reader)?),
                Event::Empty(start) => {
                    let element = open_element(&start, &reader)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    let element = stack.pop().ok_or_else(|| DocError::Unbalanced {
                        name: name.clone(),
                        message: "closing tag without a matching opening tag".to_owned(),
                    })?;
                    if element.name() != name {
                        return Err(DocError::Unbalanced {
                            name,
                            message: format!("expected `</{}>`", element.name()),
                        });
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(raw) => {
                    let value = raw.unescape().map_err(|e| DocError::Xml {
                        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                        message: e.to_string(),
                    })?;
                    if let Some(top) = stack.last_mut()
                        && !value.trim().is_empty()
                    {
                        append_text(top, Text::Plain(value.into_owned()));
                    }
                }
                Event::CData(raw) => {
                    if let Some(top) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&raw.into_inner()).into_owned();
                        append_text(top, Text::CData(value));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(DocError::Unbalanced {
                name: open.name().to_owned(),
                message: "document ended before the element was closed".to_owned(),
            });
        }
        root.map(Self::new).ok_or(DocError::EmptyDocument)
    }

    /// Serialize with an XML declaration and two-space indentation.
    ///
    /// Line endings are `\n`; [`Document::save`] converts them to CRLF.
    pub fn to_xml_string(&self) -> Result<String, DocError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
        )?;
        write_element(&mut writer, &self.root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| DocError::Write {
            message: e.to_string(),
        })
    }

    /// Write the document the way Studio 5000 expects to read it back:
    /// UTF-8 BOM, XML declaration, CRLF line endings.
    pub fn save(&self, path: &Path) -> Result<(), DocError> {
        let xml = self.to_xml_string()?;
        let crlf = xml.replace("\r\n", "\n").replace('\n', "\r\n");
        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + crlf.len() + 2);
        bytes.extend_from_slice(UTF8_BOM);
        bytes.extend_from_slice(crlf.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        fs::write(path, bytes).map_err(|source| DocError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "saved document");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn open_element(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, DocError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocError::Xml {
            position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| DocError::Xml {
            position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
            message: e.to_string(),
        })?;
        element.set_attr(&key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(DocError::Unbalanced {
            name: element.name().to_owned(),
            message: "second root element".to_owned(),
        })
    }
}

/// Entity references can split character data into several events; glue
/// them back together. A CDATA section anywhere wins the representation.
fn append_text(element: &mut Element, incoming: Text) {
    let merged = match (element.text_content(), incoming) {
        (None, incoming) => incoming,
        (Some(Text::CData(prev)), incoming) => Text::CData(format!("{prev}{}", incoming.as_str())),
        (Some(Text::Plain(prev)), Text::Plain(next)) => Text::Plain(format!("{prev}{next}")),
        (Some(Text::Plain(prev)), Text::CData(next)) => Text::CData(format!("{prev}{next}")),
    };
    element.set_text_content(Some(merged));
}

// ---------------------------------------------------------------------------
// Writing helpers
// ---------------------------------------------------------------------------

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocError> {
    writer.write_event(event).map_err(|e| DocError::Write {
        message: e.to_string(),
    })
}

fn wants_cdata(element: &Element) -> bool {
    CDATA_ELEMENTS.contains(&element.name())
        || (element.name() == "Data" && element.attr("Format") == Some("L5K"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocError> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    let text = element.text_content();
    if text.is_none() && element.children().is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = text {
        match text {
            Text::CData(value) => emit(writer, Event::CData(BytesCData::new(value.as_str())))?,
            Text::Plain(value) if wants_cdata(element) => {
                emit(writer, Event::CData(BytesCData::new(value.as_str())))?;
            }
            Text::Plain(value) => {
                emit(writer, Event::Text(BytesText::new(value.as_str())))?;
            }
        }
    }
    for child in element.children() {
        write_element(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name())))
}
