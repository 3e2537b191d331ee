//! Python bindings for the USFM parser, indexer and renderer.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyList;
use usfm_core::{
    ast::{Document, Node, NodeKind},
    error::{ParseError as CoreParseError, ParseErrorKind as CoreParseErrorKind},
    span::Span as CoreSpan,
    ContentItem as CoreContentItem, EntryKind, Index as CoreIndex, IndexEntry as CoreIndexEntry,
    ParseResult as CoreParseResult, Parser as CoreParser, RenderOptions, Translation,
    VerseItem as CoreVerseItem,
};

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ============================================================================
// Span
// ============================================================================

/// Source location in the input text (byte offsets).
#[pyclass(frozen, get_all, name = "Span")]
#[derive(Clone)]
pub struct PySpan {
    pub start: u32,
    pub end: u32,
}

#[pymethods]
impl PySpan {
    fn __repr__(&self) -> String {
        format!("Span({}, {})", self.start, self.end)
    }
}

impl From<CoreSpan> for PySpan {
    fn from(s: CoreSpan) -> Self {
        PySpan {
            start: s.start,
            end: s.end,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Parse error category.
#[pyclass(frozen, eq, eq_int, name = "ParseErrorKind")]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PyParseErrorKind {
    ExpectedBookCode,
    ExpectedChapterNumber,
    ExpectedVerseNumber,
    UnknownMarker,
    UnclosedMarker,
    InvalidNumber,
    KeysExhausted,
}

impl From<CoreParseErrorKind> for PyParseErrorKind {
    fn from(k: CoreParseErrorKind) -> Self {
        match k {
            CoreParseErrorKind::ExpectedBookCode => PyParseErrorKind::ExpectedBookCode,
            CoreParseErrorKind::ExpectedChapterNumber => PyParseErrorKind::ExpectedChapterNumber,
            CoreParseErrorKind::ExpectedVerseNumber => PyParseErrorKind::ExpectedVerseNumber,
            CoreParseErrorKind::UnknownMarker => PyParseErrorKind::UnknownMarker,
            CoreParseErrorKind::UnclosedMarker => PyParseErrorKind::UnclosedMarker,
            CoreParseErrorKind::InvalidNumber => PyParseErrorKind::InvalidNumber,
            CoreParseErrorKind::KeysExhausted => PyParseErrorKind::KeysExhausted,
        }
    }
}

/// A diagnostic.
#[pyclass(frozen, get_all, name = "ParseError")]
#[derive(Clone)]
pub struct PyParseError {
    pub message: String,
    pub span: Option<PySpan>,
    pub kind: PyParseErrorKind,
    pub recoverable: bool,
}

#[pymethods]
impl PyParseError {
    fn __repr__(&self) -> String {
        format!("ParseError({:?}, {:?})", self.message, self.kind)
    }

    fn __str__(&self) -> String {
        match &self.span {
            Some(s) => format!("{} at bytes {}..{}", self.message, s.start, s.end),
            None => self.message.clone(),
        }
    }
}

impl From<CoreParseError> for PyParseError {
    fn from(e: CoreParseError) -> Self {
        PyParseError {
            message: e.message,
            span: e.span.map(PySpan::from),
            kind: e.kind.into(),
            recoverable: e.recoverable,
        }
    }
}

// ============================================================================
// Tree
// ============================================================================

/// A tree node.
///
/// `kind` is one of "book", "marker", "text", "bookcode", "heading",
/// "description", "chapternumber", "versenumber", "subverse", "citation"
/// or "illegal". Markers keep their literal as `value`.
#[pyclass(frozen, get_all, name = "Node")]
pub struct PyNode {
    pub kind: String,
    pub value: String,
    pub position: u32,
    pub children: PyObject,
}

#[pymethods]
impl PyNode {
    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!(
            "Node({}, {:?}, position={}, children={})",
            self.kind,
            self.value,
            self.position,
            self.children.bind(py).len()?
        ))
    }

    fn __len__(&self, py: Python<'_>) -> PyResult<usize> {
        self.children.bind(py).len()
    }
}

fn kind_name(kind: NodeKind) -> String {
    format!("{:?}", kind).to_lowercase()
}

fn convert_node(py: Python<'_>, node: &Node) -> PyResult<PyNode> {
    let children = PyList::empty(py);
    for child in &node.children {
        children.append(Py::new(py, convert_node(py, child)?)?)?;
    }
    Ok(PyNode {
        kind: kind_name(node.kind),
        value: node.value.clone(),
        position: node.position,
        children: children.into_any().unbind(),
    })
}

/// A parsed USFM document.
#[pyclass(frozen, name = "Document")]
pub struct PyDocument {
    /// Three letter book code, empty when `\id` was absent.
    #[pyo3(get)]
    pub code: String,
    #[pyo3(get)]
    pub book: Py<PyNode>,
    #[pyo3(get)]
    pub span: PySpan,
}

#[pymethods]
impl PyDocument {
    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!(
            "Document(code={:?}, nodes={}, bytes={})",
            self.code,
            self.book.get().children.bind(py).len()?,
            self.span.end
        ))
    }
}

fn convert_document(py: Python<'_>, doc: &Document) -> PyResult<PyDocument> {
    Ok(PyDocument {
        code: doc.code().to_string(),
        book: Py::new(py, convert_node(py, &doc.book)?)?,
        span: doc.span.into(),
    })
}

/// Result of parsing with error recovery.
#[pyclass(frozen, name = "ParseResult")]
pub struct PyParseResult {
    #[pyo3(get)]
    pub document: Py<PyDocument>,
    #[pyo3(get)]
    pub errors: Vec<PyParseError>,
}

#[pymethods]
impl PyParseResult {
    #[getter]
    fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn __repr__(&self) -> String {
        format!(
            "ParseResult(ok={}, code={:?}, errors={})",
            self.errors.is_empty(),
            self.document.get().code,
            self.errors.len()
        )
    }
}

// ============================================================================
// Index
// ============================================================================

/// A byte range of one book, chapter, verse or description.
#[pyclass(frozen, get_all, name = "IndexEntry")]
#[derive(Clone)]
pub struct PyIndexEntry {
    pub key: u32,
    pub owner_key: u32,
    pub reference: String,
    pub start: u64,
    pub end: u64,
    /// "book", "chapter", "verse" or "description".
    pub kind: String,
}

#[pymethods]
impl PyIndexEntry {
    fn __repr__(&self) -> String {
        format!(
            "IndexEntry({}, {:?}, {}..={}, {})",
            self.key, self.reference, self.start, self.end, self.kind
        )
    }
}

impl From<&CoreIndexEntry> for PyIndexEntry {
    fn from(e: &CoreIndexEntry) -> Self {
        PyIndexEntry {
            key: e.key,
            owner_key: e.owner_key,
            reference: e.reference.clone(),
            start: e.start,
            end: e.end,
            kind: match e.kind {
                EntryKind::Book => "book",
                EntryKind::Chapter => "chapter",
                EntryKind::Verse => "verse",
                EntryKind::Description => "description",
            }
            .to_string(),
        }
    }
}

/// Byte-range index accumulated over a corpus.
///
/// Each call to `append` continues from the key and byte where the
/// previous document ended.
///
/// Args:
///     start_key: Key allocated before the first entry (default: 0)
///     start_byte: Byte offset of the first document (default: 0)
///     short_code, name, revision, date_published: Translation metadata
#[pyclass(name = "Index")]
pub struct PyIndex {
    inner: CoreIndex,
    #[pyo3(get)]
    end_key: u32,
    #[pyo3(get)]
    end_byte: u64,
    #[pyo3(get)]
    warnings: Vec<PyParseError>,
}

#[pymethods]
impl PyIndex {
    #[new]
    #[pyo3(
        signature = (start_key=0, start_byte=0, short_code=None, name=None, revision=None, date_published=None),
        text_signature = "(start_key=0, start_byte=0, short_code=None, name=None, revision=None, date_published=None)"
    )]
    fn new(
        start_key: u32,
        start_byte: u64,
        short_code: Option<String>,
        name: Option<String>,
        revision: Option<String>,
        date_published: Option<String>,
    ) -> Self {
        let translation = Translation {
            short_code: short_code.unwrap_or_default(),
            name: name.unwrap_or_default(),
            revision: revision.unwrap_or_default(),
            date_published: date_published.unwrap_or_default(),
        };
        PyIndex {
            inner: CoreIndex::new(translation),
            end_key: start_key,
            end_byte: start_byte,
            warnings: Vec::new(),
        }
    }

    /// Parse a document and append its entries. Raises ValueError on error.
    #[pyo3(text_signature = "(self, input)")]
    fn append(&mut self, input: &str) -> PyResult<()> {
        let document = CoreParser::new().parse(input).map_err(value_error)?;
        let appended = self.inner.append(&document, self.end_key, self.end_byte);
        self.end_key = appended.end_key;
        self.end_byte = appended.end_byte;
        self.warnings
            .extend(appended.warnings.into_iter().map(PyParseError::from));
        Ok(())
    }

    /// Entry with the given key.
    fn get(&self, key: u32) -> Option<PyIndexEntry> {
        self.inner.get(key).map(PyIndexEntry::from)
    }

    /// Entry whose range contains the given byte.
    fn locate(&self, byte: u64) -> Option<PyIndexEntry> {
        self.inner.locate(byte).map(PyIndexEntry::from)
    }

    #[getter]
    fn entries(&self) -> Vec<PyIndexEntry> {
        self.inner.entries.values().map(PyIndexEntry::from).collect()
    }

    #[getter]
    fn descriptions(&self) -> Vec<PyIndexEntry> {
        self.inner.descriptions.iter().map(PyIndexEntry::from).collect()
    }

    /// Serialize the index in its sidecar JSON shape.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(value_error)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Index(entries={}, end_key={}, end_byte={})",
            self.inner.len(),
            self.end_key,
            self.end_byte
        )
    }
}

// ============================================================================
// Render
// ============================================================================

/// Markup for one verse.
#[pyclass(frozen, get_all, name = "VerseItem")]
#[derive(Clone)]
pub struct PyVerseItem {
    pub key: u32,
    pub reference: String,
    pub markup: String,
}

impl From<CoreVerseItem> for PyVerseItem {
    fn from(v: CoreVerseItem) -> Self {
        PyVerseItem {
            key: v.key,
            reference: v.reference,
            markup: v.markup,
        }
    }
}

/// A display item.
///
/// `kind` is "book", "chapter", "description", "paragraph" or "verse".
/// Only paragraphs carry `verses`.
#[pyclass(frozen, get_all, name = "ContentItem")]
pub struct PyContentItem {
    pub kind: String,
    pub key: u32,
    pub reference: String,
    pub markup: String,
    pub verses: Vec<PyVerseItem>,
}

#[pymethods]
impl PyContentItem {
    fn __repr__(&self) -> String {
        format!("ContentItem({}, {}, {:?})", self.kind, self.key, self.reference)
    }
}

fn item(kind: &str, key: u32, reference: String, markup: String) -> PyContentItem {
    PyContentItem {
        kind: kind.to_string(),
        key,
        reference,
        markup,
        verses: Vec::new(),
    }
}

impl From<CoreContentItem> for PyContentItem {
    fn from(i: CoreContentItem) -> Self {
        match i {
            CoreContentItem::Book {
                key,
                reference,
                markup,
            } => item("book", key, reference, markup),
            CoreContentItem::Chapter {
                key,
                reference,
                markup,
            } => item("chapter", key, reference, markup),
            CoreContentItem::Description {
                key,
                reference,
                markup,
            } => item("description", key, reference, markup),
            CoreContentItem::Paragraph {
                key,
                reference,
                markup,
                verses,
            } => PyContentItem {
                verses: verses.into_iter().map(PyVerseItem::from).collect(),
                ..item("paragraph", key, reference, markup)
            },
            CoreContentItem::Verse(v) => item("verse", v.key, v.reference, v.markup),
        }
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Parse a USFM string.
///
/// Args:
///     input: Document string to parse
///
/// Returns:
///     Document: Parsed document
///
/// Raises:
///     ValueError: On a missing book code, chapter number or verse number
#[pyfunction]
#[pyo3(signature = (input), text_signature = "(input)")]
fn parse(py: Python<'_>, input: &str) -> PyResult<PyDocument> {
    let document = CoreParser::new().parse(input).map_err(value_error)?;
    convert_document(py, &document)
}

/// Parse and collect recoverable diagnostics.
///
/// Args:
///     input: Document string
///     strict: Fail on the first diagnostic (default: False)
///
/// Returns:
///     ParseResult: Result with document and errors
///
/// Raises:
///     ValueError: On a fatal error
#[pyfunction]
#[pyo3(signature = (input, strict=false), text_signature = "(input, strict=False)")]
fn parse_with_recovery(py: Python<'_>, input: &str, strict: bool) -> PyResult<PyParseResult> {
    let CoreParseResult { document, errors } = CoreParser::new()
        .with_recovery(!strict)
        .parse_with_recovery(input)
        .map_err(value_error)?;
    Ok(PyParseResult {
        document: Py::new(py, convert_document(py, &document)?)?,
        errors: errors.into_iter().map(PyParseError::from).collect(),
    })
}

/// Build a byte-range index for one document.
///
/// Args:
///     input: Document string
///     start_key: Key allocated before the first entry (default: 0)
///     start_byte: Byte offset of the document in its corpus (default: 0)
///
/// Returns:
///     Index: Index whose end_key and end_byte seed the next document
#[pyfunction]
#[pyo3(signature = (input, start_key=0, start_byte=0), text_signature = "(input, start_key=0, start_byte=0)")]
fn build_index(input: &str, start_key: u32, start_byte: u64) -> PyResult<PyIndex> {
    let mut index = PyIndex::new(start_key, start_byte, None, None, None, None);
    index.append(input)?;
    Ok(index)
}

/// Render display items for a document.
///
/// Args:
///     input: Document string
///     start_key: Key allocated before the first item (default: 0)
///     options: JSON object overriding element wrappers, e.g.
///         '{"verse_number": {"tag": "b"}}'
///
/// Returns:
///     list[ContentItem]: Items in document order
#[pyfunction]
#[pyo3(signature = (input, start_key=0, options=None), text_signature = "(input, start_key=0, options=None)")]
fn render(input: &str, start_key: u32, options: Option<&str>) -> PyResult<Vec<PyContentItem>> {
    let options: RenderOptions = match options {
        Some(json) => serde_json::from_str(json).map_err(value_error)?,
        None => RenderOptions::default(),
    };
    let document = CoreParser::new().parse(input).map_err(value_error)?;
    let rendered = usfm_core::render(&document, start_key, &options);
    Ok(rendered.items.into_iter().map(PyContentItem::from).collect())
}

// ============================================================================
// Module
// ============================================================================

/// USFM - Scripture markup parser with byte-range indexing and rendering.
#[pymodule]
fn pyusfm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySpan>()?;
    m.add_class::<PyParseErrorKind>()?;
    m.add_class::<PyParseError>()?;
    m.add_class::<PyNode>()?;
    m.add_class::<PyDocument>()?;
    m.add_class::<PyParseResult>()?;
    m.add_class::<PyIndexEntry>()?;
    m.add_class::<PyIndex>()?;
    m.add_class::<PyVerseItem>()?;
    m.add_class::<PyContentItem>()?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(parse_with_recovery, m)?)?;
    m.add_function(wrap_pyfunction!(build_index, m)?)?;
    m.add_function(wrap_pyfunction!(render, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
