//! Block tree of a Markdown document.
//!
//! The tree is built from pulldown-cmark's offset event stream. Only the
//! structure needed to find fenced code blocks is kept: a kind per node, its
//! children, and for code blocks the spans of their content lines in the
//! original source.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use tracing::{trace, warn};

/// Half-open byte range `[start, end)` of one content line, terminator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn value<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    BlockQuote,
    List,
    ListItem,
    /// A backtick or tilde fence. `language` is the first word of the info string as written.
    FencedCode { language: String },
    IndentedCode,
    /// Paragraphs, headings, inline markup and everything else we never inspect.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    lines: Vec<LineSpan>,
    children: Vec<Node>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            lines: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn lines(&self) -> &[LineSpan] {
        &self.lines
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Language tag of a fenced code block, `None` for every other kind.
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::FencedCode { language } => Some(language),
            _ => None,
        }
    }

    fn is_code(&self) -> bool {
        matches!(self.kind, NodeKind::FencedCode { .. } | NodeKind::IndentedCode)
    }
}

/// A parsed document. Line spans of its nodes index into [`Document::source`],
/// the input exactly as given.
#[derive(Debug)]
pub struct Document<'a> {
    source: &'a [u8],
    root: Node,
}

impl<'a> Document<'a> {
    /// Parses any byte input. Invalid UTF-8 never reaches the payload: the
    /// parser sees a same-length copy and spans slice the original bytes.
    pub fn parse(input: &'a [u8]) -> Self {
        let text = parse_text(input);
        let root = build_tree(&text, input);
        Document {
            source: input,
            root,
        }
    }

    pub fn source(&self) -> &[u8] {
        self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn line_bytes(&self, span: &LineSpan) -> &[u8] {
        span.value(self.source)
    }

    /// Every node in document order, parents before their children.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![&self.root],
        }
    }
}

/// Stands in for each byte of an invalid UTF-8 sequence. Not markup anywhere.
const INVALID_BYTE_PLACEHOLDER: char = '?';

/// UTF-8 view of `input` with the same byte offsets.
fn parse_text(input: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(input) {
        return Cow::Borrowed(text);
    }
    let mut text = String::with_capacity(input.len());
    let mut invalid = 0;
    for chunk in input.utf8_chunks() {
        text.push_str(chunk.valid());
        invalid += chunk.invalid().len();
        text.extend(std::iter::repeat(INVALID_BYTE_PLACEHOLDER).take(chunk.invalid().len()));
    }
    warn!(invalid_bytes = invalid, "input is not valid UTF-8");
    Cow::Owned(text)
}

pub struct Walk<'d> {
    stack: Vec<&'d Node>,
}

impl<'d> Iterator for Walk<'d> {
    type Item = &'d Node;

    fn next(&mut self) -> Option<&'d Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn node_kind(tag: &Tag<'_>, source: &[u8], start: usize) -> NodeKind {
    match tag {
        Tag::BlockQuote(_) => NodeKind::BlockQuote,
        Tag::List(_) => NodeKind::List,
        Tag::Item => NodeKind::ListItem,
        Tag::CodeBlock(CodeBlockKind::Fenced(_)) => NodeKind::FencedCode {
            language: fence_language(source, start),
        },
        Tag::CodeBlock(CodeBlockKind::Indented) => NodeKind::IndentedCode,
        _ => NodeKind::Other,
    }
}

/// Language tag as written on the opening fence line at `start`: the info
/// string, trimmed, up to its first space. Entities and escapes stay as-is.
fn fence_language(source: &[u8], start: usize) -> String {
    let rest = &source[start.min(source.len())..];
    let line = match rest.iter().position(|&b| b == b'\n') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let Some(fence_start) = line.iter().position(|&b| b == b'`' || b == b'~') else {
        return String::new();
    };
    let fence = &line[fence_start..];
    let info_start = fence
        .iter()
        .position(|&b| b != fence[0])
        .unwrap_or(fence.len());
    let info = trim_ascii_whitespace(&fence[info_start..]);
    let language = info.split(|&b| b == b' ').next().unwrap_or_default();
    String::from_utf8_lossy(language).into_owned()
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn build_tree(text: &str, source: &[u8]) -> Node {
    let mut stack = vec![Node::new(NodeKind::Root)];
    for (event, range) in Parser::new_ext(text, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                let node = Node::new(node_kind(&tag, source, range.start));
                trace!(kind = ?node.kind, start = range.start, "open node");
                stack.push(node);
            }
            Event::End(_) => close_node(&mut stack),
            Event::Text(_) => {
                if let Some(node) = stack.last_mut().filter(|node| node.is_code()) {
                    push_line_spans(&mut node.lines, source, range);
                }
            }
            _ => {}
        }
    }
    while stack.len() > 1 {
        close_node(&mut stack);
    }
    stack
        .into_iter()
        .next()
        .unwrap_or_else(|| Node::new(NodeKind::Root))
}

fn close_node(stack: &mut Vec<Node>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

/// Splits a code text range into per-line spans.
///
/// The parser may merge consecutive lines into one text event, or split a line
/// around a `\r` it drops. Each span therefore runs from the first content byte
/// of its line to just past the line's `\n` in the source, and a line already
/// covered by the previous span is not emitted twice.
fn push_line_spans(lines: &mut Vec<LineSpan>, source: &[u8], range: Range<usize>) {
    let mut cursor = match lines.last() {
        Some(last) => last.end.max(range.start),
        None => range.start,
    };
    while cursor < range.end {
        let end = source[cursor..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(source.len(), |i| cursor + i + 1);
        lines.push(LineSpan { start: cursor, end });
        cursor = end;
    }
}
