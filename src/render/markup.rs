//! Markup targets shared by the DOM-like and SVG-like backends.
//!
//! Emitters talk to a [`MarkupSink`]: `open` a tag, add attributes, `close` it. Tags are closed
//! in stack order, so output is balanced by construction. Two targets exist: a live
//! [`ElementTree`] and a serialized [`MarkupString`].

use std::fmt::Write as _;

use crate::foundation::core::SurfaceSize;
use crate::foundation::math::round_to_digits;
use crate::foundation::transform::Transform2D;

/// A live markup element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Attributes in emission order.
    pub attrs: Vec<(String, String)>,
    /// Child elements in paint order.
    pub children: Vec<Element>,
}

impl Element {
    /// Element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every descendant (self included) with tag `tag`, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect(tag, &mut out);
        out
    }

    fn collect<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for c in &self.children {
            c.collect(tag, out);
        }
    }

    /// Serialize into `out`.
    pub fn write_markup(&self, out: &mut String) {
        let mut sink = StringSink::new(out);
        self.replay(&mut sink);
    }

    /// Serialized markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn replay(&self, sink: &mut impl MarkupSink) {
        sink.open(&self.tag);
        for (k, v) in &self.attrs {
            sink.attr(k, v);
        }
        for c in &self.children {
            c.replay(sink);
        }
        sink.close();
    }
}

/// Streaming markup writer.
pub trait MarkupSink {
    /// Start element `tag` as a child of the innermost open element.
    fn open(&mut self, tag: &str);

    /// Add an attribute to the innermost open element. Ignored once it has children.
    fn attr(&mut self, name: &str, value: &str);

    /// Close the innermost open element. No-op when nothing is open.
    fn close(&mut self);

    /// Number of currently open elements.
    fn depth(&self) -> usize;

    /// Close every open element.
    fn finish(&mut self) {
        while self.depth() > 0 {
            self.close();
        }
    }
}

/// Appends escaped markup to a borrowed `String`.
#[derive(Debug)]
pub struct StringSink<'a> {
    out: &'a mut String,
    stack: Vec<String>,
    start_tag_open: bool,
}

impl<'a> StringSink<'a> {
    /// Sink appending to `out`.
    pub fn new(out: &'a mut String) -> Self {
        Self {
            out,
            stack: Vec::new(),
            start_tag_open: false,
        }
    }

    fn end_start_tag(&mut self) {
        if self.start_tag_open {
            self.out.push('>');
            self.start_tag_open = false;
        }
    }
}

impl MarkupSink for StringSink<'_> {
    fn open(&mut self, tag: &str) {
        self.end_start_tag();
        self.out.push('<');
        self.out.push_str(tag);
        self.stack.push(tag.to_owned());
        self.start_tag_open = true;
    }

    fn attr(&mut self, name: &str, value: &str) {
        if !self.start_tag_open {
            return;
        }
        let _ = write!(self.out, " {name}=\"");
        escape_attr(value, self.out);
        self.out.push('"');
    }

    fn close(&mut self) {
        let Some(tag) = self.stack.pop() else {
            return;
        };
        if self.start_tag_open {
            self.out.push_str("/>");
            self.start_tag_open = false;
        } else {
            let _ = write!(self.out, "</{tag}>");
        }
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Builds [`Element`]s; the outermost closed element lands in the borrowed slot.
#[derive(Debug)]
pub struct TreeSink<'a> {
    root: &'a mut Option<Element>,
    stack: Vec<Element>,
}

impl<'a> TreeSink<'a> {
    /// Sink writing its outermost element into `root`.
    pub fn new(root: &'a mut Option<Element>) -> Self {
        Self {
            root,
            stack: Vec::new(),
        }
    }
}

impl MarkupSink for TreeSink<'_> {
    fn open(&mut self, tag: &str) {
        self.stack.push(Element::new(tag));
    }

    fn attr(&mut self, name: &str, value: &str) {
        if let Some(top) = self.stack.last_mut()
            && top.children.is_empty()
        {
            top.attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    fn close(&mut self) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => *self.root = Some(done),
        }
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// A surface representation markup backends can write into.
pub trait MarkupTarget: Default {
    /// Sink type borrowed from the target.
    type Sink<'a>: MarkupSink
    where
        Self: 'a;

    /// Discard current content and return a sink writing fresh content.
    fn begin(&mut self) -> Self::Sink<'_>;
}

/// Live element tree target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementTree {
    root: Option<Element>,
}

impl ElementTree {
    /// Root element, present after the first clear or render.
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Serialized markup of the root, empty before the first clear or render.
    pub fn to_markup(&self) -> String {
        self.root.as_ref().map(Element::to_markup).unwrap_or_default()
    }
}

impl MarkupTarget for ElementTree {
    type Sink<'a> = TreeSink<'a>;

    fn begin(&mut self) -> TreeSink<'_> {
        self.root = None;
        TreeSink::new(&mut self.root)
    }
}

/// Serialized markup target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupString {
    text: String,
}

impl MarkupString {
    /// The markup text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl MarkupTarget for MarkupString {
    type Sink<'a> = StringSink<'a>;

    fn begin(&mut self) -> StringSink<'_> {
        self.text.clear();
        StringSink::new(&mut self.text)
    }
}

/// Markup surface: dimensions plus content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupSurface<T> {
    size: SurfaceSize,
    content: T,
}

impl<T: MarkupTarget> MarkupSurface<T> {
    /// Empty surface of `size`.
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            content: T::default(),
        }
    }

    /// Surface dimensions.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    /// Current content.
    pub fn content(&self) -> &T {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }
}

/// Escape `&`, `<`, `>` and `"` for use inside a double-quoted attribute.
pub fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Format a number for markup: integral values print without a fraction and `-0` prints `0`.
pub(crate) fn fmt_num(v: f64) -> String {
    if v == 0.0 {
        return "0".to_owned();
    }
    format!("{v}")
}

/// `a,b,c,d,tx,ty` with every coefficient rounded to 5 decimals.
pub(crate) fn matrix_args(t: &Transform2D) -> String {
    let [a, b, c, d, tx, ty] = t.coeffs().map(|v| fmt_num(round_to_digits(v, 5)));
    format!("{a},{b},{c},{d},{tx},{ty}")
}

#[cfg(test)]
#[path = "../../tests/unit/render/markup.rs"]
mod tests;
