//! # Span model
//!
//! Block text on the wire is flat: one string plus typed ranges over it. This
//! module turns a sequence of [`TextRun`]s (text with the marks active over it)
//! into that flat form.
//!
//! ## Offsets
//!
//! All offsets are UTF-16 code units, matching what the documents service and
//! web clients count. [`Utf16Index`] maps them back to byte offsets for
//! slicing Rust strings.
//!
//! ## Merging
//!
//! Marks are identified by `(type, attributes)`. Consecutive runs carrying the
//! same identity extend one open annotation; anything else closes it. Atomic
//! types (embed, image, video, file) get one annotation per placeholder and
//! never merge.

use std::collections::BTreeMap;

use crate::api::{Annotation, AnnotationType};
use crate::mttast::PLACEHOLDER;

/// Identity of a mark over a run: its type plus attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkSpec {
    pub kind: AnnotationType,
    pub attributes: BTreeMap<String, String>,
}

impl MarkSpec {
    pub fn plain(kind: AnnotationType) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Text plus the marks active over all of it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRun {
    pub text: String,
    pub marks: Vec<MarkSpec>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Vec<MarkSpec>) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// A single placeholder character carrying an atomic annotation.
    pub fn placeholder(mark: MarkSpec) -> Self {
        Self {
            text: PLACEHOLDER.to_string(),
            marks: vec![mark],
        }
    }
}

/// Result of merging runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatText {
    pub text: String,
    pub annotations: Vec<Annotation>,
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// The placeholder character for an atomic node at `start`, with its
/// annotation carrying `url`.
pub fn embed_placeholder(kind: AnnotationType, url: &str, start: usize) -> (char, Annotation) {
    (
        PLACEHOLDER,
        Annotation::new(kind, start, start + 1).with_attr("url", url),
    )
}

/// Concatenates run texts and computes merged annotations over the result.
pub fn merge_runs(runs: &[TextRun]) -> FlatText {
    let mut text = String::new();
    let mut annotations = vec![];
    let mut open: Vec<(MarkSpec, usize)> = vec![];
    let mut offset = 0;

    for run in runs.iter().filter(|r| !r.text.is_empty()) {
        let len = utf16_len(&run.text);

        let (closing, still_open): (Vec<_>, Vec<_>) = open
            .into_iter()
            .partition(|(mark, _)| !run.marks.contains(mark));
        open = still_open;
        for (mark, start) in closing {
            annotations.push(to_annotation(mark, start, offset));
        }

        for mark in &run.marks {
            if mark.kind.is_atomic() {
                annotations.push(to_annotation(mark.clone(), offset, offset + len));
            } else if !open.iter().any(|(m, _)| m == mark) {
                open.push((mark.clone(), offset));
            }
        }

        text.push_str(&run.text);
        offset += len;
    }

    for (mark, start) in open {
        annotations.push(to_annotation(mark, start, offset));
    }

    sort_annotations(&mut annotations);
    FlatText { text, annotations }
}

/// Stable sort by `(start, type)`.
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by_key(|a| (a.start, a.kind));
}

fn to_annotation(mark: MarkSpec, start: usize, end: usize) -> Annotation {
    Annotation {
        kind: mark.kind,
        start,
        end,
        attributes: mark.attributes,
    }
}

/// Maps UTF-16 offsets in a string to byte offsets.
#[derive(Debug, Clone)]
pub struct Utf16Index {
    /// `(utf16_offset, byte_offset)` at every char boundary, plus the end.
    boundaries: Vec<(usize, usize)>,
}

impl Utf16Index {
    pub fn new(s: &str) -> Self {
        let mut boundaries = Vec::with_capacity(s.len() + 1);
        let mut units = 0;
        for (byte, ch) in s.char_indices() {
            boundaries.push((units, byte));
            units += ch.len_utf16();
        }
        boundaries.push((units, s.len()));
        Self { boundaries }
    }

    /// Total UTF-16 length.
    pub fn len(&self) -> usize {
        self.boundaries.last().map(|(u, _)| *u).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset for a UTF-16 offset. `None` when the offset is past the
    /// end or splits a surrogate pair.
    pub fn byte_offset(&self, utf16: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&utf16, |(u, _)| *u)
            .ok()
            .map(|i| self.boundaries[i].1)
    }
}
