//! Pure rendering of text with annotation highlights.
//!
//! The renderer is a function from `(text, annotations)` to a
//! [`RenderTree`]; it never mutates either input and never searches the
//! output afterwards. Line breaks become explicit nodes because render
//! surfaces collapse literal whitespace.

use tracing::debug;
use uuid::Uuid;

use crate::annotation::{AnnotationKind, AnnotationSet, Severity};
use crate::text::PlainText;

/// Maximum chars of replacement text shown in a tooltip.
const TOOLTIP_MAX_CHARS: usize = 80;

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    /// A verbatim text run. Never contains a line break.
    Text(String),
    /// An explicit line break.
    LineBreak,
    /// An annotated range rendered as a styled, clickable highlight.
    /// `text` is the covered document text, emitted verbatim.
    Highlight {
        id: Uuid,
        kind: AnnotationKind,
        severity: Severity,
        text: String,
        tooltip: String,
    },
}

impl RenderNode {
    /// Chars this node contributes to the plain-text projection.
    pub fn len_chars(&self) -> usize {
        match self {
            Self::Text(s) => s.chars().count(),
            Self::LineBreak => 1,
            Self::Highlight { text, .. } => text.chars().count(),
        }
    }
}

/// The renderable form of a document: an ordered run of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    /// The plain-text projection: all text content in order, with line
    /// breaks mapped back to `\n`. Rendering with an empty annotation set
    /// and projecting yields the original text exactly.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                RenderNode::Text(s) => out.push_str(s),
                RenderNode::LineBreak => out.push('\n'),
                RenderNode::Highlight { text, .. } => out.push_str(text),
            }
        }
        out
    }

    /// Total chars across all nodes.
    pub fn len_chars(&self) -> usize {
        self.nodes.iter().map(RenderNode::len_chars).sum()
    }
}

/// Renders `text` with `annotations` overlaid.
///
/// Annotations are processed in descending start order, each one spliced
/// out of the still-unprocessed prefix, so that consuming a high-offset
/// range never invalidates the offsets of lower ones. A range that is
/// empty or does not fit the unprocessed prefix is skipped; rendering
/// never fails.
pub fn render(text: &PlainText, annotations: &AnnotationSet) -> RenderTree {
    // Segments collected back-to-front: each is a highlight followed by
    // the plain text between it and the previously consumed point.
    let mut segments: Vec<Vec<RenderNode>> = Vec::new();
    let mut rest_end = text.len_chars();

    for ann in annotations.iter().rev() {
        if ann.start >= ann.end || ann.end > rest_end {
            debug!(
                annotation = %ann.id,
                start = ann.start,
                end = ann.end,
                "skipping annotation with unusable range"
            );
            continue;
        }

        let mut segment = Vec::new();
        segment.push(RenderNode::Highlight {
            id: ann.id,
            kind: ann.kind,
            severity: ann.severity,
            text: text.slice(ann.start, ann.end).unwrap_or_default(),
            tooltip: tooltip_for(ann.kind, &ann.replacement_text),
        });
        push_text_runs(&mut segment, &text.slice(ann.end, rest_end).unwrap_or_default());
        segments.push(segment);
        rest_end = ann.start;
    }

    let mut nodes = Vec::new();
    push_text_runs(&mut nodes, &text.slice(0, rest_end).unwrap_or_default());
    for segment in segments.into_iter().rev() {
        nodes.extend(segment);
    }
    RenderTree { nodes }
}

/// Splits `s` on line breaks, pushing text runs and explicit break nodes.
fn push_text_runs(nodes: &mut Vec<RenderNode>, s: &str) {
    let mut run = String::new();
    for ch in s.chars() {
        if ch == '\n' {
            if !run.is_empty() {
                nodes.push(RenderNode::Text(std::mem::take(&mut run)));
            }
            nodes.push(RenderNode::LineBreak);
        } else {
            run.push(ch);
        }
    }
    if !run.is_empty() {
        nodes.push(RenderNode::Text(run));
    }
}

/// Builds the short hover string for a highlight.
fn tooltip_for(kind: AnnotationKind, replacement: &str) -> String {
    let shown: String = replacement.chars().take(TOOLTIP_MAX_CHARS).collect();
    if shown.chars().count() < replacement.chars().count() {
        format!("{}: {}…", kind.label(), shown)
    } else {
        format!("{}: {}", kind.label(), shown)
    }
}
