//! Core editing model for StudyWrite.
//!
//! Everything here is surface-agnostic: the session owns the plain-text
//! body and the active suggestion set, the renderer is a pure function
//! to a node tree, and the caret is a logical char offset. A UI shell
//! supplies the event loop and the drawing; an analysis client supplies
//! the suggestions.

pub mod annotation;
pub mod caret;
pub mod render;
pub mod session;
pub mod stats;
pub mod store;
pub mod text;

pub use annotation::{
    validate, Annotation, AnnotationKind, AnnotationSet, RejectReason, Severity, Validation,
};
pub use caret::{capture_offset, restore_offset, CaretLocus};
pub use render::{render, RenderNode, RenderTree};
pub use session::{AcceptanceRecord, AnalysisReport, DocumentSnapshot, EditorSession};
pub use stats::{compute as compute_stats, DocumentStats};
pub use store::{DocumentMeta, DocumentRecord, DocumentStore, FileStore, MemoryStore};
pub use text::PlainText;
