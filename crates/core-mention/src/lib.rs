//! Mention tracking for one editable text buffer.
//!
//! A mention (tagged user) is a run of buffer text created by accepting a
//! suggestion. `MentionRegistry` owns the ordered spans and the last observed
//! buffer state, and keeps span ranges correct as the surrounding text is
//! edited.
//!
//! Invariants (must hold after every public call):
//! * spans are sorted ascending by `range.location`;
//! * no two span ranges intersect;
//! * every range lies within `[0, buffer_len]`;
//! * an edit that deletes any character of a span removes that span, unless it
//!   replaces exactly the span's range with the span's own text.
//!
//! The registry is plain owned data driven through `&mut self`: one edit is in
//! flight at a time and edits must arrive in buffer order, since each one is a
//! delta against the retained snapshot.

use core_text::{TextError, Utf16Range};
use thiserror::Error;

mod options;
mod registry;
mod span;
pub mod style;

pub use options::MentionOptions;
pub use registry::{EditKind, EditOutcome, MentionRegistry, SubstitutionResult};
pub use span::MentionSpan;
pub use style::{Rgb, StyleAttributes, StyleKey, StyleRun, StyleValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MentionError {
    #[error("invalid range: {0}")]
    InvalidRange(#[from] TextError),
    #[error("new text is not the previous text with the edit applied")]
    InconsistentEdit,
    #[error("previous text does not match the retained snapshot (edit applied out of order)")]
    StaleSnapshot,
    #[error("suggestion text is empty")]
    EmptySuggestion,
    #[error("spans {first} and {second} overlap or are out of order")]
    OverlapInvariantViolation { first: Utf16Range, second: Utf16Range },
}
