/// Errors produced by the engine itself.
///
/// Every variant names the input that caused it so a calling layer can turn
/// it into an actionable message. Provider failures never appear here; they
/// travel as opaque `anyhow::Error`s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid range [{start}, {end}): {fault}")]
    InvalidRange {
        start: usize,
        end: usize,
        fault: RangeFault,
    },

    #[error("text not found: occurrence {occurrence} of {needle:?} requested, {found} found")]
    TextNotFound {
        needle: String,
        occurrence: usize,
        found: usize,
    },

    #[error("incompatible batch: intent #{position} ({operation}) {fault}")]
    IncompatibleBatch {
        /// Zero-based position of the offending intent in the submitted order.
        position: usize,
        operation: &'static str,
        fault: BatchFault,
    },

    #[error("malformed tree at {path}: {reason}")]
    MalformedTree { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeFault {
    #[error("start must be at least 1")]
    StartBeforeBody,
    #[error("end must be greater than start")]
    NotIncreasing,
    #[error("end is past the end of the body at {end_of_body}")]
    PastEndOfBody { end_of_body: usize },
    #[error("no paragraph contains this index")]
    NoParagraph,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchFault {
    #[error("replaces the whole body and must be the only intent in its batch")]
    ReplaceBodyNotAlone,
    #[error("cannot nest a body replacement")]
    NestedReplaceBody,
    #[error("has no text to insert")]
    EmptyInsert,
    #[error("has no style fields set")]
    EmptyStyle,
    #[error("needs at least one row and one column")]
    EmptyTable,
    #[error("targets index {at}, outside the body [1, {end_of_body}]")]
    OutOfBounds { at: usize, end_of_body: usize },
    #[error("uses a range resolved against another snapshot")]
    ForeignSnapshot,
    #[error("uses a range that is not bound to any snapshot")]
    UnboundRange,
}
