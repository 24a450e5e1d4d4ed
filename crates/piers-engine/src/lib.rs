pub mod editing;
pub mod error;
pub mod io;
pub mod markup;
pub mod providers;
pub mod resolve;
pub mod service;
pub mod tree;
pub mod wire;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{EditBatch, EditIntent, ParagraphStylePatch, Sequencer, TextStylePatch, sequence};
pub use error::{BatchFault, EngineError, RangeFault};
pub use io::{IoError, JsonDirectory};
pub use providers::{DocumentProvider, FileProvider, ValuesProvider};
pub use resolve::{Range, Target, resolve};
pub use service::{DocsService, Outcome, ReadFormat, ServiceError};
pub use tree::{Snapshot, SnapshotId, StructuralElement};
