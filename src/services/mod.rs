//! Services: the backend client, report acquisition and liveness.

pub mod backend;
pub mod liveness;
pub mod report;

pub use backend::{AnalysisBackend, HttpBackend};
pub use liveness::Liveness;
pub use report::{
    EntryMode, FileKind, FileSlot, PlainTextExtractor, ReportFile, ReportInput, TextExtractor,
};
