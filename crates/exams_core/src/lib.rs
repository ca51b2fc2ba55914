//! Exams core: domain model, metadata inference and the pure job state machine.
mod effect;
mod filter;
mod infer;
mod message;
mod model;
mod msg;
mod sanitize;
mod state;
mod update;

pub use effect::Effect;
pub use filter::Filters;
pub use infer::{
    infer_grade, infer_session_year, infer_year, ANA_LABEL, GEC_LABEL, OTHER_LABEL,
};
pub use message::{EmitMessage, ItemStatus, ProgressUpdate, Summary};
pub use model::{Extension, FileItem, Session, UNKNOWN_YEAR};
pub use msg::Msg;
pub use sanitize::{file_name_with_extension, sanitize_segment, MAX_SEGMENT_CHARS};
pub use state::{
    Counters, JobConfig, JobId, JobState, JobStatus, DEFAULT_OUTPUT_DIR, DEFAULT_WORKERS,
    MAX_WORKERS,
};
pub use update::update;
