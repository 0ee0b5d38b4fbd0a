//! SIP planner engine: HTTP transport, stream consumption, report retrieval
//! and effect execution.
pub mod api;
mod client;
mod decode;
mod engine;
mod persist;
mod retrieval;
mod stream;
mod types;

pub use client::{ApiClient, ClientSettings};
pub use decode::{decode_body, CharsetSource, DecodeError, DecodedText};
pub use engine::{EngineError, EngineHandle};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use retrieval::{
    DownloadEndpointSource, FsFileReader, LocalFileReader, ReportRetriever, ReportSource,
    ReportsEndpointSource, StaticPathSource,
};
pub use stream::{run_stream, FrameSink, StreamOutcome};
pub use types::{EngineCommand, EngineEvent, FailureKind, FetchError};
