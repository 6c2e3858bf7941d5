// Infrastructure adapters for deptrace.

pub mod concurrency;
pub mod config;
pub mod diagnostics;
pub mod record_source;
pub mod sinks;

pub use config::TraceConfig;
pub use diagnostics::TracingCycleReporter;
pub use record_source::{open_records, JsonLinesRecords};
pub use sinks::{JsonSink, JsonTarget, MemorySink};
