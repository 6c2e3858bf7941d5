// Main library entry point for deptrace.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{RunSummary, TracePipeline};
pub use domain::case_builder::{CaseBuilder, SelfLoopPolicy};
pub use domain::case_file::{CaseFile, DependencyTree};
pub use domain::error::TraceError;
pub use domain::record::{DependencyRecord, NodeId, RawRecord};
