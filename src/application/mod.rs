//! Trace pipeline: the record-at-a-time front end of a run.
//!
//! Records are ingested synchronously, one at a time, in arrival order.
//! `finish` expands every root and hands the case file to the sink exactly
//! once; `abort` drops the run without emitting anything. Both consume the
//! pipeline, so no state outlives the run.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::adjacency::AdjacencyAccumulator;
use crate::domain::case_builder::{CaseBuilder, SelfLoopPolicy};
use crate::domain::error::TraceError;
use crate::domain::record::{DependencyRecord, RawRecord};
use crate::infrastructure::config::TraceConfig;
use crate::infrastructure::record_source::open_records;
use crate::ports::{CaseSink, CycleReporter};
use std::path::Path;

/// Statistics for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records: usize,
    pub nodes: usize,
    pub edges: usize,
    pub roots: usize,
    pub visited_edges: usize,
}

pub struct TracePipeline<'a> {
    accumulator: AdjacencyAccumulator,
    reporter: &'a dyn CycleReporter,
    policy: SelfLoopPolicy,
}

impl<'a> TracePipeline<'a> {
    pub fn new(reporter: &'a dyn CycleReporter) -> Self {
        Self {
            accumulator: AdjacencyAccumulator::new(),
            reporter,
            policy: SelfLoopPolicy::default(),
        }
    }

    pub fn with_config(config: &TraceConfig, reporter: &'a dyn CycleReporter) -> Self {
        Self::new(reporter).with_policy(config.self_loop_policy)
    }

    pub fn with_policy(mut self, policy: SelfLoopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ingest(&mut self, record: DependencyRecord) -> Result<(), TraceError> {
        self.accumulator.ingest(record)
    }

    pub fn ingest_raw(&mut self, raw: RawRecord) -> Result<(), TraceError> {
        self.ingest(DependencyRecord::try_from(raw)?)
    }

    pub fn records_ingested(&self) -> usize {
        self.accumulator.record_count()
    }

    /// Expand every root, emit the case file, and close the sink.
    pub fn finish(self, sink: &mut dyn CaseSink) -> Result<RunSummary> {
        let mut builder =
            CaseBuilder::new(&self.accumulator, self.reporter).with_policy(self.policy);
        let case_file = builder.build_case_file(self.accumulator.roots());

        let summary = RunSummary {
            records: self.accumulator.record_count(),
            nodes: self.accumulator.node_count(),
            edges: self.accumulator.edge_count(),
            roots: case_file.len(),
            visited_edges: builder.visited().len(),
        };
        drop(builder);
        drop(self);

        let accepted = sink.accept(case_file);
        let closed = sink.close();
        accepted?;
        closed?;

        info!(
            records = summary.records,
            roots = summary.roots,
            visited_edges = summary.visited_edges,
            "trace run finished"
        );
        Ok(summary)
    }

    /// Discard the run without emitting a case file, then close the sink.
    pub fn abort(self, sink: &mut dyn CaseSink) -> Result<()> {
        warn!(records = self.records_ingested(), "trace run aborted");
        drop(self);
        sink.close()
    }

    /// Drive a whole record stream through the pipeline. The first error
    /// aborts the run and is returned.
    pub fn run<I>(mut self, records: I, sink: &mut dyn CaseSink) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<DependencyRecord>>,
    {
        for record in records {
            let ingested = record.and_then(|record| self.ingest(record).map_err(Into::into));
            if let Err(e) = ingested {
                self.abort(sink)?;
                return Err(e);
            }
        }
        debug!(records = self.records_ingested(), "end of input");
        self.finish(sink)
    }
}

/// Trace one JSON-lines record file as a single run.
pub fn trace_file(
    path: &Path,
    config: &TraceConfig,
    reporter: &dyn CycleReporter,
    sink: &mut dyn CaseSink,
) -> Result<RunSummary> {
    let records = open_records(path)?;
    info!(path = %path.display(), "tracing record file");
    TracePipeline::with_config(config, reporter)
        .run(records, sink)
        .map_err(|e| e.context(format!("Failed to trace {}", path.display())))
}
