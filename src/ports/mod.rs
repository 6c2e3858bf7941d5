use crate::domain::case_file::CaseFile;

/// Side channel for self-referencing modules. Must not block.
pub trait CycleReporter {
    fn self_reference(&self, suspect: &str, lead: &str);
}

/// Downstream consumer of a run's case file.
pub trait CaseSink {
    /// Receives the finished case file. Called at most once per run.
    fn accept(&mut self, case_file: CaseFile) -> anyhow::Result<()>;

    /// Signals that no further output will arrive, whether or not a case file
    /// was accepted.
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Discards diagnostics.
pub struct SilentReporter;

impl CycleReporter for SilentReporter {
    fn self_reference(&self, _suspect: &str, _lead: &str) {}
}
