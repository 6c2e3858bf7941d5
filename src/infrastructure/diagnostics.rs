//! Logs self-referencing modules through `tracing`.

use tracing::warn;

use crate::domain::error::TraceError;
use crate::ports::CycleReporter;

pub struct TracingCycleReporter {
    context_segments: usize,
}

impl TracingCycleReporter {
    pub fn new(context_segments: usize) -> Self {
        Self { context_segments }
    }

    /// Directory prefix shared by both paths in a report: everything in the
    /// suspect path except its last `context_segments` segments. Zero
    /// segments disables shortening.
    fn common_prefix<'p>(&self, suspect: &'p str) -> Option<&'p str> {
        let segments = suspect.split('/').count();
        if self.context_segments == 0 || segments <= self.context_segments {
            return None;
        }
        let keep_from = segments - self.context_segments;
        // Byte offset just past the separator ending the prefix.
        suspect
            .match_indices('/')
            .nth(keep_from - 1)
            .map(|(idx, _)| &suspect[..=idx])
    }

    pub fn shorten<'p>(&self, suspect: &str, path: &'p str) -> &'p str {
        match self.common_prefix(suspect) {
            Some(prefix) => path.strip_prefix(prefix).unwrap_or(path),
            None => path,
        }
    }
}

impl Default for TracingCycleReporter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl CycleReporter for TracingCycleReporter {
    fn self_reference(&self, suspect: &str, lead: &str) {
        let diagnostic = TraceError::CircularDependencyDetected {
            suspect: self.shorten(suspect, suspect).to_string(),
            lead: self.shorten(suspect, lead).to_string(),
        };
        warn!(suspect, lead, "{}", diagnostic);
    }
}
