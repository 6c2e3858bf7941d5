//! Dependency records as delivered by the module scanner.

use crate::domain::error::TraceError;
use serde::{Deserialize, Serialize};

/// Opaque node identifier (absolute path or resolved module key).
pub type NodeId = String;

/// One module and its direct dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// The module being described
    pub suspect: NodeId,
    /// Direct dependencies, in declaration order
    pub leads: Vec<NodeId>,
    /// Module that caused this one to be loaded; `None` for entry points
    pub source: Option<NodeId>,
}

impl DependencyRecord {
    pub fn new(suspect: impl Into<NodeId>, leads: Vec<NodeId>, source: Option<NodeId>) -> Self {
        Self {
            suspect: suspect.into(),
            leads,
            source,
        }
    }

    /// Record for an entry module.
    pub fn root<I, S>(suspect: impl Into<NodeId>, leads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Self::new(suspect, leads.into_iter().map(Into::into).collect(), None)
    }

    /// Record for a module loaded by `source`.
    pub fn child<I, S>(suspect: impl Into<NodeId>, leads: I, source: impl Into<NodeId>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Self::new(
            suspect,
            leads.into_iter().map(Into::into).collect(),
            Some(source.into()),
        )
    }

    pub fn is_root(&self) -> bool {
        self.source.is_none()
    }

    /// Checks the fields the accumulator relies on.
    pub fn validate(&self) -> Result<(), TraceError> {
        if self.suspect.is_empty() {
            return Err(TraceError::invalid_record("suspect is empty"));
        }
        if self.leads.iter().any(|lead| lead.is_empty()) {
            return Err(TraceError::invalid_record(format!(
                "empty lead in record for {}",
                self.suspect
            )));
        }
        Ok(())
    }
}

/// Wire shape of a record. Every field is optional so a missing one can be
/// reported as `InvalidRecord` instead of a generic parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub suspect: Option<NodeId>,
    pub leads: Option<Vec<NodeId>>,
    #[serde(default)]
    pub source: Option<NodeId>,
}

impl TryFrom<RawRecord> for DependencyRecord {
    type Error = TraceError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let suspect = raw
            .suspect
            .ok_or_else(|| TraceError::invalid_record("missing suspect"))?;
        let leads = raw.leads.ok_or_else(|| {
            TraceError::invalid_record(format!("missing leads for {}", suspect))
        })?;
        let record = DependencyRecord {
            suspect,
            leads,
            source: raw.source,
        };
        record.validate()?;
        Ok(record)
    }
}

impl From<DependencyRecord> for RawRecord {
    fn from(record: DependencyRecord) -> Self {
        Self {
            suspect: Some(record.suspect),
            leads: Some(record.leads),
            source: record.source,
        }
    }
}
