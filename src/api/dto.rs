use serde::{Deserialize, Serialize};
use crate::application::RunSummary;
use crate::domain::case_file::CaseFile;

/// One request line from a client.
#[derive(Debug, Deserialize)]
pub struct CommandReq {
    pub command: String,
    pub params: Option<serde_json::Value>,
}

/// Reply to a request line. Case file replies carry their payload as a
/// borrowed DTO so it is written straight to the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response<T = serde_json::Value> {
    Success { data: T },
    Error { message: String },
}

impl Response {
    pub fn success(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Response::Success { data },
            Err(e) => Response::error(e),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::Error {
            message: message.to_string(),
        }
    }
}

/// Payload of a FINISH reply.
#[derive(Debug, Serialize)]
pub struct FinishDto<'a> {
    pub case_file: &'a CaseFile,
    pub summary: RunSummary,
}
