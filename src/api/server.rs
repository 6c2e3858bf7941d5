use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use crate::api::dto::{CommandReq, FinishDto, Response};
use crate::application::TracePipeline;
use crate::domain::record::RawRecord;
use crate::infrastructure::config::TraceConfig;
use crate::infrastructure::diagnostics::TracingCycleReporter;
use crate::infrastructure::sinks::MemorySink;
use crate::ports::CycleReporter;

pub fn start_server(port: u16, config: TraceConfig) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;
    serve(listener, config)
}

/// Accept connections forever. Every connection is its own sequence of
/// trace runs.
pub fn serve(listener: TcpListener, config: TraceConfig) -> Result<()> {
    info!(address = %listener.local_addr()?, "trace server listening");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let config = config.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &config) {
                        error!("connection error: {:#}", e);
                    }
                });
            }
            Err(e) => warn!("accept error: {}", e),
        }
    }

    Ok(())
}

/// The run currently being fed by one connection.
struct Session<'a> {
    config: &'a TraceConfig,
    reporter: &'a dyn CycleReporter,
    pipeline: TracePipeline<'a>,
}

impl<'a> Session<'a> {
    fn new(config: &'a TraceConfig, reporter: &'a dyn CycleReporter) -> Self {
        Self {
            config,
            reporter,
            pipeline: TracePipeline::with_config(config, reporter),
        }
    }

    /// Swap in a fresh run, returning the current one.
    fn take_run(&mut self) -> TracePipeline<'a> {
        std::mem::replace(
            &mut self.pipeline,
            TracePipeline::with_config(self.config, self.reporter),
        )
    }

    /// Handles one request line and returns the encoded reply.
    fn process(&mut self, line: &str) -> Result<String> {
        let req: CommandReq = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => return encode(&Response::error(format!("Invalid JSON format: {}", e))),
        };

        match req.command.as_str() {
            "PING" => encode(&Response::success("PONG")),
            "RECORD" => encode(&self.record(req.params)),
            "FINISH" => self.finish(),
            "ABORT" => match self.abort() {
                Ok(()) => encode(&Response::success("ABORTED")),
                Err(e) => encode(&Response::error(e)),
            },
            _ => encode(&Response::error(format!("Unknown command: {}", req.command))),
        }
    }

    fn record(&mut self, params: Option<serde_json::Value>) -> Response {
        let ingested = match params {
            None => Err("Missing params for RECORD".to_string()),
            Some(params) => serde_json::from_value::<RawRecord>(params)
                .map_err(|e| format!("Invalid record: {}", e))
                .and_then(|raw| self.pipeline.ingest_raw(raw).map_err(|e| e.to_string())),
        };

        match ingested {
            Ok(()) => Response::success(serde_json::json!({
                "records": self.pipeline.records_ingested()
            })),
            Err(message) => {
                // Structural errors end the run.
                if let Err(abort_err) = self.abort() {
                    return Response::error(abort_err);
                }
                Response::error(format!("{}; run aborted", message))
            }
        }
    }

    fn finish(&mut self) -> Result<String> {
        let mut sink = MemorySink::new();
        let summary = match self.take_run().finish(&mut sink) {
            Ok(summary) => summary,
            Err(e) => return encode(&Response::error(e)),
        };
        match sink.case_file() {
            Some(case_file) => encode(&Response::Success {
                data: FinishDto { case_file, summary },
            }),
            None => encode(&Response::error("run produced no case file")),
        }
    }

    fn abort(&mut self) -> Result<()> {
        let mut sink = MemorySink::new();
        self.take_run().abort(&mut sink)
    }
}

fn encode<T: Serialize>(response: &Response<T>) -> Result<String> {
    serde_json::to_string(response).context("Failed to encode response")
}

/// Writes one reply line with a single write.
fn write_reply<W: Write>(writer: &mut W, mut reply: String) -> Result<()> {
    reply.push('\n');
    writer.write_all(reply.as_bytes())?;
    Ok(())
}

fn handle_connection(stream: TcpStream, config: &TraceConfig) -> Result<()> {
    let peer = stream.peer_addr()?;
    stream.set_nodelay(true)?;
    debug!(%peer, "client connected");

    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    let reporter = TracingCycleReporter::new(config.path_context_segments);
    let mut session = Session::new(config, &reporter);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = session.process(trimmed)?;
        write_reply(&mut writer, reply)?;
    }

    // Client went away; whatever was in flight is dropped unemitted.
    if session.pipeline.records_ingested() > 0 {
        session.abort()?;
    }
    debug!(%peer, "client disconnected");
    Ok(())
}
