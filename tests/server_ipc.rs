use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use deptrace::api::server;
use deptrace::infrastructure::config::TraceConfig;
use serde_json::Value;

fn start() -> TcpStream {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Err(e) = server::serve(listener, TraceConfig::default()) {
            eprintln!("Server failed: {}", e);
        }
    });
    TcpStream::connect(addr).expect("Failed to connect to server")
}

fn request(stream: &mut TcpStream, reader: &mut BufReader<TcpStream>, line: &str) -> Value {
    stream.write_all(line.as_bytes()).unwrap();
    stream.write_all(b"\n").unwrap();
    let mut response = String::new();
    reader.read_line(&mut response).unwrap();
    serde_json::from_str(&response).unwrap()
}

#[test]
fn test_streaming_run_over_tcp() {
    let mut stream = start();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let pong = request(&mut stream, &mut reader, r#"{"command": "PING"}"#);
    assert_eq!(pong["status"], "success");
    assert_eq!(pong["data"], "PONG");

    let records = [
        r#"{"command": "RECORD", "params": {"suspect": "A", "leads": ["B"], "source": null}}"#,
        r#"{"command": "RECORD", "params": {"suspect": "B", "leads": ["A"], "source": "A"}}"#,
    ];
    for (i, line) in records.iter().enumerate() {
        let reply = request(&mut stream, &mut reader, line);
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["data"]["records"], i + 1);
    }

    let finished = request(&mut stream, &mut reader, r#"{"command": "FINISH"}"#);
    assert_eq!(finished["status"], "success");
    assert_eq!(
        finished["data"]["case_file"],
        serde_json::json!({ "A": { "B": { "A": {} } } })
    );

    // A fresh run starts after FINISH.
    let empty = request(&mut stream, &mut reader, r#"{"command": "FINISH"}"#);
    assert_eq!(empty["data"]["case_file"], serde_json::json!({}));
}

#[test]
fn test_abort_discards_run() {
    let mut stream = start();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    request(
        &mut stream,
        &mut reader,
        r#"{"command": "RECORD", "params": {"suspect": "A", "leads": ["B"]}}"#,
    );
    let aborted = request(&mut stream, &mut reader, r#"{"command": "ABORT"}"#);
    assert_eq!(aborted["data"], "ABORTED");

    let finished = request(&mut stream, &mut reader, r#"{"command": "FINISH"}"#);
    assert_eq!(finished["data"]["case_file"], serde_json::json!({}));
    assert_eq!(finished["data"]["summary"]["records"], 0);
}

#[test]
fn test_missing_suspect_is_rejected() {
    let mut stream = start();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let reply = request(
        &mut stream,
        &mut reader,
        r#"{"command": "RECORD", "params": {"leads": ["B"]}}"#,
    );
    assert_eq!(reply["status"], "error");
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .contains("missing suspect"));
}
