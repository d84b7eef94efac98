use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("portal").unwrap();
    cmd.env_remove("PORTAL_BASE_URL")
        .env_remove("PORTAL_SESSION_ID")
        .env_remove("RUST_LOG");
    cmd
}

/// Answer a single request with `status` and a JSON `body`. The handle
/// yields the raw request as received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });
    (format!("http://{addr}"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !request_complete(&buf) {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
    let body = &buf[end + 4..];
    if head.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    let length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= length
}

#[test]
fn immediate_tilgung_shows_repay_amount() {
    cmd()
        .args(["loan-form", "--loan-type", "immediate", "--subtype", "tilgung"])
        .assert()
        .success()
        .stdout(contains("loan type:     immediate"))
        .stdout(contains("subtypes:      tilgung, endfaellig, annuitaet"))
        .stdout(contains("repay amount:  shown"))
        .stdout(contains("term:          hidden"))
        .stdout(contains("term input:    disabled"));
}

#[test]
fn building_defaults_to_annuitaet_and_collateral() {
    cmd()
        .args(["loan-form", "--loan-type", "Baudarlehen"])
        .assert()
        .success()
        .stdout(contains("loan type:     building"))
        .stdout(contains("subtypes:      annuitaet"))
        .stdout(contains("subtype:       annuitaet"))
        .stdout(contains("term:          shown"))
        .stdout(contains("collateral:    shown, required"));
}

#[test]
fn loan_form_json() {
    let out = cmd()
        .args(["loan-form", "--loan-type", "immediate", "--subtype", "endfaellig", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["projection"]["visibility"]["show_repay"], false);
    assert_eq!(value["projection"]["visibility"]["show_term"], true);
    assert_eq!(value["subtype_options"][0]["label"], "Tilgung");
    assert_eq!(value["term_disabled"], false);
}

#[test]
fn unknown_loan_type_has_no_subtypes() {
    cmd()
        .args(["loan-form", "--loan-type", "leasing"])
        .assert()
        .success()
        .stdout(contains("subtypes:      -"))
        .stdout(contains("repay amount:  hidden"))
        .stdout(contains("term:          hidden"));
}

#[test]
fn filled_fields_are_ready() {
    cmd()
        .args(["check-fields", "text:Anna", "select:immediate", "text::hidden"])
        .assert()
        .success()
        .stdout(contains("ready"));
}

#[test]
fn blank_visible_field_blocks_submit() {
    cmd()
        .args(["check-fields", "text:Anna", "text:   "])
        .assert()
        .failure()
        .stdout(contains("not ready: field 2"));
}

#[test]
fn malformed_field_spec_is_rejected() {
    cmd()
        .args(["check-fields", "Anna"])
        .assert()
        .failure()
        .stderr(contains("not KIND:VALUE"));
}

#[test]
fn finalize_url_carries_person() {
    cmd()
        .args(["finalize-url", "--base-url", "http://portal.test", "--person", "17"])
        .assert()
        .success()
        .stdout(contains("http://portal.test/create_db_records?person_identifier=17"));
}

#[test]
fn finalize_without_person_fails() {
    cmd()
        .args(["finalize-url", "--base-url", "http://portal.test"])
        .assert()
        .failure()
        .stderr(contains("no person identifier"));
}

#[test]
fn config_overrides_finalize_endpoint() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("portal.json");
    fs::write(&path, r#"{ "endpoints": { "finalize": "/commit" } }"#).unwrap();
    cmd()
        .arg("--config")
        .arg(&path)
        .args(["finalize-url", "--base-url", "http://portal.test", "--person", "3"])
        .assert()
        .success()
        .stdout(contains("/commit?person_identifier=3"));
}

#[test]
fn invalid_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("portal.json");
    fs::write(&path, r#"{ "endpoints": { "file": "file" } }"#).unwrap();
    cmd()
        .arg("--config")
        .arg(&path)
        .args(["finalize-url", "--person", "3"])
        .assert()
        .failure()
        .stderr(contains("must start with '/'"));
}

#[test]
fn delete_against_unreachable_server_is_a_transport_error() {
    cmd()
        .args(["delete", "5", "--base-url", "http://127.0.0.1:9", "--person", "1"])
        .assert()
        .failure()
        .stderr(contains("network request failed").and(contains("deleted").not()));
}

#[test]
fn upload_prints_addressable_rows() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a.pdf");
    fs::write(&file, b"%PDF-1.4").unwrap();
    let (base, server) = serve_once(
        "200 OK",
        r#"{"files":[{"id":1,"file_name":"a.pdf","download_url":"/d/1"}]}"#,
    );

    cmd()
        .args(["upload", "--base-url", &base, "--session-id", "abc", "--field", "application_id=3"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("file-1\ta.pdf\t/d/1"));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /upload_temp "), "{request}");
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("cookie: session_id=abc"));
    assert!(request.contains(r#"name="application_id""#));
    assert!(request.contains(r#"filename="a.pdf""#));
}

#[test]
fn rejected_upload_shows_server_detail() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("huge.pdf");
    fs::write(&file, b"x").unwrap();
    let (base, server) = serve_once("413 Payload Too Large", r#"{"detail":"file too large"}"#);

    cmd()
        .args(["upload", "--base-url", &base])
        .arg(&file)
        .assert()
        .failure()
        .stderr(contains("file too large"))
        .stdout(contains("file-").not());
    server.join().unwrap();
}

#[test]
fn delete_sends_person_and_confirms() {
    let (base, server) = serve_once("200 OK", r#"{"message":"deleted"}"#);
    cmd()
        .args(["delete", "5", "--base-url", &base, "--person", "1"])
        .assert()
        .success()
        .stdout(contains("deleted file 5"));
    let request = server.join().unwrap();
    assert!(request.starts_with("DELETE /file/5?person_identifier=1 "), "{request}");
}

#[test]
fn missing_file_on_delete_reports_detail() {
    let (base, server) = serve_once("404 Not Found", r#"{"detail":"not found"}"#);
    cmd()
        .args(["delete", "5", "--base-url", &base])
        .assert()
        .failure()
        .stderr(contains("not found"))
        .stdout(contains("deleted").not());
    let request = server.join().unwrap();
    assert!(request.starts_with("DELETE /file/5 "), "{request}");
}
