use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};
use std::thread;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_proxy-probe"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

fn list_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Plain HTTP proxy that answers every forwarded request with 200
fn spawn_http_proxy() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut head = Vec::new();
            let mut byte = [0u8; 1];
            while !head.ends_with(b"\r\n\r\n") {
                match stream.read(&mut byte) {
                    Ok(1) => head.push(byte[0]),
                    _ => break,
                }
            }
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        }
    });
    port
}

#[test]
fn test_missing_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");

    let output = run_cli(&["--file", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{}", stderr);
}

#[test]
fn test_blank_file_exits_with_failure() {
    for content in ["", "\n   \n\t\n"] {
        let file = list_file(content);

        let output = run_cli(&["--file", file.path().to_str().unwrap()]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("empty"), "{}", stderr);
    }
}

#[test]
fn test_result_lines_reach_piped_stdout() {
    let file = list_file("not a proxy\nftp://1.2.3.4:21\n1.2.3.4\n");

    let output = run_cli(&["--file", file.path().to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let result_lines: Vec<&str> = stdout
        .lines()
        .filter(|line| line.ends_with(": not working (Invalid format)"))
        .collect();
    assert_eq!(result_lines.len(), 3, "{}", stdout);
    for line in ["not a proxy", "ftp://1.2.3.4:21", "1.2.3.4"] {
        assert!(
            result_lines.contains(&format!("{}: not working (Invalid format)", line).as_str()),
            "{}",
            stdout
        );
    }
    assert!(stdout.contains("Results: 0 working (0 fast, 0 normal, 0 slow), 3 not working"));
}

#[test]
fn test_non_interactive_stdin_skips_save_prompt() {
    let port = spawn_http_proxy();
    let file = list_file(&format!("127.0.0.1:{}\n", port));

    let output = run_cli(&[
        "--file",
        file.path().to_str().unwrap(),
        "--url",
        "http://example.com/",
        "--timeout",
        "5",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Results: 1 working"), "{}", stdout);
    assert!(!stdout.contains("(y/n)"), "{}", stdout);
    assert!(stdout.contains("proxies not saved"), "{}", stdout);
    assert!(stdout.contains("Program finished."), "{}", stdout);
}

#[test]
fn test_output_flag_saves_without_prompt() {
    let port = spawn_http_proxy();
    let file = list_file(&format!("127.0.0.1:{}\nbad line\n", port));
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("working.txt");

    let output = run_cli(&[
        "--file",
        file.path().to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--url",
        "http://example.com/",
    ]);

    assert!(output.status.success());
    let saved = std::fs::read_to_string(&out).unwrap();
    assert_eq!(saved.trim(), format!("127.0.0.1:{}", port));
}
