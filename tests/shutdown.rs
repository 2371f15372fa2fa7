//! Process-level shutdown of the server binary.

#![cfg(unix)]

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

#[tokio::test]
async fn interrupt_exits_cleanly_while_stdin_stays_open() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-learning-server"))
        .arg("start")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    // Held for the whole test so the server never sees EOF
    let _stdin = child.stdin.take().unwrap();
    let mut stderr = BufReader::new(child.stderr.take().unwrap());

    timeout(Duration::from_secs(10), async {
        let mut line = String::new();
        loop {
            line.clear();
            let read = stderr.read_line(&mut line).await.unwrap();
            assert!(read > 0, "server exited before printing its banner");
            if line.starts_with("- Prompts:") {
                break;
            }
        }
    })
    .await
    .unwrap();

    // The Ctrl-C listener is installed right after the banner is written
    tokio::time::sleep(Duration::from_millis(300)).await;

    let pid = child.id().unwrap().to_string();
    let kill = std::process::Command::new("kill")
        .args(["-INT", &pid])
        .status()
        .unwrap();
    assert!(kill.success());

    let status = timeout(Duration::from_secs(10), child.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.code(), Some(0));

    let mut rest = String::new();
    stderr.read_to_string(&mut rest).await.unwrap();
    assert!(rest.contains("Shutting down server..."));
}
