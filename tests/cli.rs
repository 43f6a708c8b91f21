use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn contextkeep() -> Command {
    Command::cargo_bin("contextkeep").unwrap()
}

#[test]
fn help_lists_subcommands() {
    contextkeep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stdio"))
        .stdout(predicate::str::contains("http"))
        .stdout(predicate::str::contains("generate-config"));
}

#[test]
fn generate_config_prints_mcp_server_entry() {
    contextkeep()
        .arg("generate-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("mcpServers"))
        .stdout(predicate::str::contains("context-keep"));
}

#[test]
fn stdio_initialize_handshake() {
    let dir = TempDir::new().unwrap();
    contextkeep()
        .args(["--data-dir", dir.path().to_str().unwrap(), "stdio"])
        .write_stdin(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("context-keep"))
        .stdout(predicate::str::contains("store_memory"))
        .stdout(predicate::str::contains("list_recent_memories"));
}

#[test]
fn stdio_store_and_retrieve() {
    let dir = TempDir::new().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"store_memory","arguments":{"key":"proj","content":"remember this"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"retrieve_memory","arguments":{"key":"proj"}}}"#,
        "\n",
    );
    contextkeep()
        .args(["--data-dir", dir.path().to_str().unwrap(), "stdio"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Memory stored"))
        .stdout(predicate::str::contains("remember this"));
}

#[test]
fn stdio_emits_only_json_lines() {
    // The transport is line-oriented JSON-RPC; any stray diagnostic on
    // stdout would corrupt it.
    let dir = TempDir::new().unwrap();
    let output = contextkeep()
        .args(["--data-dir", dir.path().to_str().unwrap(), "stdio"])
        .env("RUST_LOG", "debug")
        .write_stdin(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
        ))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        serde_json::from_str::<serde_json::Value>(line)
            .unwrap_or_else(|e| panic!("non-JSON line on stdout: {:?} ({})", line, e));
    }
}

#[test]
fn unknown_method_returns_jsonrpc_error() {
    let dir = TempDir::new().unwrap();
    contextkeep()
        .args(["--data-dir", dir.path().to_str().unwrap(), "stdio"])
        .write_stdin(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"no/such/method"}"#,
            "\n",
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("-32601"));
}
