//! Line-delimited stdio transport.
//!
//! One JSON-RPC message per line. Parse failures are reported as
//! `InvalidData` so the server loop can answer with a JSON-RPC parse error
//! instead of tearing the session down.

use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::io::{self, BufRead, Write};

/// Owns the process's stdio handles for the duration of a session.
pub struct StdioTransport {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }

    /// Read the next request, skipping blank lines. `Ok(None)` means EOF.
    pub fn read_request(&mut self) -> io::Result<Option<JsonRpcRequest>> {
        loop {
            let mut line = String::new();
            let bytes_read = self.stdin.lock().read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
        }
    }

    /// Write one response as a single newline-terminated line and flush, so
    /// the peer never waits on a buffered partial message.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let mut out = self.stdout.lock();
        serde_json::to_writer(&mut out, response)?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}
