//! Loading the inbound rule event.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use confcheck_core::InboundEvent;

/// Read an event from `source`, a file path or `-` for stdin.
pub fn load_event(source: &str) -> Result<InboundEvent> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        read_file(Path::new(source))?
    };
    parse_event(&raw)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read event file {}", path.display()))
}

pub fn parse_event(raw: &str) -> Result<InboundEvent> {
    serde_json::from_str(raw).context("event is not a valid rule invocation envelope")
}
