//! JSON document on stdout
//!
//! Keys are sorted at every level and indented by four spaces so runs can
//! be diffed against each other.

use crate::scanner::ScanResult;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::{self, Write};
use tracing::debug;

/// Serialize a scan result into the output document, newline included.
pub fn render(result: &ScanResult) -> serde_json::Result<Vec<u8>> {
    // Going through `Value` sorts every object's keys
    let value = serde_json::to_value(result)?;

    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    buf.push(b'\n');

    Ok(buf)
}

/// Write the document, ignoring a reader that went away (e.g. `q` in less).
pub fn write_document<W: Write>(result: &ScanResult, mut out: W) -> Result<()> {
    let document = render(result).context("Failed to serialize scan result")?;

    match out.write_all(&document).and_then(|_| out.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Output pipe closed early");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to write output"),
    }
}
