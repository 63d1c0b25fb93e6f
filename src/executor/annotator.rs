//! Console annotation for TIBCO tool output
//!
//! [`LineAnnotator`] sits between the process output and the build log.
//! It buffers bytes until a full line is available and, before forwarding
//! that line untouched, may emit a marker:
//!
//! - a target-header marker before a line like `compile:` that follows a
//!   blank line and contains no space
//! - an outcome marker before a line that is exactly `BUILD SUCCESSFUL` or
//!   `BUILD FAILED`
//!
//! Markers are hidden escape sequences; the log renderer decides how to
//! display them. Line bytes are never altered or dropped.

use crate::builder::ToolKind;
use std::io::{self, Write};

/// Kind of annotation emitted before a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The line names a build target
    TargetHeader,
    /// The line reports the build outcome
    Outcome,
}

impl Marker {
    /// Encodes the marker for `tool`
    ///
    /// The payload is wrapped in `ESC[8m` / `ESC[0m` so terminals that do
    /// not understand it render nothing.
    #[must_use]
    pub fn encode(self, tool: ToolKind) -> Vec<u8> {
        let name = match self {
            Self::TargetHeader => "target",
            Self::Outcome => "outcome",
        };
        format!("\x1b[8mha:{}:{name}\x1b[0m", tool.id()).into_bytes()
    }
}

/// Line-buffering filter that annotates target headers and outcomes
#[derive(Debug)]
pub struct LineAnnotator<W: Write> {
    out: W,
    tool: ToolKind,
    buf: Vec<u8>,
    was_previous_line_empty: bool,
}

impl<W: Write> LineAnnotator<W> {
    /// Wraps `out`
    pub fn new(out: W, tool: ToolKind) -> Self {
        Self {
            out,
            tool,
            buf: Vec::with_capacity(256),
            was_previous_line_empty: true,
        }
    }

    /// Writes any buffered partial line as if it were complete
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    pub fn force_eol(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let line = std::mem::take(&mut self.buf);
            self.eol(&line)?;
        }
        Ok(())
    }

    /// Flushes the partial line and returns the underlying sink
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    pub fn finish(mut self) -> io::Result<W> {
        self.force_eol()?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Mutable access to the underlying sink
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    fn eol(&mut self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(trim_eol(line));

        if self.was_previous_line_empty && text.ends_with(':') && !text.contains(' ') {
            self.out.write_all(&Marker::TargetHeader.encode(self.tool))?;
        }
        if text == "BUILD SUCCESSFUL" || text == "BUILD FAILED" {
            self.out.write_all(&Marker::Outcome.encode(self.tool))?;
        }

        self.was_previous_line_empty = text.is_empty();
        self.out.write_all(line)
    }
}

impl<W: Write> Write for LineAnnotator<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut rest = data;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let (head, tail) = rest.split_at(pos + 1);
            self.buf.extend_from_slice(head);
            let line = std::mem::take(&mut self.buf);
            self.eol(&line)?;
            rest = tail;
        }
        self.buf.extend_from_slice(rest);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn trim_eol(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}
