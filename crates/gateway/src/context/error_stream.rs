use std::io;

use bytes::BytesMut;
use tracing::error;

/// Line-buffered error stream handed to applications.
///
/// Bytes are collected until a newline arrives; every complete line is emitted as one
/// `error` event. `flush` emits a trailing partial line.
#[derive(Debug, Default)]
pub struct ErrorStream {
    pending: BytesMut,
    lines: usize,
}

impl ErrorStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines emitted so far.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    fn emit(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        error!(target: "micro_gateway::application", "{}", text.trim_end_matches('\r'));
        self.lines += 1;
    }
}

impl io::Write for ErrorStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.split_to(pos + 1);
            self.emit(&line[..pos]);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = self.pending.split();
            self.emit(&line);
        }
        Ok(())
    }
}

impl Drop for ErrorStream {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}
