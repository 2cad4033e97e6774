use std::io::{self, Write};

/// In-memory stand-in for an OS pipe between two stages.
///
/// `output` collects what the running stage writes; `input` holds what the
/// previous stage wrote and is the read source of the running stage.
#[derive(Debug, Default)]
pub struct PipeBuffer {
    output: Vec<u8>,
    input: Vec<u8>,
}

impl PipeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to `output`.
    pub fn append(&mut self, data: &[u8]) {
        self.output.extend_from_slice(data);
    }

    /// Move `output` into `input`, replacing it, and leave `output` empty.
    pub fn redirect_to_input(&mut self) {
        self.input = std::mem::take(&mut self.output);
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take the upstream data, leaving `input` empty.
    pub fn take_input(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.input)
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Write `output` to `sink` and empty it.
    pub fn flush_to(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        if !self.output.is_empty() {
            sink.write_all(&self.output)?;
            self.output.clear();
        }
        sink.flush()
    }
}
