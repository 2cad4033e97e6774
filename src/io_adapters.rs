use crate::command::StagePosition;
use crate::pipe::PipeBuffer;
use std::cell::RefCell;
use std::io::{self, Cursor, Read, Result as IoResult, Write};
use std::rc::Rc;

/// The I/O capabilities a command gets for one stage.
///
/// Reads come from the session's standard input when the stage runs alone and
/// from the pipe otherwise. Writes always go to the pipe's output; they reach the
/// real sink only through [`StageIo::flush_if_last`], which does nothing for
/// stages that feed another stage.
pub struct StageIo<'a> {
    position: StagePosition,
    pipe: &'a mut PipeBuffer,
    stdin: &'a mut dyn Read,
    sink: &'a mut dyn Write,
    process_stdin: bool,
}

impl<'a> StageIo<'a> {
    pub fn new(
        position: StagePosition,
        pipe: &'a mut PipeBuffer,
        stdin: &'a mut dyn Read,
        sink: &'a mut dyn Write,
    ) -> Self {
        Self {
            position,
            pipe,
            stdin,
            sink,
            process_stdin: false,
        }
    }

    /// Mark `stdin` as the process's own standard input.
    pub fn with_process_stdin(mut self, process_stdin: bool) -> Self {
        self.process_stdin = process_stdin;
        self
    }

    /// A child process may share the process's standard input only when the
    /// stage runs alone and the session reads from that very stream.
    pub fn reads_process_stdin(&self) -> bool {
        self.process_stdin && self.position.is_single()
    }

    pub fn position(&self) -> StagePosition {
        self.position
    }

    /// All upstream data as raw bytes. The pipe's input is consumed.
    ///
    /// Blocks until end of input when reading the real standard input.
    pub fn read_input_bytes(&mut self) -> IoResult<Vec<u8>> {
        if self.position.is_single() {
            let mut buf = Vec::new();
            self.stdin.read_to_end(&mut buf)?;
            Ok(buf)
        } else {
            Ok(self.pipe.take_input())
        }
    }

    /// All upstream data as text; invalid UTF-8 is replaced.
    pub fn read_input(&mut self) -> IoResult<String> {
        let bytes = self.read_input_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn append_output(&mut self, text: &str) {
        self.pipe.append(text.as_bytes());
    }

    /// Push the collected output to the real sink if this is the last stage.
    pub fn flush_if_last(&mut self) -> IoResult<()> {
        if self.position.is_last() {
            self.pipe.flush_to(&mut *self.sink)?;
        }
        Ok(())
    }
}

impl Write for StageIo<'_> {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.pipe.append(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        self.flush_if_last()
    }
}

/// Memory-backed reader, used as the interpreter's standard input in tests
/// and embeddings.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: impl Into<Vec<u8>>) -> Self {
        Self {
            cursor: Cursor::new(buf.into()),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

/// Memory-backed writer for capturing what the interpreter prints.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
