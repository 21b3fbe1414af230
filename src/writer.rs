use std::io::{self, Write};
use std::sync::Mutex;

/// A byte sink shared by every handler derived from the same root.
///
/// The lock is held only for the duration of a single write, so concurrent
/// records never interleave.
#[derive(Debug)]
pub struct LockedWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write> LockedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Write one complete line to the sink.
    pub fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        writer.write_all(line)
    }

    /// Flush the underlying sink.
    pub fn flush(&self) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        writer.flush()
    }

    /// Consume the wrapper and return the sink.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner
            .into_inner()
            .map_err(|_| io::Error::other("log sink lock poisoned"))
    }
}
