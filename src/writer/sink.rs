//! Output Sink
//!
//! Where the writer's bytes go. Any `io::Write` is a sink; custom sinks
//! can implement the trait directly.

use std::io;
use std::ops::Range;

/// Destination for serialized bytes
pub trait Sink {
    /// Accept a chunk of output
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Accept `bytes[range]`; out-of-bounds ranges are an `InvalidInput` error
    fn send_bounded(&mut self, bytes: &[u8], range: Range<usize>) -> io::Result<()> {
        match bytes.get(range) {
            Some(slice) => self.send(slice),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "bounded range outside of buffer",
            )),
        }
    }

    /// Called exactly once, when a document ends successfully
    fn flush(&mut self) -> io::Result<()>;
}

impl<W: io::Write> Sink for W {
    #[inline]
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(self)
    }
}
