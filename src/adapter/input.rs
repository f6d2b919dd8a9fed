//! Blocking, pull-based access to a streamed request body.
//!
//! The application runs on the blocking pool, so the body stream is
//! bridged to `std::io` with `StreamReader` + `SyncIoBridge`. Data is
//! pulled from the connection only as the application reads it.

use axum::body::Body;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use tokio_util::io::{StreamReader, SyncIoBridge};

type BodyReader = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// The request body as seen by the application.
///
/// Must be created inside a Tokio runtime and read from a thread where
/// blocking is allowed (e.g. inside `spawn_blocking`).
pub struct Input {
    reader: BufReader<SyncIoBridge<BodyReader>>,
}

impl Input {
    pub fn new(body: Body) -> Self {
        let stream = body.into_data_stream().map_err(io::Error::other).boxed();
        Self {
            reader: BufReader::new(SyncIoBridge::new(StreamReader::new(stream))),
        }
    }

    /// Read up to `length` bytes, or everything left when `length` is `None`.
    ///
    /// With a length, `None` signals end of input. Without one, end of
    /// input yields an empty buffer.
    pub fn read(&mut self, length: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        match length {
            None => {
                let mut buf = Vec::new();
                self.reader.read_to_end(&mut buf)?;
                Ok(Some(buf))
            }
            Some(0) => Ok(Some(Vec::new())),
            Some(length) => {
                let mut buf = Vec::with_capacity(length.min(64 * 1024));
                (&mut self.reader).take(length as u64).read_to_end(&mut buf)?;
                if buf.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(buf))
                }
            }
        }
    }

    /// Read the next line, including its trailing `\n` if present.
    pub fn gets(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Iterate the remaining body in the chunks it arrives in.
    pub fn each(&mut self) -> Chunks<'_> {
        Chunks { input: self }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input").finish_non_exhaustive()
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for Input {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

/// Iterator returned by [`Input::each`].
pub struct Chunks<'a> {
    input: &'a mut Input,
}

impl Iterator for Chunks<'_> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = match self.input.reader.fill_buf() {
            Ok([]) => return None,
            Ok(buf) => buf.to_vec(),
            Err(e) => return Some(Err(e)),
        };
        self.input.reader.consume(chunk.len());
        Some(Ok(chunk))
    }
}
