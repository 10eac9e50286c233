//! Line sources: partial-line reassembly and transparent decompression.
//!
//! A [`LineReader`] hands out complete lines only. When the underlying
//! reader reports [`io::ErrorKind::WouldBlock`] in the middle of a line,
//! the reader sleeps for the poll interval and tries again, so slow pipes
//! never split a command in two.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use flate2::read::MultiGzDecoder;

use crate::error::{ParseError, Result};

/// Default sleep between retries on a partial line.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(10);

/// Outcome of one [`LineReader::next_line`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A full line, without its line terminator.
    Complete(String),
    /// A line longer than the reader's limit; its bytes are dropped up to
    /// the next terminator.
    TooLong,
    /// No data available right now; the source is not exhausted.
    WouldBlock,
    /// The source is exhausted.
    Eof,
}

/// Reads newline-terminated lines from a possibly non-blocking source.
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    poll_interval: Duration,
    max_len: Option<usize>,
    /// Dropping the rest of an over-long line.
    discarding: bool,
}

impl<R: Read> LineReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_len: None,
            discarding: false,
        }
    }

    /// Set the sleep between retries on a partial line.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Report lines longer than `max` bytes as [`Line::TooLong`].
    pub fn with_max_len(mut self, max: usize) -> Self {
        self.set_max_len(max);
        self
    }

    /// Same as [`LineReader::with_max_len`], on a borrowed reader.
    pub fn set_max_len(&mut self, max: usize) {
        self.max_len = Some(max);
    }

    /// True if part of a line has been read but not yet returned.
    pub fn has_partial_line(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Next complete line.
    ///
    /// A last line without a terminator is returned once the source is
    /// exhausted. At most the length limit plus a line terminator is ever
    /// buffered.
    pub fn next_line(&mut self) -> io::Result<Line> {
        let mut announced = false;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if self.pending.is_empty() {
                        return Ok(Line::WouldBlock);
                    }
                    if !announced {
                        log::info!("Reading raw data block...");
                        announced = true;
                    }
                    thread::sleep(self.poll_interval);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                self.discarding = false;
                if self.pending.is_empty() {
                    return Ok(Line::Eof);
                }
                return Ok(Line::Complete(self.take_pending()));
            }

            let (used, found) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            if self.discarding {
                self.inner.consume(used);
                self.discarding = !found;
                continue;
            }

            let room = match self.max_len {
                Some(max) => max.saturating_add(2).saturating_sub(self.pending.len()),
                None => usize::MAX,
            };
            let take = used.min(room);
            self.pending.extend_from_slice(&available[..take]);
            self.inner.consume(take);
            let complete = found && take == used;

            if self.max_len.is_some_and(|max| content_len(&self.pending) > max) {
                self.pending.clear();
                self.discarding = !complete;
                return Ok(Line::TooLong);
            }
            if complete {
                return Ok(Line::Complete(self.take_pending()));
            }
        }
    }

    fn take_pending(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Length of a buffered line without its terminator.
fn content_len(bytes: &[u8]) -> usize {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes).len()
}

/// Compression detected from a file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain text.
    None,
    /// `.gz`, decoded in-process.
    Gzip,
    /// `.bz` or `.bz2`, decoded by an external `bzip2 -dc`.
    Bzip2,
}

impl Compression {
    /// Detect from the path's suffix.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::Gzip,
            Some("bz") | Some("bz2") => Self::Bzip2,
            _ => Self::None,
        }
    }
}

/// Scene node name for an input file: the file name without directories,
/// without a compression suffix, then without `.gl`.
pub fn object_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".gz", ".bz2", ".bz"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
            break;
        }
    }
    if let Some(stripped) = name.strip_suffix(".gl") {
        name = stripped.to_string();
    }
    name
}

/// An opened input file.
pub struct Input {
    /// Lines of the decompressed content.
    pub lines: LineReader<Box<dyn Read>>,
    child: Option<Child>,
}

impl Input {
    /// Open `path`, decompressing according to its suffix.
    pub fn open(path: &Path, poll_interval: Duration) -> Result<Self> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|_| ParseError::CannotOpen(display.clone()))?;

        let (reader, child): (Box<dyn Read>, Option<Child>) = match Compression::from_path(path) {
            Compression::None => (Box::new(file), None),
            Compression::Gzip => {
                log::info!("Deflating/reading: {display}");
                (Box::new(MultiGzDecoder::new(file)), None)
            }
            Compression::Bzip2 => {
                drop(file);
                log::info!("Deflating/reading: {display}");
                let mut child = Command::new("bzip2")
                    .arg("-dc")
                    .arg(path)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .spawn()
                    .map_err(|e| {
                        ParseError::invalid(format!("Could not deflate {} file : {display} ({e})", suffix(path)))
                    })?;
                let stdout = child.stdout.take().ok_or_else(|| {
                    ParseError::invalid(format!("Could not deflate {} file : {display}", suffix(path)))
                })?;
                (Box::new(stdout), Some(child))
            }
        };

        Ok(Self {
            lines: LineReader::new(reader).with_poll_interval(poll_interval),
            child,
        })
    }

    /// Wait for the decompression process, if any.
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                log::warn!("bzip2 exited with {status}");
            }
        }
        Ok(())
    }
}

fn suffix(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Resolve an `include` target against the including file's directory.
pub fn resolve_include(target: &str, directory: Option<&Path>) -> PathBuf {
    let target = Path::new(target);
    match directory {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    }
}
