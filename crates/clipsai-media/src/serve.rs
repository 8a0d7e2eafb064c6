//! Range-aware file streaming.
//!
//! A client hanging up mid-stream is normal (seeking in a player, closing a
//! tab) and ends the stream quietly as [`StreamStatus::Aborted`].

use regex::Regex;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Size of each chunk written to the sink.
pub const CHUNK_SIZE: usize = 8 * 1024;

pub const STATUS_OK: u16 = 200;
pub const STATUS_PARTIAL_CONTENT: u16 = 206;

/// `bytes=<start>-[<end>]`. Anything after the first range is ignored.
static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*bytes=(\d+)-(\d*)").expect("valid range regex"));

/// Inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header against a file of `total` bytes.
    ///
    /// Returns `None` for a malformed header or an empty file, in which case
    /// the whole file is served. Out-of-bounds values are clamped.
    pub fn parse(header: &str, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let caps = RANGE_PATTERN.captures(header)?;
        let last = total - 1;

        // Digits that overflow u64 are still past the end of any file
        let start = caps[1].parse::<u64>().unwrap_or(u64::MAX).min(last);
        let end = match caps.get(2).map(|m| m.as_str()) {
            Some(digits) if !digits.is_empty() => digits.parse::<u64>().unwrap_or(u64::MAX),
            _ => last,
        };

        Some(Self {
            start,
            end: end.clamp(start, last),
        })
    }

    /// Number of bytes covered.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Content-Range` header value.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Status and headers of a file response, decided before any byte is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServePlan {
    pub status: u16,
    pub total: u64,
    pub range: Option<ByteRange>,
    pub content_length: u64,
    pub content_range: Option<String>,
}

impl ServePlan {
    /// First byte to send.
    pub fn offset(&self) -> u64 {
        self.range.map_or(0, |r| r.start)
    }
}

/// Decide between a full 200 and a partial 206 response.
pub fn plan_response(total: u64, range_header: Option<&str>) -> ServePlan {
    match range_header.and_then(|h| ByteRange::parse(h, total)) {
        Some(range) => ServePlan {
            status: STATUS_PARTIAL_CONTENT,
            total,
            range: Some(range),
            content_length: range.len(),
            content_range: Some(range.content_range(total)),
        },
        None => ServePlan {
            status: STATUS_OK,
            total,
            range: None,
            content_length: total,
            content_range: None,
        },
    }
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Every planned byte was written
    Complete,
    /// The peer went away
    Aborted,
    /// Local I/O failure
    Failed,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Complete => "complete",
            StreamStatus::Aborted => "aborted",
            StreamStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    pub bytes_written: u64,
    pub status: StreamStatus,
}

/// Write errors that mean the client disconnected.
fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero
    )
}

/// Stream the bytes selected by `plan` from `reader` into `sink`.
///
/// Writes and flushes one chunk at a time. Never returns an error: a
/// disconnect stops the stream silently, any other failure is logged once.
pub async fn serve_range<R, W>(reader: &mut R, sink: &mut W, plan: &ServePlan) -> StreamOutcome
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    let outcome = copy_chunks(reader, sink, plan.offset(), plan.content_length).await;
    metrics::record_stream(outcome.status.as_str(), outcome.bytes_written);
    outcome
}

async fn copy_chunks<R, W>(reader: &mut R, sink: &mut W, offset: u64, length: u64) -> StreamOutcome
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    let finish = |status: StreamStatus, bytes_written: u64| StreamOutcome {
        bytes_written,
        status,
    };

    if offset > 0 {
        if let Err(e) = reader.seek(SeekFrom::Start(offset)).await {
            error!(offset, error = %e, "Failed to seek source file");
            return finish(StreamStatus::Failed, 0);
        }
    }

    let mut buf = vec![0u8; CHUNK_SIZE];
    while written < length {
        let want = (length - written).min(CHUNK_SIZE as u64) as usize;
        let n = match reader.read(&mut buf[..want]).await {
            Ok(0) => {
                error!(written, length, "Source file ended before the planned range");
                return finish(StreamStatus::Failed, written);
            }
            Ok(n) => n,
            Err(e) => {
                error!(written, error = %e, "Failed to read source file");
                return finish(StreamStatus::Failed, written);
            }
        };

        let sent = match sink.write_all(&buf[..n]).await {
            Ok(()) => sink.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = sent {
            if is_disconnect(&e) {
                debug!(written, length, "Client disconnected during stream");
                return finish(StreamStatus::Aborted, written);
            }
            error!(written, error = %e, "Failed to write stream chunk");
            return finish(StreamStatus::Failed, written);
        }

        written += n as u64;
    }

    finish(StreamStatus::Complete, written)
}

/// A file opened for serving, with its response already planned.
#[derive(Debug)]
pub struct RangedFile {
    pub path: PathBuf,
    pub file: File,
    pub plan: ServePlan,
    pub content_type: &'static str,
}

impl RangedFile {
    /// Stream the planned bytes into `sink`.
    pub async fn serve_into<W: AsyncWrite + Unpin>(mut self, sink: &mut W) -> StreamOutcome {
        serve_range(&mut self.file, sink, &self.plan).await
    }
}

/// Open `path` and plan the response for an optional `Range` header.
pub async fn open_ranged(path: &Path, range_header: Option<&str>) -> MediaResult<RangedFile> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MediaError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    Ok(RangedFile {
        path: path.to_path_buf(),
        file,
        plan: plan_response(metadata.len(), range_header),
        content_type: content_type_for(path),
    })
}

/// MIME type by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
