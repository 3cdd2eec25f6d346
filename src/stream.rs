//! Chunked streaming file I/O
//!
//! Memory-bounded transfer: at most one chunk buffer is resident at a time,
//! never the whole file. The offset and byte accumulator live inside the
//! stream object, so a sequence of `next_chunk`/`write_chunk` calls walks
//! the file without the caller tracking positions.

use std::path::Path;

use compio::fs::{File, OpenOptions};
use compio::io::{AsyncReadAt, AsyncWriteAt};
use tracing::debug;

use crate::error::{stream_error, translate_io_error, Result};

/// Chunked reader over a file
///
/// Yields owned chunk buffers of at most `chunk_size` bytes. Short reads
/// are normal (the buffer is truncated to the bytes actually read); `None`
/// marks end of file.
#[derive(Debug)]
pub struct FileReadStream {
    file: File,
    chunk_size: usize,
    offset: u64,
    len: u64,
}

impl FileReadStream {
    /// Open `path` for chunked reading
    ///
    /// The chunk size is pinned here; later configuration changes do not
    /// affect an open stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its size queried.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| translate_io_error("open for streaming read", path, &e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| translate_io_error("stat for streaming read", path, &e))?
            .len();
        debug!(
            "opened read stream for {} ({len} bytes, {chunk_size}-byte chunks)",
            path.display()
        );
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            len,
        })
    }

    /// Read the next chunk, advancing the internal offset
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let buffer = vec![0u8; self.chunk_size];
        let result = self.file.read_at(buffer, self.offset).await;
        let bytes_read = result.0.map_err(|e| {
            stream_error(&format!("read failed at offset {}: {e}", self.offset))
        })?;
        if bytes_read == 0 {
            return Ok(None);
        }

        let mut chunk = result.1;
        chunk.truncate(bytes_read);
        self.offset += bytes_read as u64;
        Ok(Some(chunk))
    }

    /// Total bytes read so far
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// File size at open time (a hint; the file may grow or shrink)
    #[must_use]
    pub const fn file_size(&self) -> u64 {
        self.len
    }

    /// The pinned chunk size
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Chunked writer into a file
///
/// Appends each chunk at the internal offset, looping on partial writes
/// until the chunk is fully written. [`FileWriteStream::finish`] optionally
/// syncs to disk and returns the total byte count; writing after `finish`
/// is an error.
#[derive(Debug)]
pub struct FileWriteStream {
    file: File,
    offset: u64,
    sync_on_finish: bool,
    finished: bool,
}

impl FileWriteStream {
    /// Create (or truncate) `path` for chunked writing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub async fn create(path: &Path, sync_on_finish: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| translate_io_error("open for streaming write", path, &e))?;
        debug!("opened write stream for {}", path.display());
        Ok(Self {
            file,
            offset: 0,
            sync_on_finish,
            finished: false,
        })
    }

    /// Write one chunk at the current offset
    ///
    /// Partial writes are retried with the remaining tail until the whole
    /// chunk is on its way to disk. Zero-byte progress is an error rather
    /// than silent data loss.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is finished, a write fails, or the OS
    /// accepts zero bytes.
    pub async fn write_chunk(&mut self, chunk: Vec<u8>) -> Result<usize> {
        if self.finished {
            return Err(stream_error("write_chunk called after finish"));
        }

        let total = chunk.len();
        let mut remaining = chunk;
        while !remaining.is_empty() {
            let result = self.file.write_at(remaining, self.offset).await;
            let bytes_written = result.0.map_err(|e| {
                stream_error(&format!("write failed at offset {}: {e}", self.offset))
            })?;
            if bytes_written == 0 {
                return Err(stream_error(&format!(
                    "no bytes written at offset {}",
                    self.offset
                )));
            }
            self.offset += bytes_written as u64;
            remaining = result.1;
            remaining.drain(..bytes_written);
        }
        Ok(total)
    }

    /// Finish the stream, optionally syncing to disk
    ///
    /// Returns the total bytes written. Finishing an unwritten stream is
    /// valid and leaves an empty file.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream was already finished or the sync
    /// fails.
    pub async fn finish(&mut self) -> Result<u64> {
        if self.finished {
            return Err(stream_error("finish called twice"));
        }
        if self.sync_on_finish {
            self.file
                .sync_all()
                .await
                .map_err(|e| stream_error(&format!("sync failed: {e}")))?;
        }
        self.finished = true;
        Ok(self.offset)
    }

    /// Total bytes written so far
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.offset
    }
}

/// Copy `src` to `dst` through a read-stream/write-stream pair
///
/// # Errors
///
/// Returns an error if either stream fails.
pub async fn copy_file_streaming(
    src: &Path,
    dst: &Path,
    chunk_size: usize,
    sync_on_write: bool,
) -> Result<u64> {
    let mut reader = FileReadStream::open(src, chunk_size).await?;
    let mut writer = FileWriteStream::create(dst, sync_on_write).await?;
    while let Some(chunk) = reader.next_chunk().await? {
        writer.write_chunk(chunk).await?;
    }
    writer.finish().await
}
