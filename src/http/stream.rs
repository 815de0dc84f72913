//! Chunked body streaming
//!
//! File windows are never buffered whole. A spawned task reads at most
//! [`CHUNK_SIZE`] bytes at a time and hands each chunk to the response body
//! through a channel of capacity one, so peak memory per response stays at
//! a few chunks no matter how large the window is.

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::logger;

/// Bytes read from the file per chunk (1 MiB)
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Body type shared by every response the server produces
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

type FrameResult = Result<Frame<Bytes>, io::Error>;

/// How a window pump ended without an I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every planned byte was handed to the body
    Complete { sent: u64 },
    /// The body was dropped (client went away) before the window finished
    ClientGone { sent: u64 },
}

/// In-memory body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Zero-length body (HEAD responses, empty files)
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream `len` bytes of `reader` starting at `offset`
///
/// The pump runs in its own task. `label` names the resource in log lines.
pub fn window_body<R>(reader: R, offset: u64, len: u64, label: String) -> ResponseBody
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<FrameResult>(1);

    tokio::spawn(async move {
        match pump_window(reader, offset, len, &tx).await {
            Ok(StreamOutcome::Complete { .. }) => {}
            Ok(StreamOutcome::ClientGone { sent }) => {
                logger::log_client_disconnected(&label, sent, len);
            }
            Err(e) => {
                logger::log_error(&format!("Streaming '{label}' failed: {e}"));
                // Aborts the body so the client sees a truncated response
                let _ = tx.send(Err(e)).await;
            }
        }
    });

    StreamBody::new(ReceiverStream::new(rx)).boxed_unsync()
}

/// Read the window chunk by chunk and push each chunk into `tx`
///
/// A closed channel is a normal outcome, not an error. Short reads are
/// retried; only a zero-byte read before `len` bytes is an error.
pub async fn pump_window<R>(
    mut reader: R,
    offset: u64,
    len: u64,
    tx: &mpsc::Sender<FrameResult>,
) -> io::Result<StreamOutcome>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    if len == 0 {
        return Ok(StreamOutcome::Complete { sent: 0 });
    }
    if offset > 0 {
        reader.seek(SeekFrom::Start(offset)).await?;
    }

    let mut sent = 0u64;
    while sent < len {
        if tx.is_closed() {
            return Ok(StreamOutcome::ClientGone { sent });
        }

        let want = usize::try_from(len - sent).map_or(CHUNK_SIZE, |n| n.min(CHUNK_SIZE));
        let mut chunk = vec![0u8; want];
        read_full(&mut reader, &mut chunk).await?;

        if tx.send(Ok(Frame::data(Bytes::from(chunk)))).await.is_err() {
            return Ok(StreamOutcome::ClientGone { sent });
        }
        sent += want as u64;
    }

    Ok(StreamOutcome::Complete { sent })
}

/// Fill `buf` completely, tolerating short and interrupted reads
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended {} bytes before the planned window",
                        buf.len() - filled
                    ),
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
