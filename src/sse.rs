//! SSE frame decoding.
//!
//! Turns a response body's byte-chunk stream into a lazy, single-pass
//! sequence of parsed JSON events. Frames are `data:`-prefixed payloads
//! separated by a blank line; the `[DONE]` sentinel marks the logical end of
//! the event stream without being emitted. Non-data frames (comments,
//! keep-alives, ids) are skipped.

use async_stream::stream;
use futures::Stream;
use futures_util::StreamExt;

use crate::error::ClientError;

const FRAME_TERMINATOR: &[u8] = b"\n\n";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE frame splitter.
///
/// Complete frames are returned per feed; the unterminated tail is carried
/// forward as raw bytes, so a multi-byte code point split across chunk
/// boundaries reassembles before UTF-8 decoding. The tail never contains a
/// complete frame, and a tail left over when the source ends is discarded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte chunk, returning every frame it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, ClientError> {
        // The carried tail holds no terminator, so only its last byte can
        // start one with the new chunk; resume the scan there instead of
        // rescanning the whole tail on every feed.
        let mut search_from = self.pending.len().saturating_sub(1);
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = find_terminator(&self.pending[search_from..]) {
            let pos = search_from + pos;
            let rest = self.pending.split_off(pos + FRAME_TERMINATOR.len());
            self.pending.truncate(pos);
            let frame = std::str::from_utf8(&self.pending)
                .map_err(|e| {
                    ClientError::MalformedStream(format!("frame is not valid UTF-8: {e}"))
                })?
                .to_owned();
            self.pending = rest;
            search_from = 0;
            frames.push(frame);
        }
        Ok(frames)
    }
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == FRAME_TERMINATOR)
}

/// Strip the `data:` field prefix (plus one optional space) from a complete
/// frame, returning `None` for non-data frames.
pub fn data_payload(frame: &str) -> Option<&str> {
    let rest = frame.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Decode a byte-chunk stream into parsed JSON events.
///
/// Lazy and single-pass; unbounded input is supported, and the stream ends
/// when the source ends. The `[DONE]` sentinel is skipped rather than
/// terminating the stream, so frames after a mid-stream sentinel are still
/// decoded. A data payload that is not valid JSON yields
/// [`ClientError::MalformedStream`] and ends the stream.
pub fn json_event_stream<S, B>(
    byte_stream: S,
) -> impl Stream<Item = Result<serde_json::Value, ClientError>> + Send
where
    S: Stream<Item = Result<B, ClientError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    stream! {
        let mut source = Box::pin(byte_stream);
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = source.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let frames = match decoder.feed(chunk.as_ref()) {
                Ok(frames) => frames,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            for frame in frames {
                let Some(payload) = data_payload(&frame) else {
                    continue;
                };
                let payload = payload.trim();
                if payload == DONE_SENTINEL {
                    continue;
                }
                match serde_json::from_str::<serde_json::Value>(payload) {
                    Ok(event) => {
                        tracing::trace!(%event, "decoded stream event");
                        yield Ok(event);
                    }
                    Err(e) => {
                        yield Err(ClientError::MalformedStream(format!(
                            "invalid JSON in data frame: {e}"
                        )));
                        return;
                    }
                }
            }
        }
    }
}
