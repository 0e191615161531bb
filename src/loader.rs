//! Background image loading.
//!
//! Decoding runs on a dedicated thread so the event loop never blocks on
//! an image decode. Every request carries a monotonically increasing
//! sequence number; consumers compare a completion's sequence against the
//! latest one they issued and discard stale results, so an in-flight load
//! of an older image can never overwrite a newer one.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbaImage;

use crate::constants::DECODER_THREAD_NAME;
use crate::error::InspectError;

/// A decode request sent to the background thread.
struct LoadRequest {
    seq: u64,
    source: String,
}

/// Message sent to the decoder thread.
enum ThreadMessage {
    /// Decode an image source
    Load(LoadRequest),
    /// Shut the thread down
    Shutdown,
}

/// A completed load, successful or not.
pub struct LoadResult {
    /// Sequence number of the originating request
    pub seq: u64,
    /// The source string that was requested
    pub source: String,
    /// Decoded pixels, or the decode failure
    pub result: Result<RgbaImage, InspectError>,
}

/// Handle to the background decode thread.
pub struct ImageLoader {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<LoadResult>,
    thread_handle: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl ImageLoader {
    /// Spawn the decoder thread.
    ///
    /// Returns `Err` if the thread fails to spawn.
    pub fn spawn() -> Result<Self, InspectError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<LoadResult>();

        let thread_handle = thread::Builder::new()
            .name(DECODER_THREAD_NAME.to_string())
            .spawn(move || {
                log::debug!("image decoder thread started");
                Self::thread_loop(request_rx, result_tx);
                log::debug!("image decoder thread exiting");
            })
            .map_err(InspectError::Io)?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_seq: 0,
        })
    }

    /// Request a decode and return the request's sequence number.
    ///
    /// The caller remembers the returned value as its latest sequence and
    /// ignores completions tagged with anything older.
    pub fn request(&mut self, source: &str) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        log::debug!("load request {} for {}", seq, display_source(source));
        if self
            .request_tx
            .send(ThreadMessage::Load(LoadRequest {
                seq,
                source: source.to_string(),
            }))
            .is_err()
        {
            log::error!("decoder thread is gone; request {} dropped", seq);
        }
        seq
    }

    /// The sequence number of the most recent request.
    pub fn latest_seq(&self) -> u64 {
        self.next_seq
    }

    /// Drain all completions currently available, without blocking.
    pub fn poll(&mut self) -> Vec<LoadResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            results.push(result);
        }
        results
    }

    /// Wait up to `timeout` for at least one completion, then drain.
    ///
    /// Useful for headless hosts and tests that need load completion
    /// without an event loop ticking `poll`.
    pub fn wait(&mut self, timeout: Duration) -> Vec<LoadResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                let mut results = vec![result];
                // Grab anything else already queued
                results.extend(self.poll());
                results
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }

    /// Background thread main loop.
    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<LoadResult>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Load(request)) => {
                    let result = decode_source(&request.source);
                    if let Err(e) = &result {
                        log::error!(
                            "decode failed for request {} ({}): {}",
                            request.seq,
                            display_source(&request.source),
                            e
                        );
                    }
                    let completed = LoadResult {
                        seq: request.seq,
                        source: request.source,
                        result,
                    };
                    if result_tx.send(completed).is_err() {
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Decode an image source string into RGBA pixels.
///
/// Supported sources: `data:…;base64,…` URLs and filesystem paths. Other
/// URI schemes are unsupported and fail the decode (which the views treat
/// as a silently empty background).
pub fn decode_source(source: &str) -> Result<RgbaImage, InspectError> {
    let bytes = if let Some(rest) = source.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| InspectError::invalid_data_url("missing ;base64, marker"))?;
        BASE64
            .decode(payload.trim())
            .map_err(|e| InspectError::invalid_data_url(e.to_string()))?
    } else if source.contains("://") {
        return Err(InspectError::unsupported_source(source));
    } else {
        std::fs::read(source)?
    };

    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

fn display_source(source: &str) -> String {
    if source.len() > 48 {
        format!("{}…", source.chars().take(48).collect::<String>())
    } else {
        source.to_string()
    }
}
