//! Silence-based frame reception.
//!
//! Frames on this bus carry no length field and no delimiter; a frame is
//! over when the line has been quiet for longer than the quiescence
//! threshold. The state machine here is driven by an abstract byte source
//! and an abstract monotonic clock so it can be exercised with a scripted
//! feed instead of wall-clock delays.

use std::time::Duration;

use anyhow::Result;
use log::debug;
use thiserror::Error;

/// Inter-byte gap after which a frame is considered complete.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(100);

/// Receive buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("receive buffer overflow ({dropped} bytes dropped)")]
    Overflow { dropped: usize },
    #[error("no complete frame within {0:?}")]
    DeadlineExceeded(Duration),
}

/// One end of a byte-oriented link.
pub trait ByteSource {
    /// Non-blocking availability check.
    fn has_data(&mut self) -> Result<bool>;

    /// Reads one byte. Must return promptly once `has_data` signaled.
    fn read_byte(&mut self) -> Result<u8>;
}

/// Monotonic time since an arbitrary epoch.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Inter-byte silence that ends a frame.
    pub quiescence: Duration,
    /// Buffer capacity; bytes past it count as overflow.
    pub capacity: usize,
    /// Optional bound on the total wait. `None` reproduces the device
    /// family's native behavior: the call blocks until the line goes
    /// quiet, however long bytes keep arriving.
    pub max_wait: Option<Duration>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            quiescence: DEFAULT_QUIESCENCE,
            capacity: DEFAULT_CAPACITY,
            max_wait: None,
        }
    }
}

/// Raw bytes accumulated for one reception window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    bytes: Vec<u8>,
}

impl ReceivedFrame {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating,
    Complete,
}

/// Accumulates one frame. A fresh receiver is created per reception
/// window; nothing is shared across calls.
#[derive(Debug)]
pub struct FrameReceiver {
    config: ReceiverConfig,
    buf: Vec<u8>,
    dropped: usize,
    state: State,
    last_activity: Duration,
}

impl FrameReceiver {
    pub fn new(config: ReceiverConfig) -> Self {
        FrameReceiver {
            buf: Vec::with_capacity(config.capacity),
            config,
            dropped: 0,
            state: State::Idle,
            last_activity: Duration::ZERO,
        }
    }

    /// Feeds one byte received at time `now`.
    pub fn feed(&mut self, byte: u8, now: Duration) {
        if self.buf.len() < self.config.capacity {
            self.buf.push(byte);
        } else {
            self.dropped += 1;
        }
        self.last_activity = now;
        if self.state == State::Idle {
            self.state = State::Accumulating;
        }
    }

    /// Reports line silence at time `now`. Returns true once the
    /// quiescence window has elapsed and the frame is complete. The first
    /// call establishes the activity timestamp, so an idle line still
    /// completes (with an empty frame) after one quiescence window.
    pub fn quiet(&mut self, now: Duration) -> bool {
        match self.state {
            State::Idle => {
                self.last_activity = now;
                self.state = State::Accumulating;
                false
            }
            State::Accumulating => {
                if now.saturating_sub(self.last_activity) > self.config.quiescence {
                    self.state = State::Complete;
                    true
                } else {
                    false
                }
            }
            State::Complete => true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Yields the accumulated frame, or an overflow error if any bytes
    /// were dropped during accumulation.
    pub fn finish(self) -> Result<ReceivedFrame, ReceiveError> {
        if self.dropped > 0 {
            Err(ReceiveError::Overflow {
                dropped: self.dropped,
            })
        } else {
            Ok(ReceivedFrame { bytes: self.buf })
        }
    }
}

/// Collects one frame from `source`, ending it after
/// `config.quiescence` of silence.
///
/// Without `config.max_wait` there is no overall deadline: as long as
/// bytes keep arriving the call keeps accumulating, and on a dead line it
/// returns an empty frame after one quiescence window.
pub fn receive_frame<S, C>(source: &mut S, clock: &C, config: &ReceiverConfig) -> Result<ReceivedFrame>
where
    S: ByteSource + ?Sized,
    C: Clock + ?Sized,
{
    let mut receiver = FrameReceiver::new(config.clone());
    let start = clock.now();

    loop {
        if let Some(max_wait) = config.max_wait {
            if clock.now().saturating_sub(start) > max_wait {
                return Err(ReceiveError::DeadlineExceeded(max_wait).into());
            }
        }
        if source.has_data()? {
            let byte = source.read_byte()?;
            receiver.feed(byte, clock.now());
        } else if receiver.quiet(clock.now()) {
            // Silence is judged on time sampled after the poll, so time
            // spent in `has_data` counts toward the quiescence window.
            break;
        }
    }

    let frame = receiver.finish()?;
    debug!("recv {:02x?}", frame.bytes());
    Ok(frame)
}
