//! Device position sources.
//!
//! A source answers one-shot position requests and can open a stream of
//! continuous observations. How a platform obtains the position is up to the
//! implementation; the tracker only relies on this trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt::Debug, time::Duration};
use tokio::sync::mpsc;

use crate::{error::LocationError, model::Coordinate};

/// Stream of continuous observations. Ends when the sender side is dropped.
pub type PositionStream = mpsc::Receiver<Result<Coordinate, LocationError>>;

const WATCH_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Upper bound on waiting for a single fix.
    pub timeout: Duration,
    /// How old a cached fix may be and still be reused.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// Options for the startup fix.
    pub const fn one_shot() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }

    /// Options for continuous observation.
    pub const fn watch() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            maximum_age: Duration::from_secs(20),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self, options: PositionOptions)
    -> Result<Coordinate, LocationError>;

    fn watch_position(&self, options: PositionOptions) -> Result<PositionStream, LocationError>;
}

/// A host with no positioning capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

#[async_trait]
impl PositionSource for NoDevice {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }

    fn watch_position(&self, _: PositionOptions) -> Result<PositionStream, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// A stationary device at a configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }

    /// Yields the position once, then stays silent until the stream is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    fn watch_position(&self, _: PositionOptions) -> Result<PositionStream, LocationError> {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 on a fresh channel, cannot fail.
        let _ = tx.try_send(Ok(self.0));
        tokio::spawn(async move { tx.closed().await });
        Ok(rx)
    }
}

/// A source driven from outside: the one-shot answer is fixed at construction
/// and observations are pushed through the returned sender.
#[derive(Debug)]
pub struct ChannelPosition {
    initial: Result<Coordinate, LocationError>,
    observations: Mutex<Option<PositionStream>>,
}

impl ChannelPosition {
    pub fn new(
        initial: Result<Coordinate, LocationError>,
    ) -> (Self, mpsc::Sender<Result<Coordinate, LocationError>>) {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let source = Self {
            initial,
            observations: Mutex::new(Some(rx)),
        };
        (source, tx)
    }
}

#[async_trait]
impl PositionSource for ChannelPosition {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, LocationError> {
        self.initial.clone()
    }

    /// The stream can be taken once.
    fn watch_position(&self, _: PositionOptions) -> Result<PositionStream, LocationError> {
        self.observations
            .lock()
            .take()
            .ok_or_else(|| LocationError::Other("position stream already taken".into()))
    }
}
