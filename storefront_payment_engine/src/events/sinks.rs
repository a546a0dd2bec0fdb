use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

use crate::events::{SinkError, StatusEvent, StatusSink};

/// How many undelivered events a [`ChannelSink`] holds before its reader is considered stalled.
const DEFAULT_SINK_CAPACITY: usize = 64;

/// A [`StatusSink`] backed by a bounded tokio channel. The transport layer owns the receiving half and turns it
/// into whatever wire format it speaks.
///
/// A reader that falls `capacity` events behind gets a delivery failure, which makes the broadcaster evict it.
/// Closing the sink drops the sender, so the receiver sees the end of the stream once it has drained what was
/// already queued.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Mutex<Option<Sender<StatusEvent>>>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<StatusEvent>) {
        Self::with_capacity(DEFAULT_SINK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, Receiver<StatusEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender: Mutex::new(Some(sender)) }, receiver)
    }
}

impl StatusSink for ChannelSink {
    fn deliver(&self, event: &StatusEvent) -> Result<(), SinkError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            return Err(SinkError::Closed);
        };
        tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::DeliveryFailed("reader is not keeping up".into()),
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn close(&self) {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
