//! Simple stateless async hook runner
//!
//! Components register a [`Handler`] for an event type. Producers push events into a bounded channel, and the
//! [`EventHandler`] task spawns the handler for each one. Handlers see only the event itself, never engine state.
//!
//! The handler task shuts down by itself once every [`EventProducer`] has been dropped, after waiting for the jobs
//! that are still running.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("🪝️ Starting event handler");
        // Drop our own sender so the loop below ends when the last producer goes away
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("🪝️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap whatever has already finished so the set doesn't grow without bound
            while let Some(res) = jobs.try_join_next() {
                log_join_result(res);
            }
        }
        if !jobs.is_empty() {
            debug!("🪝️ Waiting for {} hook job(s) to complete", jobs.len());
        }
        while let Some(res) = jobs.join_next().await {
            log_join_result(res);
        }
        debug!("🪝️ Event handler has shut down");
    }
}

fn log_join_result(res: Result<(), tokio::task::JoinError>) {
    match res {
        Ok(()) => trace!("🪝️ Event handled"),
        Err(e) => warn!("🪝️ A hook handler did not complete. {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("🪝️ Failed to send event: {e}");
        }
    }

    /// Queue an event without waiting. If the hook queue is full, or its handler has stopped, the event is dropped.
    pub fn try_publish_event(&self, event: E) {
        match self.sender.try_send(event) {
            Ok(()) => {},
            Err(mpsc::error::TrySendError::Full(_)) => warn!("🪝️ Hook queue is full. Event dropped"),
            Err(mpsc::error::TrySendError::Closed(_)) => warn!("🪝️ Hook handler has stopped. Event dropped"),
        }
    }
}
