//! Server-sent event streams of payment status changes.
//!
//! A stream opens with a snapshot of the order's stored status, followed by every [`StatusEvent`] published for the
//! order, each as a `data: {json}` frame. A comment line goes out every heartbeat interval so that proxies keep the
//! connection open.
//!
//! The stream owns the broadcaster [`Subscription`]. When the client goes away, actix drops the stream and the
//! subscription is released with it.
use std::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use actix_web::{http::header, web::Bytes, HttpResponse};
use chrono::Utc;
use futures::{future, stream, Stream, StreamExt};
use log::*;
use serde::Serialize;
use storefront_payment_engine::events::{StatusEvent, Subscription};
use tokio::{
    sync::mpsc::Receiver,
    time::{interval_at, Instant},
};
use tokio_stream::wrappers::{IntervalStream, ReceiverStream};

use crate::{data_objects::StatusSnapshot, errors::ServerError};

type FrameStream = Pin<Box<dyn Stream<Item = Result<Bytes, ServerError>>>>;

pub struct StatusEventStream {
    frames: FrameStream,
    subscription: Subscription,
}

impl StatusEventStream {
    pub fn new(
        snapshot: StatusSnapshot,
        events: Receiver<StatusEvent>,
        subscription: Subscription,
        heartbeat: Duration,
    ) -> Self {
        let first = stream::iter(data_frame(&snapshot).map(Ok::<_, ServerError>));
        let live = ReceiverStream::new(events)
            .filter_map(|ev| async move { data_frame(&ev).map(Ok::<_, ServerError>) });
        let beats = IntervalStream::new(interval_at(Instant::now() + heartbeat, heartbeat))
            .map(|_| Ok::<_, ServerError>(heartbeat_frame()));
        // `select` only ends when both sides end, and the heartbeat never does. Stop when the event side closes.
        let live = stream::select(live.map(Some).chain(stream::once(async { None })), beats.map(Some))
            .take_while(|item| future::ready(item.is_some()))
            .filter_map(future::ready);
        let frames: FrameStream = Box::pin(first.chain(live));
        Self { frames, subscription }
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header((header::CACHE_CONTROL, "no-cache, no-transform"))
            .insert_header(("X-Accel-Buffering", "no"))
            .streaming(self)
    }
}

impl Stream for StatusEventStream {
    type Item = Result<Bytes, ServerError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.as_mut().poll_next(cx)
    }
}

impl Drop for StatusEventStream {
    fn drop(&mut self) {
        debug!("📡️ Status stream for order {} closed", self.subscription.order_id());
    }
}

pub fn data_frame<T: Serialize>(data: &T) -> Option<Bytes> {
    match serde_json::to_string(data) {
        Ok(json) => Some(Bytes::from(format!("data: {json}\n\n"))),
        Err(e) => {
            error!("📡️ Could not serialize status stream frame. {e}");
            None
        },
    }
}

pub fn heartbeat_frame() -> Bytes {
    Bytes::from(format!(": heartbeat {}\n\n", Utc::now().timestamp_millis()))
}
