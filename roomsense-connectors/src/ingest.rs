//! Ingest loop: message source → pipeline → sink channel

use log::{error, info};
use roomsense_core::Pipeline;

use crate::dispatch::EventSender;
use crate::{MessageSource, SessionError};

/// What an ingest run processed before it stopped
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Messages pulled from the source
    pub messages: u64,
    /// Events handed to the dispatcher
    pub events: u64,
}

/// Pull messages from `source` through `pipeline` into `events`
///
/// Runs until the source reports a terminal error (returned as `Err`) or the
/// dispatcher on the other end of `events` is gone (returns `Ok`).
pub async fn ingest<M>(
    source: &mut M,
    pipeline: &Pipeline,
    events: &EventSender,
) -> Result<IngestSummary, SessionError>
where
    M: MessageSource + ?Sized,
{
    let mut summary = IngestSummary::default();

    loop {
        if events.is_closed() {
            info!("sink dispatcher closed after {} messages, stopping ingest", summary.messages);
            return Ok(summary);
        }

        let message = match source.next_message().await {
            Ok(message) => message,
            Err(err) => {
                error!("message stream ended after {} messages: {}", summary.messages, err);
                return Err(err);
            }
        };
        summary.messages += 1;

        let mut closed = false;
        pipeline.process(&message, |event| match events.send(event) {
            Ok(()) => summary.events += 1,
            Err(_) => closed = true,
        });
        if closed {
            info!("sink dispatcher closed after {} messages, stopping ingest", summary.messages);
            return Ok(summary);
        }
    }
}
