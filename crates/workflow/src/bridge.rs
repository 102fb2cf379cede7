//! Bridge between a running workflow and its consumer.
//!
//! A [`WorkflowHandle`] exposes three things: the early-resolved tag, the
//! ordered answer stream, and a cancellation trigger. The worker side keeps
//! two promises: the tag future always resolves (with the tag, or with the
//! error that stopped the run before it was known), and the answer stream
//! always ends with exactly one terminal event.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use windlass_core::error::Error;
use windlass_core::payload::Tag;

use crate::events::AnswerEvent;

// --- Early result ---

/// Single-shot delivery slot for the resolved tag.
///
/// The tag-check node fires it as soon as classification finishes, well
/// before the answer starts streaming. The worker fires it with an error
/// instead when the run dies first.
pub struct TagTap {
    slot: Mutex<Option<oneshot::Sender<Result<Tag, Error>>>>,
}

impl TagTap {
    pub(crate) fn new(sender: oneshot::Sender<Result<Tag, Error>>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Some(sender)),
        })
    }

    /// Deliver the tag. Later calls are no-ops.
    pub fn resolve(&self, tag: Tag) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(sender) = slot.take() {
                let _ = sender.send(Ok(tag));
            }
        }
    }

    /// Deliver a failure through the early slot. Returns false when the tag
    /// had already been resolved, in which case the error belongs on the
    /// answer stream instead.
    pub(crate) fn fail(&self, error: Error) -> bool {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(sender) = slot.take() {
                let _ = sender.send(Err(error));
                return true;
            }
        }
        false
    }
}

// --- Consumer handle ---

/// Consumer side of one workflow invocation.
pub struct WorkflowHandle {
    tag: Option<oneshot::Receiver<Result<Tag, Error>>>,
    events: mpsc::Receiver<AnswerEvent>,
    cancel: CancellationToken,
}

impl WorkflowHandle {
    pub(crate) fn new(
        tag: oneshot::Receiver<Result<Tag, Error>>,
        events: mpsc::Receiver<AnswerEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tag: Some(tag),
            events,
            cancel,
        }
    }

    /// Wait for the early-resolved tag.
    ///
    /// Resolves before or alongside the first answer chunk. Errors that
    /// stopped the run before classification arrive here. Consuming it a
    /// second time is an error.
    pub async fn early_tag(&mut self) -> Result<Tag, Error> {
        let receiver = self
            .tag
            .take()
            .ok_or_else(|| Error::Internal("early tag was already consumed".into()))?;
        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(Error::Internal(
                "workflow ended without resolving the tag".into(),
            )),
        }
    }

    /// Next event on the answer stream; `None` once the stream is closed.
    pub async fn next_event(&mut self) -> Option<AnswerEvent> {
        self.events.recv().await
    }

    /// Request cooperative cancellation. The worker stops at the next node
    /// or chunk boundary; it never interrupts mid-write.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Consume the handle, yielding the raw answer stream.
    ///
    /// For relaying events over a transport (SSE) that wants a `Stream`.
    /// Discards the early-tag future; the terminal event still carries the
    /// tag. Dropping the stream mid-run behaves like `cancel`: the worker
    /// stops at its next send.
    pub fn into_event_stream(self) -> ReceiverStream<AnswerEvent> {
        ReceiverStream::new(self.events)
    }

    /// Drain the stream into a single answer.
    pub async fn collect(mut self) -> Result<CollectedAnswer, Error> {
        let mut answer = String::new();
        while let Some(event) = self.events.recv().await {
            match event {
                AnswerEvent::Chunk { content } => answer.push_str(&content),
                AnswerEvent::Error { message } => return Err(Error::Internal(message)),
                AnswerEvent::Complete {
                    tag,
                    iterations,
                    tool_calls,
                } => {
                    return Ok(CollectedAnswer {
                        answer,
                        tag,
                        iterations,
                        tool_calls,
                    });
                }
            }
        }
        Err(Error::Internal(
            "answer stream closed without a terminal event".into(),
        ))
    }
}

/// A fully drained answer.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedAnswer {
    pub answer: String,
    pub tag: Tag,
    pub iterations: u32,
    pub tool_calls: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with(
        events: Vec<AnswerEvent>,
    ) -> (WorkflowHandle, oneshot::Sender<Result<Tag, Error>>) {
        let (tag_tx, tag_rx) = oneshot::channel();
        let (event_tx, event_rx) = mpsc::channel(16);
        for event in events {
            event_tx.try_send(event).unwrap();
        }
        drop(event_tx);
        (
            WorkflowHandle::new(tag_rx, event_rx, CancellationToken::new()),
            tag_tx,
        )
    }

    #[tokio::test]
    async fn collect_joins_chunks_in_order() {
        let (handle, _tag_tx) = handle_with(vec![
            AnswerEvent::chunk("Hel"),
            AnswerEvent::chunk("lo"),
            AnswerEvent::Complete {
                tag: Tag::General,
                iterations: 0,
                tool_calls: 0,
            },
        ]);

        let collected = handle.collect().await.unwrap();
        assert_eq!(collected.answer, "Hello");
        assert_eq!(collected.tag, Tag::General);
    }

    #[tokio::test]
    async fn collect_surfaces_the_error_sentinel() {
        let (handle, _tag_tx) = handle_with(vec![
            AnswerEvent::chunk("partial"),
            AnswerEvent::error("stream interrupted"),
        ]);

        let err = handle.collect().await.unwrap_err();
        assert!(err.to_string().contains("stream interrupted"));
    }

    #[tokio::test]
    async fn closed_stream_without_terminal_is_an_error_not_a_hang() {
        let (handle, _tag_tx) = handle_with(vec![AnswerEvent::chunk("partial")]);
        let err = handle.collect().await.unwrap_err();
        assert!(err.to_string().contains("without a terminal"));
    }

    #[tokio::test]
    async fn into_event_stream_yields_events_in_order() {
        use tokio_stream::StreamExt;

        let (handle, _tag_tx) = handle_with(vec![
            AnswerEvent::chunk("Hi"),
            AnswerEvent::Complete {
                tag: Tag::Marketing,
                iterations: 0,
                tool_calls: 0,
            },
        ]);

        let mut stream = handle.into_event_stream();
        assert_eq!(stream.next().await, Some(AnswerEvent::chunk("Hi")));
        assert!(matches!(
            stream.next().await,
            Some(AnswerEvent::Complete { tag: Tag::Marketing, .. })
        ));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn early_tag_resolves_once() {
        let (mut handle, tag_tx) = handle_with(vec![]);
        tag_tx.send(Ok(Tag::Law)).unwrap();

        assert_eq!(handle.early_tag().await.unwrap(), Tag::Law);
        assert!(handle.early_tag().await.is_err());
    }

    #[tokio::test]
    async fn tap_resolves_only_the_first_time() {
        let (tag_tx, tag_rx) = oneshot::channel();
        let tap = TagTap::new(tag_tx);

        tap.resolve(Tag::Finance);
        tap.resolve(Tag::Marketing);
        assert!(!tap.fail(Error::Internal("late".into())));

        assert_eq!(tag_rx.await.unwrap().unwrap(), Tag::Finance);
    }

    #[tokio::test]
    async fn tap_failure_reaches_the_waiting_consumer() {
        let (tag_tx, tag_rx) = oneshot::channel();
        let tap = TagTap::new(tag_tx);

        assert!(tap.fail(Error::Internal("died early".into())));
        let delivered = tag_rx.await.unwrap();
        assert!(delivered.unwrap_err().to_string().contains("died early"));
    }
}
