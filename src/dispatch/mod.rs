//! Media dispatch: route, number, transform, apply.
//!
//! The [`Dispatcher`] owns no state of its own. It draws a number from the
//! shared counter (the counter's lock is released when `next()` returns, so
//! it is never held across a transport call), renders the caption and then
//! applies it through a [`CaptionTransport`], falling back from editing in
//! place to resending the media.

mod config;

use std::sync::Arc;
use std::time::Instant;

pub use config::{MediaSelector, PipelineConfig, RoutingConfig};

use crate::caption::{CaptionTransformer, TransformResult};
use crate::contracts::{
    CaptionTransport, MediaKind, MediaMessage, SequenceCounter, SequenceError, TransportError,
};
use crate::metrics::DispatchMetrics;

/// What to do with a message of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Replace the caption with the transformer's output.
    Transform,
    /// Replace the caption with the empty string.
    Clear,
    /// Leave the message alone.
    Skip,
}

/// A caption ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Number consumed for this caption, if the route and mode draw one.
    pub sequence: Option<u64>,
    pub result: TransformResult,
}

/// How a prepared caption reached the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Edited,
    /// Editing failed; the media was re-sent with the new caption.
    Resent { edit_error: TransportError },
    /// Both attempts failed. The consumed number is not reclaimed.
    Failed {
        edit_error: TransportError,
        resend_error: TransportError,
    },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ApplyOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Skipped,
    Applied {
        sequence: Option<u64>,
        text: String,
        outcome: ApplyOutcome,
    },
}

pub struct Dispatcher<S: SequenceCounter> {
    counter: Arc<S>,
    transformer: Arc<CaptionTransformer>,
    routing: RoutingConfig,
    metrics: Arc<DispatchMetrics>,
}

impl<S: SequenceCounter> Dispatcher<S> {
    pub fn new(
        counter: Arc<S>,
        transformer: Arc<CaptionTransformer>,
        routing: RoutingConfig,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            counter,
            transformer,
            routing,
            metrics,
        }
    }

    pub fn counter(&self) -> &Arc<S> {
        &self.counter
    }

    pub fn transformer(&self) -> &CaptionTransformer {
        &self.transformer
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Clear rules win over transform rules.
    pub fn classify(&self, kind: &MediaKind) -> Route {
        if self.routing.clear.iter().any(|s| s.matches(kind)) {
            Route::Clear
        } else if self.routing.transform.iter().any(|s| s.matches(kind)) {
            Route::Transform
        } else {
            Route::Skip
        }
    }

    /// Routes a message and renders its new caption without touching the
    /// transport. `Ok(None)` means no action.
    ///
    /// A transformed caption consumes exactly one sequence number when the
    /// configured mode uses numbering. A counter failure consumes nothing.
    pub fn prepare(
        &self,
        kind: &MediaKind,
        caption: Option<&str>,
    ) -> Result<Option<Prepared>, SequenceError> {
        self.metrics.record_message(kind.label());

        match self.classify(kind) {
            Route::Skip => {
                self.metrics.record_skipped();
                tracing::debug!(kind = kind.label(), "No routing rule, skipping");
                Ok(None)
            }
            Route::Clear => {
                self.metrics.record_cleared();
                Ok(Some(Prepared {
                    sequence: None,
                    result: TransformResult {
                        text: String::new(),
                    },
                }))
            }
            Route::Transform => {
                let raw = caption.unwrap_or_default();
                let sequence = if self.transformer.consumes_sequence() {
                    Some(self.next_sequence()?)
                } else {
                    None
                };

                let result = match sequence {
                    Some(n) => self.transformer.transform_sequence(raw, n),
                    None => self.transformer.transform(raw, ""),
                };
                self.metrics.record_transformed();

                Ok(Some(Prepared { sequence, result }))
            }
        }
    }

    fn next_sequence(&self) -> Result<u64, SequenceError> {
        match self.counter.next() {
            Ok(n) => {
                self.metrics.record_sequence_issued();
                Ok(n)
            }
            Err(e) => {
                self.metrics.record_sequence_error();
                tracing::error!(error = %e, "Failed to draw sequence number");
                Err(e)
            }
        }
    }

    /// Prepares and applies the caption for one message.
    ///
    /// Only counter failures are returned as errors. Transport failures end
    /// up in [`ApplyOutcome`].
    pub async fn handle<T: CaptionTransport>(
        &self,
        message: &MediaMessage,
        transport: &T,
    ) -> Result<DispatchOutcome, SequenceError> {
        let prepared = match self.prepare(&message.kind, message.caption.as_deref())? {
            Some(p) => p,
            None => return Ok(DispatchOutcome::Skipped),
        };

        let outcome = self.apply(message, &prepared.result.text, transport).await;

        Ok(DispatchOutcome::Applied {
            sequence: prepared.sequence,
            text: prepared.result.into_text(),
            outcome,
        })
    }

    /// Edits the caption in place, re-sending the media once if the edit
    /// fails.
    pub async fn apply<T: CaptionTransport>(
        &self,
        message: &MediaMessage,
        caption: &str,
        transport: &T,
    ) -> ApplyOutcome {
        let start = Instant::now();

        let edit_error = match transport.edit_caption(message, caption).await {
            Ok(()) => {
                self.metrics.record_edit(elapsed_ms(start));
                tracing::debug!(
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    "Caption edited"
                );
                return ApplyOutcome::Edited;
            }
            Err(e) => e,
        };

        tracing::warn!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            error = %edit_error,
            "Caption edit failed, resending media"
        );

        match transport.resend_media(message, caption).await {
            Ok(()) => {
                self.metrics.record_resend(elapsed_ms(start));
                ApplyOutcome::Resent { edit_error }
            }
            Err(resend_error) => {
                self.metrics.record_apply_failure(elapsed_ms(start));
                tracing::error!(
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    edit_error = %edit_error,
                    resend_error = %resend_error,
                    "Failed to apply caption"
                );
                ApplyOutcome::Failed {
                    edit_error,
                    resend_error,
                }
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
