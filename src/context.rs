//! Backend-agnostic trace context values.

use std::str::FromStr;

use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
use thiserror::Error;

/// A point-in-time trace identity, decoupled from any live span.
///
/// A `TraceContext` captures where a unit of work sits within a distributed
/// trace: the trace it belongs to, the span that produced it, whether the
/// trace is being recorded, any vendor-specific trace state, and whether the
/// identity was received from another process.
///
/// Values are immutable once constructed. They are produced by
/// [`trace_context`], by [`from_span_context`], or directly by callers that
/// need to force a specific identity (for example when bridging from a
/// transport that is not W3C trace-context aware), and consumed by
/// [`set_trace_context`].
///
/// [`trace_context`]: crate::trace_context
/// [`from_span_context`]: TraceContext::from_span_context
/// [`set_trace_context`]: crate::set_trace_context
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: TraceId,
    parent_id: SpanId,
    flags: u8,
    state: TraceState,
    remote: bool,
}

impl TraceContext {
    /// Bit 0 of [`flags`](TraceContext::flags): the trace is being recorded.
    pub const SAMPLED: u8 = 0x01;

    /// Construct a context from already-typed identifiers.
    pub fn new(
        trace_id: TraceId,
        parent_id: SpanId,
        flags: u8,
        state: TraceState,
        remote: bool,
    ) -> Self {
        TraceContext {
            trace_id,
            parent_id,
            flags,
            state,
            remote,
        }
    }

    /// Construct a context from hexadecimal identifiers.
    ///
    /// `trace_id` and `parent_id` are parsed as lowercase hexadecimal, as
    /// they appear in a `traceparent` header; `state` is an optional
    /// `tracestate` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use traces_opentelemetry::TraceContext;
    ///
    /// let context = TraceContext::from_hex(
    ///     "4bf92f3577b34da6a3ce929d0e0e4736",
    ///     "00f067aa0ba902b7",
    ///     TraceContext::SAMPLED,
    ///     None,
    ///     true,
    /// );
    /// assert!(context.is_ok());
    /// ```
    pub fn from_hex(
        trace_id: &str,
        parent_id: &str,
        flags: u8,
        state: Option<&str>,
        remote: bool,
    ) -> Result<Self, TraceContextError> {
        let trace_id = TraceId::from_hex(trace_id)
            .map_err(|_| TraceContextError::TraceId(trace_id.to_owned()))?;
        let parent_id = SpanId::from_hex(parent_id)
            .map_err(|_| TraceContextError::SpanId(parent_id.to_owned()))?;
        let state = match state {
            Some(header) => TraceState::from_str(header)
                .map_err(|_| TraceContextError::State(header.to_owned()))?,
            None => TraceState::NONE,
        };

        Ok(TraceContext::new(trace_id, parent_id, flags, state, remote))
    }

    /// Describe the given backend span context.
    ///
    /// `flags` carries only the sampled bit, derived from the span
    /// context's sampling decision.
    pub fn from_span_context(span_context: &SpanContext) -> Self {
        let flags = if span_context.is_sampled() {
            TraceContext::SAMPLED
        } else {
            0
        };

        TraceContext {
            trace_id: span_context.trace_id(),
            parent_id: span_context.span_id(),
            flags,
            state: span_context.trace_state().clone(),
            remote: span_context.is_remote(),
        }
    }

    /// The trace this context belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The span that produced this context.
    pub fn parent_id(&self) -> SpanId {
        self.parent_id
    }

    /// The raw trace flags byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Vendor-specific trace state, passed through uninterpreted.
    pub fn state(&self) -> &TraceState {
        &self.state
    }

    /// Whether this context was received from another process.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Whether the trace is being recorded.
    pub fn is_sampled(&self) -> bool {
        self.flags & TraceContext::SAMPLED != 0
    }

    /// Rebuild the backend-native span context.
    ///
    /// The flags byte is carried over verbatim, so reserved bits set at
    /// construction survive a round-trip through the backend.
    pub fn to_span_context(&self) -> SpanContext {
        SpanContext::new(
            self.trace_id,
            self.parent_id,
            TraceFlags::new(self.flags),
            self.remote,
            self.state.clone(),
        )
    }
}

impl From<&SpanContext> for TraceContext {
    fn from(span_context: &SpanContext) -> Self {
        TraceContext::from_span_context(span_context)
    }
}

impl From<&TraceContext> for SpanContext {
    fn from(context: &TraceContext) -> Self {
        context.to_span_context()
    }
}

/// Error returned when constructing a [`TraceContext`] from raw input.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceContextError {
    /// The trace id is not valid hexadecimal.
    #[error("{0:?} is not a valid hexadecimal trace id")]
    TraceId(String),

    /// The span id is not valid hexadecimal.
    #[error("{0:?} is not a valid hexadecimal span id")]
    SpanId(String),

    /// The trace state is not a valid `tracestate` header.
    #[error("{0:?} is not a valid tracestate header")]
    State(String),
}
