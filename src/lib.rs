//! An [OpenTelemetry] backend for a generic, backend-agnostic tracing
//! surface.
//!
//! This crate is a thin adapter: it maps a small set of tracing operations
//! (start/finish spans, read and install trace context, propagate context
//! across process boundaries) onto the OpenTelemetry trace API. Span
//! creation, sampling, and export remain entirely with the OpenTelemetry
//! SDK configured by the application; context serialization uses the
//! [W3C trace-context] `traceparent`/`tracestate` headers.
//!
//! Spans are created through the globally registered tracer provider, so
//! the adapter picks up whatever pipeline the application installs via
//! [`opentelemetry::global::set_tracer_provider`].
//!
//! # Getting Started
//!
//! ```
//! use std::collections::HashMap;
//!
//! use opentelemetry::KeyValue;
//! use traces_opentelemetry::{extract, inject, trace, with_context};
//!
//! // Wrap a unit of work in a span:
//! let answer = trace("solve", [KeyValue::new("difficulty", "hard")], |_span| 42);
//! assert_eq!(answer, 42);
//!
//! // Propagate the trace across a process boundary:
//! let mut headers = HashMap::new();
//! trace("outbound", [], |_span| {
//!     inject(&mut headers);
//! });
//!
//! // ... and continue it on the receiving side:
//! let remote = extract(&headers);
//! with_context(remote, || {
//!     trace("inbound", [], |_span| {
//!         // spans started here attach to the remote trace
//!     });
//! });
//! ```
//!
//! # Features
//!
//! - `internal-logs` (default): diagnostic logging of degraded operations
//!   through the OpenTelemetry internal-log macros.
//!
//! [OpenTelemetry]: https://opentelemetry.io
//! [W3C trace-context]: https://www.w3.org/TR/trace-context/
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(test, deny(warnings))]

mod context;
mod interface;
mod propagation;

pub use context::{TraceContext, TraceContextError};
pub use interface::{
    attach_context, current_context, is_active, set_trace_context, trace, trace_context,
    try_trace, with_context,
};
pub use propagation::{extract, extract_with_context, inject, inject_context};

// Backend handle types that appear in this crate's signatures.
pub use opentelemetry::propagation::{Extractor, Injector};
pub use opentelemetry::trace::SpanRef;
pub use opentelemetry::{Context, ContextGuard, KeyValue};
