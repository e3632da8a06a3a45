//! Span scopes and current-context management.

use std::borrow::Cow;
use std::sync::OnceLock;
use std::thread;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{SpanRef, Status, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{Context, ContextGuard, InstrumentationScope, KeyValue};

use crate::context::TraceContext;

fn tracer() -> BoxedTracer {
    static SCOPE: OnceLock<InstrumentationScope> = OnceLock::new();
    let scope = SCOPE.get_or_init(|| {
        InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
            .build()
    });

    global::tracer_provider().tracer_with_scope(scope.clone())
}

/// Ends the scope's span when dropped, marking it failed if the stack is
/// unwinding.
struct FinishOnDrop<'a> {
    cx: &'a Context,
}

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        let span = self.cx.span();
        if thread::panicking() {
            span.set_status(Status::error("unhandled panic"));
        }
        span.end();
    }
}

fn start_scope<N, A>(name: N, attributes: A) -> Context
where
    N: Into<Cow<'static, str>>,
    A: IntoIterator<Item = KeyValue>,
{
    let tracer = tracer();
    let span = tracer
        .span_builder(name)
        .with_attributes(attributes)
        .start(&tracer);

    Context::current_with_span(span)
}

/// Run `body` within a new span named `name`.
///
/// The span is started before `body` runs, made current for its duration,
/// and ended exactly once on every exit path. If `body` panics, the span is
/// marked failed before it is ended and the panic continues unchanged.
///
/// `body` receives a handle to the live span, through which it can rename
/// the span, attach attributes, or record events while the scope is open;
/// bodies that don't need it take `|_span|`.
///
/// Returns whatever `body` returns. For fallible bodies whose errors should
/// be recorded on the span, use [`try_trace`].
///
/// # Examples
///
/// ```
/// use opentelemetry::KeyValue;
/// use traces_opentelemetry::trace;
///
/// let result = trace("authenticate", [KeyValue::new("user.id", 42)], |_span| {
///     // ... perform the work ...
///     "authenticated"
/// });
/// assert_eq!(result, "authenticated");
/// ```
pub fn trace<N, A, F, R>(name: N, attributes: A, body: F) -> R
where
    N: Into<Cow<'static, str>>,
    A: IntoIterator<Item = KeyValue>,
    F: FnOnce(SpanRef<'_>) -> R,
{
    let cx = start_scope(name, attributes);
    let _attached = cx.clone().attach();
    let _finish = FinishOnDrop { cx: &cx };

    body(cx.span())
}

/// Run a fallible `body` within a new span named `name`.
///
/// Behaves like [`trace`], and additionally records `Err` results on the
/// span: the error is attached as an exception event and the span status is
/// set to failed before the span is ended. The result is returned to the
/// caller unchanged either way.
pub fn try_trace<N, A, F, T, E>(name: N, attributes: A, body: F) -> Result<T, E>
where
    N: Into<Cow<'static, str>>,
    A: IntoIterator<Item = KeyValue>,
    F: FnOnce(SpanRef<'_>) -> Result<T, E>,
    E: std::error::Error,
{
    let cx = start_scope(name, attributes);
    let _attached = cx.clone().attach();
    let _finish = FinishOnDrop { cx: &cx };

    let result = body(cx.span());
    if let Err(error) = &result {
        let span = cx.span();
        span.record_error(error);
        span.set_status(Status::error(error.to_string()));
    }

    result
}

/// Describe the currently active span as a [`TraceContext`].
///
/// Returns `None` when the caller is not inside any span scope. To describe
/// a span context obtained elsewhere, use
/// [`TraceContext::from_span_context`].
pub fn trace_context() -> Option<TraceContext> {
    Context::map_current(|cx| {
        let span = cx.span();
        let span_context = span.span_context();
        span_context
            .is_valid()
            .then(|| TraceContext::from_span_context(span_context))
    })
}

/// Install `context` as the current trace context.
///
/// The context is wrapped as a non-recording span, so no new span is
/// started; spans created while the returned guard is live attach to
/// `context.parent_id()` as their parent. Dropping the guard restores the
/// previously current context, also when unwinding.
///
/// # Examples
///
/// ```
/// use traces_opentelemetry::{set_trace_context, trace, TraceContext};
///
/// let context = TraceContext::from_hex(
///     "4bf92f3577b34da6a3ce929d0e0e4736",
///     "00f067aa0ba902b7",
///     TraceContext::SAMPLED,
///     None,
///     true,
/// )
/// .unwrap();
///
/// let _guard = set_trace_context(&context);
/// trace("continue_remote_work", [], |_span| {
///     // this span is a child of 00f067aa0ba902b7
/// });
/// ```
#[must_use = "dropping the guard restores the previous trace context"]
pub fn set_trace_context(context: &TraceContext) -> ContextGuard {
    Context::map_current(|cx| cx.with_remote_span_context(context.to_span_context())).attach()
}

/// Whether a valid span is currently active on this execution path.
pub fn is_active() -> bool {
    Context::map_current(|cx| cx.span().span_context().is_valid())
}

/// A snapshot of the backend-native context that is currently active.
///
/// The returned [`Context`] is opaque; it is meant to be restored later
/// with [`with_context`] or [`attach_context`], or handed to a concurrent
/// execution path so it can inherit this one's trace position.
pub fn current_context() -> Context {
    Context::current()
}

/// Run `body` with `context` as the current context.
///
/// The previously current context is restored when `body` returns, and
/// also when it unwinds. Returns whatever `body` returns.
pub fn with_context<F, R>(context: Context, body: F) -> R
where
    F: FnOnce() -> R,
{
    let _attached = context.attach();
    body()
}

/// Make `context` current until the returned token is dropped.
///
/// This is the unscoped form of [`with_context`]: the caller owns the
/// token and is responsible for dropping it to restore the previous
/// context. Tokens must be dropped in the reverse of their attach order.
#[must_use = "dropping the token restores the previous context"]
pub fn attach_context(context: Context) -> ContextGuard {
    context.attach()
}
