//! Carrier injection and extraction in W3C trace-context format.

use opentelemetry::otel_debug;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;

/// Serialize the current trace context into `injector`.
///
/// Writes `traceparent` and `tracestate` entries to the carrier. Returns
/// `false` without touching the carrier when there is no valid span context
/// to propagate; entries unrelated to trace propagation are never removed
/// or altered.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// traces_opentelemetry::trace("outbound_request", [], |_span| {
///     traces_opentelemetry::inject(&mut headers);
/// });
/// ```
pub fn inject(injector: &mut dyn Injector) -> bool {
    Context::map_current(|cx| inject_context(cx, injector))
}

/// Serialize the span context carried by `cx` into `injector`.
///
/// See [`inject`] for the carrier contract.
pub fn inject_context(cx: &Context, injector: &mut dyn Injector) -> bool {
    if !cx.span().span_context().is_valid() {
        otel_debug!(name: "Inject.NoValidSpanContext");
        return false;
    }

    TraceContextPropagator::new().inject_context(cx, injector);
    true
}

/// Parse propagation headers into a backend-native context.
///
/// On well-formed input the returned context carries the remote span
/// context and can be activated with [`with_context`] or
/// [`attach_context`]. Malformed or missing propagation headers are not an
/// error: the caller's current context is returned unchanged.
///
/// [`with_context`]: crate::with_context
/// [`attach_context`]: crate::attach_context
pub fn extract(extractor: &dyn Extractor) -> Context {
    Context::map_current(|cx| extract_with_context(cx, extractor))
}

/// Parse propagation headers, falling back to `cx` on malformed input.
pub fn extract_with_context(cx: &Context, extractor: &dyn Extractor) -> Context {
    TraceContextPropagator::new().extract_with_context(cx, extractor)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

    use super::*;

    fn remote_context() -> Context {
        Context::new().with_remote_span_context(SpanContext::new(
            TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736),
            SpanId::from(0x00f0_67aa_0ba9_02b7),
            TraceFlags::SAMPLED,
            true,
            TraceState::NONE,
        ))
    }

    #[test]
    fn inject_writes_traceparent_for_a_valid_context() {
        let mut headers = HashMap::new();

        assert!(inject_context(&remote_context(), &mut headers));
        assert_eq!(
            headers.get("traceparent").map(String::as_str),
            Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );
    }

    #[test]
    fn inject_leaves_the_carrier_untouched_without_a_span() {
        let mut headers = HashMap::from([("existing".to_string(), "value".to_string())]);

        assert!(!inject_context(&Context::new(), &mut headers));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("existing").map(String::as_str), Some("value"));
    }

    #[test]
    fn extract_recovers_the_remote_span_context() {
        let headers = HashMap::from([(
            "traceparent".to_string(),
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_string(),
        )]);

        let cx = extract(&headers);
        let span = cx.span();
        let span_context = span.span_context();
        assert!(span_context.is_valid());
        assert!(span_context.is_remote());
        assert_eq!(
            span_context.trace_id(),
            TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736)
        );
    }

    #[test]
    fn extract_degrades_to_the_given_context_on_malformed_input() {
        let headers = HashMap::from([("traceparent".to_string(), "invalid".to_string())]);
        let ambient = remote_context();

        let cx = extract_with_context(&ambient, &headers);
        assert_eq!(cx.span().span_context(), ambient.span().span_context());
    }

    #[test]
    fn extract_degrades_to_the_given_context_without_headers() {
        let headers: HashMap<String, String> = HashMap::new();
        let ambient = remote_context();

        let cx = extract_with_context(&ambient, &headers);
        assert_eq!(cx.span().span_context(), ambient.span().span_context());
    }
}
