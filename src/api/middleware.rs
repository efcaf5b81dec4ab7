//! Runs the session gate in front of every non-excluded request.

use axum::{
    Router,
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use std::{fmt::Write, sync::Arc};
use tracing::{debug, warn};

use crate::gate::{GateAction, RequestContext, SessionGate};

/// Wrap `router` with the session gate.
pub fn protect<S>(router: Router<S>, gate: Arc<SessionGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, session_gate))
}

/// axum middleware: decide, then either continue or answer with `307`.
pub async fn session_gate(
    State(gate): State<Arc<SessionGate>>,
    request: Request,
    next: Next,
) -> Response {
    if gate.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let context = RequestContext::from_parts(
        request.uri().path(),
        request.uri().query(),
        request.headers(),
        gate.config().session_cookie(),
    );

    match gate.decide(&context) {
        GateAction::Continue => next.run(request).await,
        GateAction::RedirectTo(target) => {
            debug!(path = %context.path, "gate redirect");
            let location = match encode_location(&target) {
                Some(location) => location,
                None => {
                    warn!(
                        path = %context.path,
                        "redirect target is not a valid Location, using landing page"
                    );
                    encode_location(gate.config().default_landing())
                        .unwrap_or_else(|| "/".to_string())
                }
            };
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Percent-encode non-ASCII bytes of `target`. `None` when the result is still
/// not a valid header value.
fn encode_location(target: &str) -> Option<String> {
    let mut encoded = String::with_capacity(target.len());
    for byte in target.bytes() {
        if byte.is_ascii() {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    HeaderValue::from_str(&encoded).is_ok().then_some(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_encodes_non_ascii() {
        assert_eq!(
            encode_location("/client/projets-\u{e9}t\u{e9}").as_deref(),
            Some("/client/projets-%C3%A9t%C3%A9")
        );
        assert_eq!(
            encode_location("/client/projects?tab=2").as_deref(),
            Some("/client/projects?tab=2")
        );
    }

    #[test]
    fn location_rejects_control_characters() {
        assert_eq!(encode_location("/a\r\nSet-Cookie:x=1"), None);
    }
}
