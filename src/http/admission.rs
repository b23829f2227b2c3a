use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use crate::security::{Admission, AdmissionDecision};

/// Admission middleware state.
#[derive(Clone)]
pub struct AdmissionGate {
    pub admission: Admission,
    /// Take the client address from the first `X-Forwarded-For` hop.
    pub trust_forwarded_for: bool,
}

/// Axum middleware rejecting requests from blocked source addresses.
///
/// Blocked addresses get 403. When the store cannot answer, the failure
/// policy decides between passing the request and answering 503.
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = match source_ip(&request, gate.trust_forwarded_for) {
        Some(ip) => gate.admission.check(ip).await,
        None => {
            let decision = gate
                .admission
                .unavailable("unknown", &"source address not available");
            crate::metrics::record_admission(decision.outcome());
            decision
        }
    };

    match decision {
        AdmissionDecision::Allow | AdmissionDecision::Unavailable { allowed: true } => {
            next.run(request).await
        }
        AdmissionDecision::Deny => ApiError::Forbidden {
            message: "access denied".to_string(),
        }
        .into_response(),
        AdmissionDecision::Unavailable { allowed: false } => ApiError::ServiceUnavailable {
            message: "access check unavailable".to_string(),
        }
        .into_response(),
    }
}

/// Resolve the client address of a request.
fn source_ip(request: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for
        && let Some(ip) = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
