//! Credential distribution to the trusted front-end.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::credentials::{CredentialSet, Secret};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::ClientIp;

/// Wire shape of `/api/keys`. Unset credentials are empty strings.
#[derive(Debug, Serialize)]
pub struct ProviderKeys<'a> {
    pub groq: &'a str,
    pub perplexity: &'a str,
    pub gemini: &'a str,
}

impl<'a> From<&'a CredentialSet> for ProviderKeys<'a> {
    fn from(creds: &'a CredentialSet) -> Self {
        Self {
            groq: expose(&creds.groq),
            perplexity: expose(&creds.perplexity),
            gemini: expose(&creds.gemini),
        }
    }
}

fn expose(secret: &Option<Secret>) -> &str {
    secret.as_ref().map(Secret::expose).unwrap_or_default()
}

fn issue_keys(creds: &CredentialSet) -> Result<Value, serde_json::Error> {
    serde_json::to_value(ProviderKeys::from(creds))
}

pub async fn get_keys(
    State(state): State<AppState>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    headers: HeaderMap,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    if !state.origins.permits(origin) {
        tracing::warn!(
            client = %client,
            origin = origin.unwrap_or("<none>"),
            "Rejected key request from unauthorized origin"
        );
        metrics::record_origin_rejected();
        return ApiError::UnauthorizedOrigin.into_response();
    }

    match issue_keys(&state.credentials) {
        Ok(body) => {
            let presence = state.credentials.presence();
            tracing::info!(
                audit = true,
                client = %client,
                groq = presence.groq,
                perplexity = presence.perplexity,
                gemini = presence.gemini,
                "Provider keys issued"
            );
            metrics::record_keys_issued();
            Json(body).into_response()
        }
        Err(e) => {
            tracing::error!(client = %client, error = %e, "Failed to assemble provider keys");
            ApiError::Internal(e.to_string()).into_response()
        }
    }
}
