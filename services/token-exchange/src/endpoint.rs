//! Token endpoint glue: form body in, OAuth JSON body out.

use crate::error::{ErrorCode, TokenErrorResponse};
use crate::grant::{ExchangeOutcome, GrantRequest, TokenExchangeHandler};
use crate::issuer::{TokenIssuer, TokenResponse};
use serde::Serialize;
use tracing::{error, warn};

/// Body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenEndpointResponse {
    /// Token issued
    Success(TokenResponse),
    /// Request rejected
    Error(TokenErrorResponse),
}

impl TokenEndpointResponse {
    /// HTTP status code for this body
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::Error(err) => err.http_status(),
        }
    }
}

/// Process one token exchange request body end to end.
pub async fn process_token_request(
    handler: &TokenExchangeHandler,
    issuer: &dyn TokenIssuer,
    body: &[u8],
) -> TokenEndpointResponse {
    let mut request = match GrantRequest::from_form(body) {
        Ok(request) => request,
        Err(err) => {
            warn!(kind = err.kind(), "Token request rejected before exchange");
            return TokenEndpointResponse::Error(TokenErrorResponse::from_error(&err));
        }
    };

    match handler.handle_and_apply(&mut request).await {
        ExchangeOutcome::Success(grant) => match issuer.issue(&grant).await {
            Ok(response) => TokenEndpointResponse::Success(response),
            Err(err) => {
                error!(error = %err, client_id = %request.client_id, "Token issuance failed");
                TokenEndpointResponse::Error(TokenErrorResponse::new(ErrorCode::ServerError, None))
            }
        },
        ExchangeOutcome::Failure(failure) => TokenEndpointResponse::Error(failure.to_response()),
    }
}
