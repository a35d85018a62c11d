use actix_web::{
    dev::Payload, error::ResponseError, http::StatusCode, web::Bytes, FromRequest, HttpRequest,
};
use futures::future::{FutureExt, LocalBoxFuture};

use crate::event::{DecodeError, Event, EVENT_HEADER};

/// Extracts a decoded GitLab event from the request body.
#[derive(Debug, Clone)]
pub struct Webhook(pub Event);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("`X-Gitlab-Event` header is not valid ASCII")]
    InvalidHeader,
    #[error("failed reading request data: {0}")]
    ActixError(#[from] actix_web::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidHeader => StatusCode::BAD_REQUEST,
            WebhookError::ActixError(err) => err.as_response_error().status_code(),
            WebhookError::Decode(DecodeError::Json(_)) => StatusCode::BAD_REQUEST,
            WebhookError::Decode(DecodeError::MissingKind) => StatusCode::BAD_REQUEST,
            // Acknowledged so the host doesn't count them as delivery failures.
            WebhookError::Decode(DecodeError::Unsupported(_)) => StatusCode::OK,
        }
    }
}

#[derive(Debug, Default)]
pub struct WebhookConfig {
    pub strict: bool,
}

fn decode(req: &HttpRequest, bytes: &[u8], strict: bool) -> Result<Event, WebhookError> {
    let header = match req.headers().get(EVENT_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| WebhookError::InvalidHeader)?),
        None => None,
    };
    tracing::info!(
        event = header.unwrap_or("<none>"),
        "request data: {}",
        String::from_utf8_lossy(bytes)
    );

    let event = Event::decode(header, bytes, strict)?;
    tracing::info!(kind = %event.kind(), "hook info: {:?}", event);
    Ok(event)
}

impl FromRequest for Webhook {
    type Error = WebhookError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;
    type Config = WebhookConfig;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(Bytes::from_request(&req, payload).map(
            move |bytes| -> Result<Self, Self::Error> {
                let strict = req
                    .app_data::<Self::Config>()
                    .map_or(false, |config| config.strict);

                let bytes = bytes?;
                decode(&req, &bytes, strict).map(Self).map_err(|err| {
                    tracing::warn!("Failed to parse request: {}", err);
                    err
                })
            },
        ))
    }
}
