use std::sync::Arc;

use actix::Addr;
use actix_web::{http::StatusCode, web, HttpResponse};

use crate::{
    config::SharedSettings,
    event::Event,
    http::Webhook,
    notifier::{Notification, Notifier},
};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to serialize decoded event: {0}")]
    SerializeError(#[from] serde_json::Error),
}

impl actix_web::ResponseError for HookError {
    fn status_code(&self) -> StatusCode {
        match self {
            HookError::SerializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub async fn webhook(
    Webhook(event): Webhook,
    settings: web::Data<SharedSettings>,
    notifier: web::Data<Addr<Notifier>>,
) -> Result<HttpResponse, HookError> {
    let settings = settings.current();

    if let Event::MergeRequest(hook) = &event {
        if settings.notify {
            match &settings.hook_address {
                Some(destination) => notifier.do_send(Notification {
                    event: Arc::new(hook.clone()),
                    destination: destination.clone(),
                }),
                None => tracing::warn!("Notifications are enabled, but `hook_address` is not set"),
            }
        }
    }

    let body = serde_json::to_vec(&event)?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}
