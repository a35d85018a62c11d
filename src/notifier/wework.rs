use std::sync::Arc;

use askama::Template;
use color_eyre::eyre::{self, WrapErr as _};
use secstr::SecUtf8;

use crate::gitlab::MergeRequestEvent;

pub const NO_ASSIGNEE: &str = "no assignee";

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum MsgType {
    Text,
}

#[derive(Debug, serde::Serialize)]
struct Content<'a> {
    content: &'a str,
}

/// Group robot message, `{"msgtype": "text", "text": {"content": ...}}`.
#[derive(Debug, serde::Serialize)]
pub struct Message<'a> {
    msgtype: MsgType,
    text: Content<'a>,
}

impl<'a> Message<'a> {
    pub fn text(content: &'a str) -> Self {
        Self {
            msgtype: MsgType::Text,
            text: Content { content },
        }
    }
}

#[derive(Debug, Template)]
#[template(path = "wework-message.txt", escape = "none")]
struct SummaryTemplate<'a> {
    event: &'a MergeRequestEvent,
    assignee: &'a str,
}

pub fn summary(event: &MergeRequestEvent) -> askama::Result<String> {
    let assignee = &event.object_attributes.assignee;
    let assignee = if assignee.is_unset() {
        NO_ASSIGNEE
    } else {
        assignee.name.as_str()
    };
    SummaryTemplate { event, assignee }.render()
}

#[derive(Clone)]
pub struct Wework {
    http: Arc<awc::Client>,
}

impl Wework {
    pub fn new(http: Arc<awc::Client>) -> Self {
        Self { http }
    }

    async fn try_notify(&self, event: &MergeRequestEvent, url: &SecUtf8) -> eyre::Result<()> {
        let text = summary(event).wrap_err("Failed to render message template")?;
        let body =
            serde_json::to_vec(&Message::text(&text)).wrap_err("Failed to serialize message")?;

        let mut resp = self
            .http
            .post(url.unsecure())
            .content_type("application/json")
            .send_body(body)
            .await
            .map_err(|err| eyre::eyre!("Failed to send request to chat endpoint: {}", err))?;

        let status = resp.status();
        if !status.is_success() {
            eyre::bail!(
                "Chat endpoint returned error: {}\n{}",
                status,
                String::from_utf8_lossy(
                    resp.body()
                        .await
                        .wrap_err("Failed to fetch chat endpoint response body")?
                        .as_ref()
                )
            );
        }

        Ok(())
    }

    pub async fn notify(self: Arc<Self>, event: Arc<MergeRequestEvent>, url: SecUtf8) {
        match self.try_notify(&event, &url).await {
            Ok(()) => tracing::info!(
                repo = event.repository.name.as_str(),
                "Sent merge request notification"
            ),
            Err(err) => tracing::error!("Failed sending chat notification: {:?}", err),
        }
    }
}
