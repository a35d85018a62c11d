mod wework;

use std::{fmt, sync::Arc};

use actix::prelude::*;
use secstr::SecUtf8;

use crate::gitlab::MergeRequestEvent;

/// Request to post a summary of `event` to the chat robot at `destination`.
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct Notification {
    pub event: Arc<MergeRequestEvent>,
    pub destination: SecUtf8,
}

#[derive(Clone)]
pub struct Notifier {
    wework: Arc<wework::Wework>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish()
    }
}

impl Notifier {
    pub fn new(http: awc::Client) -> Self {
        Self {
            wework: Arc::new(wework::Wework::new(Arc::new(http))),
        }
    }
}

impl Actor for Notifier {
    type Context = Context<Self>;
}

impl Handler<Notification> for Notifier {
    type Result = <Notification as Message>::Result;

    fn handle(&mut self, msg: Notification, ctx: &mut Self::Context) -> Self::Result {
        let Notification { event, destination } = msg;
        ctx.spawn(self.wework.clone().notify(event, destination).into_actor(self));
    }
}
