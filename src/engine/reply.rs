//! # engine::reply
//!
//! **Reply Composer**: one text message per event, no retry.

use anyhow::Context;

use crate::line::Messenger;
use crate::models::TextMessage;

pub async fn send_text(
    messenger: &dyn Messenger,
    reply_token: &str,
    text: &str,
) -> anyhow::Result<()> {
    messenger
        .reply(reply_token, vec![TextMessage::new(text)])
        .await
        .context("LINE reply failed")
}
