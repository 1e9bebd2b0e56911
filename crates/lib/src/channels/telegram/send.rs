//! Outbound delivery: one Bot API call per part, text first, then attachments in order.

use crate::channels::channel::Channel;
use crate::channels::error::{ChannelError, Result};
use crate::channels::outbound::{Attachment, OutboundMsg};
use crate::channels::status::{ChannelLog, MsgStatus};
use crate::transport::HttpExchange;

use super::api::{ApiEnvelope, TelegramApi};
use super::auth_token;
use super::keyboard::{self, ReplyMarkup};

const SEND_LOG_DESCRIPTION: &str = "Message Sent";

/// Bot API method and media field for an attachment's top-level media type.
pub fn media_method(attachment: &Attachment) -> Option<(&'static str, &'static str)> {
    match attachment.media_category() {
        "image" => Some(("sendPhoto", "photo")),
        "video" => Some(("sendVideo", "video")),
        "audio" => Some(("sendAudio", "audio")),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    api: TelegramApi,
}

impl Dispatcher {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }

    /// Send every part of `msg`, recording each outcome in the returned status.
    ///
    /// Only missing credentials fail the call; a failed part marks the status
    /// errored and the remaining parts are still attempted.
    pub async fn dispatch(&self, channel: &Channel, msg: &OutboundMsg) -> Result<MsgStatus> {
        let token = auth_token(channel)?;
        let mut status = MsgStatus::for_msg(&channel.uuid, msg.uuid);

        // text rides along as a caption only when there is exactly one attachment
        let caption = if msg.attachments.len() == 1 {
            msg.text.as_str()
        } else {
            ""
        };

        // the keyboard goes out with the first part actually sent
        let mut markup = Some(keyboard::build(&msg.quick_replies));

        if !msg.text.is_empty() && caption.is_empty() {
            let reply_markup = markup.take().unwrap_or_else(ReplyMarkup::remove);
            let form = [("chat_id", msg.to.as_str()), ("text", msg.text.as_str())];
            let (log, outcome) = self
                .send_part(token, channel, msg, "sendMessage", &form, &reply_markup)
                .await;
            status.record(log, outcome);
        }

        for attachment in &msg.attachments {
            let Some((method, field)) = media_method(attachment) else {
                log::warn!(
                    "telegram: unknown media type {} for msg {}, skipping part",
                    attachment.media_type,
                    msg.uuid
                );
                let log = ChannelLog::new(
                    format!("Unknown media type: {}", attachment.media_type),
                    &channel.uuid,
                    Some(msg.uuid),
                );
                status.record(
                    log,
                    Err(ChannelError::UnsupportedMediaType(attachment.media_type.clone())),
                );
                continue;
            };

            let reply_markup = markup.take().unwrap_or_else(ReplyMarkup::remove);
            let form = [
                ("chat_id", msg.to.as_str()),
                (field, attachment.url.as_str()),
                ("caption", caption),
            ];
            let (log, outcome) = self
                .send_part(token, channel, msg, method, &form, &reply_markup)
                .await;
            status.record(log, outcome);
        }

        if status.parts() == 0 {
            log::warn!("telegram: msg {} has no text or attachments, nothing sent", msg.uuid);
        }
        log::debug!(
            "telegram: msg {} dispatched, {} part(s), {} failed, status {:?}",
            msg.uuid,
            status.parts(),
            status.failures(),
            status.status
        );
        Ok(status)
    }

    async fn send_part(
        &self,
        token: &str,
        channel: &Channel,
        msg: &OutboundMsg,
        method: &str,
        form: &[(&str, &str)],
        reply_markup: &ReplyMarkup,
    ) -> (ChannelLog, Result<String>) {
        let markup_json = reply_markup.to_json();
        let mut fields = form.to_vec();
        fields.push(("reply_markup", markup_json.as_str()));

        log::debug!("telegram: {} for msg {}", method, msg.uuid);
        let exchange = self.api.call(token, method, &fields).await;
        let log = ChannelLog::from_exchange(SEND_LOG_DESCRIPTION, &channel.uuid, Some(msg.uuid), &exchange)
            .redacted(token);
        let outcome = sent_message_id(exchange);
        if let Err(e) = &outcome {
            log::warn!("telegram: {} failed for msg {}: {}", method, msg.uuid, e);
        }
        (log, outcome)
    }
}

/// Provider message id from a send response.
fn sent_message_id(exchange: HttpExchange) -> Result<String> {
    let response = exchange.response?;
    let envelope = ApiEnvelope::parse(&response.body);
    if !envelope.is_ok() {
        let message = match &envelope.description {
            Some(d) => format!("response not 'ok': {}", d),
            None => "response not 'ok'".to_string(),
        };
        return Err(ChannelError::provider(message, response.body));
    }
    envelope
        .result_i64("message_id")
        .map(|id| id.to_string())
        .ok_or_else(|| ChannelError::provider("no 'result.message_id' in response", response.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/jpeg", Some(("sendPhoto", "photo")))]
    #[case("image", Some(("sendPhoto", "photo")))]
    #[case("video/mp4", Some(("sendVideo", "video")))]
    #[case("audio/mp3", Some(("sendAudio", "audio")))]
    #[case("application/pdf", None)]
    #[case("", None)]
    fn classifies_media_by_prefix(#[case] media_type: &str, #[case] expected: Option<(&str, &str)>) {
        let attachment = Attachment::new(media_type, "https://foo.bar/x");
        assert_eq!(media_method(&attachment), expected);
    }
}
