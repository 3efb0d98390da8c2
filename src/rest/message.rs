use reqwest::Method;
use serde_json::json;

use crate::builders::SendMessage;
use crate::error::{Error, Result, StatusChecks};
use crate::model::{ChannelId, Message, MessageId, ReactionEmoji, User, UserId};
use crate::schema::encode_query;

use super::Discord;

/// Argument to `get_messages` to specify the desired message retrieval.
pub enum GetMessages {
    /// Get the N most recent messages.
    MostRecent,
    /// Get the first N messages before the specified message.
    Before(MessageId),
    /// Get the first N messages after the specified message.
    After(MessageId),
    /// Get N/2 messages before, N/2 messages after, and the specified message.
    Around(MessageId),
}

/// Discord REST API methods for sending, editing, pinning and otherwise
/// interacting with messages.
pub trait MessageExt {
    /// Get a single message by id from a given channel.
    async fn get_message(&self, channel: ChannelId, message: MessageId) -> Result<Message>;

    /// Get messages in the backlog for a given channel.
    ///
    /// The `what` argument determines which messages will be returned; a
    /// message limit can also be specified, and defaults to 50. More
    /// recent messages appear first in the list.
    async fn get_messages(
        &self,
        channel: ChannelId,
        what: GetMessages,
        limit: Option<u64>,
    ) -> Result<Vec<Message>>;

    /// Gets the list of messages pinned to a given channel.
    async fn get_pins(&self, channel: ChannelId) -> Result<Vec<Message>>;

    /// Pin the given message to the given channel.
    ///
    /// Requires the `MANAGE_MESSAGES` permission.
    async fn pin_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Remove the given message from being pinned to the given channel.
    ///
    /// Requires the `MANAGE_MESSAGES` permission.
    async fn unpin_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Build and send a message to a given channel.
    async fn send_message<F: FnOnce(SendMessage) -> SendMessage>(
        &self,
        channel: ChannelId,
        builder: F,
    ) -> Result<Message>;

    /// Send a plain text message to a given channel.
    ///
    /// The `nonce` will be returned in the result and also transmitted to
    /// other clients. The empty string is a good default if you don't care.
    async fn send_text_message(
        &self,
        channel: ChannelId,
        text: &str,
        nonce: &str,
    ) -> Result<Message>;

    /// Edit a previously posted message by building a new one.
    ///
    /// Requires that either the message was posted by this user, or this
    /// user has permission to manage other members' messages.
    async fn edit_message<F: FnOnce(SendMessage) -> SendMessage>(
        &self,
        channel: ChannelId,
        message: MessageId,
        builder: F,
    ) -> Result<Message>;

    /// Edit the text portion of a previously posted message.
    async fn edit_text_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
    ) -> Result<Message>;

    /// Send a message with a file attached to a given channel.
    ///
    /// An empty `filename` is replaced with `"file"`.
    async fn send_file(
        &self,
        channel: ChannelId,
        text: &str,
        file: Vec<u8>,
        filename: &str,
    ) -> Result<Message>;

    /// Delete a previously posted message.
    ///
    /// Requires that either the message was posted by this user, or this
    /// user has permission to manage other members' messages.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Bulk delete a list of messages by id from a given channel.
    ///
    /// A minimum of 2 and a maximum of 100 unique messages may be
    /// supplied; duplicates are removed from the list before sending.
    ///
    /// Only bots can use this endpoint, and only on messages posted
    /// within the last two weeks.
    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        messages: &[MessageId],
    ) -> Result<()>;

    /// Add a reaction to a message.
    ///
    /// Requires the `ADD_REACTIONS` permission for the first reaction with
    /// a given emoji.
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: ReactionEmoji,
    ) -> Result<()>;

    /// Delete a reaction from a message.
    ///
    /// Pass `None` as the user to remove the current user's own reaction;
    /// removing someone else's requires `MANAGE_MESSAGES`.
    async fn delete_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: Option<UserId>,
        emoji: ReactionEmoji,
    ) -> Result<()>;

    /// Get the users that reacted to a message with a given emoji.
    ///
    /// The default `limit` is 50. `after` is the id of the user to
    /// retrieve the next page of reactions after.
    async fn get_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: ReactionEmoji,
        limit: Option<u64>,
        after: Option<UserId>,
    ) -> Result<Vec<User>>;

    /// Indicate typing on the channel for the next 5 seconds, or until a
    /// message is sent.
    async fn broadcast_typing(&self, channel: ChannelId) -> Result<()>;
}

impl MessageExt for Discord {
    async fn get_message(&self, channel: ChannelId, message: MessageId) -> Result<Message> {
        Ok(self
            .empty_request(
                &format!("/channels/{channel}/messages/{message}"),
                Method::GET,
            )
            .await?
            .json()
            .await?)
    }

    async fn get_messages(
        &self,
        channel: ChannelId,
        what: GetMessages,
        limit: Option<u64>,
    ) -> Result<Vec<Message>> {
        let mut params = vec![("limit", limit.unwrap_or(50).to_string())];
        match what {
            GetMessages::MostRecent => {}
            GetMessages::Before(id) => params.push(("before", id.to_string())),
            GetMessages::After(id) => params.push(("after", id.to_string())),
            GetMessages::Around(id) => params.push(("around", id.to_string())),
        }
        let url = format!("/channels/{channel}/messages?{}", encode_query(params));

        Ok(self.empty_request(&url, Method::GET).await?.json().await?)
    }

    async fn get_pins(&self, channel: ChannelId) -> Result<Vec<Message>> {
        Ok(self
            .empty_request(&format!("/channels/{channel}/pins"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn pin_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        self.empty_request(&format!("/channels/{channel}/pins/{message}"), Method::PUT)
            .await?
            .insure_no_content()
            .await
    }

    async fn unpin_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        self.empty_request(
            &format!("/channels/{channel}/pins/{message}"),
            Method::DELETE,
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn send_message<F: FnOnce(SendMessage) -> SendMessage>(
        &self,
        channel: ChannelId,
        builder: F,
    ) -> Result<Message> {
        let map = SendMessage::build(builder);

        Ok(self
            .request(
                &format!("/channels/{channel}/messages"),
                Method::POST,
                |req| req.json(&map),
            )
            .await?
            .json()
            .await?)
    }

    async fn send_text_message(
        &self,
        channel: ChannelId,
        text: &str,
        nonce: &str,
    ) -> Result<Message> {
        self.send_message(channel, |b| b.content(text).nonce(nonce))
            .await
    }

    async fn edit_message<F: FnOnce(SendMessage) -> SendMessage>(
        &self,
        channel: ChannelId,
        message: MessageId,
        builder: F,
    ) -> Result<Message> {
        let map = SendMessage::build(builder);

        Ok(self
            .request(
                &format!("/channels/{channel}/messages/{message}"),
                Method::PATCH,
                |req| req.json(&map),
            )
            .await?
            .json()
            .await?)
    }

    async fn edit_text_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        text: &str,
    ) -> Result<Message> {
        self.edit_message(channel, message, |b| b.content(text))
            .await
    }

    async fn send_file(
        &self,
        channel: ChannelId,
        text: &str,
        file: Vec<u8>,
        filename: &str,
    ) -> Result<Message> {
        let filename = if filename.is_empty() { "file" } else { filename };
        let part = reqwest::multipart::Part::bytes(file)
            .file_name(filename.to_owned())
            .mime_str("application/octet-stream")?;

        let form = reqwest::multipart::Form::new()
            .text("content", text.to_owned())
            .text("nonce", "")
            .text("tts", "false")
            .part("file", part);

        // `Form` is consumed on send, so build the request directly
        // instead of through the retrying helper.
        let url = format!("/channels/{channel}/messages");
        let route = crate::ratelimit::route_bucket(&url);
        self.rate_limits.pre_check(&route)?;

        let response = self
            .client
            .post(format!("{}{}", self.api_base, url))
            .header(reqwest::header::AUTHORIZATION, self.token.clone())
            .multipart(form)
            .send()
            .await?;
        self.rate_limits.post_update(&route, &response);

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        Ok(response.json().await?)
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        self.empty_request(
            &format!("/channels/{channel}/messages/{message}"),
            Method::DELETE,
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn bulk_delete_messages(
        &self,
        channel: ChannelId,
        messages: &[MessageId],
    ) -> Result<()> {
        let map = bulk_delete_payload(messages)?;

        self.request(
            &format!("/channels/{channel}/messages/bulk-delete"),
            Method::POST,
            |req| req.json(&map),
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: ReactionEmoji,
    ) -> Result<()> {
        self.empty_request(
            &format!(
                "/channels/{channel}/messages/{message}/reactions/{}/@me",
                emoji.as_path()
            ),
            Method::PUT,
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn delete_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: Option<UserId>,
        emoji: ReactionEmoji,
    ) -> Result<()> {
        let target = match user {
            Some(id) => id.to_string(),
            None => "@me".to_owned(),
        };

        self.empty_request(
            &format!(
                "/channels/{channel}/messages/{message}/reactions/{}/{target}",
                emoji.as_path()
            ),
            Method::DELETE,
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn get_reactions(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: ReactionEmoji,
        limit: Option<u64>,
        after: Option<UserId>,
    ) -> Result<Vec<User>> {
        let mut params = vec![("limit", limit.unwrap_or(50).to_string())];
        if let Some(after) = after {
            params.push(("after", after.to_string()));
        }
        let url = format!(
            "/channels/{channel}/messages/{message}/reactions/{}?{}",
            emoji.as_path(),
            encode_query(params)
        );

        Ok(self.empty_request(&url, Method::GET).await?.json().await?)
    }

    async fn broadcast_typing(&self, channel: ChannelId) -> Result<()> {
        self.empty_request(&format!("/channels/{channel}/typing"), Method::POST)
            .await?
            .insure_no_content()
            .await
    }
}

/// Validate and build the body for a bulk delete. Ids go over the wire in
/// their string form.
fn bulk_delete_payload(messages: &[MessageId]) -> Result<serde_json::Value> {
    let mut ids: Vec<u64> = messages.iter().map(|m| m.0).collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.len() < 2 {
        return Err(Error::Other("A minimum of 2 message ids must be supplied"));
    } else if ids.len() > 100 {
        return Err(Error::Other("A maximum of 100 message ids may be supplied"));
    }

    let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
    Ok(json!({ "messages": ids }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_delete_builds_the_documented_body() {
        let payload =
            bulk_delete_payload(&[MessageId(1), MessageId(2), MessageId(3), MessageId(2)]).unwrap();
        assert_eq!(payload, json!({"messages": ["1", "2", "3"]}));
    }

    #[test]
    fn bulk_delete_bounds_are_enforced() {
        assert!(bulk_delete_payload(&[MessageId(1)]).is_err());
        assert!(bulk_delete_payload(&[MessageId(1), MessageId(1)]).is_err());

        let many: Vec<MessageId> = (0u64..101).map(MessageId).collect();
        assert!(bulk_delete_payload(&many).is_err());
    }
}
