use reqwest::Method;
use serde_json::json;

use crate::builders::ExecuteWebhook;
use crate::error::{Result, StatusChecks};
use crate::model::{ChannelId, GuildId, Message, Webhook, WebhookId};

use super::Discord;

/// Discord REST API methods for managing and executing webhooks.
///
/// The `*_with_token` variants authenticate with the webhook's own token
/// and work without any other credential being valid for the channel.
pub trait WebhookExt {
    /// Create a webhook on a text channel.
    ///
    /// Requires the `MANAGE_WEBHOOKS` permission.
    async fn create_webhook(&self, channel: ChannelId, name: &str) -> Result<Webhook>;

    /// Get the webhooks of a channel.
    async fn get_channel_webhooks(&self, channel: ChannelId) -> Result<Vec<Webhook>>;

    /// Get the webhooks of a guild.
    async fn get_guild_webhooks(&self, guild: GuildId) -> Result<Vec<Webhook>>;

    /// Get a webhook by id.
    async fn get_webhook(&self, webhook: WebhookId) -> Result<Webhook>;

    /// Get a webhook by id, authenticating with its own token.
    async fn get_webhook_with_token(&self, webhook: WebhookId, token: &str) -> Result<Webhook>;

    /// Rename a webhook or replace its avatar.
    async fn edit_webhook(
        &self,
        webhook: WebhookId,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Webhook>;

    /// Delete a webhook.
    async fn delete_webhook(&self, webhook: WebhookId) -> Result<()>;

    /// Delete a webhook, authenticating with its own token.
    async fn delete_webhook_with_token(&self, webhook: WebhookId, token: &str) -> Result<()>;

    /// Post a message through a webhook.
    ///
    /// With `wait` set, the created message is returned; otherwise the
    /// server acknowledges without a body and `None` is returned.
    async fn execute_webhook<F: FnOnce(ExecuteWebhook) -> ExecuteWebhook>(
        &self,
        webhook: WebhookId,
        token: &str,
        wait: bool,
        builder: F,
    ) -> Result<Option<Message>>;
}

impl WebhookExt for Discord {
    async fn create_webhook(&self, channel: ChannelId, name: &str) -> Result<Webhook> {
        let map = json!({ "name": name });

        Ok(self
            .request(
                &format!("/channels/{channel}/webhooks"),
                Method::POST,
                |req| req.json(&map),
            )
            .await?
            .json()
            .await?)
    }

    async fn get_channel_webhooks(&self, channel: ChannelId) -> Result<Vec<Webhook>> {
        Ok(self
            .empty_request(&format!("/channels/{channel}/webhooks"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn get_guild_webhooks(&self, guild: GuildId) -> Result<Vec<Webhook>> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/webhooks"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn get_webhook(&self, webhook: WebhookId) -> Result<Webhook> {
        Ok(self
            .empty_request(&format!("/webhooks/{webhook}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn get_webhook_with_token(&self, webhook: WebhookId, token: &str) -> Result<Webhook> {
        Ok(self
            .empty_request(&format!("/webhooks/{webhook}/{token}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn edit_webhook(
        &self,
        webhook: WebhookId,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Webhook> {
        let mut map = serde_json::Map::new();
        if let Some(name) = name {
            map.insert("name".to_owned(), json!(name));
        }
        if let Some(avatar) = avatar {
            map.insert("avatar".to_owned(), json!(avatar));
        }

        Ok(self
            .request(&format!("/webhooks/{webhook}"), Method::PATCH, |req| {
                req.json(&map)
            })
            .await?
            .json()
            .await?)
    }

    async fn delete_webhook(&self, webhook: WebhookId) -> Result<()> {
        self.empty_request(&format!("/webhooks/{webhook}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn delete_webhook_with_token(&self, webhook: WebhookId, token: &str) -> Result<()> {
        self.empty_request(&format!("/webhooks/{webhook}/{token}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn execute_webhook<F: FnOnce(ExecuteWebhook) -> ExecuteWebhook>(
        &self,
        webhook: WebhookId,
        token: &str,
        wait: bool,
        builder: F,
    ) -> Result<Option<Message>> {
        let map = ExecuteWebhook::build(builder);

        let response = self
            .request(
                &format!("/webhooks/{webhook}/{token}?wait={wait}"),
                Method::POST,
                |req| req.json(&map),
            )
            .await?;

        if wait {
            Ok(Some(response.json().await?))
        } else {
            response.insure_no_content().await.map(|()| None)
        }
    }
}
