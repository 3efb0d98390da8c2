use reqwest::Method;
use serde_json::json;

use crate::builders::EditChannel;
use crate::error::{Result, StatusChecks};
use crate::model::{Channel, ChannelId, Invite, PermissionOverwrite};

use super::Discord;

/// Discord REST API methods for interacting with channels of any sort.
pub trait ChannelExt {
    /// Get a channel by id.
    async fn get_channel(&self, channel: ChannelId) -> Result<Channel>;

    /// Edit a channel's settings.
    async fn edit_channel<F: FnOnce(EditChannel) -> EditChannel>(
        &self,
        channel: ChannelId,
        builder: F,
    ) -> Result<Channel>;

    /// Delete a channel, or close a direct-message channel.
    ///
    /// Returns the channel as it was before deletion.
    async fn delete_channel(&self, channel: ChannelId) -> Result<Channel>;

    /// Get the active invites for a channel.
    async fn get_channel_invites(&self, channel: ChannelId) -> Result<Vec<Invite>>;

    /// Create an invite to a channel.
    ///
    /// A `max_age` of 0 means the invite never expires, and a `max_uses`
    /// of 0 means unlimited uses. `temporary` grants temporary membership.
    async fn create_invite(
        &self,
        channel: ChannelId,
        max_age: u64,
        max_uses: u64,
        temporary: bool,
    ) -> Result<Invite>;

    /// Create or replace a permission overwrite for a channel.
    async fn create_permission(
        &self,
        channel: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> Result<()>;

    /// Delete a permission overwrite from a channel.
    async fn delete_permission(&self, channel: ChannelId, overwrite_id: u64) -> Result<()>;
}

impl ChannelExt for Discord {
    async fn get_channel(&self, channel: ChannelId) -> Result<Channel> {
        Ok(self
            .empty_request(&format!("/channels/{channel}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn edit_channel<F: FnOnce(EditChannel) -> EditChannel>(
        &self,
        channel: ChannelId,
        builder: F,
    ) -> Result<Channel> {
        let map = EditChannel::build(builder);

        Ok(self
            .request(&format!("/channels/{channel}"), Method::PATCH, |req| {
                req.json(&map)
            })
            .await?
            .json()
            .await?)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<Channel> {
        Ok(self
            .empty_request(&format!("/channels/{channel}"), Method::DELETE)
            .await?
            .json()
            .await?)
    }

    async fn get_channel_invites(&self, channel: ChannelId) -> Result<Vec<Invite>> {
        Ok(self
            .empty_request(&format!("/channels/{channel}/invites"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn create_invite(
        &self,
        channel: ChannelId,
        max_age: u64,
        max_uses: u64,
        temporary: bool,
    ) -> Result<Invite> {
        let map = json!({
            "max_age": max_age,
            "max_uses": max_uses,
            "temporary": temporary,
        });

        Ok(self
            .request(
                &format!("/channels/{channel}/invites"),
                Method::POST,
                |req| req.json(&map),
            )
            .await?
            .json()
            .await?)
    }

    async fn create_permission(
        &self,
        channel: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> Result<()> {
        let map = json!({
            "type": overwrite.kind,
            "allow": overwrite.allow.bits(),
            "deny": overwrite.deny.bits(),
        });

        self.request(
            &format!("/channels/{channel}/permissions/{}", overwrite.id),
            Method::PUT,
            |req| req.json(&map),
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn delete_permission(&self, channel: ChannelId, overwrite_id: u64) -> Result<()> {
        self.empty_request(
            &format!("/channels/{channel}/permissions/{overwrite_id}"),
            Method::DELETE,
        )
        .await?
        .insure_no_content()
        .await
    }
}
