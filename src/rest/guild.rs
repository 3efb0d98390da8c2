use reqwest::Method;
use serde_json::json;

use crate::builders::{EditGuild, EditMember, EditRole};
use crate::error::{Result, StatusChecks};
use crate::model::{
    Ban, Channel, ChannelType, Guild, GuildChannel, GuildId, Invite, Member, Role, RoleId, UserId,
};
use crate::schema::encode_query;

use super::Discord;

/// Discord REST API methods for managing guilds, their members, roles,
/// and bans.
pub trait GuildExt {
    /// Get a guild's static information by id.
    async fn get_guild(&self, guild: GuildId) -> Result<Guild>;

    /// Create a guild owned by the current user.
    async fn create_guild(&self, name: &str) -> Result<Guild>;

    /// Edit a guild's settings.
    ///
    /// Requires the `MANAGE_GUILD` permission.
    async fn edit_guild<F: FnOnce(EditGuild) -> EditGuild>(
        &self,
        guild: GuildId,
        builder: F,
    ) -> Result<Guild>;

    /// Delete a guild. The current user must be its owner.
    async fn delete_guild(&self, guild: GuildId) -> Result<()>;

    /// Get the channels of a guild.
    async fn get_guild_channels(&self, guild: GuildId) -> Result<Vec<GuildChannel>>;

    /// Create a text or voice channel in a guild.
    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        kind: ChannelType,
    ) -> Result<Channel>;

    /// Get the members of a guild, paginated.
    ///
    /// `limit` defaults to 1 and is capped at 1000 by the server; `after`
    /// names the highest user id of the previous page.
    async fn get_guild_members(
        &self,
        guild: GuildId,
        limit: Option<u64>,
        after: Option<UserId>,
    ) -> Result<Vec<Member>>;

    /// Get a single member of a guild.
    async fn get_member(&self, guild: GuildId, user: UserId) -> Result<Member>;

    /// Edit a member: nickname, role set, voice mute/deafen.
    async fn edit_member<F: FnOnce(EditMember) -> EditMember>(
        &self,
        guild: GuildId,
        user: UserId,
        builder: F,
    ) -> Result<()>;

    /// Change the current user's nickname in a guild.
    async fn edit_nickname(&self, guild: GuildId, nick: &str) -> Result<()>;

    /// Kick a member from a guild.
    ///
    /// Requires the `KICK_MEMBERS` permission.
    async fn kick_member(&self, guild: GuildId, user: UserId) -> Result<()>;

    /// Get the users banned from a guild.
    async fn get_bans(&self, guild: GuildId) -> Result<Vec<Ban>>;

    /// Ban a user from a guild, optionally deleting their recent messages.
    ///
    /// Requires the `BAN_MEMBERS` permission.
    async fn add_ban(&self, guild: GuildId, user: UserId, delete_message_days: u8) -> Result<()>;

    /// Lift the ban of a user.
    ///
    /// Requires the `BAN_MEMBERS` permission.
    async fn remove_ban(&self, guild: GuildId, user: UserId) -> Result<()>;

    /// Get the roles of a guild.
    async fn get_roles(&self, guild: GuildId) -> Result<Vec<Role>>;

    /// Create a role in a guild.
    ///
    /// Requires the `MANAGE_ROLES` permission.
    async fn create_role<F: FnOnce(EditRole) -> EditRole>(
        &self,
        guild: GuildId,
        builder: F,
    ) -> Result<Role>;

    /// Edit a role.
    ///
    /// Requires the `MANAGE_ROLES` permission.
    async fn edit_role<F: FnOnce(EditRole) -> EditRole>(
        &self,
        guild: GuildId,
        role: RoleId,
        builder: F,
    ) -> Result<Role>;

    /// Delete a role.
    ///
    /// Requires the `MANAGE_ROLES` permission.
    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<()>;

    /// Get the active invites for a guild.
    async fn get_guild_invites(&self, guild: GuildId) -> Result<Vec<Invite>>;

    /// Leave a guild without deleting it.
    async fn leave_guild(&self, guild: GuildId) -> Result<()>;
}

impl GuildExt for Discord {
    async fn get_guild(&self, guild: GuildId) -> Result<Guild> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn create_guild(&self, name: &str) -> Result<Guild> {
        let map = json!({ "name": name });

        Ok(self
            .request("/guilds", Method::POST, |req| req.json(&map))
            .await?
            .json()
            .await?)
    }

    async fn edit_guild<F: FnOnce(EditGuild) -> EditGuild>(
        &self,
        guild: GuildId,
        builder: F,
    ) -> Result<Guild> {
        let map = EditGuild::build(builder);

        Ok(self
            .request(&format!("/guilds/{guild}"), Method::PATCH, |req| {
                req.json(&map)
            })
            .await?
            .json()
            .await?)
    }

    async fn delete_guild(&self, guild: GuildId) -> Result<()> {
        self.empty_request(&format!("/guilds/{guild}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn get_guild_channels(&self, guild: GuildId) -> Result<Vec<GuildChannel>> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/channels"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        kind: ChannelType,
    ) -> Result<Channel> {
        let map = json!({ "name": name, "type": kind });

        Ok(self
            .request(&format!("/guilds/{guild}/channels"), Method::POST, |req| {
                req.json(&map)
            })
            .await?
            .json()
            .await?)
    }

    async fn get_guild_members(
        &self,
        guild: GuildId,
        limit: Option<u64>,
        after: Option<UserId>,
    ) -> Result<Vec<Member>> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(after) = after {
            params.push(("after", after.to_string()));
        }
        let url = format!("/guilds/{guild}/members?{}", encode_query(params));

        Ok(self.empty_request(&url, Method::GET).await?.json().await?)
    }

    async fn get_member(&self, guild: GuildId, user: UserId) -> Result<Member> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/members/{user}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn edit_member<F: FnOnce(EditMember) -> EditMember>(
        &self,
        guild: GuildId,
        user: UserId,
        builder: F,
    ) -> Result<()> {
        let map = EditMember::build(builder);

        self.request(
            &format!("/guilds/{guild}/members/{user}"),
            Method::PATCH,
            |req| req.json(&map),
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn edit_nickname(&self, guild: GuildId, nick: &str) -> Result<()> {
        let map = json!({ "nick": nick });

        self.request(
            &format!("/guilds/{guild}/members/@me/nick"),
            Method::PATCH,
            |req| req.json(&map),
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn kick_member(&self, guild: GuildId, user: UserId) -> Result<()> {
        self.empty_request(&format!("/guilds/{guild}/members/{user}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn get_bans(&self, guild: GuildId) -> Result<Vec<Ban>> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/bans"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn add_ban(&self, guild: GuildId, user: UserId, delete_message_days: u8) -> Result<()> {
        let query = encode_query([(
            "delete-message-days",
            delete_message_days.min(7).to_string(),
        )]);

        self.empty_request(
            &format!("/guilds/{guild}/bans/{user}?{query}"),
            Method::PUT,
        )
        .await?
        .insure_no_content()
        .await
    }

    async fn remove_ban(&self, guild: GuildId, user: UserId) -> Result<()> {
        self.empty_request(&format!("/guilds/{guild}/bans/{user}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn get_roles(&self, guild: GuildId) -> Result<Vec<Role>> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/roles"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn create_role<F: FnOnce(EditRole) -> EditRole>(
        &self,
        guild: GuildId,
        builder: F,
    ) -> Result<Role> {
        let map = EditRole::build(builder);

        Ok(self
            .request(&format!("/guilds/{guild}/roles"), Method::POST, |req| {
                req.json(&map)
            })
            .await?
            .json()
            .await?)
    }

    async fn edit_role<F: FnOnce(EditRole) -> EditRole>(
        &self,
        guild: GuildId,
        role: RoleId,
        builder: F,
    ) -> Result<Role> {
        let map = EditRole::build(builder);

        Ok(self
            .request(
                &format!("/guilds/{guild}/roles/{role}"),
                Method::PATCH,
                |req| req.json(&map),
            )
            .await?
            .json()
            .await?)
    }

    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<()> {
        self.empty_request(&format!("/guilds/{guild}/roles/{role}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }

    async fn get_guild_invites(&self, guild: GuildId) -> Result<Vec<Invite>> {
        Ok(self
            .empty_request(&format!("/guilds/{guild}/invites"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn leave_guild(&self, guild: GuildId) -> Result<()> {
        self.empty_request(&format!("/users/@me/guilds/{guild}"), Method::DELETE)
            .await?
            .insure_no_content()
            .await
    }
}
