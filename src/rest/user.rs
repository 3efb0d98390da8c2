use reqwest::Method;
use serde_json::json;

use crate::builders::EditProfile;
use crate::error::Result;
use crate::model::{CurrentUser, PrivateChannel, User, UserGuild, UserId};

use super::Discord;

/// Discord REST API methods for fetching users and working with the
/// current user.
pub trait UserExt {
    /// Get information about the logged-in user.
    async fn get_current_user(&self) -> Result<CurrentUser>;

    /// Edit the logged-in user's profile.
    async fn edit_profile<F: FnOnce(EditProfile) -> EditProfile>(
        &self,
        builder: F,
    ) -> Result<CurrentUser>;

    /// Get a user by id.
    async fn get_user(&self, user: UserId) -> Result<User>;

    /// Get the guilds the current user is a member of.
    async fn get_current_user_guilds(&self) -> Result<Vec<UserGuild>>;

    /// Open (or reuse) a direct-message channel to the given user.
    async fn create_dm(&self, recipient: UserId) -> Result<PrivateChannel>;
}

impl UserExt for Discord {
    async fn get_current_user(&self) -> Result<CurrentUser> {
        Ok(self
            .empty_request("/users/@me", Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn edit_profile<F: FnOnce(EditProfile) -> EditProfile>(
        &self,
        builder: F,
    ) -> Result<CurrentUser> {
        let map = EditProfile::build(builder);

        Ok(self
            .request("/users/@me", Method::PATCH, |req| req.json(&map))
            .await?
            .json()
            .await?)
    }

    async fn get_user(&self, user: UserId) -> Result<User> {
        Ok(self
            .empty_request(&format!("/users/{user}"), Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn get_current_user_guilds(&self) -> Result<Vec<UserGuild>> {
        Ok(self
            .empty_request("/users/@me/guilds", Method::GET)
            .await?
            .json()
            .await?)
    }

    async fn create_dm(&self, recipient: UserId) -> Result<PrivateChannel> {
        let map = json!({ "recipient_id": recipient });

        Ok(self
            .request("/users/@me/channels", Method::POST, |req| req.json(&map))
            .await?
            .json()
            .await?)
    }
}
