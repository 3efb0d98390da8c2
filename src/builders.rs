//! Builders for the larger REST request bodies.
//!
//! Each builder wraps a JSON object and inserts only the fields that were
//! explicitly set, so unset fields are omitted from the request entirely.

use serde_json::{json, Value};

use crate::model::{ChannelId, Permissions, RoleId};
use crate::Object;

macro_rules! builder {
    ($(#[$attr:meta] $name:ident;)*) => {
        $(
            #[$attr]
            #[derive(Debug)]
            pub struct $name(Object);

            impl $name {
                pub(crate) fn build<F: FnOnce($name) -> $name>(f: F) -> Object {
                    f($name(Object::new())).0
                }

                fn insert(mut self, key: &str, value: Value) -> Self {
                    self.0.insert(key.to_owned(), value);
                    self
                }
            }
        )*
    }
}

builder! {
    /// Patch content for sending or editing a message.
    SendMessage;
    /// Patch content for modifying a channel.
    EditChannel;
    /// Patch content for modifying a guild.
    EditGuild;
    /// Patch content for modifying a guild member.
    EditMember;
    /// Patch content for modifying the current user's profile.
    EditProfile;
    /// Patch content for creating or modifying a role.
    EditRole;
    /// Body content for executing a webhook.
    ExecuteWebhook;
}

impl SendMessage {
    /// The text body of the message.
    pub fn content(self, content: &str) -> Self {
        self.insert("content", json!(content))
    }

    /// An opaque value echoed back in the created message.
    pub fn nonce(self, nonce: &str) -> Self {
        self.insert("nonce", json!(nonce))
    }

    /// Whether the message should be read aloud by clients.
    pub fn tts(self, tts: bool) -> Self {
        self.insert("tts", json!(tts))
    }

    /// Rich embed content, following the OEmbed standard.
    pub fn embed(self, embed: Value) -> Self {
        self.insert("embed", embed)
    }
}

impl EditChannel {
    pub fn name(self, name: &str) -> Self {
        self.insert("name", json!(name))
    }

    pub fn topic(self, topic: &str) -> Self {
        self.insert("topic", json!(topic))
    }

    pub fn position(self, position: i64) -> Self {
        self.insert("position", json!(position))
    }

    /// Voice only.
    pub fn bitrate(self, bitrate: u64) -> Self {
        self.insert("bitrate", json!(bitrate))
    }

    /// Voice only.
    pub fn user_limit(self, user_limit: u64) -> Self {
        self.insert("user_limit", json!(user_limit))
    }
}

impl EditGuild {
    pub fn name(self, name: &str) -> Self {
        self.insert("name", json!(name))
    }

    pub fn region(self, region: &str) -> Self {
        self.insert("region", json!(region))
    }

    /// A `data:`-scheme image produced by [`read_image`][crate::read_image],
    /// or `None` to remove the icon.
    pub fn icon(self, icon: Option<&str>) -> Self {
        self.insert("icon", json!(icon))
    }

    pub fn afk_channel(self, channel: Option<ChannelId>) -> Self {
        self.insert("afk_channel_id", json!(channel))
    }

    pub fn afk_timeout(self, timeout: u64) -> Self {
        self.insert("afk_timeout", json!(timeout))
    }

    pub fn verification_level(self, level: u64) -> Self {
        self.insert("verification_level", json!(level))
    }
}

impl EditMember {
    pub fn nickname(self, nick: &str) -> Self {
        self.insert("nick", json!(nick))
    }

    /// Replace the member's role set. Roles are named by id.
    pub fn roles(self, roles: &[RoleId]) -> Self {
        self.insert("roles", json!(roles))
    }

    pub fn mute(self, mute: bool) -> Self {
        self.insert("mute", json!(mute))
    }

    pub fn deafen(self, deaf: bool) -> Self {
        self.insert("deaf", json!(deaf))
    }
}

impl EditProfile {
    pub fn username(self, username: &str) -> Self {
        self.insert("username", json!(username))
    }

    /// A `data:`-scheme image produced by [`read_image`][crate::read_image],
    /// or `None` to remove the avatar.
    pub fn avatar(self, avatar: Option<&str>) -> Self {
        self.insert("avatar", json!(avatar))
    }
}

impl EditRole {
    pub fn name(self, name: &str) -> Self {
        self.insert("name", json!(name))
    }

    /// Color in `0xRRGGBB` form.
    pub fn color(self, color: u64) -> Self {
        self.insert("color", json!(color))
    }

    /// Whether the role is displayed separately in the member list.
    pub fn hoist(self, hoist: bool) -> Self {
        self.insert("hoist", json!(hoist))
    }

    pub fn mentionable(self, mentionable: bool) -> Self {
        self.insert("mentionable", json!(mentionable))
    }

    pub fn permissions(self, permissions: Permissions) -> Self {
        self.insert("permissions", json!(permissions.bits()))
    }
}

impl ExecuteWebhook {
    pub fn content(self, content: &str) -> Self {
        self.insert("content", json!(content))
    }

    /// Override the default username of the webhook.
    pub fn username(self, username: &str) -> Self {
        self.insert("username", json!(username))
    }

    /// Override the default avatar of the webhook.
    pub fn avatar_url(self, avatar_url: &str) -> Self {
        self.insert("avatar_url", json!(avatar_url))
    }

    pub fn tts(self, tts: bool) -> Self {
        self.insert("tts", json!(tts))
    }

    pub fn embeds(self, embeds: Vec<Value>) -> Self {
        self.insert("embeds", Value::Array(embeds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let body = SendMessage::build(|b| b.content("hi"));
        assert_eq!(body.len(), 1);
        assert_eq!(body["content"], "hi");
    }

    #[test]
    fn member_roles_serialize_as_a_list_of_ids() {
        let body = EditMember::build(|b| b.roles(&[RoleId(7), RoleId(9)]));
        assert_eq!(body["roles"], json!([7, 9]));
    }
}
