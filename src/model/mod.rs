//! Struct and enum definitions of values in the Discord model.

use std::fmt;

use bitflags::bitflags;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

mod event;
pub use self::event::*;

// IDs

macro_rules! snowflake {
    ($(#[$attr:meta] $name:ident;)*) => {
        $(
            #[$attr]
            ///
            /// Identifiers can be debug-printed using the `{:?}` specifier, or their
            /// raw number value printed using the `{}` specifier.
            #[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Ord, PartialOrd)]
            #[derive(Serialize, Deserialize)]
            pub struct $name(#[serde(deserialize_with = "crate::serial::deserialize_id")] pub u64);

            impl $name {
                /// Get the creation date of the object referred to by this ID.
                ///
                /// Discord generates identifiers using a scheme based on [Twitter
                /// Snowflake](https://github.com/twitter/snowflake).
                pub fn creation_date(&self) -> DateTime<Utc> {
                    DateTime::from_timestamp((1420070400 + (self.0 >> 22) / 1000) as i64, 0)
                        .unwrap_or(DateTime::UNIX_EPOCH)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    }
}

snowflake! {
    /// An identifier for an application
    ApplicationId;
    /// An identifier for a User
    UserId;
    /// An identifier for a Guild
    GuildId;
    /// An identifier for a Channel
    ChannelId;
    /// An identifier for a Message
    MessageId;
    /// An identifier for a Role
    RoleId;
    /// An identifier for an Emoji
    EmojiId;
    /// An identifier for a Webhook
    WebhookId;
}

impl GuildId {
    /// Returns the Id of the `@everyone` role, which is shared with the guild's Id.
    pub fn everyone(&self) -> RoleId {
        RoleId(self.0)
    }
}

/// A mention targeted at a specific user, channel, or role.
///
/// A mention can be formatted into a string using the `{}` specifier,
/// yielding the markup understood by Discord clients.
#[derive(Debug, Clone, Copy)]
pub struct Mention {
    prefix: &'static str,
    id: u64,
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}{}>", self.prefix, self.id)
    }
}

impl UserId {
    /// Return a `Mention` which will ping this user.
    pub fn mention(&self) -> Mention {
        Mention { prefix: "@", id: self.0 }
    }
}

impl ChannelId {
    /// Return a `Mention` which will link to this channel.
    pub fn mention(&self) -> Mention {
        Mention { prefix: "#", id: self.0 }
    }
}

impl RoleId {
    /// Return a `Mention` which will ping members of this role.
    pub fn mention(&self) -> Mention {
        Mention { prefix: "@&", id: self.0 }
    }
}

// Users

/// Public-facing user information.
///
/// Users are the base entity of the platform: they spawn across guilds,
/// participate in text chat, and own bot applications. The session keeps a
/// de-duplicated directory of every user seen over the gateway; the
/// `status` and `game` fields mirror the last presence observed for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user's ID
    pub id: UserId,

    /// The user's username, not unique across the platform.
    #[serde(rename = "username")]
    pub name: String,
    /// The user's Discord-tag
    #[serde(deserialize_with = "crate::serial::deserialize_discrim")]
    pub discriminator: u16,

    /// The user's avatar hash
    pub avatar: Option<String>,

    /// Whether the user belongs to an OAuth2 application
    #[serde(default)]
    pub bot: bool,

    /// The last online status observed for this user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OnlineStatus>,
    /// The last game observed for this user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<Game>,
}

impl User {
    /// Return a `Mention` which will ping this user.
    #[inline(always)]
    pub fn mention(&self) -> Mention {
        self.id.mention()
    }

    /// Returns the formatted URL of the user's avatar, if they have one.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|av| format!(cdn_concat!("/avatars/{}/{}.jpg"), self.id, av))
    }
}

/// Information about the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The user's ID
    pub id: UserId,
    /// The user's username
    pub username: String,
    /// The user's Discord-tag
    #[serde(deserialize_with = "crate::serial::deserialize_discrim")]
    pub discriminator: u16,
    /// The user's avatar hash
    pub avatar: Option<String>,
    /// Whether this account belongs to an OAuth2 application
    #[serde(default)]
    pub bot: bool,
}

/// A subset of user fields, as carried by presence payloads.
///
/// Presence payloads are permitted to name a user by id alone; any other
/// identity field may or may not be present.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialUser {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "crate::serial::deserialize_discrim_opt")]
    pub discriminator: Option<u16>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: Option<bool>,
}

// Guilds

/// Static guild information, as returned from the REST API and carried by
/// `GUILD_UPDATE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    pub owner_id: UserId,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub afk_timeout: u64,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub verification_level: u64,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Live guild information, provided and maintained by an active gateway
/// connection.
///
/// In addition to the static metadata this carries the guild's channel,
/// member, role, and emoji collections, each keyed by its id and kept in
/// insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveGuild {
    pub id: GuildId,
    pub name: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    pub owner_id: UserId,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub afk_timeout: u64,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub verification_level: u64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub member_count: u64,
    #[serde(default)]
    pub joined_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub channels: Vec<GuildChannel>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    /// Presences delivered with the guild; replayed into the session user
    /// directory on receipt and not maintained here afterwards.
    #[serde(default, skip_serializing)]
    pub presences: Vec<Presence>,
}

impl LiveGuild {
    /// Returns the formatted URL of the guild's icon, if it has one.
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|icon| format!(cdn_concat!("/icons/{}/{}.jpg"), self.id, icon))
    }

    /// Merge static metadata from a `GUILD_UPDATE` payload, leaving the
    /// live collections untouched.
    pub fn merge(&mut self, patch: &Guild) {
        self.name = patch.name.clone();
        self.icon = patch.icon.clone();
        self.splash = patch.splash.clone();
        self.owner_id = patch.owner_id;
        self.region = patch.region.clone();
        self.afk_timeout = patch.afk_timeout;
        self.afk_channel_id = patch.afk_channel_id;
        self.verification_level = patch.verification_level;
        self.features = patch.features.clone();
    }

    /// Calculate the permissions granted to a member through its roles,
    /// before channel overwrites.
    pub fn role_permissions(&self, user: UserId) -> Permissions {
        if user == self.owner_id {
            return Permissions::all();
        }

        let mut permissions = self
            .roles
            .iter()
            .find(|r| r.id == self.id.everyone())
            .map(|r| r.permissions)
            .unwrap_or_else(Permissions::empty);

        if let Some(member) = self.members.iter().find(|m| m.user.id == user) {
            for &role in &member.roles {
                if let Some(role) = self.roles.iter().find(|r| r.id == role) {
                    permissions |= role.permissions;
                }
            }
        }

        if permissions.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }
        permissions
    }
}

/// A guild which may be unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PossibleGuild<T> {
    /// An available guild, for which full information is present
    Online(T),
    /// An unavailable guild, the id of which is known
    Offline {
        id: GuildId,
        #[serde(default)]
        unavailable: bool,
    },
}

impl PossibleGuild<LiveGuild> {
    pub fn id(&self) -> GuildId {
        match *self {
            PossibleGuild::Offline { id, .. } => id,
            PossibleGuild::Online(ref live) => live.id,
        }
    }
}

impl PossibleGuild<Guild> {
    pub fn id(&self) -> GuildId {
        match *self {
            PossibleGuild::Offline { id, .. } => id,
            PossibleGuild::Online(ref guild) => guild.id,
        }
    }
}

// Channels

/// The type tag of a channel.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ChannelType {
    /// A text channel within a guild
    Text = 0,
    /// A direct-message channel outside of any guild
    Dm = 1,
    /// A voice channel within a guild
    Voice = 2,
}

/// A text, voice, or direct-message channel.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Channel {
    /// A channel belonging to a guild
    Guild(GuildChannel),
    /// A direct-message channel, belonging to no guild
    Private(PrivateChannel),
}

impl Channel {
    /// Decode a channel from its JSON representation, dispatching on the
    /// `type` tag.
    pub fn decode(value: Value) -> crate::Result<Channel> {
        match value.get("type").and_then(Value::as_u64) {
            Some(1) => serde_json::from_value(value)
                .map(Channel::Private)
                .map_err(From::from),
            Some(0) | Some(2) => serde_json::from_value(value)
                .map(Channel::Guild)
                .map_err(From::from),
            _ => Err(crate::Error::Decode("Unknown channel type", value)),
        }
    }

    /// The id of the channel, regardless of its kind.
    pub fn id(&self) -> ChannelId {
        match *self {
            Channel::Guild(ref ch) => ch.id,
            Channel::Private(ref ch) => ch.id,
        }
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Channel, D::Error> {
        let value = Value::deserialize(d)?;
        Channel::decode(value).map_err(serde::de::Error::custom)
    }
}

/// A text or voice channel belonging to a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildChannel {
    pub id: ChannelId,
    /// The guild owning this channel.
    ///
    /// Absent on the channel lists nested inside `GUILD_CREATE`; the state
    /// store fills it in from the surrounding guild.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
    /// Voice only
    #[serde(default)]
    pub bitrate: Option<u64>,
    /// Voice only
    #[serde(default)]
    pub user_limit: Option<u64>,
}

impl GuildChannel {
    /// Return a `Mention` which will link to this channel.
    #[inline(always)]
    pub fn mention(&self) -> Mention {
        self.id.mention()
    }

    /// Merge fields from a `CHANNEL_UPDATE` payload, retaining the prior
    /// value of any field the payload left unset.
    pub fn merge(&mut self, patch: &GuildChannel) {
        self.name = patch.name.clone();
        self.kind = patch.kind;
        self.position = patch.position;
        if patch.guild_id.is_some() {
            self.guild_id = patch.guild_id;
        }
        if patch.topic.is_some() {
            self.topic = patch.topic.clone();
        }
        if !patch.permission_overwrites.is_empty() {
            self.permission_overwrites = patch.permission_overwrites.clone();
        }
        if patch.last_message_id.is_some() {
            self.last_message_id = patch.last_message_id;
        }
        if patch.bitrate.is_some() {
            self.bitrate = patch.bitrate;
        }
        if patch.user_limit.is_some() {
            self.user_limit = patch.user_limit;
        }
    }
}

/// A direct-message channel. Carries at least one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateChannel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub recipients: Vec<User>,
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
}

impl PrivateChannel {
    /// Merge fields from a `CHANNEL_UPDATE` payload, retaining the prior
    /// value of any field the payload left unset.
    pub fn merge(&mut self, patch: &PrivateChannel) {
        self.kind = patch.kind;
        if !patch.recipients.is_empty() {
            self.recipients = patch.recipients.clone();
        }
        if patch.last_message_id.is_some() {
            self.last_message_id = patch.last_message_id;
        }
    }
}

/// A per-channel permission allow/deny record attached to a user or role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(deserialize_with = "crate::serial::deserialize_id")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: OverwriteType,
    pub allow: Permissions,
    pub deny: Permissions,
}

/// What a permission overwrite is attached to.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteType {
    Role,
    Member,
}

// Members and roles

/// Information about a member of a guild, uniquely keyed by the id of its
/// user within the guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// The user this member structure concerns.
    pub user: User,
    /// The member's guild nickname, if set.
    #[serde(default)]
    pub nick: Option<String>,
    /// The roles granted to the member.
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// When the user joined the guild.
    pub joined_at: DateTime<FixedOffset>,
    /// Whether the member is muted in voice channels.
    #[serde(default)]
    pub mute: bool,
    /// Whether the member is deafened in voice channels.
    #[serde(default)]
    pub deaf: bool,
}

impl Member {
    /// Get this member's nickname if present or their username otherwise.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }
}

/// A guild role, carrying a permission set and display information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Color in `0xRRGGBB` form.
    #[serde(default, alias = "colour")]
    pub color: u64,
    /// Whether the role is displayed separately in the member list.
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i64,
    pub permissions: Permissions,
    /// Whether the role is under the control of an integration.
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    /// Return a `Mention` which will ping members of this role.
    #[inline(always)]
    pub fn mention(&self) -> Mention {
        self.id.mention()
    }
}

bitflags! {
    /// Set of permissions assignable to a `Role` or
    /// [`PermissionOverwrite`].
    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Permissions: u64 {
        const CREATE_INVITE = 1;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        /// Implies all permissions and bypasses channel overwrites
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const ADD_REACTIONS = 1 << 6;
        const VIEW_AUDIT_LOG = 1 << 7;
        const READ_MESSAGES = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const SEND_TTS_MESSAGES = 1 << 12;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS = 1 << 14;
        const ATTACH_FILES = 1 << 15;
        const READ_HISTORY = 1 << 16;
        const MENTION_EVERYONE = 1 << 17;
        const USE_EXTERNAL_EMOJIS = 1 << 18;
        const VOICE_CONNECT = 1 << 20;
        const VOICE_SPEAK = 1 << 21;
        const VOICE_MUTE_MEMBERS = 1 << 22;
        const VOICE_DEAFEN_MEMBERS = 1 << 23;
        const VOICE_MOVE_MEMBERS = 1 << 24;
        const VOICE_USE_VOICE_ACTIVITY = 1 << 25;
        const CHANGE_NICKNAMES = 1 << 26;
        const MANAGE_NICKNAMES = 1 << 27;
        const MANAGE_ROLES = 1 << 28;
        const MANAGE_WEBHOOKS = 1 << 29;
        const MANAGE_EMOJIS = 1 << 30;
    }
}

impl Default for Permissions {
    fn default() -> Permissions {
        Permissions::empty()
    }
}

/// A custom guild emoji.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    pub id: EmojiId,
    pub name: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

// Presences

/// A user's online presence, as carried by `PRESENCE_UPDATE` and the
/// presence lists nested in `GUILD_CREATE`.
#[derive(Debug, Clone, Deserialize)]
pub struct Presence {
    pub user: PartialUser,
    pub status: OnlineStatus,
    #[serde(default)]
    pub game: Option<Game>,
}

/// A user's online status.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    #[serde(rename = "dnd")]
    DoNotDisturb,
    Invisible,
    Offline,
    Online,
    Idle,
}

/// A game or activity attached to a presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// The name of the game being played.
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: GameType,
    /// Stream url, set when `kind` is [`GameType::Streaming`].
    #[serde(default)]
    pub url: Option<String>,
}

impl Game {
    /// Create a `Game` of the normal playing type with the given name.
    pub fn playing<N: Into<String>>(name: N) -> Game {
        Game {
            name: name.into(),
            kind: GameType::Playing,
            url: None,
        }
    }

    /// Create a `Game` of the streaming type with the given name and url.
    pub fn streaming<N: Into<String>>(name: N, url: N) -> Game {
        Game {
            name: name.into(),
            kind: GameType::Streaming,
            url: Some(url.into()),
        }
    }
}

/// The type of a game being played.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum GameType {
    #[default]
    Playing = 0,
    Streaming = 1,
}

// Messages

/// Message transmitted over a text channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: User,
    pub content: String,
    // carry on if nonce is absent or for some reason not a string
    #[serde(default, deserialize_with = "crate::serial::ignore_errors")]
    pub nonce: Option<String>,
    #[serde(default)]
    pub tts: bool,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(rename = "type", default)]
    pub kind: u64,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub mentions: Vec<User>,
    #[serde(default)]
    pub mention_roles: Vec<RoleId>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Follows the OEmbed standard.
    #[serde(default)]
    pub embeds: Vec<Value>,
}

/// File upload attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    /// Short filename for the attachment
    pub filename: String,
    /// Shorter URL with message and attachment id
    pub url: String,
    /// Longer URL with large hash
    pub proxy_url: String,
    /// Size of the file in bytes
    pub size: u64,
    /// Width if the file is an image
    #[serde(default)]
    pub width: Option<u64>,
    /// Height if the file is an image
    #[serde(default)]
    pub height: Option<u64>,
}

// Webhooks and invites

/// A webhook attached to a text channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: WebhookId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    /// The user that created the webhook. Absent when fetched by token.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// The secure token of the webhook. Absent from audit-log listings.
    #[serde(default)]
    pub token: Option<String>,
}

/// An invite to a guild channel.
#[derive(Debug, Clone, Deserialize)]
pub struct Invite {
    pub code: String,
    #[serde(default)]
    pub guild: Option<InviteGuild>,
    pub channel: InviteChannel,
}

/// Abridged guild information attached to an `Invite`.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteGuild {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Abridged channel information attached to an `Invite`.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteChannel {
    pub id: ChannelId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
}

/// A ban of a user from a guild, with the reason if one was given.
#[derive(Debug, Clone, Deserialize)]
pub struct Ban {
    #[serde(default)]
    pub reason: Option<String>,
    pub user: User,
}

/// Abridged information about a guild the current user belongs to, as
/// returned by the guild listing of the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct UserGuild {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Whether the current user owns this guild.
    #[serde(default)]
    pub owner: bool,
    #[serde(default)]
    pub permissions: Permissions,
}

/// An emoji usable in reactions: either stock unicode or a custom guild
/// emoji.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReactionEmoji {
    /// A custom guild emoji.
    Custom {
        /// The name displayed for the emoji
        name: String,
        /// The id of the emoji
        id: EmojiId,
    },
    /// A stock unicode emoji; the name is the emoji itself.
    Unicode {
        name: String,
    },
}

impl ReactionEmoji {
    /// The path segment form used by the reaction endpoints.
    pub(crate) fn as_path(&self) -> String {
        match *self {
            ReactionEmoji::Custom { ref name, id } => format!("{}:{}", name, id.0),
            ReactionEmoji::Unicode { ref name } => name.clone(),
        }
    }
}
