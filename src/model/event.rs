//! Envelope and event types received over the gateway.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

use super::{
    Channel, ChannelId, CurrentUser, Emoji, Guild, GuildId, LiveGuild, Member, Message, MessageId,
    PossibleGuild, Presence, PrivateChannel, Role, RoleId, User, UserId,
};

/// The `READY` event, containing the initial state of the session.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyEvent {
    /// Active gateway protocol version.
    #[serde(rename = "v", default)]
    pub version: u64,
    /// The logged-in user.
    pub user: CurrentUser,
    /// The id of the current session, used for resuming.
    pub session_id: String,
    /// The guilds visible to the user. Initially unavailable; populated by
    /// discrete `GUILD_CREATE` events.
    pub guilds: Vec<PossibleGuild<LiveGuild>>,
    /// The direct-message channels open for the user.
    #[serde(default)]
    pub private_channels: Vec<PrivateChannel>,
    /// The shard information for this session, if sharding is in use.
    #[serde(default)]
    pub shard: Option<(u16, u16)>,
    /// The trace of gateway servers involved in serving this connection.
    #[serde(rename = "_trace", default)]
    pub trace: Option<Vec<Option<String>>>,
}

/// A `GUILD_MEMBER_UPDATE` payload. Fields left unset by the server keep
/// their previous value in the state store.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberUpdateEvent {
    pub guild_id: GuildId,
    pub user: User,
    #[serde(default)]
    pub roles: Option<Vec<RoleId>>,
    #[serde(default)]
    pub nick: Option<String>,
}

/// A `PRESENCE_UPDATE` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceUpdateEvent {
    #[serde(flatten)]
    pub presence: Presence,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub roles: Option<Vec<RoleId>>,
    #[serde(default)]
    pub nick: Option<String>,
}

/// A `MESSAGE_UPDATE` payload; any field but the ids may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageUpdateEvent {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub edited_timestamp: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub mention_everyone: Option<bool>,
    #[serde(default)]
    pub mentions: Option<Vec<User>>,
    #[serde(default)]
    pub mention_roles: Option<Vec<RoleId>>,
    #[serde(default)]
    pub embeds: Option<Vec<Value>>,
}

/// Event dispatched over a gateway connection, together with its name tag.
#[derive(Debug, Clone)]
pub enum Event {
    /// The first event of a session, containing the initial state.
    ///
    /// May also be received again later if the gateway chose to start a
    /// fresh session during a reconnect.
    Ready(ReadyEvent),
    /// The connection successfully resumed after a disconnect.
    Resumed {
        /// The trace of gateway servers involved in serving this connection.
        trace: Option<Vec<Option<String>>>,
    },

    ChannelCreate(Channel),
    ChannelUpdate(Channel),
    ChannelDelete(Channel),
    ChannelPinsUpdate {
        channel_id: ChannelId,
        last_pin_timestamp: Option<String>,
    },

    GuildCreate(PossibleGuild<LiveGuild>),
    GuildUpdate(Guild),
    GuildDelete(PossibleGuild<Guild>),
    GuildBanAdd(GuildId, User),
    GuildBanRemove(GuildId, User),
    GuildEmojisUpdate(GuildId, Vec<Emoji>),
    GuildIntegrationsUpdate(GuildId),
    GuildMemberAdd(GuildId, Member),
    GuildMemberRemove(GuildId, User),
    GuildMemberUpdate(MemberUpdateEvent),
    GuildMembersChunk(GuildId, Vec<Member>),
    GuildRoleCreate(GuildId, Role),
    GuildRoleUpdate(GuildId, Role),
    GuildRoleDelete(GuildId, RoleId),

    MessageCreate(Message),
    MessageUpdate(MessageUpdateEvent),
    MessageDelete {
        channel_id: ChannelId,
        message_id: MessageId,
    },
    MessageDeleteBulk {
        channel_id: ChannelId,
        ids: Vec<MessageId>,
    },

    PresenceUpdate(PresenceUpdateEvent),
    TypingStart {
        channel_id: ChannelId,
        user_id: UserId,
        timestamp: u64,
    },
    UserUpdate(User),

    /// An event this library does not recognize, forwarded unchanged.
    Unknown(String, Value),
}

/// The name tag of an [`Event`], used to register handlers.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum EventKind {
    Ready,
    Resumed,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    ChannelPinsUpdate,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildBanAdd,
    GuildBanRemove,
    GuildEmojisUpdate,
    GuildIntegrationsUpdate,
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    GuildMembersChunk,
    GuildRoleCreate,
    GuildRoleUpdate,
    GuildRoleDelete,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    MessageDeleteBulk,
    PresenceUpdate,
    TypingStart,
    UserUpdate,
    Unknown,
}

impl Event {
    /// The name tag of this event.
    pub fn kind(&self) -> EventKind {
        match *self {
            Event::Ready(_) => EventKind::Ready,
            Event::Resumed { .. } => EventKind::Resumed,
            Event::ChannelCreate(_) => EventKind::ChannelCreate,
            Event::ChannelUpdate(_) => EventKind::ChannelUpdate,
            Event::ChannelDelete(_) => EventKind::ChannelDelete,
            Event::ChannelPinsUpdate { .. } => EventKind::ChannelPinsUpdate,
            Event::GuildCreate(_) => EventKind::GuildCreate,
            Event::GuildUpdate(_) => EventKind::GuildUpdate,
            Event::GuildDelete(_) => EventKind::GuildDelete,
            Event::GuildBanAdd(..) => EventKind::GuildBanAdd,
            Event::GuildBanRemove(..) => EventKind::GuildBanRemove,
            Event::GuildEmojisUpdate(..) => EventKind::GuildEmojisUpdate,
            Event::GuildIntegrationsUpdate(_) => EventKind::GuildIntegrationsUpdate,
            Event::GuildMemberAdd(..) => EventKind::GuildMemberAdd,
            Event::GuildMemberRemove(..) => EventKind::GuildMemberRemove,
            Event::GuildMemberUpdate(_) => EventKind::GuildMemberUpdate,
            Event::GuildMembersChunk(..) => EventKind::GuildMembersChunk,
            Event::GuildRoleCreate(..) => EventKind::GuildRoleCreate,
            Event::GuildRoleUpdate(..) => EventKind::GuildRoleUpdate,
            Event::GuildRoleDelete(..) => EventKind::GuildRoleDelete,
            Event::MessageCreate(_) => EventKind::MessageCreate,
            Event::MessageUpdate(_) => EventKind::MessageUpdate,
            Event::MessageDelete { .. } => EventKind::MessageDelete,
            Event::MessageDeleteBulk { .. } => EventKind::MessageDeleteBulk,
            Event::PresenceUpdate(_) => EventKind::PresenceUpdate,
            Event::TypingStart { .. } => EventKind::TypingStart,
            Event::UserUpdate(_) => EventKind::UserUpdate,
            Event::Unknown(..) => EventKind::Unknown,
        }
    }

    /// Decode a dispatch payload from its name tag and `d` value.
    ///
    /// Unrecognized names are logged and preserved as [`Event::Unknown`].
    pub fn decode(kind: &str, value: Value) -> Result<Event> {
        #[derive(Deserialize)]
        struct Trace {
            #[serde(rename = "_trace", default)]
            trace: Option<Vec<Option<String>>>,
        }

        #[derive(Deserialize)]
        struct WithGuild<T> {
            guild_id: GuildId,
            #[serde(flatten)]
            rest: T,
        }

        #[derive(Deserialize)]
        struct RoleHolder {
            guild_id: GuildId,
            role: Role,
        }

        Ok(match kind {
            "READY" => Event::Ready(from_value(value)?),
            "RESUMED" => {
                let t: Trace = from_value(value)?;
                Event::Resumed { trace: t.trace }
            }

            "CHANNEL_CREATE" => Event::ChannelCreate(Channel::decode(value)?),
            "CHANNEL_UPDATE" => Event::ChannelUpdate(Channel::decode(value)?),
            "CHANNEL_DELETE" => Event::ChannelDelete(Channel::decode(value)?),
            "CHANNEL_PINS_UPDATE" => {
                #[derive(Deserialize)]
                struct Pins {
                    channel_id: ChannelId,
                    #[serde(default)]
                    last_pin_timestamp: Option<String>,
                }
                let p: Pins = from_value(value)?;
                Event::ChannelPinsUpdate {
                    channel_id: p.channel_id,
                    last_pin_timestamp: p.last_pin_timestamp,
                }
            }

            "GUILD_CREATE" => Event::GuildCreate(from_value(value)?),
            "GUILD_UPDATE" => Event::GuildUpdate(from_value(value)?),
            "GUILD_DELETE" => Event::GuildDelete(from_value(value)?),
            "GUILD_BAN_ADD" => {
                let e: WithGuild<BanTarget> = from_value(value)?;
                Event::GuildBanAdd(e.guild_id, e.rest.user)
            }
            "GUILD_BAN_REMOVE" => {
                let e: WithGuild<BanTarget> = from_value(value)?;
                Event::GuildBanRemove(e.guild_id, e.rest.user)
            }
            "GUILD_EMOJIS_UPDATE" => {
                #[derive(Deserialize)]
                struct Emojis {
                    guild_id: GuildId,
                    emojis: Vec<Emoji>,
                }
                let e: Emojis = from_value(value)?;
                Event::GuildEmojisUpdate(e.guild_id, e.emojis)
            }
            "GUILD_INTEGRATIONS_UPDATE" => {
                #[derive(Deserialize)]
                struct Integrations {
                    guild_id: GuildId,
                }
                let e: Integrations = from_value(value)?;
                Event::GuildIntegrationsUpdate(e.guild_id)
            }
            "GUILD_MEMBER_ADD" => {
                let e: WithGuild<Member> = from_value(value)?;
                Event::GuildMemberAdd(e.guild_id, e.rest)
            }
            "GUILD_MEMBER_REMOVE" => {
                let e: WithGuild<BanTarget> = from_value(value)?;
                Event::GuildMemberRemove(e.guild_id, e.rest.user)
            }
            "GUILD_MEMBER_UPDATE" => Event::GuildMemberUpdate(from_value(value)?),
            "GUILD_MEMBERS_CHUNK" => {
                #[derive(Deserialize)]
                struct Chunk {
                    guild_id: GuildId,
                    members: Vec<Member>,
                }
                let e: Chunk = from_value(value)?;
                Event::GuildMembersChunk(e.guild_id, e.members)
            }
            "GUILD_ROLE_CREATE" => {
                let e: RoleHolder = from_value(value)?;
                Event::GuildRoleCreate(e.guild_id, e.role)
            }
            "GUILD_ROLE_UPDATE" => {
                let e: RoleHolder = from_value(value)?;
                Event::GuildRoleUpdate(e.guild_id, e.role)
            }
            "GUILD_ROLE_DELETE" => {
                #[derive(Deserialize)]
                struct RoleDelete {
                    guild_id: GuildId,
                    role_id: RoleId,
                }
                let e: RoleDelete = from_value(value)?;
                Event::GuildRoleDelete(e.guild_id, e.role_id)
            }

            "MESSAGE_CREATE" => Event::MessageCreate(from_value(value)?),
            "MESSAGE_UPDATE" => Event::MessageUpdate(from_value(value)?),
            "MESSAGE_DELETE" => {
                #[derive(Deserialize)]
                struct Delete {
                    channel_id: ChannelId,
                    id: MessageId,
                }
                let e: Delete = from_value(value)?;
                Event::MessageDelete {
                    channel_id: e.channel_id,
                    message_id: e.id,
                }
            }
            "MESSAGE_DELETE_BULK" => {
                #[derive(Deserialize)]
                struct BulkDelete {
                    channel_id: ChannelId,
                    ids: Vec<MessageId>,
                }
                let e: BulkDelete = from_value(value)?;
                Event::MessageDeleteBulk {
                    channel_id: e.channel_id,
                    ids: e.ids,
                }
            }

            "PRESENCE_UPDATE" => Event::PresenceUpdate(from_value(value)?),
            "TYPING_START" => {
                #[derive(Deserialize)]
                struct Typing {
                    channel_id: ChannelId,
                    user_id: UserId,
                    timestamp: u64,
                }
                let e: Typing = from_value(value)?;
                Event::TypingStart {
                    channel_id: e.channel_id,
                    user_id: e.user_id,
                    timestamp: e.timestamp,
                }
            }
            "USER_UPDATE" => Event::UserUpdate(from_value(value)?),

            other => {
                debug!("Unrecognized dispatch event {:?}", other);
                Event::Unknown(other.to_owned(), value)
            }
        })
    }
}

#[derive(Deserialize)]
struct BanTarget {
    user: User,
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(From::from)
}

/// A message received over the gateway, of any purpose, not just event
/// dispatching.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A named event was dispatched, with its sequence number.
    Dispatch(u64, Event),
    /// The gateway requests an immediate heartbeat.
    Heartbeat(Option<u64>),
    /// The gateway asks the client to reconnect.
    Reconnect,
    /// The current gateway session is invalid. Carries whether the server
    /// considers it resumable.
    InvalidSession(bool),
    /// The first message of a connection; carries the heartbeat interval in
    /// milliseconds.
    Hello(u64),
    /// Acknowledgement of a heartbeat sent by the client.
    HeartbeatAck,
}

impl GatewayEvent {
    /// Decode a gateway envelope from its JSON representation, dispatching
    /// on the `op` field.
    pub fn decode(value: Value) -> Result<GatewayEvent> {
        let op = value.get("op").and_then(Value::as_u64);

        Ok(match op {
            Some(0) => {
                let kind = match value.get("t").and_then(Value::as_str) {
                    Some(kind) => kind.to_owned(),
                    None => return Err(Error::Decode("Dispatch missing \"t\"", value)),
                };
                let seq = match value.get("s").and_then(Value::as_u64) {
                    Some(seq) => seq,
                    None => return Err(Error::Decode("Dispatch missing \"s\"", value)),
                };
                let data = value.get("d").cloned().unwrap_or(Value::Null);
                GatewayEvent::Dispatch(seq, Event::decode(&kind, data)?)
            }
            Some(1) => GatewayEvent::Heartbeat(value.get("d").and_then(Value::as_u64)),
            Some(7) => GatewayEvent::Reconnect,
            Some(9) => {
                GatewayEvent::InvalidSession(value.get("d").and_then(Value::as_bool).unwrap_or(false))
            }
            Some(10) => match value.pointer("/d/heartbeat_interval").and_then(Value::as_u64) {
                Some(interval) => GatewayEvent::Hello(interval),
                None => return Err(Error::Decode("Hello missing heartbeat_interval", value)),
            },
            Some(11) => GatewayEvent::HeartbeatAck,
            _ => return Err(Error::Decode("Unexpected opcode", value)),
        })
    }
}
