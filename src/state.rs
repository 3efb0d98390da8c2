//! An in-memory mirror of the entities described by gateway events.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::model::*;

/// Known state composed from received events.
///
/// The store is populated by the `READY` event of a connection and kept
/// current by [`update`][Self::update], which the session's dispatch loop
/// calls for every event before user handlers run. Mutations originate
/// only from there; reads are permitted from any context.
#[derive(Debug, Default)]
pub struct State {
    user: Option<CurrentUser>,
    session_id: Option<String>,
    guilds: BTreeMap<GuildId, LiveGuild>,
    unavailable_guilds: BTreeSet<GuildId>,
    private_channels: BTreeMap<ChannelId, PrivateChannel>,
    users: BTreeMap<UserId, User>,
}

impl State {
    /// Create an empty state, to be seeded by a `READY` event.
    pub fn new() -> State {
        State::default()
    }

    /// Information about the logged-in user, once `READY` has arrived.
    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// The id the gateway assigned to this session.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The available guilds, keyed by id.
    pub fn guilds(&self) -> &BTreeMap<GuildId, LiveGuild> {
        &self.guilds
    }

    /// Look up an available guild.
    pub fn guild(&self, id: GuildId) -> Option<&LiveGuild> {
        self.guilds.get(&id)
    }

    /// The guilds known to exist but currently unavailable.
    pub fn unavailable_guilds(&self) -> &BTreeSet<GuildId> {
        &self.unavailable_guilds
    }

    /// The open direct-message channels, keyed by id.
    pub fn private_channels(&self) -> &BTreeMap<ChannelId, PrivateChannel> {
        &self.private_channels
    }

    /// The session-wide de-duplicated user directory.
    pub fn users(&self) -> &BTreeMap<UserId, User> {
        &self.users
    }

    /// Look up a user in the session directory.
    pub fn find_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Look up a channel of any kind by id.
    pub fn find_channel(&self, id: ChannelId) -> Option<ChannelRef<'_>> {
        if let Some(private) = self.private_channels.get(&id) {
            return Some(ChannelRef::Private(private));
        }
        for guild in self.guilds.values() {
            if let Some(channel) = guild.channels.iter().find(|ch| ch.id == id) {
                return Some(ChannelRef::Guild(guild, channel));
            }
        }
        None
    }

    /// Update the state according to the changes described by the given
    /// event.
    ///
    /// Every recognized event either mutates state or is an intentional
    /// no-op; failures are logged, never propagated, so one odd payload
    /// cannot poison the feed.
    pub fn update(&mut self, event: &Event) {
        match *event {
            Event::Ready(ref ready) => {
                self.user = Some(ready.user.clone());
                self.session_id = Some(ready.session_id.clone());
                self.guilds.clear();
                self.unavailable_guilds.clear();
                self.private_channels.clear();

                for guild in &ready.guilds {
                    match *guild {
                        PossibleGuild::Online(ref live) => self.install_guild(live.clone()),
                        PossibleGuild::Offline { id, .. } => {
                            self.unavailable_guilds.insert(id);
                        }
                    }
                }
                for channel in &ready.private_channels {
                    for recipient in &channel.recipients {
                        self.note_user(recipient);
                    }
                    self.private_channels.insert(channel.id, channel.clone());
                }
            }
            Event::Resumed { ref trace } => {
                trace!("Session resumed: {:?}", trace);
            }

            Event::ChannelCreate(Channel::Private(ref channel)) => {
                for recipient in &channel.recipients {
                    self.note_user(recipient);
                }
                self.private_channels.insert(channel.id, channel.clone());
            }
            Event::ChannelCreate(Channel::Guild(ref channel)) => {
                self.upsert_guild_channel(channel);
            }
            Event::ChannelUpdate(Channel::Private(ref channel)) => {
                self.private_channels
                    .entry(channel.id)
                    .and_modify(|existing| existing.merge(channel))
                    .or_insert_with(|| channel.clone());
            }
            Event::ChannelUpdate(Channel::Guild(ref channel)) => {
                let merged = match channel.guild_id {
                    Some(guild_id) => self
                        .guilds
                        .get_mut(&guild_id)
                        .and_then(|g| g.channels.iter_mut().find(|ch| ch.id == channel.id))
                        .map(|existing| existing.merge(channel))
                        .is_some(),
                    None => self
                        .guilds
                        .values_mut()
                        .flat_map(|g| g.channels.iter_mut())
                        .find(|ch| ch.id == channel.id)
                        .map(|existing| existing.merge(channel))
                        .is_some(),
                };
                if !merged {
                    self.upsert_guild_channel(channel);
                }
            }
            Event::ChannelDelete(Channel::Private(ref channel)) => {
                self.private_channels.remove(&channel.id);
            }
            Event::ChannelDelete(Channel::Guild(ref channel)) => {
                for guild in self.guilds.values_mut() {
                    guild.channels.retain(|ch| ch.id != channel.id);
                }
            }
            Event::ChannelPinsUpdate { channel_id, .. } => {
                trace!("Pins updated in channel {}", channel_id);
            }

            Event::GuildCreate(PossibleGuild::Online(ref live)) => {
                self.install_guild(live.clone());
            }
            Event::GuildCreate(PossibleGuild::Offline { id, .. }) => {
                self.unavailable_guilds.insert(id);
            }
            Event::GuildUpdate(ref patch) => match self.guilds.get_mut(&patch.id) {
                Some(guild) => guild.merge(patch),
                None => warn!("Update for unknown guild {}", patch.id),
            },
            Event::GuildDelete(ref gone) => {
                let id = gone.id();
                self.guilds.remove(&id);
                match *gone {
                    PossibleGuild::Offline {
                        unavailable: true, ..
                    } => {
                        self.unavailable_guilds.insert(id);
                    }
                    _ => {
                        self.unavailable_guilds.remove(&id);
                    }
                }
            }
            Event::GuildBanAdd(guild_id, ref user) => {
                debug!("User {} banned from guild {}", user.id, guild_id);
            }
            Event::GuildBanRemove(guild_id, ref user) => {
                debug!("Ban of user {} lifted in guild {}", user.id, guild_id);
            }
            Event::GuildEmojisUpdate(guild_id, ref emojis) => {
                if let Some(guild) = self.guilds.get_mut(&guild_id) {
                    guild.emojis = emojis.clone();
                }
            }
            Event::GuildIntegrationsUpdate(guild_id) => {
                debug!("Integrations updated in guild {}", guild_id);
            }

            Event::GuildMemberAdd(guild_id, ref member) => {
                self.note_user(&member.user);
                if let Some(guild) = self.guilds.get_mut(&guild_id) {
                    guild.member_count += 1;
                    guild.members.push(member.clone());
                }
            }
            Event::GuildMemberRemove(guild_id, ref user) => {
                if let Some(guild) = self.guilds.get_mut(&guild_id) {
                    let before = guild.members.len();
                    guild.members.retain(|m| m.user.id != user.id);
                    if guild.members.len() < before {
                        guild.member_count = guild.member_count.saturating_sub(1);
                    }
                }
            }
            Event::GuildMemberUpdate(ref update) => {
                self.note_user(&update.user);
                match self
                    .guilds
                    .get_mut(&update.guild_id)
                    .and_then(|g| g.members.iter_mut().find(|m| m.user.id == update.user.id))
                {
                    Some(member) => {
                        member.user = update.user.clone();
                        if let Some(ref roles) = update.roles {
                            member.roles = roles.clone();
                        }
                        if let Some(ref nick) = update.nick {
                            member.nick = Some(nick.clone());
                        }
                    }
                    None => warn!(
                        "Update for unknown member {} of guild {}",
                        update.user.id, update.guild_id
                    ),
                }
            }
            Event::GuildMembersChunk(guild_id, ref members) => {
                debug!("Received {} members for guild {}", members.len(), guild_id);
            }

            Event::GuildRoleCreate(guild_id, ref role)
            | Event::GuildRoleUpdate(guild_id, ref role) => {
                if let Some(guild) = self.guilds.get_mut(&guild_id) {
                    match guild.roles.iter_mut().find(|r| r.id == role.id) {
                        Some(existing) => *existing = role.clone(),
                        None => guild.roles.push(role.clone()),
                    }
                }
            }
            Event::GuildRoleDelete(guild_id, role_id) => {
                if let Some(guild) = self.guilds.get_mut(&guild_id) {
                    guild.roles.retain(|r| r.id != role_id);
                }
            }

            // Messages are not cached.
            Event::MessageCreate(ref message) => {
                trace!("Message {} in channel {}", message.id, message.channel_id);
            }
            Event::MessageUpdate(ref update) => {
                trace!("Message {} edited in channel {}", update.id, update.channel_id);
            }
            Event::MessageDelete {
                channel_id,
                message_id,
            } => {
                trace!("Message {} deleted in channel {}", message_id, channel_id);
            }
            Event::MessageDeleteBulk {
                channel_id,
                ref ids,
            } => {
                trace!("{} messages deleted in channel {}", ids.len(), channel_id);
            }

            Event::PresenceUpdate(ref update) => {
                self.apply_presence(
                    &update.presence,
                    update.guild_id,
                    update.roles.as_ref(),
                    update.nick.as_ref(),
                );
            }
            Event::TypingStart {
                channel_id,
                user_id,
                ..
            } => {
                trace!("User {} typing in channel {}", user_id, channel_id);
            }
            Event::UserUpdate(ref user) => {
                if let Some(ref mut current) = self.user {
                    if current.id == user.id {
                        current.username = user.name.clone();
                        current.discriminator = user.discriminator;
                        current.avatar = user.avatar.clone();
                    }
                }
                self.note_user(user);
            }

            Event::Unknown(ref name, _) => {
                debug!("No state update for event {:?}", name);
            }
        }
    }

    /// Record a fully-specified user into the session directory, merging
    /// over any previous entry while keeping its last observed presence.
    fn note_user(&mut self, user: &User) {
        match self.users.get_mut(&user.id) {
            Some(existing) => {
                existing.name = user.name.clone();
                existing.discriminator = user.discriminator;
                existing.avatar = user.avatar.clone();
                existing.bot = user.bot;
                if user.status.is_some() {
                    existing.status = user.status;
                }
                if user.game.is_some() {
                    existing.game = user.game.clone();
                }
            }
            None => {
                self.users.insert(user.id, user.clone());
            }
        }
    }

    fn install_guild(&mut self, mut live: LiveGuild) {
        for channel in &mut live.channels {
            channel.guild_id.get_or_insert(live.id);
        }
        for member in &live.members {
            self.note_user(&member.user);
        }
        for presence in &live.presences {
            self.apply_presence(presence, None, None, None);
        }
        live.presences.clear();

        self.unavailable_guilds.remove(&live.id);
        self.guilds.insert(live.id, live);
    }

    fn upsert_guild_channel(&mut self, channel: &GuildChannel) {
        let guild_id = match channel.guild_id {
            Some(id) => id,
            None => {
                warn!("Guild channel {} carries no guild id", channel.id);
                return;
            }
        };
        match self.guilds.get_mut(&guild_id) {
            Some(guild) => {
                match guild.channels.iter_mut().find(|ch| ch.id == channel.id) {
                    Some(existing) => *existing = channel.clone(),
                    None => guild.channels.push(channel.clone()),
                }
            }
            None => warn!("Channel {} belongs to unknown guild {}", channel.id, guild_id),
        }
    }

    fn apply_presence(
        &mut self,
        presence: &Presence,
        guild_id: Option<GuildId>,
        roles: Option<&Vec<RoleId>>,
        nick: Option<&String>,
    ) {
        let partial = &presence.user;

        match self.users.get_mut(&partial.id) {
            Some(user) => {
                if let Some(ref name) = partial.username {
                    user.name = name.clone();
                }
                if let Some(discriminator) = partial.discriminator {
                    user.discriminator = discriminator;
                }
                if let Some(ref avatar) = partial.avatar {
                    user.avatar = Some(avatar.clone());
                }
                if let Some(bot) = partial.bot {
                    user.bot = bot;
                }
                user.status = Some(presence.status);
                user.game = presence.game.clone();
            }
            None => match (partial.username.clone(), partial.discriminator) {
                (Some(name), Some(discriminator)) => {
                    self.users.insert(
                        partial.id,
                        User {
                            id: partial.id,
                            name,
                            discriminator,
                            avatar: partial.avatar.clone(),
                            bot: partial.bot.unwrap_or(false),
                            status: Some(presence.status),
                            game: presence.game.clone(),
                        },
                    );
                }
                _ => debug!("Presence for unknown user {}", partial.id),
            },
        }

        if let Some(guild_id) = guild_id {
            if let Some(member) = self
                .guilds
                .get_mut(&guild_id)
                .and_then(|g| g.members.iter_mut().find(|m| m.user.id == partial.id))
            {
                if let Some(roles) = roles {
                    member.roles = roles.clone();
                }
                if let Some(nick) = nick {
                    member.nick = Some(nick.clone());
                }
            }
        }
    }
}

/// A reference to a channel of any kind inside a [`State`].
#[derive(Debug, Clone, Copy)]
pub enum ChannelRef<'a> {
    /// A channel and the guild it belongs to
    Guild(&'a LiveGuild, &'a GuildChannel),
    /// A direct-message channel
    Private(&'a PrivateChannel),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, d: serde_json::Value) -> Event {
        Event::decode(kind, d).expect("fixture must decode")
    }

    fn ready_state() -> State {
        let mut state = State::new();
        state.update(&event(
            "READY",
            json!({
                "v": 6,
                "user": {"id": "1", "username": "self", "discriminator": "0001", "avatar": null},
                "session_id": "abc",
                "guilds": [{"id": "301", "unavailable": true}],
                "private_channels": [],
            }),
        ));
        state
    }

    fn guild_create() -> Event {
        event(
            "GUILD_CREATE",
            json!({
                "id": "301",
                "name": "Test Guild",
                "icon": null,
                "owner_id": "2",
                "members": [{
                    "user": {"id": "7", "username": "seven", "discriminator": "7777", "avatar": null},
                    "nick": "old",
                    "roles": ["501"],
                    "joined_at": "2017-01-01T00:00:00.000000+00:00",
                    "mute": false,
                    "deaf": false,
                }],
                "channels": [{
                    "id": "401", "name": "general", "type": 0, "position": 0,
                }],
                "roles": [{
                    "id": "501", "name": "everyone", "permissions": 104324161,
                }],
                "presences": [{
                    "user": {"id": "7"},
                    "status": "online",
                    "game": {"name": "Zork"},
                }],
            }),
        )
    }

    #[test]
    fn ready_seeds_the_session() {
        let state = ready_state();
        assert_eq!(state.user().unwrap().id, UserId(1));
        assert_eq!(state.session_id(), Some("abc"));
        assert!(state.guilds().is_empty());
        assert!(state.unavailable_guilds().contains(&GuildId(301)));
    }

    #[test]
    fn guilds_live_between_create_and_delete() {
        let mut state = ready_state();

        state.update(&guild_create());
        assert!(state.guild(GuildId(301)).is_some());
        assert!(!state.unavailable_guilds().contains(&GuildId(301)));

        state.update(&event("GUILD_DELETE", json!({"id": "301"})));
        assert!(state.guild(GuildId(301)).is_none());
    }

    #[test]
    fn guild_create_accretes_users_and_replays_presences() {
        let mut state = ready_state();
        state.update(&guild_create());

        let user = state.find_user(UserId(7)).expect("user recorded");
        assert_eq!(user.name, "seven");
        assert_eq!(user.status, Some(OnlineStatus::Online));
        assert_eq!(user.game.as_ref().unwrap().name, "Zork");

        // Presences are replayed, not retained on the guild.
        assert!(state.guild(GuildId(301)).unwrap().presences.is_empty());
    }

    #[test]
    fn dm_channels_live_between_create_and_delete() {
        let mut state = ready_state();
        let dm = json!({
            "id": "9",
            "type": 1,
            "recipients": [{"id": "3", "username": "pal", "discriminator": "0003", "avatar": null}],
        });

        state.update(&event("CHANNEL_CREATE", dm.clone()));
        assert!(state.private_channels().contains_key(&ChannelId(9)));
        assert!(state.find_user(UserId(3)).is_some());

        state.update(&event("CHANNEL_DELETE", dm));
        assert!(!state.private_channels().contains_key(&ChannelId(9)));

        // Deleting again is a no-op.
        state.update(&event(
            "CHANNEL_DELETE",
            json!({"id": "9", "type": 1, "recipients": []}),
        ));
    }

    #[test]
    fn role_update_merges_in_place() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "GUILD_ROLE_UPDATE",
            json!({
                "guild_id": "301",
                "role": {"id": "501", "name": "renamed", "permissions": 8, "hoist": true},
            }),
        ));

        let guild = state.guild(GuildId(301)).unwrap();
        let matching: Vec<_> = guild.roles.iter().filter(|r| r.id == RoleId(501)).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].name, "renamed");
        assert!(matching[0].hoist);
    }

    #[test]
    fn member_update_preserves_unnamed_fields() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "GUILD_MEMBER_UPDATE",
            json!({
                "guild_id": "301",
                "user": {"id": "7", "username": "seven", "discriminator": "7777", "avatar": null},
                "nick": "new",
            }),
        ));

        let guild = state.guild(GuildId(301)).unwrap();
        let member = guild.members.iter().find(|m| m.user.id == UserId(7)).unwrap();
        assert_eq!(member.nick.as_deref(), Some("new"));
        assert_eq!(member.roles, vec![RoleId(501)]);
    }

    #[test]
    fn member_add_and_remove_track_the_count() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "GUILD_MEMBER_ADD",
            json!({
                "guild_id": "301",
                "user": {"id": "8", "username": "eight", "discriminator": "0008", "avatar": null},
                "roles": [],
                "joined_at": "2017-02-01T00:00:00.000000+00:00",
                "mute": false,
                "deaf": false,
            }),
        ));
        assert_eq!(state.guild(GuildId(301)).unwrap().members.len(), 2);

        state.update(&event(
            "GUILD_MEMBER_REMOVE",
            json!({
                "guild_id": "301",
                "user": {"id": "8", "username": "eight", "discriminator": "0008", "avatar": null},
            }),
        ));
        let guild = state.guild(GuildId(301)).unwrap();
        assert_eq!(guild.members.len(), 1);
        assert!(guild.members.iter().all(|m| m.user.id != UserId(8)));
    }

    #[test]
    fn presence_update_merges_member_fields_when_guild_is_named() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "PRESENCE_UPDATE",
            json!({
                "guild_id": "301",
                "user": {"id": "7"},
                "status": "idle",
                "roles": ["501"],
                "nick": "dozing",
            }),
        ));

        assert_eq!(
            state.find_user(UserId(7)).unwrap().status,
            Some(OnlineStatus::Idle)
        );
        let guild = state.guild(GuildId(301)).unwrap();
        let member = guild.members.iter().find(|m| m.user.id == UserId(7)).unwrap();
        assert_eq!(member.nick.as_deref(), Some("dozing"));
    }

    #[test]
    fn channel_update_keeps_list_order() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "CHANNEL_CREATE",
            json!({"id": "402", "guild_id": "301", "name": "second", "type": 0}),
        ));
        state.update(&event(
            "CHANNEL_UPDATE",
            json!({"id": "401", "guild_id": "301", "name": "renamed", "type": 0}),
        ));

        let guild = state.guild(GuildId(301)).unwrap();
        let names: Vec<_> = guild.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["renamed", "second"]);
    }

    #[test]
    fn channel_update_merges_without_dropping_fields() {
        let mut state = ready_state();
        state.update(&guild_create());

        state.update(&event(
            "CHANNEL_UPDATE",
            json!({
                "id": "401", "guild_id": "301", "name": "general", "type": 0,
                "topic": "rules go here",
            }),
        ));
        // A later update that leaves the topic unset keeps the old one.
        state.update(&event(
            "CHANNEL_UPDATE",
            json!({"id": "401", "guild_id": "301", "name": "renamed", "type": 0}),
        ));

        let guild = state.guild(GuildId(301)).unwrap();
        let channel = guild
            .channels
            .iter()
            .find(|c| c.id == ChannelId(401))
            .unwrap();
        assert_eq!(channel.name, "renamed");
        assert_eq!(channel.topic.as_deref(), Some("rules go here"));
    }

    #[test]
    fn messages_are_not_cached() {
        let mut state = ready_state();
        state.update(&event(
            "MESSAGE_CREATE",
            json!({
                "id": "101",
                "channel_id": "401",
                "author": {"id": "7", "username": "seven", "discriminator": "7777", "avatar": null},
                "content": "hello",
                "timestamp": "2017-01-01T00:00:00.000000+00:00",
            }),
        ));
        // Message authors do not accrete into the directory either; only
        // member, recipient, and presence payloads do.
        assert!(state.find_user(UserId(7)).is_none());
    }
}
