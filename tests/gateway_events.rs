//! Scripted gateway event sequences, fed through the envelope decoder and
//! the state store the same way the dispatch loop feeds them.

use discord_session::model::*;
use discord_session::State;
use serde_json::{json, Value};

/// A tiny stand-in for the dispatch loop: decode envelopes, track the
/// sequence high-water mark, apply dispatches to the state.
struct Harness {
    state: State,
    seq: Option<u64>,
}

impl Harness {
    fn new() -> Harness {
        Harness {
            state: State::new(),
            seq: None,
        }
    }

    fn feed(&mut self, envelope: Value) -> GatewayEvent {
        let event = GatewayEvent::decode(envelope).expect("envelope must decode");
        if let GatewayEvent::Dispatch(seq, ref dispatched) = event {
            self.seq = Some(self.seq.map_or(seq, |prev| prev.max(seq)));
            self.state.update(dispatched);
        }
        event
    }
}

#[test]
fn cold_connect_reaches_ready() {
    let mut bot = Harness::new();

    let hello = bot.feed(json!({"op": 10, "d": {"heartbeat_interval": 41250}}));
    assert!(matches!(hello, GatewayEvent::Hello(41250)));

    bot.feed(json!({
        "op": 0,
        "t": "READY",
        "s": 1,
        "d": {
            "v": 6,
            "session_id": "abc",
            "user": {"id": "1", "username": "bot", "discriminator": "0001", "avatar": null},
            "guilds": [{"id": "301", "unavailable": true}],
            "private_channels": [],
        },
    }));

    assert_eq!(bot.state.user().unwrap().id, UserId(1));
    assert_eq!(bot.state.session_id(), Some("abc"));
    assert!(bot.state.unavailable_guilds().contains(&GuildId(301)));
    assert_eq!(bot.seq, Some(1));
}

#[test]
fn sequence_is_the_high_water_mark() {
    let mut bot = Harness::new();
    for (s, name) in [(3u64, "TYPING_START"), (5, "TYPING_START"), (4, "TYPING_START")] {
        bot.feed(json!({
            "op": 0,
            "t": name,
            "s": s,
            "d": {"channel_id": "401", "user_id": "7", "timestamp": 0},
        }));
    }
    assert_eq!(bot.seq, Some(5));
}

#[test]
fn guild_lifecycle_is_tracked_between_create_and_delete() {
    let mut bot = Harness::new();

    bot.feed(json!({
        "op": 0, "t": "GUILD_CREATE", "s": 2,
        "d": {
            "id": "301",
            "name": "Test",
            "icon": null,
            "owner_id": "2",
            "channels": [{"id": "401", "name": "general", "type": 0}],
            "members": [],
            "roles": [],
        },
    }));
    assert!(bot.state.guild(GuildId(301)).is_some());

    // Channels delivered inside the guild inherit its id.
    let guild = bot.state.guild(GuildId(301)).unwrap();
    assert_eq!(guild.channels[0].guild_id, Some(GuildId(301)));

    bot.feed(json!({
        "op": 0, "t": "GUILD_DELETE", "s": 3,
        "d": {"id": "301", "unavailable": false},
    }));
    assert!(bot.state.guild(GuildId(301)).is_none());
}

#[test]
fn dm_channels_are_mirrored_until_deleted() {
    let mut bot = Harness::new();

    bot.feed(json!({
        "op": 0, "t": "CHANNEL_CREATE", "s": 1,
        "d": {
            "id": "9",
            "type": 1,
            "recipients": [
                {"id": "3", "username": "pal", "discriminator": "0003", "avatar": null},
            ],
        },
    }));
    assert!(bot.state.private_channels().contains_key(&ChannelId(9)));
    let dm = &bot.state.private_channels()[&ChannelId(9)];
    assert_eq!(dm.kind, ChannelType::Dm);
    assert_eq!(dm.recipients.len(), 1);

    bot.feed(json!({
        "op": 0, "t": "CHANNEL_DELETE", "s": 2,
        "d": {"id": "9", "type": 1, "recipients": []},
    }));
    assert!(!bot.state.private_channels().contains_key(&ChannelId(9)));
}

#[test]
fn unknown_events_are_forwarded_with_name_and_payload() {
    let mut bot = Harness::new();
    let event = bot.feed(json!({
        "op": 0, "t": "GUILD_SCHEDULED_THING", "s": 8,
        "d": {"answer": 42},
    }));

    match event {
        GatewayEvent::Dispatch(8, Event::Unknown(name, payload)) => {
            assert_eq!(name, "GUILD_SCHEDULED_THING");
            assert_eq!(payload, json!({"answer": 42}));
        }
        other => panic!("expected unknown dispatch, got {:?}", other),
    }
}

#[test]
fn control_envelopes_decode_by_opcode() {
    assert!(matches!(
        GatewayEvent::decode(json!({"op": 1, "d": 12})).unwrap(),
        GatewayEvent::Heartbeat(Some(12))
    ));
    assert!(matches!(
        GatewayEvent::decode(json!({"op": 7, "d": null})).unwrap(),
        GatewayEvent::Reconnect
    ));
    assert!(matches!(
        GatewayEvent::decode(json!({"op": 9, "d": false})).unwrap(),
        GatewayEvent::InvalidSession(false)
    ));
    assert!(matches!(
        GatewayEvent::decode(json!({"op": 9, "d": true})).unwrap(),
        GatewayEvent::InvalidSession(true)
    ));
    assert!(matches!(
        GatewayEvent::decode(json!({"op": 11})).unwrap(),
        GatewayEvent::HeartbeatAck
    ));
    assert!(GatewayEvent::decode(json!({"op": 255})).is_err());
}

#[test]
fn resumed_restores_live_delivery_without_touching_state() {
    let mut bot = Harness::new();
    bot.feed(json!({
        "op": 0, "t": "READY", "s": 1,
        "d": {
            "v": 6,
            "session_id": "abc",
            "user": {"id": "1", "username": "bot", "discriminator": "0001", "avatar": null},
            "guilds": [],
            "private_channels": [],
        },
    }));

    let event = bot.feed(json!({
        "op": 0, "t": "RESUMED", "s": 2,
        "d": {"_trace": ["gateway-prd-main"]},
    }));
    assert!(matches!(
        event,
        GatewayEvent::Dispatch(2, Event::Resumed { .. })
    ));
    assert_eq!(bot.state.session_id(), Some("abc"));
    assert_eq!(bot.seq, Some(2));
}

#[test]
fn member_update_merges_only_named_fields() {
    let mut bot = Harness::new();
    bot.feed(json!({
        "op": 0, "t": "GUILD_CREATE", "s": 1,
        "d": {
            "id": "301",
            "name": "Test",
            "icon": null,
            "owner_id": "2",
            "channels": [],
            "roles": [],
            "members": [{
                "user": {"id": "7", "username": "seven", "discriminator": "7777", "avatar": null},
                "nick": "old",
                "roles": ["501"],
                "joined_at": "2017-01-01T00:00:00.000000+00:00",
                "mute": false,
                "deaf": false,
            }],
        },
    }));

    bot.feed(json!({
        "op": 0, "t": "GUILD_MEMBER_UPDATE", "s": 2,
        "d": {
            "guild_id": "301",
            "user": {"id": "7", "username": "seven", "discriminator": "7777", "avatar": null},
            "nick": "new",
        },
    }));

    let guild = bot.state.guild(GuildId(301)).unwrap();
    let member = guild.members.iter().find(|m| m.user.id == UserId(7)).unwrap();
    assert_eq!(member.nick.as_deref(), Some("new"));
    assert_eq!(member.roles, vec![RoleId(501)]);
}
