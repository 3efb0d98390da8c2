//! The persistent gateway connection and its control protocol.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::SinkExt;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, Interval};
use tracing::{debug, trace, warn};

use crate::model::{Event, Game, GatewayEvent, GuildId, OnlineStatus};
use crate::ratelimit::{SendWindow, GATEWAY_LIMIT_SEND, GATEWAY_PERIOD, STATUS_LIMIT_SEND};
use crate::transport::{self, EventStream, JsonSink};
use crate::{Discord, Error, Result};

/// The gateway protocol version spoken by this library.
pub const GATEWAY_VERSION: u64 = 6;

/// How long to wait for the gateway's Hello before tearing the socket down.
const HELLO_TIMEOUT: Duration = Duration::from_secs(15);

/// How many times to retry establishing a connection before giving up.
const RECONNECT_ATTEMPTS: u32 = 10;

/// The ceiling of the reconnect backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Close code sent when the client forces a reconnect it intends to resume.
const CLOSE_RESUME: u16 = 4000;

/// Numeric opcodes of the gateway control protocol.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum OpCode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    StatusUpdate = 3,
    VoiceStateUpdate = 4,
    VoiceServerPing = 5,
    Resume = 6,
    Reconnect = 7,
    RequestGuildMembers = 8,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

impl OpCode {
    pub fn num(self) -> u8 {
        self as u8
    }
}

/// Where a connection currently is in its lifecycle.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum ConnState {
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Resuming,
    Live,
}

/// Prepare a gateway connection before establishing it.
#[derive(Clone)]
pub struct ConnectionBuilder {
    rest: Arc<Discord>,
    token: String,
    shard: Option<[u16; 2]>,
    compress: bool,
    large_threshold: u64,
}

impl ConnectionBuilder {
    /// Prepare a connection authenticated by `token`, using `rest` for
    /// gateway discovery.
    pub fn new(rest: Arc<Discord>, token: &str) -> Self {
        ConnectionBuilder {
            rest,
            token: token.to_owned(),
            shard: None,
            compress: false,
            large_threshold: 50,
        }
    }

    /// Connect as a specific shard of `total_shards`.
    ///
    /// The `shard_id` is indexed at 0 while `total_shards` is indexed at 1.
    pub fn sharding(&mut self, shard_id: u16, total_shards: u16) -> &mut Self {
        self.shard = Some([shard_id, total_shards]);
        self
    }

    /// Whether to ask the gateway for zlib-compressed payloads.
    pub fn compression(&mut self, compress: bool) -> &mut Self {
        self.compress = compress;
        self
    }

    /// The member count past which the gateway stops sending offline
    /// members with a guild. Values outside 50..=250 are clamped.
    pub fn large_threshold(&mut self, threshold: u64) -> &mut Self {
        self.large_threshold = threshold;
        self
    }

    fn identify_envelope(&self) -> Value {
        let threshold = if (50..=250).contains(&self.large_threshold) {
            self.large_threshold
        } else {
            let clamped = self.large_threshold.clamp(50, 250);
            warn!(
                "large_threshold {} out of range, clamping to {}",
                self.large_threshold, clamped
            );
            clamped
        };

        let shard = match self.shard {
            None => [0, 1],
            Some([id, count]) if count >= 1 && id < count => [id, count],
            Some(bad) => {
                warn!("Invalid shard {:?}, correcting to [0, 1]", bad);
                [0, 1]
            }
        };

        json!({
            "op": OpCode::Identify.num(),
            "d": {
                "token": self.token,
                "properties": {
                    "$os": ::std::env::consts::OS,
                    "$browser": "discord-session",
                    "$device": "discord-session",
                    "$referrer": "",
                    "$referring_domain": "",
                },
                "compress": self.compress,
                "large_threshold": threshold,
                "shard": shard,
            }
        })
    }

    /// Establish the websocket connection and send Identify.
    ///
    /// The `READY` dispatch arrives through
    /// [`recv_event`][Connection::recv_event] once the gateway accepts the
    /// handshake.
    pub async fn connect(&self) -> Result<Connection> {
        let identify = self.identify_envelope();

        let base = self.rest.gateway_url().await?;
        let url = build_gateway_url(&base);
        let (sink, mut receiver) = transport::connect(&url).await?;

        let interval = await_hello(&mut receiver).await?;

        let instants = Arc::new(Mutex::new(HeartbeatTimes::default()));
        let (keepalive_channel, rx) = mpsc::unbounded_channel();
        tokio::spawn(keepalive(
            Duration::from_millis(interval),
            sink,
            rx,
            instants.clone(),
        ));

        let _ = keepalive_channel.send(Status::SendMessage(identify.clone()));

        Ok(Connection {
            receiver,
            keepalive_channel,
            rest: self.rest.clone(),
            token: self.token.clone(),
            identify,
            session_id: None,
            last_sequence: None,
            state: ConnState::Identifying,
            status_window: Arc::new(Mutex::new(SendWindow::new(
                STATUS_LIMIT_SEND,
                GATEWAY_PERIOD,
            ))),
            instants,
        })
    }
}

/// An active websocket connection to the Discord gateway.
///
/// Reading events with [`recv_event`][Self::recv_event] drives the control
/// protocol: heartbeats are acknowledged, dropped connections are resumed
/// or re-identified, and close codes that indicate a configuration problem
/// surface as errors.
pub struct Connection {
    /// Receiver of envelopes from the gateway.
    receiver: EventStream,
    /// Channel to the task owning the write half and the heartbeat timer.
    keepalive_channel: mpsc::UnboundedSender<Status>,
    rest: Arc<Discord>,
    token: String,
    /// The complete identify envelope used when logging in.
    identify: Value,
    /// The id of the current session, used to resume after a disconnect.
    session_id: Option<String>,
    /// The highest dispatch sequence number observed.
    last_sequence: Option<u64>,
    state: ConnState,
    status_window: Arc<Mutex<SendWindow>>,
    instants: Arc<Mutex<HeartbeatTimes>>,
}

impl Connection {
    /// The lifecycle state the connection is currently in.
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// The id assigned to this session by the gateway, once `READY` has
    /// been received.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The highest dispatch sequence number observed.
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// The time between the last heartbeat and its acknowledgement, if
    /// both have happened.
    pub fn latency(&self) -> Option<Duration> {
        let times = self.instants.lock().expect("Heartbeat times poisoned");
        match (times.sent, times.acked) {
            (Some(sent), Some(acked)) if acked >= sent => Some(acked - sent),
            _ => None,
        }
    }

    /// A cheap handle for sending gateway commands from other tasks.
    pub fn handle(&self) -> GatewayHandle {
        GatewayHandle {
            channel: self.keepalive_channel.clone(),
            status_window: self.status_window.clone(),
        }
    }

    /// Sets the active presence of the client, including game and/or
    /// status information.
    pub fn set_presence(&self, game: Option<Game>, status: OnlineStatus, afk: bool) {
        self.handle().set_presence(game, status, afk)
    }

    /// Set the client to be playing this game.
    pub fn set_game(&self, game: Option<Game>) {
        self.handle().set_game(game)
    }

    /// Requests member chunks for the given guilds, delivered as
    /// `GUILD_MEMBERS_CHUNK` dispatches.
    pub fn request_guild_members(&self, guilds: &[GuildId], query: Option<&str>, limit: u64) {
        self.handle().request_guild_members(guilds, query, limit)
    }

    /// Receive an event over the websocket, blocking until one is
    /// available.
    ///
    /// Recoverable failures are handled internally: the connection will
    /// resume or re-identify and keep delivering events. An error from this
    /// method is terminal for the session.
    pub async fn recv_event(&mut self) -> Result<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(GatewayEvent::Dispatch(seq, event)) => {
                    let (sequence, regressed) = advance_sequence(self.last_sequence, seq);
                    self.last_sequence = Some(sequence);
                    if regressed {
                        warn!(
                            "Sequence regressed (them {}, us {}); resuming",
                            seq, sequence
                        );
                        let _ = self.keepalive_channel.send(Status::Close(CLOSE_RESUME));
                        self.recover(true).await?;
                        continue;
                    }
                    let _ = self.keepalive_channel.send(Status::Sequence(seq));

                    match event {
                        Event::Ready(ref ready) => {
                            if ready.version != GATEWAY_VERSION {
                                warn!(
                                    "Got protocol version {} instead of {}",
                                    ready.version, GATEWAY_VERSION
                                );
                            }
                            self.session_id = Some(ready.session_id.clone());
                            self.state = ConnState::Live;
                        }
                        Event::Resumed { .. } => {
                            trace!("Resumed successfully");
                            self.state = ConnState::Live;
                        }
                        _ => {}
                    }

                    return Ok(event);
                }
                Ok(GatewayEvent::Heartbeat(_)) => {
                    debug!("Heartbeat requested by the gateway");
                    let map = json!({
                        "op": OpCode::Heartbeat.num(),
                        "d": self.last_sequence,
                    });
                    let _ = self.keepalive_channel.send(Status::SendMessage(map));
                }
                Ok(GatewayEvent::HeartbeatAck) => {
                    let _ = self.keepalive_channel.send(Status::Ack);
                }
                Ok(GatewayEvent::Hello(interval)) => {
                    debug!("Mysterious late-game hello: {}", interval);
                    let _ = self
                        .keepalive_channel
                        .send(Status::ChangeInterval(Duration::from_millis(interval)));
                }
                Ok(GatewayEvent::Reconnect) => {
                    debug!("Reconnect requested by the gateway");
                    let _ = self.keepalive_channel.send(Status::Close(CLOSE_RESUME));
                    self.recover(true).await?;
                }
                Ok(GatewayEvent::InvalidSession(_)) => {
                    debug!("Session invalidated, reidentifying");
                    self.session_id = None;
                    self.last_sequence = None;
                    self.state = ConnState::Identifying;

                    let delay = rand::thread_rng().gen_range(1_000..=5_000);
                    tokio::time::sleep(Duration::from_millis(delay)).await;

                    let _ = self
                        .keepalive_channel
                        .send(Status::SendMessage(self.identify.clone()));
                }
                Err(Error::Closed(code, reason)) => {
                    if let Some(fatal) = fatal_close(code) {
                        self.state = ConnState::Disconnected;
                        return Err(fatal);
                    }

                    warn!("Closure, reconnecting: {:?}: {}", code, reason);
                    if code == Some(4006) {
                        self.session_id = None;
                    }
                    if code == Some(4007) {
                        self.last_sequence = None;
                    }
                    let resume = self.session_id.is_some();
                    self.recover(resume).await?;
                }
                Err(Error::WebSocket(err)) => {
                    warn!("Websocket error, reconnecting: {:?}", err);
                    let resume = self.session_id.is_some();
                    self.recover(resume).await?;
                }
                Err(Error::Json(err)) => {
                    // One malformed payload must not poison the stream.
                    warn!("Malformed gateway payload: {}", err);
                }
                Err(Error::Decode(msg, value)) => {
                    warn!("Undecodable gateway payload ({}): {}", msg, value);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Cleanly shut down the websocket connection.
    pub fn shutdown(&mut self) {
        let _ = self.keepalive_channel.send(Status::Close(1000));
        self.state = ConnState::Disconnected;
    }

    /// Re-establish the connection, resuming the session when possible.
    async fn recover(&mut self, try_resume: bool) -> Result<()> {
        self.state = ConnState::Connecting;
        let mut delay = Duration::from_secs(1);

        for attempt in 0..RECONNECT_ATTEMPTS {
            if attempt > 0 {
                debug!("Backing off for {:?} before reconnecting", delay);
                tokio::time::sleep(delay).await;
                delay = ::std::cmp::min(delay * 2, MAX_BACKOFF);
            }
            if attempt == 2 {
                // The cached endpoint may have gone away; rediscover it.
                self.rest.forget_gateway_url();
            }

            let base = match self.rest.gateway_url().await {
                Ok(base) => base,
                Err(err) => {
                    debug!("Gateway discovery failed: {}", err);
                    continue;
                }
            };

            self.state = ConnState::AwaitingHello;
            let (sink, mut receiver) = match transport::connect(&build_gateway_url(&base)).await {
                Ok(halves) => halves,
                Err(err) => {
                    debug!("Reconnect attempt failed: {}", err);
                    continue;
                }
            };

            let interval = match await_hello(&mut receiver).await {
                Ok(interval) => interval,
                Err(err) => {
                    debug!("Handshake failed during reconnect: {}", err);
                    continue;
                }
            };

            self.receiver = receiver;
            let _ = self.keepalive_channel.send(Status::ChangeSender(sink));
            let _ = self
                .keepalive_channel
                .send(Status::ChangeInterval(Duration::from_millis(interval)));

            match self.session_id {
                Some(ref session_id) if try_resume => {
                    trace!("Resuming...");
                    let resume = json!({
                        "op": OpCode::Resume.num(),
                        "d": {
                            "session_id": session_id,
                            "seq": self.last_sequence,
                            "token": self.token,
                        }
                    });
                    let _ = self.keepalive_channel.send(Status::SendMessage(resume));
                    self.state = ConnState::Resuming;
                }
                _ => {
                    trace!("Reconnecting with a fresh identify...");
                    self.session_id = None;
                    self.last_sequence = None;
                    let _ = self
                        .keepalive_channel
                        .send(Status::SendMessage(self.identify.clone()));
                    self.state = ConnState::Identifying;
                }
            }
            return Ok(());
        }

        self.state = ConnState::Disconnected;
        Err(Error::Protocol("Failed to reconnect to the gateway"))
    }
}

/// Advance the stored sequence to `max(prev, seq)`. The second element
/// reports a regression, which is a protocol error forcing a resume.
fn advance_sequence(prev: Option<u64>, seq: u64) -> (u64, bool) {
    match prev {
        Some(prev) if seq < prev => (prev, true),
        Some(prev) => (seq.max(prev), false),
        None => (seq, false),
    }
}

/// Map terminal close codes onto the error that ends the session.
fn fatal_close(code: Option<u16>) -> Option<Error> {
    match code {
        Some(4004) => Some(Error::Auth("Gateway rejected the token")),
        Some(4010) => Some(Error::Shard("Gateway rejected the shard information")),
        Some(4011) => Some(Error::Shard("Bot requires sharding")),
        Some(4012) => Some(Error::Protocol("Invalid gateway API version")),
        Some(4013) => Some(Error::Protocol("Invalid intents")),
        Some(4014) => Some(Error::Protocol("Disallowed intents")),
        _ => None,
    }
}

/// A cloneable handle for sending commands over an active connection.
#[derive(Clone)]
pub struct GatewayHandle {
    channel: mpsc::UnboundedSender<Status>,
    status_window: Arc<Mutex<SendWindow>>,
}

impl GatewayHandle {
    /// A handle wired to nothing, for exercising dispatch without a
    /// connection.
    #[cfg(test)]
    pub(crate) fn detached() -> GatewayHandle {
        let (channel, _) = mpsc::unbounded_channel();
        GatewayHandle {
            channel,
            status_window: Arc::new(Mutex::new(SendWindow::new(
                STATUS_LIMIT_SEND,
                GATEWAY_PERIOD,
            ))),
        }
    }

    /// Sets the active presence of the client, including game and/or
    /// status information.
    ///
    /// `afk` will help Discord determine where to send notifications.
    /// Status updates beyond 5 per minute are dropped with a warning.
    pub fn set_presence(&self, game: Option<Game>, status: OnlineStatus, afk: bool) {
        if !self
            .status_window
            .lock()
            .expect("Status window poisoned")
            .acquire_or_drop("status update")
        {
            return;
        }

        let status = match status {
            OnlineStatus::Offline => OnlineStatus::Invisible,
            other => other,
        };
        let game = match game {
            Some(Game {
                kind: crate::model::GameType::Streaming,
                url: Some(url),
                name,
            }) => json!({ "type": crate::model::GameType::Streaming, "url": url, "name": name }),
            Some(game) => json!({ "name": game.name, "type": crate::model::GameType::Playing }),
            None => json!(null),
        };

        let update = json!({
            "op": OpCode::StatusUpdate.num(),
            "d": {
                "afk": afk,
                "since": 0,
                "status": status,
                "game": game,
            }
        });
        let _ = self.channel.send(Status::SendMessage(update));
    }

    /// Set the client to be playing this game, with defaults used for any
    /// extended information.
    pub fn set_game(&self, game: Option<Game>) {
        self.set_presence(game, OnlineStatus::Online, false)
    }

    /// Set the client to be playing the game with the given name.
    pub fn set_game_name(&self, name: String) {
        self.set_game(Some(Game::playing(name)))
    }

    /// Requests member chunks for the given guilds.
    ///
    /// The members arrive as `GUILD_MEMBERS_CHUNK` dispatches of up to 1000
    /// members each. Pass an empty `query` and a `limit` of 0 to request
    /// every member.
    pub fn request_guild_members(&self, guilds: &[GuildId], query: Option<&str>, limit: u64) {
        let msg = json!({
            "op": OpCode::RequestGuildMembers.num(),
            "d": {
                "guild_id": guilds,
                "query": query.unwrap_or(""),
                "limit": limit,
            }
        });
        let _ = self.channel.send(Status::SendMessage(msg));
    }
}

/// Messages handled by the task owning the write half of the socket.
enum Status {
    SendMessage(Value),
    Sequence(u64),
    ChangeInterval(Duration),
    ChangeSender(JsonSink),
    Ack,
    Close(u16),
}

#[derive(Default)]
struct HeartbeatTimes {
    sent: Option<Instant>,
    acked: Option<Instant>,
}

/// Owns the write half of the socket and the heartbeat timer.
///
/// Every scheduled tick sends exactly one heartbeat carrying the highest
/// sequence seen. If the previous heartbeat was never acknowledged, the
/// connection is closed instead so the read half can resume it. All
/// outgoing frames pass through the per-connection send window.
async fn keepalive(
    interval: Duration,
    mut sink: JsonSink,
    mut channel: mpsc::UnboundedReceiver<Status>,
    instants: Arc<Mutex<HeartbeatTimes>>,
) {
    let mut timer = jittered_timer(interval);
    let mut last_sequence: Option<u64> = None;
    let mut acked = true;
    let mut window = SendWindow::new(GATEWAY_LIMIT_SEND, GATEWAY_PERIOD);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if !acked {
                    warn!("Heartbeat was not acknowledged; closing connection");
                    let _ = sink.close(CLOSE_RESUME).await;
                    // Leave the flag set until a new sender arrives so the
                    // dead socket is only closed once.
                    acked = true;
                    continue;
                }

                if !window.acquire_or_drop("heartbeat") {
                    continue;
                }

                trace!("Sending heartbeat d: {:?}", last_sequence);
                let map = json!({
                    "op": OpCode::Heartbeat.num(),
                    "d": last_sequence,
                });
                match sink.send(map).await {
                    Ok(()) => {
                        acked = false;
                        instants.lock().expect("Heartbeat times poisoned").sent =
                            Some(Instant::now());
                    }
                    Err(e) => warn!("Error sending gateway keepalive: {:?}", e),
                }
            },
            status = channel.recv() => match status {
                None => break,
                Some(Status::SendMessage(value)) => {
                    if !window.acquire_or_drop("gateway message") {
                        continue;
                    }
                    if let Err(e) = sink.send(value).await {
                        warn!("Error sending gateway message: {:?}", e);
                    }
                }
                Some(Status::Sequence(seq)) => {
                    last_sequence = Some(last_sequence.map_or(seq, |prev| prev.max(seq)));
                }
                Some(Status::Ack) => {
                    acked = true;
                    instants.lock().expect("Heartbeat times poisoned").acked =
                        Some(Instant::now());
                }
                Some(Status::ChangeInterval(new_interval)) => {
                    timer = jittered_timer(new_interval);
                    acked = true;
                }
                Some(Status::ChangeSender(new_sink)) => {
                    sink = new_sink;
                    acked = true;
                    window = SendWindow::new(GATEWAY_LIMIT_SEND, GATEWAY_PERIOD);
                }
                Some(Status::Close(code)) => {
                    let _ = sink.close(code).await;
                }
            }
        }
    }
}

/// A heartbeat timer whose first tick is offset by a random fraction of
/// the interval.
fn jittered_timer(period: Duration) -> Interval {
    let first = Instant::now() + period.mul_f64(rand::random::<f64>());
    interval_at(first, period)
}

async fn await_hello(receiver: &mut EventStream) -> Result<u64> {
    let hello = match timeout(HELLO_TIMEOUT, receiver.recv()).await {
        Ok(result) => result?,
        Err(_) => return Err(Error::Protocol("Timed out waiting for Hello")),
    };

    match hello {
        GatewayEvent::Hello(interval) => Ok(interval),
        other => {
            debug!("Unexpected event: {:?}", other);
            Err(Error::Protocol("Expected Hello during handshake"))
        }
    }
}

#[inline]
fn build_gateway_url(base: &str) -> String {
    format!("{}/?v={}&encoding=json", base, GATEWAY_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(shard: Option<[u16; 2]>, threshold: u64) -> ConnectionBuilder {
        let mut b = ConnectionBuilder::new(Arc::new(Discord::from_bot_token("sekrit")), "sekrit");
        b.large_threshold(threshold);
        if let Some([id, count]) = shard {
            b.sharding(id, count);
        }
        b
    }

    #[test]
    fn identify_carries_the_fingerprint_fields() {
        let envelope = builder(None, 50).identify_envelope();
        assert_eq!(envelope["op"], 2);

        let d = &envelope["d"];
        assert_eq!(d["token"], "sekrit");
        assert_eq!(d["compress"], false);
        assert_eq!(d["large_threshold"], 50);
        assert_eq!(d["shard"], serde_json::json!([0, 1]));
        for key in ["$os", "$browser", "$device", "$referrer", "$referring_domain"] {
            assert!(d["properties"].get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn large_threshold_is_clamped() {
        assert_eq!(builder(None, 10).identify_envelope()["d"]["large_threshold"], 50);
        assert_eq!(builder(None, 900).identify_envelope()["d"]["large_threshold"], 250);
        assert_eq!(builder(None, 250).identify_envelope()["d"]["large_threshold"], 250);
    }

    #[test]
    fn invalid_shards_are_corrected() {
        assert_eq!(
            builder(Some([3, 2]), 50).identify_envelope()["d"]["shard"],
            serde_json::json!([0, 1])
        );
        assert_eq!(
            builder(Some([1, 0]), 50).identify_envelope()["d"]["shard"],
            serde_json::json!([0, 1])
        );
        assert_eq!(
            builder(Some([1, 4]), 50).identify_envelope()["d"]["shard"],
            serde_json::json!([1, 4])
        );
    }

    #[test]
    fn gateway_url_carries_version_and_encoding() {
        assert_eq!(
            build_gateway_url("wss://gateway.example"),
            "wss://gateway.example/?v=6&encoding=json"
        );
    }

    #[test]
    fn fatal_close_codes_end_the_session() {
        assert!(matches!(fatal_close(Some(4004)), Some(Error::Auth(_))));
        assert!(matches!(fatal_close(Some(4010)), Some(Error::Shard(_))));
        assert!(matches!(fatal_close(Some(4011)), Some(Error::Shard(_))));
        assert!(matches!(fatal_close(Some(4012)), Some(Error::Protocol(_))));
        assert!(matches!(fatal_close(Some(4014)), Some(Error::Protocol(_))));
        assert!(fatal_close(Some(1001)).is_none());
        assert!(fatal_close(None).is_none());
    }

    #[test]
    fn sequence_advances_to_the_maximum() {
        assert_eq!(advance_sequence(None, 1), (1, false));
        assert_eq!(advance_sequence(Some(1), 2), (2, false));
        assert_eq!(advance_sequence(Some(2), 2), (2, false));
        // A regression keeps the high-water mark and forces a resume.
        assert_eq!(advance_sequence(Some(5), 3), (5, true));
    }

    #[test]
    fn backoff_doubles_to_the_cap() {
        let mut delay = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(delay.as_secs());
            delay = ::std::cmp::min(delay * 2, MAX_BACKOFF);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }
}
