//! Session lifecycle: binding the REST client, gateway connection, state
//! mirror, and event dispatch together.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::connection::{Connection, ConnectionBuilder, GatewayHandle};
use crate::dispatch::{Context, EventHandlers, Handler};
use crate::model::{Event, EventKind};
use crate::state::State;
use crate::{Discord, Error, Result};

/// Configuration window passed to the setup callback of
/// [`Session::connect`].
///
/// Handlers registered here are in place before Identify is sent, so no
/// event of the session can be missed.
#[derive(Default)]
pub struct Setup {
    handlers: EventHandlers,
    compress: bool,
    large_threshold: Option<u64>,
    retry_rate_limits: bool,
}

impl Setup {
    /// Register a handler for one kind of event.
    pub fn on<F, Fut>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(Context, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers
            .insert(kind, Box::new(move |cx, ev| handler(cx, ev).boxed()) as Handler);
        self
    }

    /// Register the handler invoked for events that have no specific
    /// handler of their own.
    pub fn on_default<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers
            .set_fallback(Box::new(move |cx, ev| handler(cx, ev).boxed()) as Handler);
        self
    }

    /// Ask the gateway for zlib-compressed payloads.
    pub fn compression(&mut self, compress: bool) -> &mut Self {
        self.compress = compress;
        self
    }

    /// Tune the member count past which offline members are withheld.
    pub fn large_threshold(&mut self, threshold: u64) -> &mut Self {
        self.large_threshold = Some(threshold);
        self
    }

    /// Automatically re-queue rate-limited REST requests once, after the
    /// advertised delay, instead of surfacing the refusal.
    pub fn retry_rate_limits(&mut self, retry: bool) -> &mut Self {
        self.retry_rate_limits = retry;
        self
    }
}

/// A live, authenticated session: the gateway connection and its state
/// mirror, plus the REST client sharing the credential.
///
/// Cloning a `Session` is cheap and yields another handle onto the same
/// session.
#[derive(Clone)]
pub struct Session {
    rest: Arc<Discord>,
    state: Arc<RwLock<State>>,
    gateway: GatewayHandle,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    closed: Arc<AtomicBool>,
}

impl Session {
    /// Open a session for a bot token.
    ///
    /// The `setup` callback runs before Identify is sent; use it to
    /// register event handlers and tune connection options. Returns once
    /// the websocket handshake has completed; the `READY` event is
    /// delivered to handlers like any other.
    pub async fn connect<F>(token: &str, setup: F) -> Result<Session>
    where
        F: FnOnce(&mut Setup),
    {
        Session::connect_inner(token, setup, None).await
    }

    /// Open a session for one shard of a sharded bot.
    ///
    /// The `shard_id` is indexed at 0 while `total_shards` is indexed at 1.
    pub async fn connect_sharded<F>(
        token: &str,
        shard_id: u16,
        total_shards: u16,
        setup: F,
    ) -> Result<Session>
    where
        F: FnOnce(&mut Setup),
    {
        Session::connect_inner(token, setup, Some([shard_id, total_shards])).await
    }

    async fn connect_inner<F>(token: &str, setup: F, shard: Option<[u16; 2]>) -> Result<Session>
    where
        F: FnOnce(&mut Setup),
    {
        let mut options = Setup::default();
        setup(&mut options);

        let rest = Arc::new(
            Discord::from_bot_token(token).retry_rate_limits(options.retry_rate_limits),
        );

        let mut builder = ConnectionBuilder::new(rest.clone(), token);
        builder.compression(options.compress);
        if let Some(threshold) = options.large_threshold {
            builder.large_threshold(threshold);
        }
        if let Some([id, count]) = shard {
            builder.sharding(id, count);
        }

        let connection = builder.connect().await?;
        let gateway = connection.handle();
        let state = Arc::new(RwLock::new(State::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let cx = Context {
            rest: rest.clone(),
            state: state.clone(),
            gateway: gateway.clone(),
        };
        tokio::spawn(dispatch_loop(
            connection,
            options.handlers,
            cx,
            shutdown_rx,
            closed.clone(),
        ));

        Ok(Session {
            rest,
            state,
            gateway,
            shutdown: Arc::new(Mutex::new(Some(shutdown_tx))),
            closed,
        })
    }

    /// The REST client bound to this session's credential.
    pub fn rest(&self) -> Result<Arc<Discord>> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(self.rest.clone())
    }

    /// A handle for sending gateway commands (presence updates, member
    /// chunk requests).
    pub fn gateway(&self) -> Result<GatewayHandle> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(self.gateway.clone())
    }

    /// The session's state mirror. Reads are permitted from any task.
    pub fn state(&self) -> &Arc<RwLock<State>> {
        &self.state
    }

    /// Whether the session has been disconnected, by request or by a
    /// terminal gateway failure.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cleanly shut the session down: close the websocket with code 1000,
    /// stop the heartbeat, and end event dispatch.
    ///
    /// Operations attempted afterwards return
    /// [`SessionClosed`][Error::SessionClosed].
    pub fn disconnect(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }
        if let Some(tx) = self
            .shutdown
            .lock()
            .expect("Shutdown channel poisoned")
            .take()
        {
            let _ = tx.send(());
        }
        info!("Session disconnected");
        Ok(())
    }
}

/// Reads events off the connection and feeds them, serially, through the
/// built-in state updates and then the user handlers.
async fn dispatch_loop(
    mut connection: Connection,
    handlers: EventHandlers,
    cx: Context,
    mut shutdown: oneshot::Receiver<()>,
    closed: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                connection.shutdown();
                break;
            }
            event = connection.recv_event() => match event {
                Ok(event) => handlers.dispatch(&cx, event).await,
                Err(err) => {
                    error!("Session ended: {}", err);
                    closed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
    }
}
