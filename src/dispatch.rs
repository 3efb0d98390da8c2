//! Fan-out of gateway events to registered handlers.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::error;

use crate::connection::GatewayHandle;
use crate::model::{Event, EventKind};
use crate::state::State;
use crate::Discord;

/// Capabilities handed to every user event handler: the REST client, the
/// session's state mirror, and a handle for gateway commands.
#[derive(Clone)]
pub struct Context {
    pub rest: Arc<Discord>,
    pub state: Arc<RwLock<State>>,
    pub gateway: GatewayHandle,
}

/// A boxed user event handler.
pub type Handler = Box<dyn Fn(Context, Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// The per-session registry of user event handlers.
#[derive(Default)]
pub(crate) struct EventHandlers {
    by_kind: HashMap<EventKind, Handler>,
    fallback: Option<Handler>,
}

impl EventHandlers {
    pub fn insert(&mut self, kind: EventKind, handler: Handler) {
        self.by_kind.insert(kind, handler);
    }

    pub fn set_fallback(&mut self, handler: Handler) {
        self.fallback = Some(handler);
    }

    /// Deliver one event: the state mirror is brought current first, so
    /// the user handler observes the post-event state. Events without a
    /// registered handler fall back to the default handler, if any.
    ///
    /// A panicking handler is caught and logged; it never takes the
    /// dispatch loop down with it.
    pub async fn dispatch(&self, cx: &Context, event: Event) {
        cx.state.write().expect("State poisoned").update(&event);

        let handler = match self.by_kind.get(&event.kind()) {
            Some(handler) => handler,
            None => match self.fallback {
                Some(ref fallback) => fallback,
                None => return,
            },
        };

        let kind = event.kind();
        if AssertUnwindSafe(handler(cx.clone(), event))
            .catch_unwind()
            .await
            .is_err()
        {
            error!("Handler for {:?} panicked", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn context() -> Context {
        Context {
            rest: Arc::new(Discord::from_bot_token("sekrit")),
            state: Arc::new(RwLock::new(State::new())),
            gateway: crate::connection::GatewayHandle::detached(),
        }
    }

    fn ready() -> Event {
        Event::decode(
            "READY",
            json!({
                "v": 6,
                "user": {"id": "1", "username": "self", "discriminator": "0001", "avatar": null},
                "session_id": "abc",
                "guilds": [],
                "private_channels": [],
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn handlers_observe_the_updated_state() {
        let mut handlers = EventHandlers::default();
        let observed = Arc::new(std::sync::Mutex::new(None));

        let sink = observed.clone();
        handlers.insert(
            EventKind::Ready,
            Box::new(move |cx: Context, _ev| {
                let sink = sink.clone();
                async move {
                    let session_id = cx
                        .state
                        .read()
                        .unwrap()
                        .session_id()
                        .map(str::to_owned);
                    *sink.lock().unwrap() = session_id;
                }
                .boxed()
            }),
        );

        handlers.dispatch(&context(), ready()).await;
        assert_eq!(observed.lock().unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn fallback_handler_covers_unregistered_events() {
        let mut handlers = EventHandlers::default();
        let hits = Arc::new(AtomicU32::new(0));

        let counter = hits.clone();
        handlers.set_fallback(Box::new(move |_cx, _ev| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}.boxed()
        }));

        let cx = context();
        handlers.dispatch(&cx, ready()).await;
        handlers
            .dispatch(
                &cx,
                Event::decode("SOME_FUTURE_EVENT", json!({"x": 1})).unwrap(),
            )
            .await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_panicking_handler_does_not_stop_dispatch() {
        let mut handlers = EventHandlers::default();
        handlers.insert(
            EventKind::Ready,
            Box::new(|_cx, _ev| async { panic!("boom") }.boxed()),
        );

        let cx = context();
        handlers.dispatch(&cx, ready()).await;
        // State was still updated before the handler ran.
        assert_eq!(cx.state.read().unwrap().session_id(), Some("abc"));
    }
}
