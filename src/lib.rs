//! Client library for the [Discord](https://discord.com) API.
//!
//! The Discord API can be divided into two main components: the RESTful
//! API to which calls can be made to take actions, and a websocket-based
//! permanent connection (the "gateway") over which state updates are
//! received.
//!
//! The quickest way to both is [`Session::connect`]: it logs in with a bot
//! token, opens the gateway connection, and keeps an in-memory [`State`]
//! mirror current while your registered event handlers run. The handlers
//! receive a [`Context`] carrying the REST client and a gateway handle, so
//! a handful of lines suffice for a chatbot that reads and responds to
//! messages.
//!
//! For finer control, [`Discord`] can be used on its own for REST calls,
//! and [`ConnectionBuilder`] yields a bare [`Connection`] whose events you
//! pull yourself with `recv_event`.
//!
//! REST calls are `async` and return a future that completes once with the
//! outcome; callers that want synchronous semantics can drive them with
//! their runtime's `block_on`.

use std::sync::Arc;

/// A JSON object, as used for dynamic request bodies.
pub type Object = serde_json::Map<String, serde_json::Value>;

macro_rules! cdn_concat {
    ($e:expr) => {
        // Out of everything, only the CDN still uses the old domain.
        concat!("https://cdn.discordapp.com", $e)
    };
}

pub mod model;

pub mod builders;

mod connection;
mod dispatch;
mod error;
mod ratelimit;
mod schema;
mod serial;
mod session;
mod state;
mod transport;

mod rest;
pub use rest::*;

pub use connection::{
    ConnState, Connection, ConnectionBuilder, GatewayHandle, OpCode, GATEWAY_VERSION,
};
pub use dispatch::{Context, Handler};
pub use error::{Error, Result};
pub use schema::{encode_query, FieldKind, Schema};
pub use session::{Session, Setup};
pub use state::{ChannelRef, State};

/// Read an image from a file into a string suitable for upload.
///
/// If the file's extension is `.png`, the claimed media type will be
/// `image/png`, or `image/jpg` otherwise. Note that Discord may convert
/// the image to JPEG or another format after upload.
pub fn read_image<P: AsRef<::std::path::Path>>(path: P) -> Result<String> {
    use base64::Engine;
    use std::io::Read;

    let path = path.as_ref();
    let mut vec = Vec::new();
    std::fs::File::open(path)?.read_to_end(&mut vec)?;
    Ok(format!(
        "data:image/{};base64,{}",
        if path.extension() == Some("png".as_ref()) {
            "png"
        } else {
            "jpg"
        },
        base64::engine::general_purpose::STANDARD.encode(&vec),
    ))
}

/// Open a gateway session for a bot token. Shorthand for
/// [`Session::connect`].
pub async fn connect<F>(token: &str, setup: F) -> Result<Session>
where
    F: FnOnce(&mut Setup),
{
    Session::connect(token, setup).await
}

/// Build a bare gateway connection sharing the given REST client's
/// credential handling.
pub fn connection_builder(rest: Arc<Discord>, token: &str) -> ConnectionBuilder {
    ConnectionBuilder::new(rest, token)
}
