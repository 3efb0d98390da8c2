use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt::Display;
use std::io::Error as IoError;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::debug;

/// Discord API `Result` alias type.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Discord API error type.
#[derive(Debug)]
pub enum Error {
    /// A `reqwest` crate error
    Reqwest(ReqwestError),
    /// A `serde_json` crate error
    Json(JsonError),
    /// A `tungstenite` crate error
    WebSocket(WsError),
    /// A `std::io` module error
    Io(IoError),
    /// The websocket connection was closed, possibly with a code and message
    Closed(Option<u16>, String),
    /// A json decoding error, with a description and the offending value
    Decode(&'static str, Value),
    /// A field-schema table named a descriptor this library does not know
    Schema(&'static str, String),
    /// A verb outside of GET/POST/PUT/PATCH/DELETE was passed to `send`
    BadVerb(String),
    /// A generic non-success response from the REST API
    Status(reqwest::StatusCode, Option<Value>),
    /// The server rate limited the request; retry after this many seconds
    RateLimited(f64),
    /// The client-side burst guard refused the request; retry after this
    /// many seconds
    LocalRateLimit(f64),
    /// The gateway rejected the credentials; the session will not reconnect
    Auth(&'static str),
    /// The gateway rejected the shard configuration; the session will not
    /// reconnect
    Shard(&'static str),
    /// A Discord protocol error, with a description
    Protocol(&'static str),
    /// An operation was attempted on a disconnected session
    SessionClosed,
    /// A miscellaneous error, with a description
    Other(&'static str),
}

impl Error {
    #[doc(hidden)]
    pub async fn from_response(response: reqwest::Response) -> Error {
        let status = response.status();

        let value = response
            .bytes()
            .await
            .ok()
            .and_then(|b| serde_json::from_slice::<Value>(&b).ok());

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if let Some(Value::Object(ref map)) = value {
                // v6 reports retry_after in milliseconds
                if let Some(delay) = map.get("retry_after").and_then(|v| v.as_f64()) {
                    return Error::RateLimited(delay / 1000.0);
                }
            }
        }
        Error::Status(status, value)
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl From<ReqwestError> for Error {
    fn from(err: ReqwestError) -> Error {
        Error::Reqwest(err)
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Error {
        Error::Json(err)
    }
}

impl From<WsError> for Error {
    fn from(err: WsError) -> Error {
        Error::WebSocket(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        match *self {
            Error::Reqwest(ref inner) => inner.fmt(f),
            Error::Json(ref inner) => inner.fmt(f),
            Error::WebSocket(ref inner) => inner.fmt(f),
            Error::Io(ref inner) => inner.fmt(f),
            Error::Closed(code, ref reason) => {
                write!(f, "Connection closed ({:?}): {:?}", code, reason)
            }
            Error::Decode(msg, ref value) => write!(f, "{}: {}", msg, value),
            Error::Schema(msg, ref tag) => write!(f, "{}: {:?}", msg, tag),
            Error::BadVerb(ref verb) => write!(f, "Unsupported request verb {:?}", verb),
            Error::Status(status, _) => write!(
                f,
                "{}",
                status.canonical_reason().unwrap_or("Unknown bad HTTP status")
            ),
            Error::RateLimited(seconds) => {
                write!(f, "Rate limited for {:.3}s", seconds)
            }
            Error::LocalRateLimit(seconds) => {
                write!(f, "Locally rate limited for {:.3}s", seconds)
            }
            Error::Auth(msg) | Error::Shard(msg) | Error::Protocol(msg) | Error::Other(msg) => {
                f.write_str(msg)
            }
            Error::SessionClosed => f.write_str("Session is disconnected"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Reqwest(ref inner) => Some(inner),
            Error::Json(ref inner) => Some(inner),
            Error::WebSocket(ref inner) => Some(inner),
            Error::Io(ref inner) => Some(inner),
            _ => None,
        }
    }
}

/// Extension trait for validating discord HTTP responses that carry no body.
pub(crate) trait StatusChecks {
    /// Validate a request that is expected to return 204 No Content and print
    /// debug information if it does not.
    async fn insure_no_content(self) -> Result<()>;
}

impl StatusChecks for reqwest::Response {
    async fn insure_no_content(self) -> Result<()> {
        if self.status() != reqwest::StatusCode::NO_CONTENT {
            debug!("Expected 204 No Content, got {}", self.status());

            for (header_name, header_value) in self.headers().iter() {
                debug!("Header: {}: {:?}", header_name, header_value);
            }

            let content = self.bytes().await?;
            debug!("Content: {:?}", content);
        }
        Ok(())
    }
}
