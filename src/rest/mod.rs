//! Discord REST API methods provided through a simple interface.
//!
//! The Discord REST API is how applications modify server-side state and
//! obtain the gateway endpoint for listening to events.
//!
//! The functionality of the [`Discord`] client is split over several
//! extension traits so that callers import only the method families they
//! need:
//!
//! - [`ChannelExt`]: interact with channels, invites, and overwrites.
//! - [`MessageExt`]: send, edit, pin, and react to messages.
//! - [`GuildExt`]: manage guilds, members, roles, and bans.
//! - [`UserExt`]: fetch and update users and open direct messages.
//! - [`WebhookExt`]: manage and execute webhooks.
//!
//! Everything bottoms out in [`Discord::send`], which derives the
//! rate-limit route for the resource, refuses locally over-quota requests,
//! attaches the credential, and parses the response.

mod channel;
pub use channel::*;

mod connect;

mod guild;
pub use guild::*;

mod message;
pub use message::*;

mod user;
pub use user::*;

mod webhook;
pub use webhook::*;

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ratelimit::{route_bucket, RateLimits};
use crate::schema::Schema;
use crate::Object;

/// Where the Discord API is mounted on the web.
pub(crate) const API_BASE: &str = "https://discordapp.com/api/v6";

/// The `User-Agent` sent along with every request.
const USER_AGENT: &str = concat!(
    "DiscordBot (discord-session, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Client for the Discord REST API.
///
/// # Multiple clients
///
/// Using multiple [`Discord`] clients for one credential is not advisable,
/// as each of them tracks detached rate-limiting records. Nearly all
/// operations take `&self`, so a single client is best shared behind an
/// [`Arc`][std::sync::Arc].
#[derive(Debug)]
pub struct Discord {
    /// Configured `reqwest` client for making requests.
    client: reqwest::Client,
    /// The credential, in the form used for the `Authorization` header.
    token: String,
    /// Rate limit records for this credential.
    rate_limits: RateLimits,
    /// Discovered gateway endpoints, keyed by the API base they came from.
    gateway_cache: Mutex<BTreeMap<String, String>>,
    api_base: String,
    retry_rate_limits: bool,
}

fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .https_only(true)
        .build()
        .expect("Couldn't build HTTPS reqwest client")
}

impl Discord {
    /// Log in as a bot account, with the token taken from the bot page of
    /// the application console.
    pub fn from_bot_token(token: &str) -> Discord {
        Discord::with_token(format!("Bot {}", token.trim()))
    }

    /// Log in with an OAuth2 bearer token.
    pub fn from_bearer_token(token: &str) -> Discord {
        Discord::with_token(format!("Bearer {}", token.trim()))
    }

    fn with_token(token: String) -> Discord {
        Discord {
            client: tls_client(),
            token,
            rate_limits: RateLimits::default(),
            gateway_cache: Mutex::new(BTreeMap::new()),
            api_base: API_BASE.to_owned(),
            retry_rate_limits: false,
        }
    }

    /// Automatically re-queue rate-limited requests once, after the
    /// advertised delay, instead of surfacing the refusal to the caller.
    pub fn retry_rate_limits(mut self, retry: bool) -> Discord {
        self.retry_rate_limits = retry;
        self
    }

    /// Issue a raw request against the API.
    ///
    /// `verb` must be one of GET, POST, PUT, PATCH, or DELETE, and
    /// `resource` must start with `/`. The body is either empty,
    /// pre-encoded bytes with a content type, or a mapping rendered
    /// through a field [`Schema`]. Additional headers (including a
    /// `Content-Type` override) can be supplied through `headers`.
    ///
    /// On success, yields the decoded response body (`None` when the
    /// response was empty or not JSON, which is logged) together with the
    /// response metadata.
    pub async fn send(
        &self,
        verb: Method,
        resource: &str,
        body: Body<'_>,
        headers: &[(&str, &str)],
    ) -> Result<(Option<Value>, ResponseMeta)> {
        let verbs = [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ];
        if !verbs.contains(&verb) {
            return Err(Error::BadVerb(verb.to_string()));
        }
        if !resource.starts_with('/') {
            return Err(Error::Other("resource must start with '/'"));
        }

        let encoded = match body {
            Body::Empty => None,
            Body::Raw(bytes, content_type) => Some((bytes.to_vec(), content_type)),
            Body::Fields(map, schema) => {
                Some((schema.encode(map)?.into_bytes(), "application/json"))
            }
        };
        let extra: Vec<(String, String)> = headers
            .iter()
            .map(|&(name, value)| (name.to_owned(), value.to_owned()))
            .collect();

        let response = self
            .request(resource, verb, move |mut req| {
                if let Some((ref bytes, content_type)) = encoded {
                    req = req
                        .header(header::CONTENT_TYPE, content_type)
                        .body(bytes.clone());
                }
                for (name, value) in &extra {
                    req = req.header(name.as_str(), value.as_str());
                }
                req
            })
            .await?;

        let meta = ResponseMeta {
            status: response.status(),
            headers: response.headers().clone(),
        };
        let bytes = response.bytes().await?;
        let decoded = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!("Undecodable response body: {}", err);
                    None
                }
            }
        };
        Ok((decoded, meta))
    }

    /// Make a request while having rate limits and authorization taken
    /// care of. Yields only successful responses.
    pub(crate) async fn request<F: Fn(RequestBuilder) -> RequestBuilder>(
        &self,
        url: &str,
        method: Method,
        f: F,
    ) -> Result<reqwest::Response> {
        let route = route_bucket(url);
        self.check_route(&route).await?;

        let make = || {
            f(self
                .client
                .request(method.clone(), format!("{}{}", self.api_base, url)))
            .header(header::AUTHORIZATION, self.token.clone())
            .header(header::USER_AGENT, USER_AGENT)
        };

        let response = retry(&make).await?;
        self.rate_limits.post_update(&route, &response);

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let err = Error::from_response(response).await;
            if let (true, &Error::RateLimited(seconds)) = (self.retry_rate_limits, &err) {
                warn!("Rate limited on {}, retrying in {:.3}s", route, seconds);
                tokio::time::sleep(Duration::from_secs_f64(seconds)).await;

                let response = retry(&make).await?;
                self.rate_limits.post_update(&route, &response);
                if !response.status().is_success() {
                    return Err(Error::from_response(response).await);
                }
                return Ok(response);
            }
            return Err(err);
        }

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        Ok(response)
    }

    /// Make a request while having rate limits and authorization taken
    /// care of.
    ///
    /// Now comes in body free flavor.
    pub(crate) async fn empty_request(
        &self,
        url: &str,
        method: Method,
    ) -> Result<reqwest::Response> {
        self.request(url, method, |req| req).await
    }

    async fn check_route(&self, route: &str) -> Result<()> {
        match self.rate_limits.pre_check(route) {
            Err(Error::RateLimited(seconds)) | Err(Error::LocalRateLimit(seconds))
                if self.retry_rate_limits =>
            {
                warn!("Over quota on {}, waiting {:.3}s", route, seconds);
                tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
                self.rate_limits.pre_check(route)
            }
            other => other,
        }
    }
}

/// A request body accepted by [`Discord::send`].
pub enum Body<'a> {
    /// No request body.
    Empty,
    /// Pre-encoded bytes with their content type.
    Raw(&'a [u8], &'static str),
    /// A mapping rendered through a field schema.
    Fields(&'a Object, &'a Schema),
}

/// Metadata of a completed REST response.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: header::HeaderMap,
}

/// Send a request, retrying it a second time if the connection is aborted
/// the first time.
async fn retry<F: Fn() -> RequestBuilder>(f: &F) -> Result<reqwest::Response> {
    // retry on a connection error, which occurs if it's been a while since
    // the last request
    match f().send().await {
        Err(err) if err.is_connect() => f().send().await.map_err(Error::Reqwest),
        other => other.map_err(Error::Reqwest),
    }
}
