//! Gateway discovery over the REST API.

use std::collections::BTreeMap;

use reqwest::Method;

use crate::error::{Error, Result};
use crate::Object;

use super::Discord;

impl Discord {
    /// Discover the websocket URL of the gateway.
    ///
    /// The response is cached per API base; use
    /// [`forget_gateway_url`][Self::forget_gateway_url] to force a fresh
    /// discovery.
    pub async fn gateway_url(&self) -> Result<String> {
        if let Some(url) = self
            .gateway_cache
            .lock()
            .expect("Gateway cache poisoned")
            .get(&self.api_base)
        {
            return Ok(url.clone());
        }

        let mut response: BTreeMap<String, String> = self
            .empty_request("/gateway", Method::GET)
            .await?
            .json()
            .await?;

        match response.remove("url") {
            Some(url) => {
                self.gateway_cache
                    .lock()
                    .expect("Gateway cache poisoned")
                    .insert(self.api_base.clone(), url.clone());
                Ok(url)
            }
            None => Err(Error::Protocol(
                "Response missing \"url\" in Discord::gateway_url()",
            )),
        }
    }

    /// Drop the cached gateway URL for this client's API base.
    pub fn forget_gateway_url(&self) {
        self.gateway_cache
            .lock()
            .expect("Gateway cache poisoned")
            .remove(&self.api_base);
    }

    /// Retrieves the number of guild shards Discord suggests to use based
    /// on the number of guilds.
    ///
    /// This endpoint is only available for bots.
    pub async fn suggested_shard_count(&self) -> Result<u64> {
        let mut response = self
            .empty_request("/gateway/bot", Method::GET)
            .await?
            .json::<Object>()
            .await?;

        match response.remove("shards") {
            Some(value) => match value.as_u64() {
                Some(shards) => Ok(shards),
                None => Err(Error::Decode("Invalid \"shards\"", value)),
            },
            None => Err(Error::Protocol(
                "suggested_shard_count missing \"shards\"",
            )),
        }
    }
}
