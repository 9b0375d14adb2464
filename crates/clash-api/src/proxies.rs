// Proxy endpoints
//
// Listing, inspection, latency testing, and group selection.

use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::client::{Client, rejection};
use crate::error::Error;
use crate::models::{Proxy, ProxyCollection, ProxyDelay};

impl Client {
    /// List every proxy and group the controller knows about.
    ///
    /// `GET /proxies`
    pub async fn list_proxies(&self) -> Result<ProxyCollection, Error> {
        self.get(&["proxies"]).await
    }

    /// Fetch a single proxy or group by name.
    ///
    /// `GET /proxy/{name}`
    pub async fn get_proxy(&self, name: &str) -> Result<Proxy, Error> {
        self.get(&["proxy", name]).await
    }

    /// Ask the controller to measure latency through `name` to `test_url`.
    ///
    /// `GET /proxy/{name}/delay?timeout={ms}&url={test_url}`
    ///
    /// `timeout_ms` bounds the controller-side test, not this request.
    pub async fn measure_delay(
        &self,
        name: &str,
        timeout_ms: u32,
        test_url: &str,
    ) -> Result<ProxyDelay, Error> {
        debug!(name, timeout_ms, test_url, "measuring proxy delay");
        self.get_with_params(
            &["proxy", name, "delay"],
            &[
                ("timeout", timeout_ms.to_string()),
                ("url", test_url.to_owned()),
            ],
        )
        .await
    }

    /// Switch `group` to `target`.
    ///
    /// `PUT /proxies/{group}`. The target is sent both as the `name` query
    /// parameter and as a `{"name": ...}` body; older controllers read the
    /// former, newer ones the latter.
    pub async fn select_proxy(&self, group: &str, target: &str) -> Result<(), Error> {
        debug!(group, target, "selecting proxy");
        let resp = self
            .oneshot(Method::PUT, &["proxies", group])?
            .query(&[("name", target)])
            .json(&json!({ "name": target }))
            .send()
            .await?;

        if resp.status() == StatusCode::OK {
            return Ok(());
        }

        let (status, message) = rejection(resp).await;
        Err(Error::SelectionRejected { status, message })
    }
}
