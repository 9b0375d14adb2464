// Configuration endpoints
//
// Read, patch, and reload the controller's running configuration.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::client::{Client, rejection};
use crate::error::Error;
use crate::models::Config;

#[derive(Serialize)]
struct ReloadRequest<'a> {
    path: &'a str,
}

impl Client {
    /// `GET /configs`
    pub async fn get_config(&self) -> Result<Config, Error> {
        self.get(&["configs"]).await
    }

    /// Apply a partial configuration. Only the `Some` fields of `patch`
    /// are sent.
    ///
    /// `PATCH /configs`, expecting `204 No Content`. The response body is
    /// ignored on success.
    pub async fn set_config(&self, patch: &Config) -> Result<(), Error> {
        let resp = self
            .oneshot(Method::PATCH, &["configs"])?
            .json(patch)
            .send()
            .await?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let (status, message) = rejection(resp).await;
        Err(Error::ConfigRejected { status, message })
    }

    /// Reload configuration from disk.
    ///
    /// `PUT /configs?force={force}`, expecting `200 OK`. With a `path`
    /// the body is `{"path": ...}`; without one the request has no body.
    pub async fn reload_config(&self, force: bool, path: Option<&str>) -> Result<(), Error> {
        debug!(force, path, "reloading configuration");
        let mut builder = self
            .oneshot(Method::PUT, &["configs"])?
            .query(&[("force", force)]);
        if let Some(path) = path {
            builder = builder.json(&ReloadRequest { path });
        }

        let resp = builder.send().await?;
        if resp.status() == StatusCode::OK {
            return Ok(());
        }

        let (status, message) = rejection(resp).await;
        Err(Error::ReloadRejected { status, message })
    }
}
