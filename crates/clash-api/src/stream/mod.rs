//! Long-lived newline-delimited JSON streams.
//!
//! `GET /traffic` and `GET /logs` never finish on their own: the controller
//! keeps the response open and writes one JSON object per line. Opening a
//! stream awaits the response headers; after that every poll of the
//! returned [`RecordStream`] reads just enough of the body to produce the
//! next record.
//!
//! A stream ends with `None` when the controller closes the connection.
//! A read error or an undecodable line is yielded once as `Err`, and the
//! stream is finished afterwards. Nothing is skipped and nothing is retried;
//! dropping the stream closes the connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use clash_api::{Client, LogLevel, TransportConfig};
//!
//! let client = Client::new("127.0.0.1:9090", "secret".to_string(), &TransportConfig::default())?;
//! let mut logs = client.logs(LogLevel::Info).await?;
//!
//! while let Some(record) = logs.next().await {
//!     println!("{}", record?);
//! }
//! ```

mod framing;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_stream::try_stream;
use futures_core::Stream;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::client::{Client, rejection};
use crate::error::Error;
use crate::models::{LogLevel, LogRecord, Traffic};

use framing::{LineFramer, MAX_LINE_BYTES, decode_line};

/// Records from `GET /traffic`.
pub type TrafficStream = RecordStream<Traffic>;

/// Records from `GET /logs`.
pub type LogStream = RecordStream<LogRecord>;

/// Lazy, non-restartable sequence of records decoded from one response.
pub struct RecordStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T, Error>> + Send>>,
}

impl<T> RecordStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Take over an already-sent response.
    ///
    /// Fails with `Unauthorized` on 401 and `Api` on any other non-success
    /// status, without touching the body otherwise.
    pub async fn open(resp: reqwest::Response) -> Result<Self, Error> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            let (status, message) = rejection(resp).await;
            return Err(Error::Api { status, message });
        }

        debug!(url = %resp.url(), "stream opened");
        Ok(Self {
            inner: Box::pin(records(resp)),
        })
    }
}

impl<T> fmt::Debug for RecordStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream").finish_non_exhaustive()
    }
}

impl<T> Stream for RecordStream<T> {
    type Item = Result<T, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Read loop: chunk → lines → records, stopping at the first error.
fn records<T>(mut resp: reqwest::Response) -> impl Stream<Item = Result<T, Error>> + Send
where
    T: DeserializeOwned + Send + 'static,
{
    try_stream! {
        let mut framer = LineFramer::new(MAX_LINE_BYTES);

        while let Some(chunk) = resp.chunk().await.map_err(Error::Transport)? {
            trace!(bytes = chunk.len(), "stream chunk");
            framer.push(&chunk);
            while let Some(line) = framer.next_line()? {
                yield decode_line::<T>(&line)?;
            }
        }

        if let Some(tail) = framer.finish() {
            yield decode_line::<T>(&tail)?;
        }

        debug!("stream closed by controller");
    }
}

impl Client {
    /// Open the traffic counter stream.
    ///
    /// `GET /traffic`. The controller writes one sample per line, roughly once a second.
    pub async fn traffic(&self) -> Result<TrafficStream, Error> {
        let resp = self.request(Method::GET, &["traffic"])?.send().await?;
        RecordStream::open(resp).await
    }

    /// Tail the controller log at `level` and above.
    ///
    /// `GET /logs?level={level}`. Filtering happens on the controller.
    pub async fn logs(&self, level: LogLevel) -> Result<LogStream, Error> {
        let resp = self
            .request(Method::GET, &["logs"])?
            .query(&[("level", level.to_string())])
            .send()
            .await?;
        RecordStream::open(resp).await
    }
}
