//! The catalog API response envelope.
//!
//! ```json
//! { "apiStatus": true, "data": ..., "Error": false, "Message": "..." }
//! ```
//!
//! `data` is kept as raw JSON until the envelope is known to be a success,
//! since failed envelopes put an error code string there.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "apiStatus", default)]
    pub api_status: Option<bool>,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "Error", default)]
    pub error: Option<bool>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Parse a 2xx body. An empty body is an empty successful envelope.
    pub fn parse(body: &str) -> ClientResult<Self> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    pub fn is_rejected(&self) -> bool {
        self.api_status == Some(false) || self.error == Some(true)
    }

    /// Decode `data` into `T`, or fail with [`ClientError::Rejected`].
    pub fn into_data<T: DeserializeOwned>(self) -> ClientResult<T> {
        let data = self.into_value()?;
        serde_json::from_value(data).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Succeed if the envelope reports success, ignoring `data`.
    pub fn into_ack(self) -> ClientResult<()> {
        self.into_value().map(drop)
    }

    fn into_value(self) -> ClientResult<Value> {
        if self.is_rejected() {
            return Err(ClientError::Rejected {
                code: self.data.as_str().map(str::to_string),
                message: self.message,
            });
        }
        Ok(self.data)
    }
}
