use serde::Serialize;
use serde_json::{Map, Value};

use crate::{ClientError, RemoteError, TransportError};

/// Decoded body of a successful ql-node call.
///
/// Holds the full JSON object exactly as the node sent it, including the
/// `success` and `duration` fields. Only [`Response::from_value`] builds
/// one, so a `Response` always carries `success: true`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Response {
    body: Map<String, Value>,
}

impl Response {
    /// Interprets a decoded JSON body as a ql-node envelope.
    ///
    /// `success: false` becomes [`ClientError::Remote`]; bodies that are not
    /// objects with a boolean `success` become
    /// [`TransportError::MalformedResponse`].
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        let body = match value {
            Value::Object(body) => body,
            other => {
                return Err(TransportError::MalformedResponse(format!(
                    "expected a JSON object, got {other}"
                ))
                .into());
            }
        };

        match body.get("success") {
            Some(Value::Bool(true)) => Ok(Self { body }),
            Some(Value::Bool(false)) => Err(RemoteError {
                message: error_message(&body),
            }
            .into()),
            _ => Err(TransportError::MalformedResponse(
                "missing boolean 'success' field".to_owned(),
            )
            .into()),
        }
    }

    /// Returns a field of the response body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Server-side processing time as reported by the node.
    pub fn duration(&self) -> Option<&Value> {
        self.body.get("duration")
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Decodes a raw HTTP answer into a [`Response`].
pub(crate) fn decode(status: reqwest::StatusCode, payload: &str) -> Result<Response, ClientError> {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Response::from_value(value),
        Err(_) if !status.is_success() => Err(TransportError::HttpStatus {
            status,
            body: payload.to_owned(),
        }
        .into()),
        Err(error) => Err(error.into()),
    }
}

fn error_message(body: &Map<String, Value>) -> String {
    match body.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
