//! JSON-RPC 2.0 envelopes as spoken by the `/jsonrpc` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::error::Error;

#[derive(Serialize, Debug)]
pub struct Request<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
    pub id: u32,
}

impl<P: Serialize> Request<P> {
    pub fn call(params: P) -> Self {
        Request {
            jsonrpc: "2.0",
            method: "call",
            params,
            id: rand::random::<u32>(),
        }
    }
}

/// Parameters of a call to one of the server-side services (`common`, `object`, `db`).
#[derive(Serialize, Debug)]
pub struct ServiceCall<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: Value,
}

#[derive(Deserialize, Debug)]
pub struct Response<T> {
    pub jsonrpc: String,
    pub id: Option<u32>,
    pub result: T,
}

/// Envelope before we know whether the call succeeded.
#[derive(Deserialize, Debug)]
pub struct RawResponse {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RawResponse {
    pub fn into_result(self) -> Result<Response<Value>, Error> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        Ok(Response {
            jsonrpc: "2.0".to_string(),
            id: self.id,
            result: self.result.unwrap_or(Value::Null),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RpcErrorData {
    pub name: Option<String>,
    pub message: Option<String>,
    pub debug: Option<String>,
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        let data = err.data.unwrap_or_default();
        Error::Remote {
            code: err.code,
            name: data.name.unwrap_or_else(|| "unknown".to_string()),
            message: data.message.unwrap_or(err.message),
        }
    }
}
