use async_trait::async_trait;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::skip_serializing_none;
use tracing::{debug, info, warn};

use crate::api::{RawResponse, Request, Response, ServiceCall};
use crate::config::ApiKey;
use crate::domain::Domain;
use crate::error::{Error, Result};

/// Odoo serializes empty scalar and relational fields as `false`.
pub fn deserialize_odoo_nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        other => T::deserialize(other).map(Some).map_err(serde::de::Error::custom),
    }
}

/// A many2one value as read from the server: `[id, display_name]`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Many2one(pub i64, pub String);

impl Many2one {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> &str {
        &self.1
    }
}

/// Keyword arguments accepted by `read` and `search_read`.
#[skip_serializing_none]
#[derive(Serialize, Debug, Default, Clone)]
pub struct KwArgs<'a> {
    pub fields: Option<&'a [&'a str]>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl<'a> KwArgs<'a> {
    pub fn fields(fields: &'a [&'a str]) -> Self {
        KwArgs {
            fields: Some(fields),
            ..Default::default()
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn decode_records<T: DeserializeOwned>(model: &str, value: Value) -> Result<Vec<T>> {
    serde_json::from_value(value).map_err(|e| Error::malformed(model, e.to_string()))
}

/// The `object` service: `execute_kw` plus the ORM methods built on it.
#[async_trait]
pub trait ObjectRpc: Send + Sync {
    async fn execute_kw(&self, model: &str, method: &str, args: Value, kwargs: Value)
        -> Result<Value>;

    async fn search(&self, model: &str, domain: &Domain) -> Result<Vec<i64>> {
        let value = self
            .execute_kw(model, "search", json!([domain]), json!({}))
            .await?;
        decode_records(model, value)
    }

    async fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Value> {
        if ids.is_empty() {
            return Ok(json!([]));
        }
        let kwargs = KwArgs::fields(fields).to_value()?;
        self.execute_kw(model, "read", json!([ids]), kwargs).await
    }

    async fn search_read(&self, model: &str, domain: &Domain, kwargs: KwArgs<'_>) -> Result<Value> {
        let kwargs = kwargs.to_value()?;
        self.execute_kw(model, "search_read", json!([domain]), kwargs)
            .await
    }

    async fn create(&self, model: &str, values: Value) -> Result<i64> {
        let value = self
            .execute_kw(model, "create", json!([values]), json!({}))
            .await?;
        value
            .as_i64()
            .ok_or_else(|| Error::malformed(model, format!("create returned {}", value)))
    }

    async fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<bool> {
        let value = self
            .execute_kw(model, "write", json!([ids, values]), json!({}))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn fetch_write_dates(&self, model: &str, ids: &[i64]) -> Result<Vec<WriteDate>> {
        let value = self.read(model, ids, &["id", "write_date"]).await?;
        decode_records(model, value)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WriteDate {
    pub id: i64,
    pub write_date: String,
}

#[derive(Debug, Clone)]
struct Session {
    uid: i64,
    password: String,
}

/// Client for the `/jsonrpc` endpoint of an Odoo server.
pub struct Odoo {
    host: String,
    database: String,
    http: reqwest::Client,
    session: Option<Session>,
}

impl Odoo {
    pub fn new(host: &str, database: &str) -> Self {
        Odoo {
            host: host.trim_end_matches('/').to_string(),
            database: database.to_string(),
            http: reqwest::Client::new(),
            session: None,
        }
    }

    pub async fn new_and_login(
        host: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let mut odoo = Odoo::new(host, database);
        odoo.login(username, password).await?;
        Ok(odoo)
    }

    pub async fn from_key(key: &ApiKey) -> Result<Self> {
        Odoo::new_and_login(&key.host, &key.db, &key.username, &key.password).await
    }

    pub fn uid(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.uid)
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Response<Value>> {
        let url = format!("{}/jsonrpc", self.host);
        let request = Request::call(ServiceCall {
            service,
            method,
            args,
        });
        let raw: RawResponse = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        raw.into_result()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<i64> {
        info!(host = %self.host, db = %self.database, "odoo api login");
        let authenticated = self
            .call(
                "common",
                "authenticate",
                json!([self.database, username, password, {}]),
            )
            .await;
        let response = match authenticated {
            Ok(response) => response,
            Err(Error::Remote { code, name, message }) => {
                warn!(code, %name, %message, "authenticate refused, retrying with common.login");
                self.call("common", "login", json!([self.database, username, password]))
                    .await?
            }
            Err(e) => return Err(e),
        };
        match response.result.as_i64() {
            Some(uid) => {
                self.session = Some(Session {
                    uid,
                    password: password.to_string(),
                });
                Ok(uid)
            }
            None => Err(Error::Authentication {
                db: self.database.clone(),
                username: username.to_string(),
            }),
        }
    }

    pub async fn version(&self) -> Result<ServerVersion> {
        let response = self.call("common", "version", json!([])).await?;
        Ok(serde_json::from_value(response.result)?)
    }
}

#[async_trait]
impl ObjectRpc for Odoo {
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Config("execute_kw called before login".to_string()))?;
        debug!(model, method, "execute_kw");
        let response = self
            .call(
                "object",
                "execute_kw",
                json!([
                    self.database,
                    session.uid,
                    session.password,
                    model,
                    method,
                    args,
                    kwargs
                ]),
            )
            .await?;
        Ok(response.result)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerVersion {
    pub server_version: String,
    #[serde(default)]
    pub protocol_version: Option<i64>,
    #[serde(default)]
    pub server_serie: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::mock::MockRpc;
    use super::*;

    #[derive(Deserialize, Debug)]
    struct ProductTemplate {
        name: String,
        #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
        default_code: Option<String>,
        #[serde(default, deserialize_with = "deserialize_odoo_nullable")]
        categ_id: Option<Many2one>,
    }

    #[test]
    fn false_fields_become_none() {
        let rows: Vec<ProductTemplate> = serde_json::from_value(json!([
            {"name": "Desk", "default_code": false, "categ_id": false},
            {"name": "Chair", "default_code": "CH-01", "categ_id": [4, "All / Office"]}
        ]))
        .unwrap();
        assert_eq!(rows[0].default_code, None);
        assert_eq!(rows[0].categ_id, None);
        assert_eq!(rows[1].name, "Chair");
        assert_eq!(rows[1].default_code.as_deref(), Some("CH-01"));
        let categ = rows[1].categ_id.as_ref().unwrap();
        assert_eq!(categ.id(), 4);
        assert_eq!(categ.name(), "All / Office");
    }

    #[tokio::test]
    async fn read_without_ids_skips_the_server() {
        let rpc = MockRpc::new();
        let value = rpc.read("sale.order", &[], &["id"]).await.unwrap();
        assert_eq!(value, json!([]));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn orm_helpers_shape_execute_kw_arguments() {
        let rpc = MockRpc::new()
            .reply("stock.quant", "search", json!([3, 4]))
            .reply("stock.quant", "write", json!(true))
            .reply("product.pricelist.item", "create", json!(42));

        let domain = Domain::new().term("location_id", "ilike", "WH/Stock");
        let ids = rpc.search("stock.quant", &domain).await.unwrap();
        assert_eq!(ids, vec![3, 4]);

        let ok = rpc
            .write("stock.quant", &[3], json!({"location_id": 9}))
            .await
            .unwrap();
        assert!(ok);

        let id = rpc
            .create("product.pricelist.item", json!({"fixed_price": 1.5}))
            .await
            .unwrap();
        assert_eq!(id, 42);

        let calls = rpc.calls();
        assert_eq!(calls[0].args, json!([[["location_id", "ilike", "WH/Stock"]]]));
        assert_eq!(calls[1].args, json!([[3], {"location_id": 9}]));
        assert_eq!(calls[2].args, json!([{"fixed_price": 1.5}]));
    }

    #[tokio::test]
    async fn search_read_omits_unset_kwargs() {
        let rpc = MockRpc::new().reply("product.template", "search_read", json!([]));
        let fields = ["id", "name"];
        rpc.search_read(
            "product.template",
            &Domain::new(),
            KwArgs {
                fields: Some(&fields[..]),
                limit: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let call = &rpc.calls()[0];
        assert_eq!(call.kwargs, json!({"fields": ["id", "name"], "limit": 5}));
    }

    #[tokio::test]
    async fn write_dates_decode() {
        let rpc = MockRpc::new().reply(
            "sale.order",
            "read",
            json!([{"id": 1, "write_date": "2024-03-01 10:00:00"}]),
        );
        let dates = rpc.fetch_write_dates("sale.order", &[1]).await.unwrap();
        assert_eq!(dates[0].write_date, "2024-03-01 10:00:00");
        assert_eq!(rpc.calls()[0].kwargs, json!({"fields": ["id", "write_date"]}));
    }

    mod loopback {
        //! Minimal `/jsonrpc` endpoint on a local socket. One request per connection.

        use std::sync::{Arc, Mutex};

        use serde_json::Value;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        pub type Requests = Arc<Mutex<Vec<Value>>>;

        /// Starts a server answering each JSON-RPC body with the envelope built by
        /// `answer` (`{"result": ..}` or `{"error": ..}`). Returns its base url and the
        /// request bodies it received.
        pub async fn serve<F>(answer: F) -> (String, Requests)
        where
            F: Fn(&Value) -> Value + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let host = format!("http://{}", listener.local_addr().unwrap());
            let requests: Requests = Arc::default();
            let seen = requests.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let Some(request) = read_request(&mut stream).await else {
                        continue;
                    };
                    let mut envelope = answer(&request);
                    envelope["jsonrpc"] = "2.0".into();
                    envelope["id"] = request["id"].clone();
                    seen.lock().unwrap().push(request);
                    let body = envelope.to_string();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });
            (host, requests)
        }

        async fn read_request(stream: &mut TcpStream) -> Option<Value> {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let header_end = loop {
                let n = stream.read(&mut chunk).await.ok()?;
                if n == 0 {
                    return None;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < header_end + length {
                let n = stream.read(&mut chunk).await.ok()?;
                if n == 0 {
                    return None;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            serde_json::from_slice(&buf[header_end..header_end + length]).ok()
        }
    }

    fn rpc_method(request: &Value) -> &str {
        request["params"]["method"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn login_falls_back_to_common_login() {
        let (host, requests) = loopback::serve(|request| match rpc_method(request) {
            "authenticate" => json!({"error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "builtins.AttributeError", "message": "authenticate not available"}
            }}),
            "login" => json!({"result": 7}),
            _ => json!({"result": false}),
        })
        .await;

        let odoo = Odoo::new_and_login(&host, "acme", "bot", "secret")
            .await
            .unwrap();
        assert_eq!(odoo.uid(), Some(7));

        let requests = requests.lock().unwrap();
        let methods: Vec<&str> = requests.iter().map(rpc_method).collect();
        assert_eq!(methods, vec!["authenticate", "login"]);
        assert_eq!(requests[0]["params"]["args"], json!(["acme", "bot", "secret", {}]));
        assert_eq!(requests[1]["params"]["service"], "common");
        assert_eq!(requests[1]["params"]["args"], json!(["acme", "bot", "secret"]));
    }

    #[tokio::test]
    async fn refused_credentials_are_an_authentication_error() {
        let (host, requests) = loopback::serve(|_| json!({"result": false})).await;

        let err = Odoo::new_and_login(&host, "acme", "bot", "wrong")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Authentication { ref db, ref username } if db == "acme" && username == "bot"
        ));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn execute_kw_sends_session_and_call_arguments() {
        let (host, requests) = loopback::serve(|request| match rpc_method(request) {
            "authenticate" => json!({"result": 2}),
            "execute_kw" => json!({"result": [11, 12]}),
            _ => json!({"result": false}),
        })
        .await;

        let odoo = Odoo::new_and_login(&(host + "/"), "acme", "bot", "secret")
            .await
            .unwrap();
        let domain = Domain::new().term("customer_rank", ">=", 1);
        let ids = odoo.search("res.partner", &domain).await.unwrap();
        assert_eq!(ids, vec![11, 12]);

        let requests = requests.lock().unwrap();
        let call = &requests[1];
        assert_eq!(call["jsonrpc"], "2.0");
        assert_eq!(call["method"], "call");
        assert_eq!(
            call["params"],
            json!({
                "service": "object",
                "method": "execute_kw",
                "args": [
                    "acme", 2, "secret", "res.partner", "search",
                    [[["customer_rank", ">=", 1]]], {}
                ]
            })
        );
    }

    #[tokio::test]
    async fn server_fault_surfaces_as_remote_error() {
        let (host, _) = loopback::serve(|request| match rpc_method(request) {
            "authenticate" => json!({"result": 2}),
            _ => json!({"error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.AccessError", "message": "no access"}
            }}),
        })
        .await;

        let odoo = Odoo::new_and_login(&host, "acme", "bot", "secret")
            .await
            .unwrap();
        let err = odoo
            .write("stock.quant", &[1], json!({"location_id": 2}))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Remote { code: 200, ref name, .. } if name == "odoo.exceptions.AccessError"));
    }

    #[tokio::test]
    async fn execute_kw_before_login_is_a_config_error() {
        let odoo = Odoo::new("http://127.0.0.1:9", "acme");
        let err = odoo
            .execute_kw("res.partner", "search", json!([[]]), json!({}))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
