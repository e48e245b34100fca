use serde_json::{Map, Value};
use url::Url;

use crate::response::decode;
use crate::transport::{API_VERSION, API_VERSION_HEADER, parse_node_url};
use crate::{ClientError, CommandKind, Request, Response};

/// Async ql-node client.
///
/// Same commands and validation as [`crate::BlockingQliteClient`]; each call
/// opens its own request on the shared `reqwest` connection pool, so clones
/// can be used from concurrent tasks.
#[derive(Clone, Debug)]
pub struct QliteClient {
    node_url: Url,
    http: reqwest::Client,
}

impl QliteClient {
    /// Creates a client for the ql-node API at `node_url`.
    pub fn new(node_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Ok(Self {
            node_url: parse_node_url(node_url.as_ref())?,
            http: reqwest::Client::new(),
        })
    }

    /// Returns a new client that sends requests through `http`.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn node_url(&self) -> &Url {
        &self.node_url
    }

    /// Calls a command by name with a JSON object of parameters.
    pub async fn call(
        &self,
        command: &str,
        params: &Map<String, Value>,
    ) -> Result<Response, ClientError> {
        let request = Request::from_json(command, params)?;
        self.send_request(&request).await
    }

    /// Validates `params` for `kind`, then sends the request.
    pub async fn execute(
        &self,
        kind: CommandKind,
        params: &[(&str, Value)],
    ) -> Result<Response, ClientError> {
        let request = Request::build(kind, params)?;
        self.send_request(&request).await
    }

    /// Sends an already validated request and interprets the envelope.
    pub async fn send_request(&self, request: &Request) -> Result<Response, ClientError> {
        tracing::debug!(command = request.command(), url = %self.node_url, "sending ql-node request");

        let response = self
            .http
            .post(self.node_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(API_VERSION_HEADER, API_VERSION)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let payload = response.text().await?;

        tracing::debug!(
            command = request.command(),
            %status,
            bytes = payload.len(),
            "received ql-node response"
        );

        decode(status, &payload).inspect_err(|error| {
            if error.is_remote() {
                tracing::warn!(command = request.command(), %error, "ql-node reported failure");
            }
        })
    }

    /// Gives details about this ql-node.
    pub async fn node_info(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::NodeInfo, &[]).await
    }

    /// Changes the IOTA full node used to interact with the tangle.
    pub async fn change_node(
        &self,
        node_address: &str,
        mwm: Option<i64>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("node_address", Value::from(node_address))];
        params.extend(mwm.map(|mwm| ("mwm", Value::from(mwm))));
        self.execute(CommandKind::ChangeNode, &params).await
    }

    /// Determines the quorum based result of a qubic's epoch.
    pub async fn fetch_epoch(
        &self,
        qubic: &str,
        epoch: i64,
        epoch_max: Option<i64>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("qubic", Value::from(qubic)), ("epoch", Value::from(epoch))];
        params.extend(epoch_max.map(|max| ("epoch_max", Value::from(max))));
        self.execute(CommandKind::FetchEpoch, &params).await
    }

    pub async fn export(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::Export, &[("id", Value::from(id))])
            .await
    }

    pub async fn import(&self, encoded: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::Import, &[("encoded", Value::from(encoded))])
            .await
    }

    pub async fn qubic_read(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicRead, &[("qubic", Value::from(qubic))])
            .await
    }

    pub async fn qubic_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicList, &[]).await
    }

    /// Creates a new qubic.
    pub async fn qubic_create(
        &self,
        execution_start: i64,
        hash_period_duration: i64,
        result_period_duration: i64,
        runtime_limit: i64,
        code: &str,
    ) -> Result<Response, ClientError> {
        self.execute(
            CommandKind::QubicCreate,
            &[
                ("execution_start", Value::from(execution_start)),
                ("hash_period_duration", Value::from(hash_period_duration)),
                ("result_period_duration", Value::from(result_period_duration)),
                ("runtime_limit", Value::from(runtime_limit)),
                ("code", Value::from(code)),
            ],
        )
        .await
    }

    pub async fn qubic_delete(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicDelete, &[("qubic", Value::from(qubic))])
            .await
    }

    pub async fn qubic_list_applications(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(
            CommandKind::QubicListApplications,
            &[("qubic", Value::from(qubic))],
        )
        .await
    }

    /// Publishes the assembly transaction of a qubic with the given oracles.
    pub async fn qubic_assemble(
        &self,
        qubic: &str,
        assembly: &[impl AsRef<str>],
    ) -> Result<Response, ClientError> {
        let oracles: Vec<Value> = assembly
            .iter()
            .map(|oracle| {
                let oracle: &str = oracle.as_ref();
                Value::from(oracle)
            })
            .collect();
        self.execute(
            CommandKind::QubicAssemble,
            &[("qubic", Value::from(qubic)), ("assembly", Value::Array(oracles))],
        )
        .await
    }

    pub async fn qubic_test(
        &self,
        code: &str,
        epoch_index: Option<i64>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("code", Value::from(code))];
        params.extend(epoch_index.map(|index| ("epoch_index", Value::from(index))));
        self.execute(CommandKind::QubicTest, &params).await
    }

    pub async fn qubic_consensus(
        &self,
        qubic: &str,
        keyword: &str,
        position: i64,
    ) -> Result<Response, ClientError> {
        self.execute(
            CommandKind::QubicConsensus,
            &[
                ("qubic", Value::from(qubic)),
                ("keyword", Value::from(keyword)),
                ("position", Value::from(position)),
            ],
        )
        .await
    }

    pub async fn oracle_create(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleCreate, &[("qubic", Value::from(qubic))])
            .await
    }

    pub async fn oracle_delete(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleDelete, &[("id", Value::from(id))])
            .await
    }

    pub async fn oracle_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleList, &[]).await
    }

    pub async fn oracle_pause(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OraclePause, &[("id", Value::from(id))])
            .await
    }

    pub async fn oracle_restart(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleRestart, &[("id", Value::from(id))])
            .await
    }

    pub async fn iam_create(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamCreate, &[]).await
    }

    pub async fn iam_delete(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamDelete, &[("id", Value::from(id))])
            .await
    }

    pub async fn iam_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamList, &[]).await
    }

    pub async fn iam_write(
        &self,
        id: &str,
        index: i64,
        message: &Value,
        keyword: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![
            ("id", Value::from(id)),
            ("index", Value::from(index)),
            ("message", message.clone()),
        ];
        params.extend(keyword.map(|keyword| ("keyword", Value::from(keyword))));
        self.execute(CommandKind::IamWrite, &params).await
    }

    pub async fn iam_read(
        &self,
        id: &str,
        index: i64,
        keyword: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("id", Value::from(id)), ("index", Value::from(index))];
        params.extend(keyword.map(|keyword| ("keyword", Value::from(keyword))));
        self.execute(CommandKind::IamRead, &params).await
    }

    pub async fn app_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppList, &[]).await
    }

    pub async fn app_install(&self, url: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppInstall, &[("url", Value::from(url))])
            .await
    }

    pub async fn app_uninstall(&self, app: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppUninstall, &[("app", Value::from(app))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::QliteClient;
    use crate::ClientError;

    const STREAM: &str =
        "CLUZILAWASDZAPQXWQHWRUBNXDFITUDFMBSBVAGB9PVLWDSYADZBPXCIOAYOEYAETUUNHNW9R9TZKU999";

    #[tokio::test]
    async fn iam_write_posts_message_object() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("X-QLITE-API-Version", "0.4.1")
            .match_body(Matcher::Json(json!({
                "command": "iam_write",
                "ID": STREAM,
                "index": 17,
                "message": {"day": 4},
                "keyword": ""
            })))
            .with_status(200)
            .with_body(r#"{"duration":"42","success":true}"#)
            .create_async()
            .await;

        let client = QliteClient::new(server.url()).expect("valid url");
        client
            .iam_write(STREAM, 17, &json!({"day": 4}), None)
            .await
            .expect("call succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn iam_read_returns_stored_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({
                "command": "iam_read",
                "id": STREAM,
                "index": 17,
                "keyword": "RESULTS"
            })))
            .with_status(200)
            .with_body(r#"{"duration":"42","read":{"habit":"antarctica","name":"penguin"},"success":true}"#)
            .create_async()
            .await;

        let client = QliteClient::new(server.url()).expect("valid url");
        let response = client
            .iam_read(STREAM, 17, Some("RESULTS"))
            .await
            .expect("call succeeds");
        assert_eq!(
            response.get("read"),
            Some(&json!({"habit": "antarctica", "name": "penguin"}))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn remote_failure_carries_server_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"success":false,"error":"qubic does not exist"}"#)
            .create_async()
            .await;

        let client = QliteClient::new(server.url()).expect("valid url");
        let error = client.qubic_read(STREAM).await.expect_err("remote failure");
        assert_eq!(error.to_string(), "qubic does not exist");
        assert!(error.is_remote());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_keyword_is_rejected_before_sending() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;

        let client = QliteClient::new(server.url()).expect("valid url");
        let error = client
            .qubic_consensus(STREAM, "NOT A KEYWORD", 4)
            .await
            .expect_err("illegal trytes");
        assert!(matches!(error, ClientError::Validation(_)));
        mock.assert_async().await;
    }

    #[test]
    fn rejects_invalid_node_url() {
        let error = QliteClient::new("not a url").expect_err("invalid url");
        assert!(error.is_transport());
    }
}
