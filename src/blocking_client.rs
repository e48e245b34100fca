use serde_json::{Map, Value};
use url::Url;

use crate::response::decode;
use crate::transport::{API_VERSION, API_VERSION_HEADER, parse_node_url};
use crate::{ClientError, CommandKind, Request, Response};

/// Blocking ql-node client.
///
/// Every method validates its arguments, sends exactly one `POST` to the
/// node URL and returns the decoded response. This is the synchronous
/// counterpart of [`crate::QliteClient`].
#[derive(Debug)]
pub struct BlockingQliteClient {
    node_url: Url,
    http: reqwest::blocking::Client,
}

impl BlockingQliteClient {
    /// Creates a client for the ql-node API at `node_url`.
    pub fn new(node_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Ok(Self {
            node_url: parse_node_url(node_url.as_ref())?,
            http: reqwest::blocking::Client::new(),
        })
    }

    /// Returns a new client that sends requests through `http`.
    ///
    /// Use this to configure timeouts, proxies or TLS.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = http;
        self
    }

    pub fn node_url(&self) -> &Url {
        &self.node_url
    }

    /// Calls a command by name with a JSON object of parameters.
    ///
    /// Parameter names are the snake-case names listed by
    /// [`CommandKind::params`], not the wire field names.
    pub fn call(&self, command: &str, params: &Map<String, Value>) -> Result<Response, ClientError> {
        let request = Request::from_json(command, params)?;
        self.send_request(&request)
    }

    /// Validates `params` for `kind`, then sends the request.
    pub fn execute(
        &self,
        kind: CommandKind,
        params: &[(&str, Value)],
    ) -> Result<Response, ClientError> {
        let request = Request::build(kind, params)?;
        self.send_request(&request)
    }

    /// Sends an already validated request and interprets the envelope.
    pub fn send_request(&self, request: &Request) -> Result<Response, ClientError> {
        tracing::debug!(command = request.command(), url = %self.node_url, "sending ql-node request");

        let response = self
            .http
            .post(self.node_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(API_VERSION_HEADER, API_VERSION)
            .json(request)
            .send()?;
        let status = response.status();
        let payload = response.text()?;

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
    pub fn node_info(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::NodeInfo, &[])
    }

    /// Changes the IOTA full node used to interact with the tangle.
    ///
    /// `mwm` is the min weight magnitude in `9..=14`: 9 for testnet nodes,
    /// 14 (the default) otherwise.
    pub fn change_node(&self, node_address: &str, mwm: Option<i64>) -> Result<Response, ClientError> {
        let mut params = vec![("node_address", Value::from(node_address))];
        params.extend(mwm.map(|mwm| ("mwm", Value::from(mwm))));
        self.execute(CommandKind::ChangeNode, &params)
    }

    /// Determines the quorum based result of a qubic's epoch.
    ///
    /// With `epoch_max`, fetches every epoch from `epoch` up to it.
    pub fn fetch_epoch(
        &self,
        qubic: &str,
        epoch: i64,
        epoch_max: Option<i64>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("qubic", Value::from(qubic)), ("epoch", Value::from(epoch))];
        params.extend(epoch_max.map(|max| ("epoch_max", Value::from(max))));
        self.execute(CommandKind::FetchEpoch, &params)
    }

    /// Exports an IAM stream, qubic or oracle into an importable string.
    pub fn export(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::Export, &[("id", Value::from(id))])
    }

    /// Imports an entity previously produced by [`Self::export`].
    pub fn import(&self, encoded: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::Import, &[("encoded", Value::from(encoded))])
    }

    /// Reads the specification of any qubic.
    pub fn qubic_read(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicRead, &[("qubic", Value::from(qubic))])
    }

    /// Lists all qubics stored on the node.
    pub fn qubic_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicList, &[])
    }

    /// Creates a new qubic. The assembly transaction must be published
    /// manually with [`Self::qubic_assemble`].
    pub fn qubic_create(
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
    }

    /// Deletes a qubic and its private key. Cannot be undone.
    pub fn qubic_delete(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::QubicDelete, &[("qubic", Value::from(qubic))])
    }

    /// Lists the oracle applications received by a qubic.
    pub fn qubic_list_applications(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(
            CommandKind::QubicListApplications,
            &[("qubic", Value::from(qubic))],
        )
    }

    /// Publishes the assembly transaction of a qubic with the given oracles.
    pub fn qubic_assemble(
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
    }

    /// Runs qubic code on the node without publishing it.
    pub fn qubic_test(&self, code: &str, epoch_index: Option<i64>) -> Result<Response, ClientError> {
        let mut params = vec![("code", Value::from(code))];
        params.extend(epoch_index.map(|index| ("epoch_index", Value::from(index))));
        self.execute(CommandKind::QubicTest, &params)
    }

    /// Determines the quorum based consensus of a qubic's assembly at an IAM index.
    pub fn qubic_consensus(
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
    }

    /// Creates an oracle processing `qubic`.
    pub fn oracle_create(&self, qubic: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleCreate, &[("qubic", Value::from(qubic))])
    }

    /// Deletes an oracle and its private key. Cannot be undone.
    pub fn oracle_delete(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleDelete, &[("id", Value::from(id))])
    }

    pub fn oracle_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleList, &[])
    }

    /// Stops an oracle after its current epoch.
    pub fn oracle_pause(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OraclePause, &[("id", Value::from(id))])
    }

    /// Resumes an oracle paused with [`Self::oracle_pause`].
    pub fn oracle_restart(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::OracleRestart, &[("id", Value::from(id))])
    }

    pub fn iam_create(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamCreate, &[])
    }

    /// Deletes an IAM stream and its private key. Cannot be undone.
    pub fn iam_delete(&self, id: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamDelete, &[("id", Value::from(id))])
    }

    pub fn iam_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::IamList, &[])
    }

    /// Writes a JSON object into an IAM stream at `index` and `keyword`.
    pub fn iam_write(
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
        self.execute(CommandKind::IamWrite, &params)
    }

    /// Reads the message of an IAM stream at `index` and `keyword`.
    pub fn iam_read(
        &self,
        id: &str,
        index: i64,
        keyword: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut params = vec![("id", Value::from(id)), ("index", Value::from(index))];
        params.extend(keyword.map(|keyword| ("keyword", Value::from(keyword))));
        self.execute(CommandKind::IamRead, &params)
    }

    pub fn app_list(&self) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppList, &[])
    }

    /// Installs an app from `url`.
    pub fn app_install(&self, url: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppInstall, &[("url", Value::from(url))])
    }

    /// Uninstalls the app with directory name `app`.
    pub fn app_uninstall(&self, app: &str) -> Result<Response, ClientError> {
        self.execute(CommandKind::AppUninstall, &[("app", Value::from(app))])
    }
}
