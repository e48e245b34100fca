use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ValidationError;
use crate::validate::{
    validate_alphanumeric, validate_array, validate_integer, validate_object, validate_string,
    validate_tryte_sequence,
};

/// Largest integer the ql-node accepts for epochs, indices and durations.
pub const INT_MAX: i64 = 2_147_483_647;

/// Length of qubic, oracle and IAM stream identifiers.
pub const ID_LENGTH: usize = 81;

/// Maximum length of an IAM index keyword.
pub const KEYWORD_MAX_LENGTH: usize = 30;

/// Default minimum weight magnitude for `change_node` (mainnet).
pub const DEFAULT_MWM: i64 = 14;

/// Every command the ql-node API understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    NodeInfo,
    ChangeNode,
    FetchEpoch,
    Export,
    Import,
    QubicRead,
    QubicList,
    QubicCreate,
    QubicDelete,
    QubicListApplications,
    QubicAssemble,
    QubicTest,
    QubicConsensus,
    OracleCreate,
    OracleDelete,
    OracleList,
    OraclePause,
    OracleRestart,
    IamCreate,
    IamDelete,
    IamList,
    IamWrite,
    IamRead,
    AppList,
    AppInstall,
    AppUninstall,
}

/// Validation rule attached to one command parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    String,
    Integer { min: i64, max: i64 },
    TryteSequence { min_length: usize, max_length: usize },
    Array,
    Object,
    Alphanumeric,
}

/// Value used when an optional parameter is omitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    Integer(i64),
    Str(&'static str),
}

/// One parameter of a ql-node command.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    /// Name callers use, also reported in validation errors.
    pub name: &'static str,
    /// Field name in the request body.
    pub wire_name: &'static str,
    pub rule: Rule,
    /// `None` marks a required parameter.
    pub default: Option<DefaultValue>,
}

const fn required(name: &'static str, wire_name: &'static str, rule: Rule) -> ParamSpec {
    ParamSpec {
        name,
        wire_name,
        rule,
        default: None,
    }
}

const fn optional(
    name: &'static str,
    wire_name: &'static str,
    rule: Rule,
    default: DefaultValue,
) -> ParamSpec {
    ParamSpec {
        name,
        wire_name,
        rule,
        default: Some(default),
    }
}

const ID: Rule = Rule::TryteSequence {
    min_length: ID_LENGTH,
    max_length: ID_LENGTH,
};
const KEYWORD: Rule = Rule::TryteSequence {
    min_length: 0,
    max_length: KEYWORD_MAX_LENGTH,
};
const NON_NEGATIVE: Rule = Rule::Integer { min: 0, max: INT_MAX };
const POSITIVE: Rule = Rule::Integer { min: 1, max: INT_MAX };

const NO_PARAMS: &[ParamSpec] = &[];
const QUBIC_PARAM: &[ParamSpec] = &[required("qubic", "qubic", ID)];
const ID_PARAM: &[ParamSpec] = &[required("id", "id", ID)];

const CHANGE_NODE_PARAMS: &[ParamSpec] = &[
    required("node_address", "node address", Rule::String),
    optional(
        "mwm",
        "mwm",
        Rule::Integer { min: 9, max: 14 },
        DefaultValue::Integer(DEFAULT_MWM),
    ),
];

const FETCH_EPOCH_PARAMS: &[ParamSpec] = &[
    required("qubic", "qubic", ID),
    required("epoch", "epoch", NON_NEGATIVE),
    optional(
        "epoch_max",
        "epoch max",
        Rule::Integer { min: -1, max: INT_MAX },
        DefaultValue::Integer(-1),
    ),
];

const IMPORT_PARAMS: &[ParamSpec] = &[required("encoded", "encoded", Rule::String)];

const QUBIC_CREATE_PARAMS: &[ParamSpec] = &[
    required("execution_start", "execution start", POSITIVE),
    required("hash_period_duration", "hash period duration", POSITIVE),
    required("result_period_duration", "result period duration", POSITIVE),
    required("runtime_limit", "runtime limit", POSITIVE),
    required("code", "code", Rule::String),
];

const QUBIC_ASSEMBLE_PARAMS: &[ParamSpec] = &[
    required("qubic", "qubic", ID),
    required("assembly", "assembly", Rule::Array),
];

const QUBIC_TEST_PARAMS: &[ParamSpec] = &[
    required("code", "code", Rule::String),
    optional(
        "epoch_index",
        "epoch index",
        NON_NEGATIVE,
        DefaultValue::Integer(0),
    ),
];

const QUBIC_CONSENSUS_PARAMS: &[ParamSpec] = &[
    required("qubic", "qubic", ID),
    required("keyword", "keyword", KEYWORD),
    required("position", "position", NON_NEGATIVE),
];

// The ql-node reads the stream id of `iam_write` from an upper-case field.
const IAM_WRITE_PARAMS: &[ParamSpec] = &[
    required("id", "ID", ID),
    required("index", "index", NON_NEGATIVE),
    required("message", "message", Rule::Object),
    optional("keyword", "keyword", KEYWORD, DefaultValue::Str("")),
];

const IAM_READ_PARAMS: &[ParamSpec] = &[
    required("id", "id", ID),
    required("index", "index", NON_NEGATIVE),
    optional("keyword", "keyword", KEYWORD, DefaultValue::Str("")),
];

const APP_INSTALL_PARAMS: &[ParamSpec] = &[required("url", "url", Rule::String)];
const APP_UNINSTALL_PARAMS: &[ParamSpec] = &[required("app", "app", Rule::Alphanumeric)];

impl CommandKind {
    /// All commands in catalog order.
    pub const ALL: [CommandKind; 26] = [
        Self::NodeInfo,
        Self::ChangeNode,
        Self::FetchEpoch,
        Self::Export,
        Self::Import,
        Self::QubicRead,
        Self::QubicList,
        Self::QubicCreate,
        Self::QubicDelete,
        Self::QubicListApplications,
        Self::QubicAssemble,
        Self::QubicTest,
        Self::QubicConsensus,
        Self::OracleCreate,
        Self::OracleDelete,
        Self::OracleList,
        Self::OraclePause,
        Self::OracleRestart,
        Self::IamCreate,
        Self::IamDelete,
        Self::IamList,
        Self::IamWrite,
        Self::IamRead,
        Self::AppList,
        Self::AppInstall,
        Self::AppUninstall,
    ];

    /// Value of the `command` field on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::NodeInfo => "node_info",
            Self::ChangeNode => "change_node",
            Self::FetchEpoch => "fetch_epoch",
            Self::Export => "export",
            Self::Import => "import",
            Self::QubicRead => "qubic_read",
            Self::QubicList => "qubic_list",
            Self::QubicCreate => "qubic_create",
            Self::QubicDelete => "qubic_delete",
            Self::QubicListApplications => "qubic_list_applications",
            Self::QubicAssemble => "qubic_assemble",
            Self::QubicTest => "qubic_test",
            Self::QubicConsensus => "qubic_consensus",
            Self::OracleCreate => "oracle_create",
            Self::OracleDelete => "oracle_delete",
            Self::OracleList => "oracle_list",
            Self::OraclePause => "oracle_pause",
            Self::OracleRestart => "oracle_restart",
            Self::IamCreate => "iam_create",
            Self::IamDelete => "iam_delete",
            Self::IamList => "iam_list",
            Self::IamWrite => "iam_write",
            Self::IamRead => "iam_read",
            Self::AppList => "app_list",
            Self::AppInstall => "app_install",
            Self::AppUninstall => "app_uninstall",
        }
    }

    /// Parameters accepted by this command, in request order.
    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            Self::NodeInfo
            | Self::QubicList
            | Self::OracleList
            | Self::IamCreate
            | Self::IamList
            | Self::AppList => NO_PARAMS,
            Self::ChangeNode => CHANGE_NODE_PARAMS,
            Self::FetchEpoch => FETCH_EPOCH_PARAMS,
            Self::Import => IMPORT_PARAMS,
            Self::QubicRead
            | Self::QubicDelete
            | Self::QubicListApplications
            | Self::OracleCreate => QUBIC_PARAM,
            Self::Export
            | Self::OracleDelete
            | Self::OraclePause
            | Self::OracleRestart
            | Self::IamDelete => ID_PARAM,
            Self::QubicCreate => QUBIC_CREATE_PARAMS,
            Self::QubicAssemble => QUBIC_ASSEMBLE_PARAMS,
            Self::QubicTest => QUBIC_TEST_PARAMS,
            Self::QubicConsensus => QUBIC_CONSENSUS_PARAMS,
            Self::IamWrite => IAM_WRITE_PARAMS,
            Self::IamRead => IAM_READ_PARAMS,
            Self::AppInstall => APP_INSTALL_PARAMS,
            Self::AppUninstall => APP_UNINSTALL_PARAMS,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = ValidationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ValidationError::UnknownCommand(name.to_owned()))
    }
}

impl Rule {
    /// Checks `value` and returns it in the shape sent to the ql-node.
    pub fn apply(self, value: &Value, parameter: &str) -> Result<Value, ValidationError> {
        match self {
            Self::String => validate_string(value, parameter).map(Value::from),
            Self::Integer { min, max } => {
                validate_integer(value, parameter, min, max).map(Value::from)
            }
            Self::TryteSequence {
                min_length,
                max_length,
            } => validate_tryte_sequence(value, parameter, min_length, max_length).map(Value::from),
            Self::Array => validate_array(value, parameter).map(|_| value.clone()),
            Self::Object => validate_object(value, parameter).map(|_| value.clone()),
            Self::Alphanumeric => validate_alphanumeric(value, parameter).map(Value::from),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer { min, max } => write!(f, "integer [{min}, {max}]"),
            Self::TryteSequence {
                min_length,
                max_length,
            } if min_length == max_length => write!(f, "trytes ({min_length})"),
            Self::TryteSequence {
                min_length,
                max_length,
            } => write!(f, "trytes ({min_length}..={max_length})"),
            Self::Array => f.write_str("array"),
            Self::Object => f.write_str("object"),
            Self::Alphanumeric => f.write_str("alphanumeric"),
        }
    }
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            Self::Integer(number) => Value::from(number),
            Self::Str(text) => Value::from(text),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(number) => write!(f, "{number}"),
            Self::Str(text) => write!(f, "{text:?}"),
        }
    }
}

/// JSON body of one ql-node call.
///
/// The `command` field comes first, followed by the parameters under their
/// wire names in catalog order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Request {
    body: Map<String, Value>,
}

impl Request {
    /// Validates `params` for `kind` and assembles the request body.
    ///
    /// Parameters are looked up by name; omitted optional parameters take
    /// their default. Validation stops at the first failing parameter.
    pub fn build(kind: CommandKind, params: &[(&str, Value)]) -> Result<Self, ValidationError> {
        let specs = kind.params();

        if let Some((unexpected, _)) = params
            .iter()
            .find(|(name, _)| !specs.iter().any(|spec| spec.name == *name))
        {
            return Err(ValidationError::UnexpectedParameter {
                command: kind.name().to_owned(),
                parameter: (*unexpected).to_owned(),
            });
        }

        let mut body = Map::new();
        body.insert("command".to_owned(), Value::from(kind.name()));

        for spec in specs {
            let supplied = params
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, value)| value);

            let value = match (supplied, spec.default) {
                (Some(value), _) => spec.rule.apply(value, spec.name)?,
                (None, Some(default)) => spec.rule.apply(&default.to_value(), spec.name)?,
                (None, None) => {
                    return Err(ValidationError::MissingParameter {
                        command: kind.name().to_owned(),
                        parameter: spec.name.to_owned(),
                    });
                }
            };
            body.insert(spec.wire_name.to_owned(), value);
        }

        Ok(Self { body })
    }

    /// Builds a request from a command name and a JSON object of parameters.
    pub fn from_json(command: &str, params: &Map<String, Value>) -> Result<Self, ValidationError> {
        let kind = command.parse::<CommandKind>()?;
        let borrowed: Vec<(&str, Value)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        Self::build(kind, &borrowed)
    }

    /// Value of the `command` field.
    pub fn command(&self) -> &str {
        self.body
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The request body as a JSON object.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const QUBIC: &str =
        "CIVZQYMDDDHVBTYFWUEQQNSGCNO9TMVPGOSCEXEYEKMMUUTWXRVJNGHRAJZYJUFUVVRQLTITDCNTQZTNX";

    #[test]
    fn command_names_round_trip_through_from_str() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.name().parse::<CommandKind>(), Ok(kind));
        }
        assert_eq!(
            "qubic_explode".parse::<CommandKind>(),
            Err(ValidationError::UnknownCommand("qubic_explode".to_owned()))
        );
    }

    #[test]
    fn change_node_renames_fields_and_keeps_order() {
        let request = Request::build(
            CommandKind::ChangeNode,
            &[
                ("node_address", json!("https://node.example.org:14265")),
                ("mwm", json!(14)),
            ],
        )
        .expect("valid request");

        assert_eq!(
            request.clone().into_value(),
            json!({
                "command": "change_node",
                "node address": "https://node.example.org:14265",
                "mwm": 14
            })
        );
        assert_eq!(
            serde_json::to_string(&request).expect("serializes"),
            r#"{"command":"change_node","node address":"https://node.example.org:14265","mwm":14}"#
        );
    }

    #[test]
    fn change_node_rejects_mwm_above_fourteen() {
        let error = Request::build(
            CommandKind::ChangeNode,
            &[("node_address", json!("https://node.example.org:14265")), ("mwm", json!(20))],
        )
        .expect_err("mwm out of range");
        assert_eq!(error.parameter(), Some("mwm"));
        assert!(matches!(error, ValidationError::AboveMaximum { max: 14, .. }));
    }

    fn valid_value(rule: Rule) -> Value {
        match rule {
            Rule::String => json!("x"),
            Rule::Integer { min, .. } => json!(min),
            Rule::TryteSequence { min_length, .. } => json!("A".repeat(min_length)),
            Rule::Array => json!([]),
            Rule::Object => json!({}),
            Rule::Alphanumeric => json!("app"),
        }
    }

    #[test]
    fn every_integer_parameter_enforces_both_bounds() {
        let mut checked = 0;
        for kind in CommandKind::ALL {
            for spec in kind.params() {
                let Rule::Integer { min, max } = spec.rule else {
                    continue;
                };
                checked += 1;

                let args_with = |value: i64| -> Vec<(&str, Value)> {
                    kind.params()
                        .iter()
                        .map(|other| {
                            let value = if other.name == spec.name {
                                json!(value)
                            } else {
                                valid_value(other.rule)
                            };
                            (other.name, value)
                        })
                        .collect()
                };

                for value in [min, max] {
                    let request = Request::build(kind, &args_with(value))
                        .unwrap_or_else(|e| panic!("{} {}={value}: {e}", kind.name(), spec.name));
                    assert_eq!(request.body()[spec.wire_name], json!(value));
                }

                let error = Request::build(kind, &args_with(min - 1)).expect_err("below minimum");
                assert_eq!(error.parameter(), Some(spec.name));
                assert!(matches!(error, ValidationError::BelowMinimum { .. }), "{error}");

                let error = Request::build(kind, &args_with(max + 1)).expect_err("above maximum");
                assert_eq!(error.parameter(), Some(spec.name));
                assert!(matches!(error, ValidationError::AboveMaximum { .. }), "{error}");
            }
        }
        assert_eq!(checked, 11);
    }

    #[test]
    fn epoch_bounds_are_reported_with_limits() {
        let fetch = |epoch: Value, epoch_max: Value| {
            Request::build(
                CommandKind::FetchEpoch,
                &[("qubic", json!(QUBIC)), ("epoch", epoch), ("epoch_max", epoch_max)],
            )
        };

        let request = fetch(json!(INT_MAX), json!(-1)).expect("bounds are inclusive");
        assert_eq!(request.body()["epoch"], json!(2_147_483_647));
        assert_eq!(request.body()["epoch max"], json!(-1));

        let error = fetch(json!(2_147_483_648_i64), json!(-1)).expect_err("epoch too large");
        assert_eq!(
            error.to_string(),
            "parameter 'epoch' (= 2147483648) is greater than allowed maximum: 2147483647"
        );

        let error = fetch(json!(0), json!(-2)).expect_err("epoch_max too small");
        assert_eq!(
            error.to_string(),
            "parameter 'epoch_max' (= -2) is less than allowed minimum: -1"
        );
    }

    #[test]
    fn omitted_optional_parameters_take_defaults() {
        let request = Request::build(CommandKind::ChangeNode, &[("node_address", json!("n"))])
            .expect("valid request");
        assert_eq!(request.body()["mwm"], json!(14));

        let request = Request::build(
            CommandKind::FetchEpoch,
            &[("qubic", json!(QUBIC)), ("epoch", json!(4))],
        )
        .expect("valid request");
        assert_eq!(request.body()["epoch max"], json!(-1));

        let request = Request::build(CommandKind::QubicTest, &[("code", json!("return(epoch^2);"))])
            .expect("valid request");
        assert_eq!(request.body()["epoch index"], json!(0));

        let request = Request::build(
            CommandKind::IamRead,
            &[("id", json!(QUBIC)), ("index", json!(17))],
        )
        .expect("valid request");
        assert_eq!(
            request.into_value(),
            json!({"command": "iam_read", "id": QUBIC, "index": 17, "keyword": ""})
        );
    }

    #[test]
    fn iam_write_sends_upper_case_id_field() {
        let request = Request::build(
            CommandKind::IamWrite,
            &[
                ("id", json!(QUBIC)),
                ("index", json!(17)),
                ("message", json!({"day": 4})),
                ("keyword", json!("ADDRESS")),
            ],
        )
        .expect("valid request");
        assert_eq!(
            request.into_value(),
            json!({
                "command": "iam_write",
                "ID": QUBIC,
                "index": 17,
                "message": {"day": 4},
                "keyword": "ADDRESS"
            })
        );
    }

    #[test]
    fn iam_write_requires_object_message() {
        let error = Request::build(
            CommandKind::IamWrite,
            &[
                ("id", json!(QUBIC)),
                ("index", json!(17)),
                ("message", json!([4])),
            ],
        )
        .expect_err("array message");
        assert_eq!(error.to_string(), "parameter 'message' is not an object");
    }

    #[test]
    fn qubic_create_renames_all_durations() {
        let request = Request::build(
            CommandKind::QubicCreate,
            &[
                ("execution_start", json!(300)),
                ("hash_period_duration", json!(30)),
                ("result_period_duration", json!("30")),
                ("runtime_limit", json!(10.7)),
                ("code", json!("return(epoch^2);")),
            ],
        )
        .expect("valid request");
        assert_eq!(
            request.into_value(),
            json!({
                "command": "qubic_create",
                "execution start": 300,
                "hash period duration": 30,
                "result period duration": 30,
                "runtime limit": 10,
                "code": "return(epoch^2);"
            })
        );
    }

    #[test]
    fn qubic_create_rejects_zero_duration() {
        let error = Request::build(
            CommandKind::QubicCreate,
            &[
                ("execution_start", json!(300)),
                ("hash_period_duration", json!(0)),
                ("result_period_duration", json!(30)),
                ("runtime_limit", json!(10)),
                ("code", json!("return(1);")),
            ],
        )
        .expect_err("zero duration");
        assert_eq!(
            error.to_string(),
            "parameter 'hash_period_duration' (= 0) is less than allowed minimum: 1"
        );
    }

    #[test]
    fn assembly_accepts_any_array() {
        let request = Request::build(
            CommandKind::QubicAssemble,
            &[("qubic", json!(QUBIC)), ("assembly", json!([QUBIC, 7]))],
        )
        .expect("any array is forwarded");
        assert_eq!(request.body()["assembly"], json!([QUBIC, 7]));

        let error = Request::build(
            CommandKind::QubicAssemble,
            &[("qubic", json!(QUBIC)), ("assembly", json!({"a": QUBIC}))],
        )
        .expect_err("object assembly");
        assert!(matches!(error, ValidationError::NotAnArray { .. }));
    }

    #[test]
    fn app_uninstall_rejects_hyphenated_id() {
        let error = Request::build(CommandKind::AppUninstall, &[("app", json!("tangle-farm"))])
            .expect_err("hyphen");
        assert!(matches!(error, ValidationError::NotAlphanumeric { .. }));
    }

    #[test]
    fn missing_and_unexpected_parameters_are_reported() {
        let error =
            Request::build(CommandKind::QubicRead, &[]).expect_err("qubic is required");
        assert_eq!(
            error,
            ValidationError::MissingParameter {
                command: "qubic_read".to_owned(),
                parameter: "qubic".to_owned(),
            }
        );

        let error = Request::build(CommandKind::NodeInfo, &[("verbose", json!(true))])
            .expect_err("node_info takes no parameters");
        assert_eq!(
            error.to_string(),
            "command 'node_info' does not accept parameter 'verbose'"
        );
    }

    #[test]
    fn first_failing_parameter_wins() {
        let error = Request::build(
            CommandKind::QubicConsensus,
            &[
                ("qubic", json!("SHORT")),
                ("keyword", json!("bad keyword")),
                ("position", json!(-1)),
            ],
        )
        .expect_err("all parameters invalid");
        assert_eq!(error.parameter(), Some("qubic"));
    }

    #[test]
    fn from_json_resolves_command_name() {
        let params = json!({"qubic": QUBIC, "keyword": "COLORS", "position": "2018"});
        let request = Request::from_json(
            "qubic_consensus",
            params.as_object().expect("object literal"),
        )
        .expect("valid request");
        assert_eq!(request.command(), "qubic_consensus");
        assert_eq!(request.body()["position"], json!(2018));

        let error = Request::from_json("node_reboot", &Map::new()).expect_err("unknown");
        assert!(matches!(error, ValidationError::UnknownCommand(_)));
    }

    #[test]
    fn every_command_without_required_params_builds_empty() {
        for kind in CommandKind::ALL {
            if kind.params().iter().all(|spec| spec.default.is_some()) {
                assert!(Request::build(kind, &[]).is_ok(), "{kind} should build");
            }
        }
    }

    #[test]
    fn rule_display_describes_constraints() {
        assert_eq!(Rule::Integer { min: 9, max: 14 }.to_string(), "integer [9, 14]");
        assert_eq!(ID.to_string(), "trytes (81)");
        assert_eq!(KEYWORD.to_string(), "trytes (0..=30)");
        assert_eq!(DefaultValue::Str("").to_string(), "\"\"");
    }
}
