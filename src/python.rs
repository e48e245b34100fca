use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde_json::{Map, Value};

use crate::{BlockingQliteClient, ClientError, CommandKind};

#[pyclass(name = "ParamDefinition", get_all)]
#[derive(Clone)]
pub struct PyParamDefinition {
    pub name: String,
    pub wire_name: String,
    pub rule: String,
    pub default: Option<String>,
}

#[pyclass(name = "CommandDefinition", get_all)]
pub struct PyCommandDefinition {
    pub name: String,
    pub parameters: Vec<PyParamDefinition>,
}

#[pyclass(name = "Client")]
pub struct PyClient {
    inner: BlockingQliteClient,
}

#[pymethods]
impl PyClient {
    #[new]
    fn new(node_url: String) -> PyResult<Self> {
        let client = BlockingQliteClient::new(node_url).map_err(to_py_value_error)?;
        Ok(Self { inner: client })
    }

    #[staticmethod]
    fn commands() -> Vec<PyCommandDefinition> {
        CommandKind::ALL
            .iter()
            .map(|kind| PyCommandDefinition {
                name: kind.name().to_owned(),
                parameters: kind
                    .params()
                    .iter()
                    .map(|spec| PyParamDefinition {
                        name: spec.name.to_owned(),
                        wire_name: spec.wire_name.to_owned(),
                        rule: spec.rule.to_string(),
                        default: spec.default.map(|default| default.to_string()),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Calls `command` with parameters given as a JSON object string and
    /// returns the response as a JSON string.
    ///
    /// The GIL is released for the HTTP round trip, so calls from several
    /// Python threads run concurrently.
    #[pyo3(signature = (command, params_json=None))]
    fn call(
        &self,
        py: Python<'_>,
        command: String,
        params_json: Option<String>,
    ) -> PyResult<String> {
        let params = parse_params(params_json)?;

        let response = py
            .detach(|| self.inner.call(&command, &params))
            .map_err(to_py_client_error)?;

        Ok(response.into_value().to_string())
    }
}

#[pymodule]
fn qlite_client(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyParamDefinition>()?;
    module.add_class::<PyCommandDefinition>()?;
    module.add_class::<PyClient>()?;
    Ok(())
}

fn to_py_value_error(error: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(error.to_string())
}

// Local validation failures map to ValueError; anything after the request
// left the process maps to RuntimeError.
fn to_py_client_error(error: ClientError) -> PyErr {
    if error.is_validation() {
        PyValueError::new_err(error.to_string())
    } else {
        PyRuntimeError::new_err(error.to_string())
    }
}

fn parse_params(raw_json: Option<String>) -> PyResult<Map<String, Value>> {
    let Some(raw_json) = raw_json else {
        return Ok(Map::new());
    };

    match serde_json::from_str(&raw_json).map_err(to_py_value_error)? {
        Value::Object(params) => Ok(params),
        _ => Err(PyValueError::new_err("expected a JSON object")),
    }
}
