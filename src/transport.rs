use url::Url;

use crate::{ClientError, TransportError};

/// Protocol version announced to the ql-node on every request.
pub const API_VERSION: &str = "0.4.1";

/// Header carrying [`API_VERSION`].
pub const API_VERSION_HEADER: &str = "X-QLITE-API-Version";

/// Parses the ql-node endpoint. The URL is used as-is for every request.
pub(crate) fn parse_node_url(node_url: &str) -> Result<Url, ClientError> {
    Url::parse(node_url)
        .map_err(|_| TransportError::InvalidNodeUrl(node_url.to_owned()).into())
}
