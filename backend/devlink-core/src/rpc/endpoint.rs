use crate::error::rpc_client::RpcClientError;

use uuid::Uuid;

/// Where an [`RpcClient`](crate::rpc::RpcClient) sends its calls.
///
/// Immutable once built. The identity lets the server route replies back to
/// this client; a random one is generated when none is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    address: String,
    service: String,
    identity: String,
}

impl ServerEndpoint {
    pub fn new(
        address: impl Into<String>,
        service: impl Into<String>,
        identity: Option<String>,
    ) -> Result<Self, RpcClientError> {
        let address = address.into();
        url::Url::parse(&address)?;

        Ok(Self {
            address,
            service: service.into(),
            identity: identity
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}
