//! Per-service client registry.
//!
//! A `ClientRegistry` is built once at startup with an [`Endpoint`] and a
//! factory closure, then shared. Each service's client is constructed at most
//! once, on first use, and handed out as an `Arc`.

use crate::endpoint::{Endpoint, ServiceEndpoint};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Remote services the setup tasks talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    CloudFormation,
    DynamoDb,
    S3,
    Sns,
    Sqs,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::CloudFormation,
        ServiceKind::DynamoDb,
        ServiceKind::S3,
        ServiceKind::Sns,
        ServiceKind::Sqs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::CloudFormation => "cloudformation",
            ServiceKind::DynamoDb => "dynamodb",
            ServiceKind::S3 => "s3",
            ServiceKind::Sns => "sns",
            ServiceKind::Sqs => "sqs",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ServiceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| ClientError::UnknownService(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("failed to build {service} client")]
    Build {
        service: ServiceKind,
        #[source]
        source: anyhow::Error,
    },
}

type Factory<C> = dyn Fn(&ServiceEndpoint) -> anyhow::Result<C> + Send + Sync;

/// Thread-safe memoized client factory keyed by [`ServiceKind`].
pub struct ClientRegistry<C> {
    endpoint: Endpoint,
    factory: Box<Factory<C>>,
    clients: Mutex<HashMap<ServiceKind, Arc<C>>>,
}

impl<C> fmt::Debug for ClientRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("endpoint", &self.endpoint)
            .field("built", &self.built())
            .finish_non_exhaustive()
    }
}

impl<C> ClientRegistry<C> {
    pub fn new<F>(endpoint: Endpoint, factory: F) -> Self
    where
        F: Fn(&ServiceEndpoint) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            endpoint,
            factory: Box::new(factory),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Client for `service`, constructing it on first use.
    ///
    /// Construction runs under the registry lock, so concurrent callers never
    /// build the same client twice. Failed builds are not cached.
    pub fn get(&self, service: ServiceKind) -> Result<Arc<C>, ClientError> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&service) {
            return Ok(Arc::clone(client));
        }
        tracing::debug!("creating new {} client", service);
        let client = (self.factory)(&self.endpoint.for_service(service))
            .map(Arc::new)
            .map_err(|source| ClientError::Build { service, source })?;
        clients.insert(service, Arc::clone(&client));
        Ok(client)
    }

    /// Services whose clients have been built so far.
    pub fn built(&self) -> Vec<ServiceKind> {
        let clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<_> = clients.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
