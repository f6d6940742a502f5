//! LocalStack endpoint addressing.

use crate::clients::ServiceKind;
use crate::config::LsrConfig;

/// Where LocalStack listens and which region requests are signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub signing_region: String,
}

/// Per-service endpoint settings handed to client factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub service: ServiceKind,
    pub url: String,
    pub signing_region: String,
    /// S3 clients must address buckets by path (`host/bucket`), not by subdomain.
    pub path_style_access: bool,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::from_config(&LsrConfig::default())
    }
}

impl Endpoint {
    pub fn from_config(cfg: &LsrConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            signing_region: cfg.signing_region.clone(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn for_service(&self, service: ServiceKind) -> ServiceEndpoint {
        ServiceEndpoint {
            service,
            url: self.url(),
            signing_region: self.signing_region.clone(),
            path_style_access: service == ServiceKind::S3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_local_edge_port() {
        let ep = Endpoint::default();
        assert_eq!(ep.url(), "http://localhost:4566");
        assert_eq!(ep.signing_region, "us-east-1");
    }

    #[test]
    fn only_s3_uses_path_style() {
        let ep = Endpoint::default();
        assert!(ep.for_service(ServiceKind::S3).path_style_access);
        assert!(!ep.for_service(ServiceKind::Sqs).path_style_access);
        assert!(!ep.for_service(ServiceKind::DynamoDb).path_style_access);
    }

    #[test]
    fn config_overrides_host_and_port() {
        let cfg = LsrConfig {
            host: "stack.internal".to_string(),
            port: 4571,
            ..LsrConfig::default()
        };
        let svc = Endpoint::from_config(&cfg).for_service(ServiceKind::Sns);
        assert_eq!(svc.url, "http://stack.internal:4571");
        assert_eq!(svc.service, ServiceKind::Sns);
    }
}
