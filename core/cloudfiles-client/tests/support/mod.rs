//! Shared helpers for tests against a mocked Cloud Files API.

use cloudfiles_client::{ClientConfig, CloudFilesClient, Container};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "tok-123";

/// Identity response whose catalog points back at the mock server.
pub fn auth_body(server: &MockServer) -> serde_json::Value {
    serde_json::json!({
        "access": {
            "token": { "id": TOKEN, "expires": "2030-01-01T00:00:00Z" },
            "serviceCatalog": [
                {
                    "name": "cloudFiles",
                    "type": "object-store",
                    "endpoints": [{
                        "region": "DFW",
                        "publicURL": format!("{}/v1/acct", server.uri()),
                        "internalURL": format!("{}/snet/v1/acct", server.uri())
                    }]
                },
                {
                    "name": "cloudFilesCDN",
                    "type": "rax:object-cdn",
                    "endpoints": [{
                        "region": "DFW",
                        "publicURL": format!("{}/cdn/acct", server.uri())
                    }]
                }
            ]
        }
    })
}

pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(server)))
        .mount(server)
        .await;
}

pub fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new("demo", "secret-key");
    config.auth_url = server.uri();
    config.request_timeout_secs = 5;
    config
}

pub fn client(server: &MockServer) -> CloudFilesClient {
    CloudFilesClient::new(config(server))
}

pub fn container() -> Container {
    Container::new("assets")
}
