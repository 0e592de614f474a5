#![allow(dead_code)]

use tokio::net::TcpListener;
use url::Url;

use ::common::prelude::{Custodian, SecretKey};
use custody_daemon::http_server::{self, api::client::ApiClient};
use custody_daemon::{ServiceConfig, ServiceState};

/// A node served on a loopback port for the rest of the test
pub struct TestNode {
    pub url: Url,
    pub state: ServiceState,
    pub key: Option<SecretKey>,
}

impl TestNode {
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.url).unwrap()
    }

    /// Registry entry for this node; panics if it has no key
    pub fn custodian(&self) -> Custodian {
        let key = self.key.as_ref().expect("custodian nodes have a key");
        Custodian::new(key.public(), self.url.as_str())
    }
}

pub async fn serve(config: ServiceConfig) -> TestNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ServiceState::from_config(&config).await.unwrap();

    let router = http_server::router(http_server::Config::new(addr).unwrap(), state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestNode {
        url: Url::parse(&format!("http://{}", addr)).unwrap(),
        state,
        key: config.node_secret,
    }
}

/// `count` custodian nodes, each with a fresh key
pub async fn custodians(count: usize) -> Vec<TestNode> {
    let mut nodes = Vec::with_capacity(count);
    for i in 0..count {
        let config = ServiceConfig {
            node_id: format!("custodian-{}", i),
            node_secret: Some(SecretKey::generate()),
            ..Default::default()
        };
        nodes.push(serve(config).await);
    }
    nodes
}

/// An orchestrating node distributing to `registry`
pub async fn orchestrator(registry: Vec<Custodian>, threshold: u8) -> TestNode {
    let config = ServiceConfig {
        node_id: "orchestrator".to_string(),
        custodians: registry,
        threshold,
        ..Default::default()
    };
    serve(config).await
}
