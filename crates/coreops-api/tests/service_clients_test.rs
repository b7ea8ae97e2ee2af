// Integration tests for the thin Consul, etcd, and Docker clients.

use serde_json::json;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coreops_api::Error;
use coreops_api::consul::ConsulClient;
use coreops_api::docker::{CreateImageOptions, DockerClient};
use coreops_api::etcd::EtcdClient;

// ── Consul ──────────────────────────────────────────────────────────

#[tokio::test]
async fn consul_health_checks_decode() {
    let server = MockServer::start().await;
    let client = ConsulClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/health/checks/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Node": "core-1",
            "CheckID": "service:web",
            "Name": "Service 'web' check",
            "Status": "passing",
            "Notes": "",
            "Output": "HTTP GET 200",
            "ServiceID": "web",
            "ServiceName": "web",
            "CreateIndex": 10,
            "ModifyIndex": 12
        }])))
        .mount(&server)
        .await;

    let checks = client.health_checks("web").await.unwrap();

    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].node, "core-1");
    assert_eq!(checks[0].status, "passing");
    assert_eq!(checks[0].modify_index, 12);
}

#[tokio::test]
async fn consul_zero_checks_is_an_error() {
    let server = MockServer::start().await;
    let client = ConsulClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/health/checks/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client.health_checks("ghost").await.unwrap_err();

    assert!(
        matches!(err, Error::NoHealthChecks { ref service } if service == "ghost"),
        "expected NoHealthChecks, got: {err:?}"
    );
}

// ── etcd ────────────────────────────────────────────────────────────

#[tokio::test]
async fn etcd_get_key_returns_the_node() {
    let server = MockServer::start().await;
    let client = EtcdClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/v2/keys/services/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "get",
            "node": {
                "key": "/services/web",
                "value": "10.0.0.5:8080",
                "modifiedIndex": 7,
                "createdIndex": 3
            }
        })))
        .mount(&server)
        .await;

    let node = client.get_key("services/web").await.unwrap();

    assert_eq!(node.key, "/services/web");
    assert_eq!(node.value, "10.0.0.5:8080");
    assert!(!node.dir);
}

#[tokio::test]
async fn etcd_missing_key_surfaces_the_error_body() {
    let server = MockServer::start().await;
    let client = EtcdClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/v2/keys/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorCode": 100,
            "message": "Key not found",
            "cause": "/missing",
            "index": 42
        })))
        .mount(&server)
        .await;

    let err = client.get_key("missing").await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert_eq!(err.to_string(), "100: Key not found (/missing)");
}

#[tokio::test]
async fn etcd_recursive_listing_uses_a_query_parameter() {
    let server = MockServer::start().await;
    let client = EtcdClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/v2/keys/services"))
        .and(query_param("recursive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "get",
            "node": {
                "key": "/services",
                "dir": true,
                "nodes": [
                    { "key": "/services/web", "value": "10.0.0.5:8080" },
                    { "key": "/services/db", "value": "10.0.0.6:5432" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let node = client.recurse_keys("services").await.unwrap();

    assert!(node.dir);
    assert_eq!(node.nodes.len(), 2);
    assert_eq!(node.nodes[1].key, "/services/db");
}

#[tokio::test]
async fn etcd_set_key_reports_the_previous_node() {
    let server = MockServer::start().await;
    let client = EtcdClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    // Update of an existing key: 200 with prevNode.
    Mock::given(method("PUT"))
        .and(path("/v2/keys/services/web"))
        .and(body_string("value=10.0.0.7%3A8080"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "set",
            "node": { "key": "/services/web", "value": "10.0.0.7:8080" },
            "prevNode": { "key": "/services/web", "value": "10.0.0.5:8080" }
        })))
        .mount(&server)
        .await;

    // First create: 201, no prevNode.
    Mock::given(method("PUT"))
        .and(path("/v2/keys/services/db"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "action": "set",
            "node": { "key": "/services/db", "value": "10.0.0.6:5432" }
        })))
        .mount(&server)
        .await;

    let prev = client.set_key("services/web", "10.0.0.7:8080").await.unwrap();
    assert_eq!(prev.map(|n| n.value), Some("10.0.0.5:8080".to_owned()));

    let prev = client.set_key("services/db", "10.0.0.6:5432").await.unwrap();
    assert!(prev.is_none());
}

#[tokio::test]
async fn etcd_delete_key() {
    let server = MockServer::start().await;
    let client = EtcdClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/v2/keys/services/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "delete",
            "node": { "key": "/services/web", "modifiedIndex": 9 },
            "prevNode": { "key": "/services/web", "value": "10.0.0.5:8080" }
        })))
        .mount(&server)
        .await;

    client.delete_key("services/web").await.unwrap();
}

// ── Docker ──────────────────────────────────────────────────────────

#[tokio::test]
async fn docker_list_containers_passes_the_all_flag() {
    let server = MockServer::start().await;
    let client = DockerClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/containers/json"))
        .and(query_param("all", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Id": "abc123",
            "Names": ["/web_1"],
            "Image": "redis:latest",
            "ImageID": "sha256:deadbeef",
            "Command": "redis-server",
            "Created": 1_400_000_000,
            "Status": "Up 2 hours",
            "Ports": [
                { "IP": "0.0.0.0", "PrivatePort": 6379, "PublicPort": 16379, "Type": "tcp" }
            ],
            "Labels": null,
            "HostConfig": { "NetworkMode": "default" },
            "NetworkSettings": {
                "Networks": {
                    "bridge": { "IPAddress": "172.17.0.2", "IPPrefixLen": 16 }
                }
            }
        }])))
        .mount(&server)
        .await;

    let containers = client.list_containers(true).await.unwrap();

    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].id, "abc123");
    assert_eq!(containers[0].ports[0].private_port, 6379);
    assert!(containers[0].labels.is_none());
    assert_eq!(
        containers[0]
            .network_settings
            .networks
            .get("bridge")
            .map(|n| n.ip_address.as_str()),
        Some("172.17.0.2")
    );
}

#[tokio::test]
async fn docker_list_images() {
    let server = MockServer::start().await;
    let client = DockerClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("GET"))
        .and(path("/images/json"))
        .and(query_param("all", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Id": "sha256:deadbeef",
            "RepoTags": ["redis:latest"],
            "RepoDigests": [],
            "Created": 1_400_000_000,
            "Size": 12345,
            "VirtualSize": 23456,
            "Labels": {}
        }])))
        .mount(&server)
        .await;

    let images = client.list_images(false).await.unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].repo_tags, vec!["redis:latest"]);
}

#[tokio::test]
async fn docker_remove_container_maps_engine_errors() {
    let server = MockServer::start().await;
    let client = DockerClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/containers/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "No such container: ghost" })),
        )
        .mount(&server)
        .await;

    let err = client.remove_container("ghost", false, false).await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    match err {
        Error::Docker { status, ref message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such container: ghost");
        }
        other => panic!("expected Docker error, got: {other:?}"),
    }
}

#[tokio::test]
async fn docker_create_image_sends_only_set_options() {
    let server = MockServer::start().await;
    let client = DockerClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("POST"))
        .and(path("/images/create"))
        .and(query_param("fromImage", "redis"))
        .and(query_param("tag", "latest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let opts = CreateImageOptions {
        from_image: Some("redis".to_owned()),
        tag: Some("latest".to_owned()),
        ..CreateImageOptions::default()
    };

    client.create_image(&opts).await.unwrap();
}

#[tokio::test]
async fn docker_remove_image() {
    let server = MockServer::start().await;
    let client = DockerClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/images/redis"))
        .and(query_param("force", "true"))
        .and(query_param("noprune", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Untagged": "redis:latest" },
            { "Deleted": "sha256:deadbeef" }
        ])))
        .mount(&server)
        .await;

    client.remove_image("redis", true, false).await.unwrap();
}
