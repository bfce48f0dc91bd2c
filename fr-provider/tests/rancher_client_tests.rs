use anyhow::Result;
use fr_models::{
    ClusterSecret, ClusterService, LaunchConfig, ScaleUpdate, SecretSpec,
    ServiceSpec, ServiceState, ServiceUpgrade,
};
use fr_provider::{
    ClusterError,
    cluster::{ClusterClient, RancherClient, RancherConfig},
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{basic_auth, body_partial_json, method, path, query_param},
};

const STACK_ID: &str = "1st5";

fn config(server: &MockServer) -> RancherConfig {
    RancherConfig {
        url: format!("{}/v2-beta/", server.uri()),
        access_key: "access".into(),
        secret_key: "secret".into(),
        stack_name: "faas-functions".into(),
        timeout: Duration::from_secs(5),
    }
}

async fn mount_existing_stack(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2-beta/stacks"))
        .and(query_param("name", "faas-functions"))
        .and(basic_auth("access", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "collection",
            "data": [{ "id": STACK_ID, "name": "faas-functions" }]
        })))
        .mount(server)
        .await;
}

fn service_json(state: &str) -> serde_json::Value {
    json!({
        "id": "1s9",
        "name": "echo",
        "state": state,
        "scale": 1,
        "launchConfig": {
            "imageUuid": "docker:alpine:latest",
            "labels": { "faas_function": "echo" }
        }
    })
}

fn service(state: ServiceState) -> ClusterService {
    ClusterService {
        id: "1s9".into(),
        name: "echo".into(),
        state,
        scale: 1,
        launch_config: LaunchConfig::default(),
    }
}

#[tokio::test]
async fn connect_resolves_existing_stack() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;

    let client = RancherClient::connect(config(&server)).await?;
    assert_eq!(client.stack_id(), STACK_ID);
    Ok(())
}

#[tokio::test]
async fn connect_creates_missing_stack() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/stacks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2-beta/stacks"))
        .and(body_partial_json(json!({ "name": "faas-functions" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "1st9", "name": "faas-functions" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    assert_eq!(client.stack_id(), "1st9");
    Ok(())
}

#[tokio::test]
async fn connect_rejects_non_http_url() {
    let result = RancherClient::connect(RancherConfig {
        url: "rancher:8080".into(),
        access_key: "a".into(),
        secret_key: "s".into(),
        stack_name: "faas-functions".into(),
        timeout: Duration::from_secs(1),
    })
    .await;
    assert!(matches!(result, Err(ClusterError::ConfigurationError(_))));
}

#[tokio::test]
async fn list_services_is_scoped_to_stack() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/services"))
        .and(query_param("stackId", STACK_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [service_json("active")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    let services = client.list_services().await?;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].state, ServiceState::Active);
    assert!(services[0].is_function());
    Ok(())
}

#[tokio::test]
async fn find_by_name_returns_first_match_or_none() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/services"))
        .and(query_param("name", "echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [service_json("upgraded")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/services"))
        .and(query_param("name", "ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    let found = client.find_service_by_name("echo").await?.unwrap();
    assert_eq!(found.state, ServiceState::Upgraded);
    assert!(client.find_service_by_name("ghost").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn create_service_injects_stack_id() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2-beta/services"))
        .and(body_partial_json(json!({
            "name": "echo",
            "scale": 1,
            "startOnCreate": true,
            "stackId": STACK_ID,
            "launchConfig": { "imageUuid": "docker:alpine:latest" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(service_json("activating")))
        .expect(1)
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    let created = client
        .create_service(&ServiceSpec {
            name: "echo".into(),
            scale: 1,
            start_on_create: true,
            launch_config: LaunchConfig {
                image_uuid: "docker:alpine:latest".into(),
                ..Default::default()
            },
            stack_id: None,
        })
        .await?;
    assert_eq!(created.id, "1s9");
    Ok(())
}

#[tokio::test]
async fn service_actions_use_documented_requests() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2-beta/services/1s9"))
        .and(query_param("action", "upgrade"))
        .and(body_partial_json(json!({
            "inServiceStrategy": { "batchSize": 1, "startFirst": true }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(service_json("upgrading")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2-beta/services/1s9"))
        .and(query_param("action", "finishupgrade"))
        .respond_with(ResponseTemplate::new(202).set_body_json(service_json("finishing-upgrade")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2-beta/services/1s9"))
        .and(body_partial_json(json!({ "scale": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json("active")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2-beta/services/1s9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json("removing")))
        .expect(1)
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    let svc = service(ServiceState::Active);
    let upgrading = client
        .upgrade_service(&svc, &ServiceUpgrade::rolling(LaunchConfig::default()))
        .await?;
    assert_eq!(upgrading.state, ServiceState::Upgrading);
    let finishing = client.finish_upgrade(&svc).await?;
    assert_eq!(
        finishing.state,
        ServiceState::Other("finishing-upgrade".into())
    );
    client.update_service(&svc, &ScaleUpdate { scale: 3 }).await?;
    client.delete_service(&svc).await?;
    Ok(())
}

#[tokio::test]
async fn secret_requests() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/secrets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "1se1", "name": "api-key" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2-beta/secrets"))
        .and(body_partial_json(json!({ "name": "db-password", "value": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "1se2", "name": "db-password" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2-beta/secrets/1se1"))
        .and(body_partial_json(json!({ "value": "rotated" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "1se1", "name": "api-key" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2-beta/secrets/1se1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    let secrets = client.list_secrets().await?;
    assert_eq!(secrets.len(), 1);
    let created = client
        .create_secret(&SecretSpec {
            name: "db-password".into(),
            value: "hunter2".into(),
        })
        .await?;
    assert_eq!(created.id, "1se2");

    let existing = ClusterSecret {
        id: "1se1".into(),
        name: "api-key".into(),
        value: None,
    };
    client.update_secret(&existing, "rotated").await?;
    client.delete_secret(&existing).await?;
    Ok(())
}

#[tokio::test]
async fn error_status_is_reported_with_body() -> Result<()> {
    let server = MockServer::start().await;
    mount_existing_stack(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2-beta/services"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = RancherClient::connect(config(&server)).await?;
    match client.list_services().await {
        Err(ClusterError::RequestFailed(status, body)) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}
