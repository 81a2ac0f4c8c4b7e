//! Disposable fake device API for running documentation snippets
//!
//! Each snippet run gets a private server on an ephemeral port, seeded with
//! its own API key and a copy of the device fixture. Snippets talk to it
//! over plain HTTP with bearer authentication, so no live credentials are
//! ever exposed to untrusted code.

pub mod fixtures;
pub mod handlers;
pub mod provisioner;
pub mod server;

pub use fixtures::{ApiFixture, Device, DeviceProperties};
pub use provisioner::FakeApiProvisioner;
pub use server::{FakeApiServer, RunningServer};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use snippet_core::backend::provision;
    use std::time::Duration;

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client")
    }

    async fn start_local(api_key: &str) -> RunningServer {
        FakeApiServer::new(ApiFixture::create_test_fixture(), api_key)
            .start("127.0.0.1:0", "127.0.0.1")
            .await
            .expect("Failed to start fake API")
    }

    #[test]
    fn test_fixture_creation() {
        let fixture = ApiFixture::create_test_fixture();
        assert_eq!(fixture.devices.len(), 3);

        let lock = fixture.get_device("august_lock_1").unwrap();
        assert_eq!(lock.display_name, "Front Door");
        assert!(!lock.properties.locked);
        assert!(fixture.get_device("missing").is_none());
    }

    #[test]
    fn test_fixture_from_yaml() {
        let yaml = r#"
devices:
  - device_id: lock_a
    device_type: kwikset_lock
    display_name: Garage
    properties:
      locked: true
  - device_id: sensor_b
    device_type: noiseaware_activity_zone
    display_name: Hallway
"#;
        let fixture = ApiFixture::from_yaml(yaml).unwrap();
        assert_eq!(fixture.devices.len(), 2);
        assert!(fixture.devices[0].properties.locked);
        assert!(fixture.devices[0].properties.online);
        assert!(!fixture.devices[1].properties.locked);
    }

    #[tokio::test]
    async fn test_health_needs_no_credentials() {
        let server = start_local("key_1").await;

        let response = client()
            .get(format!("{}/health", server.base_url()))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_requests_require_seeded_key() {
        let server = start_local("key_1").await;
        let url = format!("{}/devices/list", server.base_url());

        let anonymous = client().get(&url).send().await.unwrap();
        assert_eq!(anonymous.status(), reqwest::StatusCode::UNAUTHORIZED);

        let wrong = client().get(&url).bearer_auth("key_2").send().await.unwrap();
        assert_eq!(wrong.status(), reqwest::StatusCode::UNAUTHORIZED);

        let ok = client().get(&url).bearer_auth("key_1").send().await.unwrap();
        assert!(ok.status().is_success());
        let body: Value = ok.json().await.unwrap();
        assert_eq!(body["devices"].as_array().unwrap().len(), 3);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_and_unlock_door() {
        let server = start_local("key_1").await;
        let base = server.base_url().to_string();
        let client = client();

        let response = client
            .post(format!("{}/locks/lock_door", base))
            .bearer_auth("key_1")
            .json(&json!({ "device_id": "august_lock_1" }))
            .send()
            .await
            .unwrap();
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["action_attempt"]["status"], "success");
        assert_eq!(body["action_attempt"]["action_type"], "LOCK_DOOR");

        let device: Value = client
            .post(format!("{}/devices/get", base))
            .bearer_auth("key_1")
            .json(&json!({ "device_id": "august_lock_1" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(device["device"]["properties"]["locked"], true);

        let thermostat = client
            .post(format!("{}/locks/unlock_door", base))
            .bearer_auth("key_1")
            .json(&json!({ "device_id": "ecobee_thermostat_1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(thermostat.status(), reqwest::StatusCode::BAD_REQUEST);

        let missing = client
            .post(format!("{}/devices/get", base))
            .bearer_auth("key_1")
            .json(&json!({ "device_id": "nope" }))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_provisioned_instances_are_isolated() {
        let provisioner = FakeApiProvisioner::new()
            .with_bind_addr("127.0.0.1:0")
            .with_advertised_host("127.0.0.1");

        let first = provision(&provisioner).await.unwrap();
        let second = provision(&provisioner).await.unwrap();

        assert_ne!(first.instance().base_url, second.instance().base_url);
        assert_ne!(first.instance().api_key, second.instance().api_key);
        assert!(first.instance().api_key.starts_with("seam_apikey_"));

        // The first instance's key is useless against the second server.
        let response = client()
            .get(format!("{}/devices/list", second.instance().base_url))
            .bearer_auth(&first.instance().api_key)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

        let base_url = first.instance().base_url.clone();
        first.release().await;
        second.release().await;

        let after = client().get(format!("{}/health", base_url)).send().await;
        assert!(after.is_err(), "server should be gone after release");
    }

    #[tokio::test]
    async fn test_start_requires_seed() {
        use snippet_core::backend::{BackendProvisioner, FakeBackend};

        let provisioner = FakeApiProvisioner::new().with_bind_addr("127.0.0.1:0");
        let mut instance = provisioner.create_instance().await.unwrap();

        let result = instance.start_server().await;
        assert!(matches!(result, Err(snippet_core::BackendError::StartFailed(_))));
        assert!(instance.shutdown().await.is_ok());
    }
}
