mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{FakeConnector, Script, params};
use sense_bridge::AccountController;
use sense_bridge::hub::{LocalHub, NodeRegistry};

fn setup() -> (Arc<LocalHub>, Arc<FakeConnector>, AccountController) {
    let hub = Arc::new(LocalHub::new());
    let connector = FakeConnector::new(Script::default());
    let controller = AccountController::new(hub.clone(), connector.clone()).unwrap();
    (hub, connector, controller)
}

#[tokio::test]
async fn missing_email_raises_notice() {
    let (hub, connector, mut controller) = setup();
    let only_password = HashMap::from([("password".to_string(), "pw".to_string())]);

    assert!(!controller.apply_credentials(&only_password).await);
    assert_eq!(
        hub.notices().get("email").map(String::as_str),
        Some("Please provide email address in custom parameters")
    );
    assert_eq!(connector.login_count(), 0);
    assert!(controller.session().is_none());
}

#[tokio::test]
async fn missing_password_keeps_email() {
    let (hub, _connector, mut controller) = setup();
    let only_email = HashMap::from([("email".to_string(), "me@example.com".to_string())]);

    assert!(!controller.apply_credentials(&only_email).await);
    assert!(hub.notices().contains_key("pass"));
    assert_eq!(controller.credentials().email(), Some("me@example.com"));

    // Password arrives later on its own
    let only_password = HashMap::from([("password".to_string(), "pw".to_string())]);
    assert!(controller.apply_credentials(&only_password).await);
    assert!(hub.notices().is_empty());
}

#[tokio::test]
async fn credentials_are_set_once() {
    let (hub, connector, mut controller) = setup();
    assert!(controller.apply_credentials(&params("me@example.com", "pw")).await);
    if let Some(task) = controller.take_discovery() {
        task.join().await.unwrap();
    }

    assert!(!controller.apply_credentials(&params("other@example.com", "pw")).await);
    assert_eq!(
        hub.notices().get("email").map(String::as_str),
        Some("Email address is already set, restart the node server to change it")
    );

    assert!(!controller.apply_credentials(&params("me@example.com", "new")).await);
    assert!(hub.notices().contains_key("pass"));
    assert_eq!(controller.credentials().password(), Some("pw"));

    // Redelivering the stored values is accepted and reconnects
    assert!(controller.apply_credentials(&params("me@example.com", "pw")).await);
    assert!(hub.notices().is_empty());
    assert_eq!(connector.login_count(), 2);
}

#[tokio::test]
async fn empty_values_raise_config_notice() {
    let (hub, connector, mut controller) = setup();
    assert!(!controller.apply_credentials(&params("me@example.com", "")).await);
    assert_eq!(
        hub.notices().get("cfg").map(String::as_str),
        Some("Please provide email address and password")
    );
    assert_eq!(connector.login_count(), 0);
}

#[tokio::test]
async fn rejected_login_skips_discovery() {
    let (hub, connector, mut controller) = setup();
    *connector.reject.lock().unwrap() = true;

    assert!(!controller.apply_credentials(&params("me@example.com", "pw")).await);
    assert_eq!(connector.login_count(), 1);
    assert!(controller.session().is_none());
    assert!(controller.take_discovery().is_none());
    // Not a configuration problem, nothing for the user to fix
    assert!(hub.notices().is_empty());
}
