//! End-to-end test of an auth node over RPC.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bookstore_auth::server;
use bookstore_bus::InMemoryEventLog;
use bookstore_discovery::{InMemoryRegistry, Registry};
use bookstore_rpc::protocol::{AUTH_SERVICE, LoginUser, ValidateUsernameUnique};
use bookstore_rpc::{Code, RpcClient, RpcError};
use bookstore_runtime::Node;
use bookstore_runtime::backends::EventBus;
use bookstore_runtime::config::ListenConfig;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_registered_user_can_log_in_over_rpc() {
    // Arrange
    let registry = Arc::new(InMemoryRegistry::new());
    let log = InMemoryEventLog::new();
    let cancel = CancellationToken::new();
    let node = Node::bind(&ListenConfig::loopback(), registry.clone(), AUTH_SERVICE)
        .await
        .unwrap();
    let server = tokio::spawn(server::run(
        node,
        common::in_memory_service(&[]),
        EventBus::in_memory(&log),
        common::fast_config(),
        cancel.clone(),
    ));
    let client = RpcClient::new(registry.clone(), Duration::from_secs(2)).unwrap();
    let probe = ValidateUsernameUnique {
        username: "margaret".to_owned(),
    };
    assert!(client.call(&probe).await.unwrap().unique);

    // Act
    common::publish(&log, common::registration("margaret")).await;
    let mut unique = true;
    for _ in 0..400 {
        unique = client.call(&probe).await.unwrap().unique;
        if !unique {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Assert
    assert!(!unique);
    let user = client
        .call(&LoginUser {
            username: "margaret".to_owned(),
            password: "secret".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "margaret@example.com");
    let err = client
        .call(&LoginUser {
            username: "margaret".to_owned(),
            password: "wrong".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Status(ref status) if status.code == Code::Unauthenticated));

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
    assert!(registry.discover(AUTH_SERVICE).await.unwrap().is_empty());
}
