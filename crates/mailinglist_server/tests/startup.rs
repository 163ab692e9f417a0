use mailinglist_server::{bind_listener, serve, ServeError, ServerConfig};
use std::time::Duration;

#[tokio::test]
async fn unopenable_database_fails_before_binding() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        db_path: dir.path().join("missing-dir").join("list.db"),
        call_timeout: Duration::from_secs(1),
    };

    let err = serve(config).await.unwrap_err();
    assert!(matches!(err, ServeError::Db(_)), "{err}");
}

#[tokio::test]
async fn occupied_port_is_bind_error() {
    let dir = tempfile::tempdir().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();
    let config = ServerConfig {
        bind: addr.clone(),
        db_path: dir.path().join("list.db"),
        call_timeout: Duration::from_secs(1),
    };

    let err = serve(config).await.unwrap_err();
    match err {
        ServeError::Bind { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("unexpected error: {other}"),
    }
    drop(taken);
}

#[tokio::test]
async fn hostname_listen_address_is_resolved() {
    let listener = bind_listener("localhost:0").await.unwrap();
    let local = listener.local_addr().unwrap();
    assert!(local.ip().is_loopback(), "{local}");
    assert_ne!(local.port(), 0);
}

#[tokio::test]
async fn unresolvable_host_is_bind_error() {
    let err = bind_listener("no-such-host.invalid:0").await.unwrap_err();
    assert!(matches!(err, ServeError::Bind { .. }), "{err}");
}
