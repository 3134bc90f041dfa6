/// Connection lifecycle through the server: the state machine, entity
/// binding and what a failure tears down.

use tessera_server::TesseraServerError;
use tessera_shared::{ConnectionError, ConnectionState, EntityId, GridPosition};
use tessera_test::TestServer;

#[test]
fn accept_then_establish() {
    let mut test = TestServer::new();
    let connection = test.server.accept_connection();
    assert_eq!(
        test.server.connection_state(&connection).unwrap(),
        ConnectionState::Connecting
    );

    test.server.establish_connection(&connection).unwrap();

    assert_eq!(
        test.server.connection_state(&connection).unwrap(),
        ConnectionState::Connected
    );
    assert_eq!(test.server.connection_keys(), vec![connection]);
}

#[test]
fn failed_connection_must_be_reset_before_reuse() {
    let mut test = TestServer::new();
    let connection = test.connect();
    test.server.fail_connection(&connection).unwrap();

    assert_eq!(
        test.server.reconnect(&connection),
        Err(TesseraServerError::Connection(
            ConnectionError::InvalidTransition {
                from: ConnectionState::Failed,
                to: ConnectionState::Connecting,
            }
        ))
    );

    test.server.reset_connection(&connection).unwrap();
    test.server.reconnect(&connection).unwrap();
    test.server.establish_connection(&connection).unwrap();
    assert_eq!(
        test.server.connection_state(&connection).unwrap(),
        ConnectionState::Connected
    );
}

#[test]
fn reset_only_applies_to_failed_connections() {
    let mut test = TestServer::new();
    let connection = test.connect();

    assert!(matches!(
        test.server.reset_connection(&connection),
        Err(TesseraServerError::ConnectionNotActive {
            state: ConnectionState::Connected,
            ..
        })
    ));
}

#[test]
fn disconnect_removes_the_connection() {
    let mut test = TestServer::new();
    let connection = test.connect_as(EntityId::from_u64(1));

    test.server.disconnect(&connection).unwrap();

    assert_eq!(
        test.server.connection_state(&connection),
        Err(TesseraServerError::ConnectionNotFound { connection })
    );
    // the entity can be claimed again
    test.connect_as(EntityId::from_u64(1));
}

#[test]
fn entity_binding_is_one_to_one() {
    let mut test = TestServer::new();
    let entity = EntityId::from_u64(8);
    let first = test.connect_as(entity);
    let second = test.connect();

    assert_eq!(
        test.server.authenticate(&second, entity),
        Err(TesseraServerError::EntityAlreadyBound {
            entity,
            connection: first,
        })
    );
    assert_eq!(
        test.server.authenticate(&first, EntityId::from_u64(9)),
        Err(TesseraServerError::AlreadyAuthenticated {
            connection: first,
            entity,
        })
    );
}

#[test]
fn failure_releases_entity_and_subscriptions() {
    let mut test = TestServer::new();
    let entity = EntityId::from_u64(3);
    let connection = test.connect_as(entity);
    test.server
        .subscribe(&connection, GridPosition::new(1, 1, 1))
        .unwrap();

    test.server.fail_connection(&connection).unwrap();

    let routing = test.server.routing_table();
    assert_eq!(routing.authenticated_entity(&connection), None);
    assert_eq!(routing.connection_for_entity(&entity), None);
    assert!(routing.subscribers_of(&GridPosition::new(1, 1, 1)).is_empty());
    assert!(matches!(
        test.server.subscribe(&connection, GridPosition::new(1, 1, 1)),
        Err(TesseraServerError::ConnectionNotActive { .. })
    ));
}

#[test]
fn unknown_connection_is_an_error() {
    let mut test = TestServer::new();
    let connection = test.connect();
    test.server.disconnect(&connection).unwrap();

    assert_eq!(
        test.server.fail_connection(&connection),
        Err(TesseraServerError::ConnectionNotFound { connection })
    );
}
