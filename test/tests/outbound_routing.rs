/// Outbound routing through the server: allow-lists, entity mapping and
/// segment fan-out, including connections that fail mid-subscription.

use tessera_shared::{ConnectionState, EntityId, GridPosition};
use tessera_test::{init_logger, TestEvent, TestServer, ADMIN_COMMAND, CHAT, WHISPER};

const SEGMENT: GridPosition = GridPosition::new(2, 0, -1);

#[test]
fn segment_events_reach_every_subscriber() {
    let mut test = TestServer::new();
    let first = test.connect();
    let second = test.connect();
    let outsider = test.connect();
    test.server.subscribe(&first, SEGMENT).unwrap();
    test.server.subscribe(&second, SEGMENT).unwrap();
    test.server
        .subscribe(&outsider, GridPosition::new(0, 0, 0))
        .unwrap();

    test.server
        .queue_event(TestEvent::to_segment(CHAT, SEGMENT, b"hello"));
    test.tick();

    let delivered = test.delivered();
    let mut connections: Vec<_> = delivered.iter().map(|d| d.connection).collect();
    connections.sort();
    assert_eq!(connections, vec![first, second]);
    assert!(delivered.iter().all(|d| d.event.body == b"hello"));
}

#[test]
fn failed_connection_is_excluded_from_fan_out() {
    init_logger();
    let mut test = TestServer::new();
    let healthy = test.connect();
    let failing = test.connect();
    test.server.subscribe(&healthy, SEGMENT).unwrap();
    test.server.subscribe(&failing, SEGMENT).unwrap();

    test.server.fail_connection(&failing).unwrap();
    test.server
        .queue_event(TestEvent::to_segment(CHAT, SEGMENT, b"after failure"));
    test.tick();

    let delivered = test.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].connection, healthy);
    assert_eq!(
        test.server.connection_state(&failing).unwrap(),
        ConnectionState::Failed
    );
    let failed = test.server.routing_table().connection(&failing).unwrap();
    assert_eq!(failed.subscriptions().count(), 0);
}

#[test]
fn entity_events_go_to_the_bound_connection() {
    let mut test = TestServer::new();
    let alice = EntityId::from_u64(1);
    let bob = EntityId::from_u64(2);
    let alice_connection = test.connect_as(alice);
    let bob_connection = test.connect_as(bob);

    test.server
        .queue_event(TestEvent::to_entity(WHISPER, bob, b"psst"));
    test.tick();

    let delivered = test.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].connection, bob_connection);
    assert_ne!(delivered[0].connection, alice_connection);
}

#[test]
fn entity_without_live_connection_is_a_silent_drop() {
    let mut test = TestServer::new();
    let entity = EntityId::from_u64(5);
    let connection = test.connect_as(entity);
    test.server.disconnect(&connection).unwrap();

    test.server
        .queue_event(TestEvent::to_entity(WHISPER, entity, b"gone"));
    test.server
        .queue_event(TestEvent::to_entity(WHISPER, EntityId::from_u64(99), b"never"));
    test.tick();

    assert!(test.delivered().is_empty());
}

#[test]
fn connection_scoped_events_need_a_connected_peer() {
    let mut test = TestServer::new();
    let connected = test.connect();
    let connecting = test.server.accept_connection();

    test.server
        .queue_event(TestEvent::to_connection(CHAT, connected, b"a"));
    test.server
        .queue_event(TestEvent::to_connection(CHAT, connecting, b"b"));
    test.tick();

    let delivered = test.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].connection, connected);
}

#[test]
fn kinds_outside_the_outbound_allow_list_are_dropped() {
    let mut test = TestServer::new();
    let connection = test.connect();

    test.server
        .queue_event(TestEvent::to_connection(ADMIN_COMMAND, connection, b"no"));
    test.tick();

    assert!(test.delivered().is_empty());
}

#[test]
fn nonces_increase_per_connection() {
    let mut test = TestServer::new();
    let connection = test.connect();
    for body in [b"1", b"2", b"3"] {
        test.server
            .queue_event(TestEvent::to_connection(CHAT, connection, body));
    }
    test.tick();

    let delivered = test.delivered_to(connection);
    let bodies: Vec<&[u8]> = delivered.iter().map(|d| d.event.body.as_slice()).collect();
    assert_eq!(bodies, vec![b"1" as &[u8], b"2", b"3"]);
    assert_eq!(delivered[1].nonce, delivered[0].nonce.wrapping_add(1));
    assert_eq!(delivered[2].nonce, delivered[1].nonce.wrapping_add(1));
}

#[test]
fn unsubscribed_connection_stops_receiving() {
    let mut test = TestServer::new();
    let connection = test.connect();
    assert!(test.server.subscribe(&connection, SEGMENT).unwrap());
    assert!(!test.server.subscribe(&connection, SEGMENT).unwrap());
    assert!(test.server.unsubscribe(&connection, &SEGMENT).unwrap());

    test.server
        .queue_event(TestEvent::to_segment(CHAT, SEGMENT, b"x"));
    test.tick();

    assert!(test.delivered().is_empty());
}
