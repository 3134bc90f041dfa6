/// Wall-clock ticking and what happens when the server falls behind

use std::time::{Duration, Instant};

use tessera_server::{ServerConfig, TesseraServerError};
use tessera_shared::{GridPosition, Position};
use tessera_test::{init_logger, TestServer, MOVEMENT};

#[test]
fn ticks_follow_the_clock() {
    let mut test = TestServer::new();
    let start = Instant::now();

    assert!(test.server.take_tick_events(start).is_empty());

    let events = test.server.take_tick_events(start + Duration::from_millis(35));
    assert_eq!(events.ticks(), &[0, 1, 2]);
    assert_eq!(events.skipped(), 0);

    // the 5ms remainder carries over
    let events = test.server.take_tick_events(start + Duration::from_millis(40));
    assert_eq!(events.ticks().len(), 1);
}

#[test]
fn overdue_ticks_are_skipped() {
    init_logger();
    let mut test = TestServer::new();
    let start = Instant::now();
    test.server.take_tick_events(start);

    let events = test.server.take_tick_events(start + Duration::from_millis(100));

    assert_eq!(events.ticks().len(), 4);
    assert_eq!(events.skipped(), 6);
    assert_eq!(test.server.current_tick(), 6);
    assert_eq!(events.ticks(), &[6, 7, 8, 9]);
}

#[test]
fn skipped_ticks_expire_movement_schedules() {
    init_logger();
    let mut test = TestServer::new();
    let watcher = test.connect();
    test.server
        .subscribe(&watcher, GridPosition::new(0, 0, 0))
        .unwrap();
    test.spawn_at(Position::new(1.0, 1.0, 1.0));
    // scheduled at tick 0 for tick 3
    test.tick();

    let start = Instant::now();
    test.server.take_tick_events(start);
    test.server.take_tick_events(start + Duration::from_millis(100));
    test.tick();

    assert!(test
        .delivered()
        .iter()
        .all(|delivered| delivered.event.kind != MOVEMENT));
}

#[test]
fn zero_tick_interval_is_rejected() {
    let config = ServerConfig {
        tick_interval: Duration::ZERO,
        ..Default::default()
    };

    assert!(matches!(
        tessera_server::Server::<tessera_test::TestEvent>::new(
            config,
            tessera_test::protocol(),
            tessera_test::TestCodec
        ),
        Err(TesseraServerError::InvalidTickInterval)
    ));
}
