/// Segment membership as seen through the server tick loop
///
/// Covers the Leave/Enter ordering when an entity crosses a segment boundary
/// in a single tick, and category indexers built from tag filters.

use tessera_server::{ServerConfig, TesseraServerError};
use tessera_shared::{accept_all, has_component, GridPosition, Position, SegmentConfig, SegmentEvent};
use tessera_test::{init_logger, Tag, TestServer};

fn server() -> TestServer {
    let mut test = TestServer::with_config(ServerConfig {
        segment: SegmentConfig { edge_length: 32.0 },
        ..Default::default()
    });
    test.server.world_mut().register::<Tag>().unwrap();
    test
}

#[test]
fn crossing_boundary_emits_leave_before_enter() {
    init_logger();
    let mut test = server();
    let indexer = test.server.add_indexer(accept_all()).unwrap();

    let entity = test.spawn_at(Position::new(10.0, 10.0, 0.0));
    let events = test.tick();
    assert_eq!(
        events.enters(indexer).collect::<Vec<_>>(),
        vec![(GridPosition::new(0, 0, 0), entity)]
    );

    test.move_to(&entity, Position::new(50.0, 10.0, 0.0));
    let events = test.tick();

    assert_eq!(
        events.segment_events(),
        &[
            (
                indexer,
                SegmentEvent::Leave {
                    segment: GridPosition::new(0, 0, 0),
                    entity
                }
            ),
            (
                indexer,
                SegmentEvent::Enter {
                    segment: GridPosition::new(1, 0, 0),
                    entity
                }
            ),
        ]
    );
    assert!(test
        .server
        .members_of(indexer, &GridPosition::new(1, 0, 0))
        .unwrap()
        .contains(&entity));
    assert!(test
        .server
        .members_of(indexer, &GridPosition::new(0, 0, 0))
        .unwrap()
        .is_empty());
}

#[test]
fn despawned_entity_leaves_its_segment() {
    let mut test = server();
    let indexer = test.server.add_indexer(accept_all()).unwrap();
    let entity = test.spawn_at(Position::new(-5.0, 0.0, 0.0));
    test.tick();

    test.server.world_mut().despawn(&entity).unwrap();
    let events = test.tick();

    assert_eq!(
        events.leaves(indexer).collect::<Vec<_>>(),
        vec![(GridPosition::new(-1, 0, 0), entity)]
    );
    assert!(!test.server.world().has_entity(&entity));
}

#[test]
fn category_indexers_are_independent() {
    let mut test = server();
    let tagged = test.server.add_indexer(has_component::<Tag>()).unwrap();
    let everyone = test.server.add_indexer(accept_all()).unwrap();

    let npc = test.spawn_at(Position::new(1.0, 1.0, 1.0));
    test.server.world_mut().add(&npc, Tag).unwrap();
    let player = test.spawn_at(Position::new(2.0, 2.0, 2.0));
    test.tick();

    let origin = GridPosition::new(0, 0, 0);
    let tagged_members = test.server.members_of(tagged, &origin).unwrap();
    let all_members = test.server.members_of(everyone, &origin).unwrap();
    assert_eq!(tagged_members.len(), 1);
    assert!(tagged_members.contains(&npc));
    assert!(all_members.contains(&npc) && all_members.contains(&player));
}

#[test]
fn unknown_indexer_is_an_error() {
    let mut other = server();
    let key = other.server.add_indexer(accept_all()).unwrap();
    let test = server();

    assert!(matches!(
        test.server.members_of(key, &GridPosition::default()),
        Err(TesseraServerError::IndexerNotFound { .. })
    ));
}
