/// Segment load lifecycle against a persistence backend

use std::sync::{Arc, Mutex};

use tessera_server::{Persistence, SegmentLoader, TesseraServerError};
use tessera_shared::{
    GridPosition, Position, SegmentConfig, SegmentError, SegmentResolver, SegmentState,
};
use tessera_test::TestServer;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Retrieve(Position, Position),
    Synchronize,
}

#[derive(Clone, Default)]
struct RecordingPersistence {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingPersistence {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Persistence for RecordingPersistence {
    fn retrieve_entities_in_range(&mut self, min: Position, max: Position) {
        self.calls.lock().unwrap().push(Call::Retrieve(min, max));
    }

    fn synchronize(&mut self) {
        self.calls.lock().unwrap().push(Call::Synchronize);
    }
}

fn resolver() -> SegmentResolver {
    SegmentResolver::new(&SegmentConfig { edge_length: 32.0 }).unwrap()
}

#[test]
fn load_requests_the_segment_range() {
    let persistence = RecordingPersistence::default();
    let mut loader = SegmentLoader::new(persistence.clone());
    let segment = GridPosition::new(1, -1, 0);

    assert!(loader.request_load(segment, &resolver()).unwrap());
    assert_eq!(loader.state(&segment), SegmentState::Loading);
    // second request while loading is a no-op
    assert!(!loader.request_load(segment, &resolver()).unwrap());

    assert_eq!(
        persistence.calls(),
        vec![Call::Retrieve(
            Position::new(32.0, -32.0, 0.0),
            Position::new(64.0, 0.0, 32.0)
        )]
    );
}

#[test]
fn unload_synchronizes_and_forgets() {
    let persistence = RecordingPersistence::default();
    let mut loader = SegmentLoader::new(persistence.clone());
    let segment = GridPosition::new(0, 0, 0);
    loader.request_load(segment, &resolver()).unwrap();
    loader.mark_loaded(segment).unwrap();
    assert_eq!(loader.loaded_segments(), vec![segment]);

    assert!(loader.request_unload(segment).unwrap());

    assert_eq!(loader.state(&segment), SegmentState::Unloaded);
    assert!(loader.loaded_segments().is_empty());
    assert_eq!(persistence.calls().last(), Some(&Call::Synchronize));
    assert!(!loader.request_unload(segment).unwrap());
}

#[test]
fn unloaded_segment_cannot_be_marked_loaded() {
    let mut loader = SegmentLoader::default();
    let segment = GridPosition::new(4, 4, 4);

    assert_eq!(
        loader.mark_loaded(segment),
        Err(SegmentError::InvalidTransition {
            segment,
            from: SegmentState::Unloaded,
            to: SegmentState::Loaded,
        })
    );
}

#[test]
fn load_can_be_cancelled() {
    let mut loader = SegmentLoader::default();
    let segment = GridPosition::new(2, 0, 0);
    loader.request_load(segment, &resolver()).unwrap();

    assert!(loader.request_unload(segment).unwrap());
    assert_eq!(loader.state(&segment), SegmentState::Unloaded);
}

#[test]
fn server_tracks_loaded_segments_in_order() {
    let persistence = RecordingPersistence::default();
    let mut test = TestServer::new();
    test.server.persistence_load(persistence.clone());

    for segment in [GridPosition::new(3, 0, 0), GridPosition::new(-1, 0, 0)] {
        assert!(test.server.load_segment(segment).unwrap());
        test.server.segment_loaded(segment).unwrap();
    }
    test.server.synchronize();

    assert_eq!(
        test.server.loaded_segments(),
        vec![GridPosition::new(-1, 0, 0), GridPosition::new(3, 0, 0)]
    );
    assert_eq!(persistence.calls().len(), 3);
    assert!(matches!(
        test.server.segment_loaded(GridPosition::new(9, 9, 9)),
        Err(TesseraServerError::Segment(SegmentError::InvalidTransition { .. }))
    ));
}
