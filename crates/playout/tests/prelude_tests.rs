use std::sync::Arc;

use bytes::Bytes;
use playout::prelude::*;

#[tokio::test(start_paused = true)]
async fn test_prelude_plays_a_short_asset() {
    let store = Arc::new(FrameStore::from_bytes(Bytes::from(vec![0u8; 480]), TrackFormat::pcmu()).unwrap());
    let (sink, mut packets) = ChannelSink::new(16);

    let session = PlayoutSession::builder().track(store, Arc::new(sink)).spawn().unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.handle_control(ControlSignal::TransportReady).unwrap();
    session.handle_control(ControlSignal::Play).unwrap();

    assert!(matches!(events.recv().await, Some(PlayoutEvent::Started { .. })));
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));

    let mut sequence = Vec::new();
    while let Ok(packet) = packets.try_recv() {
        sequence.push(packet.header.sequence_number);
    }
    assert_eq!(sequence, vec![0, 1, 2]);
    assert_eq!(session.state(), SessionState::Ready);
    session.close().await;
}

#[test]
fn test_version_is_set() {
    assert!(!playout::VERSION.is_empty());
}
