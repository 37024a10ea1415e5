//! End-to-end playout session behavior under a paused tokio clock

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use playout_media_core::{AssetError, MediaKind};
use playout_rtp_core::ChannelSink;
use playout_session_core::{
    ClockState, Error, FaultScope, PlayoutEvent, PlayoutSession, SessionState,
};

use common::{drain, ulaw_store, video_store};

fn assert_started(event: Option<PlayoutEvent>, expected_secs: f64) {
    match event {
        Some(PlayoutEvent::Started { duration }) => {
            assert!((duration - expected_secs).abs() < 1e-9, "duration {duration}")
        }
        other => panic!("expected started, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_audio_cycle_addressing_and_debounced_end() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    assert!(session.take_event_receiver().is_none());

    session.on_transport_ready().unwrap();
    session.wait_for_state(SessionState::Ready).await.unwrap();

    let start = Instant::now();
    session.on_play().unwrap();
    assert_started(events.recv().await, 0.4);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));

    // Last unit at 380ms, end-of-sequence at 400ms, then the debounce
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "ended after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(910), "ended after {:?}", elapsed);

    let packets = drain(&mut packets);
    assert_eq!(packets.len(), 20);
    let ssrc = packets[0].header.ssrc;
    for (i, packet) in packets.iter().enumerate() {
        assert_eq!(packet.header.sequence_number, i as u16);
        assert_eq!(packet.header.timestamp, 160 * i as u32);
        assert_eq!(packet.header.ssrc, ssrc);
        assert_eq!(packet.header.marker, i == 0);
        assert_eq!(packet.payload.len(), 160);
    }

    assert_eq!(session.state(), SessionState::Ready);
    let stats = session.stats();
    assert_eq!(stats.cycles_started, 1);
    assert_eq!(stats.cycles_ended, 1);
    assert_eq!(stats.tracks[0].sender.packets_sent, 20);
    assert_eq!(stats.tracks[0].state, ClockState::Idle);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_continue_sequence() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();

    session.on_transport_ready().unwrap();
    session.on_play().unwrap();

    let mut first = Vec::new();
    for _ in 0..7 {
        first.push(packets.recv().await.unwrap());
    }
    session.on_pause().unwrap();
    session.wait_for_state(SessionState::Paused).await.unwrap();

    sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut packets).is_empty(), "no units while paused");

    let resumed_at = Instant::now();
    session.on_play().unwrap();
    let next = packets.recv().await.unwrap();
    assert_eq!(resumed_at.elapsed(), Duration::from_millis(20));
    assert_eq!(next.header.sequence_number, 7);
    assert_eq!(next.header.timestamp, 1120);
    assert_eq!(next.header.ssrc, first[0].header.ssrc);
    assert!(!next.header.marker);

    assert_started(events.recv().await, 0.4);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    assert_eq!(drain(&mut packets).len(), 12);

    session.close().await;
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_replay_gets_fresh_identity() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(5), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();

    session.on_play().unwrap();
    assert_started(events.recv().await, 0.1);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    let first = drain(&mut packets);

    session.on_play().unwrap();
    assert_started(events.recv().await, 0.1);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    let second = drain(&mut packets);

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert_ne!(first[0].header.ssrc, second[0].header.ssrc);
    assert_eq!(second[0].header.sequence_number, 0);
    assert_eq!(second[0].header.timestamp, 0);
    assert!(second[0].header.marker);
    assert_eq!(session.stats().cycles_ended, 2);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_play_during_debounce_flushes_ended() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(3), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();

    session.on_play().unwrap();
    session.wait_for_state(SessionState::Ended).await.unwrap();
    let replay_at = Instant::now();
    session.on_play().unwrap();

    assert_started(events.recv().await, 0.06);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    assert_started(events.recv().await, 0.06);
    assert_eq!(replay_at.elapsed(), Duration::ZERO);

    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    let all = drain(&mut packets);
    assert_eq!(all.len(), 6);
    assert_eq!(all[3].header.sequence_number, 0);
    assert_ne!(all[0].header.ssrc, all[3].header.ssrc);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_unbundled_tracks_end_together() {
    let (audio_sink, mut audio) = ChannelSink::with_label(1024, "audio");
    let (video_sink, mut video) = ChannelSink::with_label(1024, "video");
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(audio_sink))
        .track(video_store(10, 1.0), Arc::new(video_sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();

    let start = Instant::now();
    session.on_play().unwrap();
    assert_started(events.recv().await, 1.0);

    session.wait_for_state(SessionState::Ended).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    assert_eq!(start.elapsed(), Duration::from_millis(1500));

    // Exactly one ended per cycle
    sleep(Duration::from_secs(3)).await;
    assert!(events.try_recv().is_err());

    let audio = drain(&mut audio);
    let video = drain(&mut video);
    assert_eq!(audio.len(), 20);
    assert_eq!(video.len(), 10);
    assert_ne!(audio[0].header.ssrc, video[0].header.ssrc);

    let video_ts: Vec<u32> = video.iter().map(|p| p.header.timestamp).collect();
    assert_eq!(video_ts, (0..10).map(|i| 3000 * i).collect::<Vec<u32>>());
    assert!(video.iter().all(|p| p.header.payload_type == 96));
    assert!(video.iter().all(|p| p.header.marker));

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_play_before_transport_ready_is_ignored() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(5), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();

    session.on_play().unwrap();
    session.on_pause().unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(session.state(), SessionState::WaitingForTransport);
    assert!(drain(&mut packets).is_empty());
    assert!(events.try_recv().is_err());

    session.on_transport_ready().unwrap();
    session.on_play().unwrap();
    assert_started(events.recv().await, 0.1);
    assert_eq!(packets.recv().await.unwrap().header.sequence_number, 0);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_asset_never_becomes_ready() {
    let (audio_sink, mut audio) = ChannelSink::new(1024);
    let (video_sink, _video) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(5), Arc::new(audio_sink))
        .asset(MediaKind::Video, Err(Arc::new(AssetError::Empty)), Arc::new(video_sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();

    match events.recv().await {
        Some(PlayoutEvent::Error { scope, kind, reason }) => {
            assert_eq!(scope, FaultScope::Configuration);
            assert_eq!(kind, MediaKind::Video);
            assert!(reason.contains("empty"), "{reason}");
        }
        other => panic!("expected configuration error, got {:?}", other),
    }

    session.on_transport_ready().unwrap();
    session.on_play().unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(session.state(), SessionState::WaitingForTransport);
    assert!(drain(&mut audio).is_empty());
    assert!(events.try_recv().is_err());

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_closed_sink_faults_only_its_clock() {
    let (audio_sink, audio_rx) = ChannelSink::new(1024);
    drop(audio_rx);
    let (video_sink, mut video) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(audio_sink))
        .track(video_store(10, 1.0), Arc::new(video_sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();

    let start = Instant::now();
    session.on_play().unwrap();
    match events.recv().await {
        Some(PlayoutEvent::Error { scope: FaultScope::Clock, kind: MediaKind::Audio, .. }) => {}
        other => panic!("expected audio clock fault, got {:?}", other),
    }
    assert_started(events.recv().await, 1.0);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
    assert_eq!(drain(&mut video).len(), 10);

    let stats = session.stats();
    assert_eq!(stats.tracks[0].sender.packets_sent, 0);
    assert_eq!(stats.tracks[1].sender.cycles_completed, 1);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_backpressure_drops_and_keeps_pacing() {
    let (sink, mut packets) = ChannelSink::new(5);
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();

    let start = Instant::now();
    session.on_play().unwrap();
    assert_started(events.recv().await, 0.4);
    assert_eq!(events.recv().await, Some(PlayoutEvent::Ended));
    assert_eq!(start.elapsed(), Duration::from_millis(900));

    let delivered = drain(&mut packets);
    assert_eq!(delivered.len(), 5);
    let total = session.stats().total();
    assert_eq!(total.packets_sent, 5);
    assert_eq!(total.packets_dropped, 15);
    assert_eq!(total.packets_offered(), 20);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_is_idempotent_and_final() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(20), Arc::new(sink))
        .spawn()
        .unwrap();
    let mut events = session.take_event_receiver().unwrap();
    session.on_transport_ready().unwrap();
    session.on_play().unwrap();

    for _ in 0..3 {
        packets.recv().await.unwrap();
    }
    session.close().await;
    assert!(session.is_closed());
    session.close().await;

    // The sink went away with the driver, so the channel drains to its end
    assert!(packets.recv().await.is_none());
    assert_started(events.recv().await, 0.4);
    assert_eq!(events.recv().await, None);
    assert!(matches!(session.on_play(), Err(Error::SessionClosed)));
}

#[tokio::test(start_paused = true)]
async fn test_signaling_envelopes() {
    let (sink, mut packets) = ChannelSink::new(1024);
    let session = PlayoutSession::builder()
        .track(ulaw_store(5), Arc::new(sink))
        .spawn()
        .unwrap();
    session.on_transport_ready().unwrap();

    session.handle_envelope(r#"{"type":"answer","sdp":"v=0"}"#).unwrap();
    assert!(matches!(session.handle_envelope("{"), Err(Error::Control(_))));
    session.handle_envelope(r#"{"type":"play"}"#).unwrap();
    assert_eq!(packets.recv().await.unwrap().header.sequence_number, 0);

    session.handle_envelope(r#"{"type":"pause"}"#).unwrap();
    session.wait_for_state(SessionState::Paused).await.unwrap();

    session.close().await;
}

#[tokio::test]
async fn test_builder_rejects_bad_track_sets() {
    assert!(matches!(PlayoutSession::builder().spawn(), Err(Error::Configuration(_))));

    let (a, _ra) = ChannelSink::new(8);
    let (b, _rb) = ChannelSink::new(8);
    let result = PlayoutSession::builder()
        .track(ulaw_store(2), Arc::new(a))
        .track(ulaw_store(2), Arc::new(b))
        .spawn();
    assert!(matches!(result, Err(Error::Configuration(_))));
}
