//! Shared fixtures for session tests

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use playout_media_core::{FrameStore, TrackFormat};
use playout_rtp_core::packet::{RtpHeader, RtpPacket};

/// 20ms µ-law store of `units` chunks
pub fn ulaw_store(units: usize) -> Arc<FrameStore> {
    Arc::new(
        FrameStore::from_bytes(Bytes::from(vec![0x7fu8; 160 * units]), TrackFormat::pcmu())
            .expect("ulaw store"),
    )
}

/// VP8 dump of `frames` packets spread over `duration_secs`, captured with a
/// non-zero base timestamp
pub fn video_store(frames: usize, duration_secs: f64) -> Arc<FrameStore> {
    let base_ts: u32 = 3_000_000_000;
    let mut dump = Vec::new();
    for i in 0..frames {
        let mut header =
            RtpHeader::new(100, 40_000 + i as u16, base_ts.wrapping_add(3000 * i as u32), 0x5151);
        header.marker = true;
        let raw = RtpPacket::new(header, Bytes::from(vec![i as u8; 900]))
            .serialize()
            .expect("serialize");
        dump.extend_from_slice(&(raw.len() as u32).to_be_bytes());
        dump.extend_from_slice(&raw);
    }
    Arc::new(
        FrameStore::from_bytes(Bytes::from(dump), TrackFormat::vp8_dump(duration_secs))
            .expect("video store"),
    )
}

/// Everything currently queued on a packet receiver
pub fn drain(packets: &mut mpsc::Receiver<RtpPacket>) -> Vec<RtpPacket> {
    let mut out = Vec::new();
    while let Ok(packet) = packets.try_recv() {
        out.push(packet);
    }
    out
}
