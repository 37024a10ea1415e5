use bytes::Bytes;

use super::{RtpHeader, RtpPacket};
use crate::{RtpPayloadType, RtpSequenceNumber, RtpSsrc, RtpTimestamp};

/// Build one fully-addressed transport unit.
///
/// Pure: no stored state and no wrapping. `sequence_number` and `timestamp`
/// arrive already reduced into their 16/32-bit ranges by the caller.
pub fn build_packet(
    payload: Bytes,
    sequence_number: RtpSequenceNumber,
    timestamp: RtpTimestamp,
    ssrc: RtpSsrc,
    payload_type: RtpPayloadType,
    marker: bool,
) -> RtpPacket {
    let mut header = RtpHeader::new(payload_type, sequence_number, timestamp, ssrc);
    header.marker = marker;
    RtpPacket::new(header, payload)
}
