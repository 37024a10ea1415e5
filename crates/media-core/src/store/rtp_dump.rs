use bytes::Bytes;
use tracing::debug;

use playout_rtp_core::RtpPacket;

use super::{container, PayloadUnit};
use crate::error::AssetError;

/// Parse a length-prefixed dump whose records are captured RTP packets.
///
/// Only the payload, source timestamp and marker survive; the captured
/// sequence numbers and SSRC are replaced on every emission.
pub(super) fn parse(data: &Bytes) -> Result<Vec<PayloadUnit>, AssetError> {
    let records = container::parse(data)?;
    let units = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let packet = RtpPacket::parse(record).map_err(|e| {
                AssetError::malformed(format!("RTP dump record {}: {}", index, e))
            })?;
            Ok(PayloadUnit {
                data: packet.payload,
                source_timestamp: Some(packet.header.timestamp),
                marker: packet.header.marker,
            })
        })
        .collect::<Result<Vec<_>, AssetError>>()?;

    debug!("Parsed {} RTP dump records", units.len());
    Ok(units)
}
