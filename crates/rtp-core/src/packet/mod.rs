//! RTP packet (transport unit) model
//!
//! A [`RtpPacket`] is one outbound network frame: payload bytes plus the
//! header fields the playout engine rewrites per emission. The full RFC 3550
//! header is parsed so that pre-captured dumps carrying CSRCs, header
//! extensions or padding load cleanly, but units built by the engine only ever
//! carry the fixed header.

mod builder;

pub use builder::build_packet;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::{
    Result, RtpPayloadType, RtpSequenceNumber, RtpSsrc, RtpTimestamp, RTP_MIN_HEADER_SIZE,
    RTP_VERSION,
};

/// RTP header extension block (RFC 3550 Section 5.3.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeaderExtension {
    /// Profile-defined identifier
    pub profile: u16,

    /// Extension data, a multiple of 4 bytes
    pub data: Bytes,
}

/// RTP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    /// Protocol version, always 2
    pub version: u8,

    /// Marker bit (start of talkspurt for audio, frame boundary for video)
    pub marker: bool,

    /// Payload format identifier
    pub payload_type: RtpPayloadType,

    /// Sequence number
    pub sequence_number: RtpSequenceNumber,

    /// Capture timestamp in clock-rate units
    pub timestamp: RtpTimestamp,

    /// Synchronization source identifier
    pub ssrc: RtpSsrc,

    /// Contributing sources
    pub csrc: Vec<RtpSsrc>,

    /// Optional header extension
    pub extension: Option<RtpHeaderExtension>,
}

impl RtpHeader {
    /// Create a fixed header with no CSRCs and no extension
    pub fn new(
        payload_type: RtpPayloadType,
        sequence_number: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        ssrc: RtpSsrc,
    ) -> Self {
        Self {
            version: RTP_VERSION,
            marker: false,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc: Vec::new(),
            extension: None,
        }
    }

    /// Size of this header on the wire
    pub fn size(&self) -> usize {
        let mut size = RTP_MIN_HEADER_SIZE + self.csrc.len() * 4;
        if let Some(ext) = &self.extension {
            size += 4 + ext.data.len();
        }
        size
    }

    /// Parse a header from the front of `buf`, leaving `buf` positioned at the
    /// start of the payload
    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < RTP_MIN_HEADER_SIZE {
            return Err(Error::BufferTooSmall {
                required: RTP_MIN_HEADER_SIZE,
                available: buf.remaining(),
            });
        }

        let first = buf.get_u8();
        let version = first >> 6;
        if version != RTP_VERSION {
            return Err(Error::InvalidVersion(version));
        }
        let has_extension = (first & 0x10) != 0;
        let csrc_count = (first & 0x0f) as usize;

        let second = buf.get_u8();
        let marker = (second & 0x80) != 0;
        let payload_type = second & 0x7f;

        let sequence_number = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        if buf.remaining() < csrc_count * 4 {
            return Err(Error::BufferTooSmall {
                required: csrc_count * 4,
                available: buf.remaining(),
            });
        }
        let csrc = (0..csrc_count).map(|_| buf.get_u32()).collect();

        let extension = if has_extension {
            if buf.remaining() < 4 {
                return Err(Error::BufferTooSmall {
                    required: 4,
                    available: buf.remaining(),
                });
            }
            let profile = buf.get_u16();
            let length = buf.get_u16() as usize * 4;
            if buf.remaining() < length {
                return Err(Error::BufferTooSmall {
                    required: length,
                    available: buf.remaining(),
                });
            }
            Some(RtpHeaderExtension {
                profile,
                data: buf.copy_to_bytes(length),
            })
        } else {
            None
        };

        Ok(Self {
            version,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension,
        })
    }

    /// Serialize this header into `buf`
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        if self.csrc.len() > 15 {
            return Err(Error::InvalidPacket(format!(
                "too many CSRCs: {}",
                self.csrc.len()
            )));
        }
        if self.payload_type > 0x7f {
            return Err(Error::InvalidPacket(format!(
                "payload type out of range: {}",
                self.payload_type
            )));
        }

        let mut first = (self.version << 6) | self.csrc.len() as u8;
        if self.extension.is_some() {
            first |= 0x10;
        }
        let mut second = self.payload_type;
        if self.marker {
            second |= 0x80;
        }

        buf.put_u8(first);
        buf.put_u8(second);
        buf.put_u16(self.sequence_number);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
        for csrc in &self.csrc {
            buf.put_u32(*csrc);
        }
        if let Some(ext) = &self.extension {
            if ext.data.len() % 4 != 0 {
                return Err(Error::InvalidPacket(
                    "header extension length is not a multiple of 4".to_string(),
                ));
            }
            buf.put_u16(ext.profile);
            buf.put_u16((ext.data.len() / 4) as u16);
            buf.put_slice(&ext.data);
        }
        Ok(())
    }
}

/// RTP packet: one transport unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    /// Packet header
    pub header: RtpHeader,

    /// Encoded media payload
    pub payload: Bytes,
}

impl RtpPacket {
    /// Create a new packet
    pub fn new(header: RtpHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Total size on the wire
    pub fn size(&self) -> usize {
        self.header.size() + self.payload.len()
    }

    /// Parse a complete packet, stripping any padding
    pub fn parse(data: &[u8]) -> Result<Self> {
        let padded = data.first().map(|b| (b & 0x20) != 0).unwrap_or(false);

        let mut buf = data;
        let header = RtpHeader::parse(&mut buf)?;

        let mut payload_len = buf.remaining();
        if padded {
            let pad = match buf.last() {
                Some(&pad) => pad as usize,
                None => {
                    return Err(Error::InvalidPacket(
                        "padding bit set on empty payload".to_string(),
                    ))
                }
            };
            if pad == 0 || pad > payload_len {
                return Err(Error::InvalidPacket(format!(
                    "invalid padding length {} for {} payload bytes",
                    pad, payload_len
                )));
            }
            payload_len -= pad;
        }

        let payload = Bytes::copy_from_slice(&buf[..payload_len]);
        Ok(Self { header, payload })
    }

    /// Serialize to wire format
    pub fn serialize(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.size());
        self.header.serialize(&mut buf)?;
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }
}
