//! Framing-header parse (spec.md §4.5): a 4-byte big-endian length
//! prefix followed by a 1-byte PDU type tag. The handler never parses
//! past the header - the payload is opaque to it.

use crate::errors::RdpError;

/// The max-packet-size ceiling; anything declaring more is rejected
/// before a single payload byte is read.
pub const MAX_PACKET_SIZE: usize = 8 * 1024;

pub const HEADER_LEN: usize = 5;

/// The closed set of PDU types the handler dispatches policy on.
/// Anything else is a hard parse error - there is no "unknown, pass
/// through" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduType {
    Input,
    Clipboard,
    FileTransfer,
    BitmapUpdate,
    Control,
}

impl PduType {
    fn from_tag(tag: u8) -> Result<Self, RdpError> {
        match tag {
            0x01 => Ok(PduType::Input),
            0x02 => Ok(PduType::Clipboard),
            0x03 => Ok(PduType::FileTransfer),
            0x04 => Ok(PduType::BitmapUpdate),
            0x05 => Ok(PduType::Control),
            other => Err(RdpError::UnknownPduType(other)),
        }
    }

    /// The payload kind the Pipeline Coordinator records the chunk
    /// under, per spec.md §4.5 point 4.
    pub fn payload_kind(&self) -> &'static str {
        match self {
            PduType::BitmapUpdate => "video_frame",
            PduType::Input | PduType::Clipboard | PduType::FileTransfer => "metadata",
            PduType::Control => "control",
        }
    }
}

/// A parsed frame header plus the slice of `body` that the declared
/// length actually covers.
#[derive(Debug)]
pub struct Frame<'a> {
    pub pdu_type: PduType,
    pub body: &'a [u8],
}

/// Parses one length-prefixed frame from the front of `buf`. Returns
/// the frame and the number of bytes consumed, or an error if the
/// header is truncated, the declared length exceeds the ceiling, or
/// the PDU type tag is unrecognized.
pub fn parse_frame(buf: &[u8]) -> Result<(Frame<'_>, usize), RdpError> {
    if buf.len() < HEADER_LEN {
        return Err(RdpError::TruncatedHeader {
            need: HEADER_LEN,
            got: buf.len(),
        });
    }

    let declared_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if declared_len > MAX_PACKET_SIZE {
        return Err(RdpError::PacketTooLarge {
            declared: declared_len,
            max: MAX_PACKET_SIZE,
        });
    }

    let pdu_type = PduType::from_tag(buf[4])?;
    let total = HEADER_LEN + declared_len;
    if buf.len() < total {
        return Err(RdpError::TruncatedHeader {
            need: total,
            got: buf.len(),
        });
    }

    Ok((
        Frame {
            pdu_type,
            body: &buf[HEADER_LEN..total],
        },
        total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(pdu_type: u8, body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.push(pdu_type);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn parses_a_well_formed_frame() {
        let bytes = frame_bytes(0x04, b"bitmap bytes");
        let (frame, consumed) = parse_frame(&bytes).unwrap();
        assert_eq!(frame.pdu_type, PduType::BitmapUpdate);
        assert_eq!(frame.body, b"bitmap bytes");
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn rejects_declared_length_over_the_ceiling() {
        let mut header = ((MAX_PACKET_SIZE + 1) as u32).to_be_bytes().to_vec();
        header.push(0x01);
        let err = parse_frame(&header).unwrap_err();
        assert!(matches!(err, RdpError::PacketTooLarge { .. }));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = parse_frame(&[0, 0, 1]).unwrap_err();
        assert!(matches!(err, RdpError::TruncatedHeader { .. }));
    }

    #[test]
    fn rejects_truncated_body() {
        let bytes = frame_bytes(0x01, b"short");
        let err = parse_frame(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, RdpError::TruncatedHeader { .. }));
    }

    #[test]
    fn rejects_unknown_pdu_type() {
        let bytes = frame_bytes(0xEE, b"x");
        let err = parse_frame(&bytes).unwrap_err();
        assert!(matches!(err, RdpError::UnknownPduType(0xEE)));
    }

    #[test]
    fn bitmap_update_maps_to_video_frame() {
        assert_eq!(PduType::BitmapUpdate.payload_kind(), "video_frame");
        assert_eq!(PduType::Input.payload_kind(), "metadata");
        assert_eq!(PduType::Control.payload_kind(), "control");
    }
}
