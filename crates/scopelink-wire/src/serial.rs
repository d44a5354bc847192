use tracing::trace;

use crate::codec::{Frame, FrameCodec};
use crate::crc::crc16;
use crate::error::{Result, WireError};

/// Frame header: magic (2) + length (2, LE) + id (1) = 5 bytes.
pub const HEADER_LEN: usize = 5;

/// Frame footer: CRC-16 (2, LE).
pub const FOOTER_LEN: usize = 2;

/// Magic bytes: "SL" (0x53 0x4C).
pub const MAGIC: [u8; 2] = [0x53, 0x4C];

/// Smallest possible frame: header + empty payload + footer.
const MIN_FRAME_LEN: usize = HEADER_LEN + FOOTER_LEN;

/// Default binary framing for scopelink links.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬─────────┬──────────────┬────────────┐
/// │ Magic (2B) │ Length    │ Id (1B) │ Payload      │ CRC-16     │
/// │ 0x53 0x4C  │ (2B LE)   │         │              │ (2B LE)    │
/// └────────────┴───────────┴─────────┴──────────────┴────────────┘
/// ```
///
/// `Length` covers the entire frame including header and footer. The CRC
/// (CCITT-FALSE) covers everything before the footer. `frame_get` scans
/// past garbage and corrupted candidates to the next magic, so a stream
/// that lost synchronization recovers on the following frame.
#[derive(Debug, Clone, Default)]
pub struct SerialFraming;

impl SerialFraming {
    pub fn new() -> Self {
        Self
    }
}

impl FrameCodec for SerialFraming {
    fn header_len(&self) -> usize {
        HEADER_LEN
    }

    fn footer_len(&self) -> usize {
        FOOTER_LEN
    }

    fn frame_final(&self, id: u8, buf: &mut [u8], cursor: &mut usize) -> Result<()> {
        if *cursor < HEADER_LEN {
            return Err(WireError::BufferTooSmall {
                need: HEADER_LEN,
                have: *cursor,
            });
        }
        let total = *cursor + FOOTER_LEN;
        if total > u16::MAX as usize {
            return Err(WireError::FrameTooLarge {
                size: total,
                max: u16::MAX as usize,
            });
        }
        if total > buf.len() {
            return Err(WireError::BufferTooSmall {
                need: total,
                have: buf.len(),
            });
        }

        buf[0..2].copy_from_slice(&MAGIC);
        buf[2..4].copy_from_slice(&(total as u16).to_le_bytes());
        buf[4] = id;

        let crc = crc16(&buf[..*cursor]);
        buf[*cursor..total].copy_from_slice(&crc.to_le_bytes());
        *cursor = total;

        Ok(())
    }

    fn frame_get<'a>(&self, buf: &'a [u8]) -> Result<Frame<'a>> {
        let mut start = 0usize;
        let mut candidate_seen = false;

        while start + 1 < buf.len() {
            if buf[start..start + 2] != MAGIC {
                start += 1;
                continue;
            }

            let rest = &buf[start..];
            if rest.len() < HEADER_LEN {
                return Err(WireError::Incomplete);
            }

            let total = u16::from_le_bytes([rest[2], rest[3]]) as usize;
            if total < MIN_FRAME_LEN {
                // Corrupted length; step past this magic and resync.
                trace!(start, total, "skipping frame candidate with bad length");
                start += 1;
                candidate_seen = true;
                continue;
            }
            if rest.len() < total {
                return Err(WireError::Incomplete);
            }

            let crc_stored = u16::from_le_bytes([rest[total - 2], rest[total - 1]]);
            if crc16(&rest[..total - FOOTER_LEN]) != crc_stored {
                trace!(start, "skipping frame candidate with bad crc");
                start += 1;
                candidate_seen = true;
                continue;
            }

            return Ok(Frame {
                id: rest[4],
                payload: &rest[HEADER_LEN..total - FOOTER_LEN],
                drop: start + total,
            });
        }

        if candidate_seen {
            Err(WireError::Incomplete)
        } else {
            Err(WireError::NoFrame)
        }
    }
}
