//! Wire decoder for GTFS-RT protocol-buffer payloads.

use prost::Message;

use crate::error::Result;
use crate::gtfs_rt::FeedMessage;

/// Decodes one GTFS-RT `FeedMessage` from raw bytes.
///
/// Pure and total: malformed input yields a typed decode error, never a
/// partially recovered message.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    Ok(FeedMessage::decode(bytes)?)
}
