//! Pre-built [`tracing::Span`] constructors for node operations.
//!
//! Consistent span names and fields make message traces easy to filter and
//! correlate across a replay.

use tracing::{info_span, Span};

/// Span covering delivery of one message.
pub fn deliver_span(msg_type: &str, height: u64) -> Span {
    info_span!("deliver", msg_type = %msg_type, height = height)
}

/// Span covering the start of a new block.
pub fn block_span(height: u64) -> Span {
    info_span!("block", height = height)
}

/// Span covering a replay of a message log.
pub fn replay_span(source: &str) -> Span {
    info_span!("replay", source = %source)
}
