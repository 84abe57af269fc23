//! Message log replay.
//!
//! A message log is JSON lines, one `{"height": N, "msg": {...}}` entry per
//! line. Blank lines and lines starting with `#` are skipped. Heights must
//! not decrease; several entries may share a height.

use std::io::BufRead;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use peggy_messages::Msg;
use peggy_node::BridgeApp;
use peggy_store::KvStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub height: u64,
    pub msg: Msg,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub delivered: u64,
    pub rejected: u64,
    pub final_height: u64,
}

pub fn parse_line(line: &str) -> anyhow::Result<Option<LogEntry>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Deliver every entry of `reader` to `app`.
///
/// Malformed lines and height regressions abort the replay. Rejected
/// messages are counted and skipped, unless `stop_on_error` is set.
pub fn replay<S: KvStore>(
    app: &mut BridgeApp<S>,
    reader: impl BufRead,
    stop_on_error: bool,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("reading line {line_no}"))?;
        let Some(entry) = parse_line(&line).with_context(|| format!("parsing line {line_no}"))?
        else {
            continue;
        };
        app.begin_block(entry.height)
            .with_context(|| format!("line {line_no}"))?;
        match app.deliver(&entry.msg) {
            Ok(response) => {
                summary.delivered += 1;
                debug!(line = line_no, ?response, "message delivered");
            }
            Err(e) if stop_on_error => {
                return Err(anyhow::Error::new(e).context(format!("line {line_no} rejected")));
            }
            Err(_) => summary.rejected += 1,
        }
    }
    summary.final_height = app.height();
    info!(
        delivered = summary.delivered,
        rejected = summary.rejected,
        height = summary.final_height,
        "replay finished"
    );
    Ok(summary)
}
