//! Prometheus metrics for the bridge node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] so that each app reports
//! only its own deliveries; [`NodeMetrics::encode_text`] renders it in the
//! Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_gauge_with_registry, Encoder,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use peggy_messages::MessageType;

use crate::NodeError;

const ACCEPTED: &str = "accepted";
const REJECTED: &str = "rejected";

pub struct NodeMetrics {
    pub registry: Registry,

    /// Delivered messages, labelled by `msg_type` and `outcome`
    /// (`accepted` or `rejected`).
    pub messages_delivered: IntCounterVec,

    /// Height of the last begun block.
    pub block_height: IntGauge,
}

impl NodeMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let messages_delivered = register_int_counter_vec_with_registry!(
            Opts::new(
                "peggy_messages_delivered_total",
                "Messages delivered to the bridge keeper"
            ),
            &["msg_type", "outcome"],
            registry
        )?;

        let block_height = register_int_gauge_with_registry!(
            Opts::new("peggy_block_height", "Height of the last begun block"),
            registry
        )?;

        Ok(Self {
            registry,
            messages_delivered,
            block_height,
        })
    }

    pub fn record_delivery(&self, msg_type: MessageType, accepted: bool) {
        let outcome = if accepted { ACCEPTED } else { REJECTED };
        self.messages_delivered
            .with_label_values(&[msg_type.as_str(), outcome])
            .inc();
    }

    pub fn accepted(&self, msg_type: MessageType) -> u64 {
        self.messages_delivered
            .with_label_values(&[msg_type.as_str(), ACCEPTED])
            .get()
    }

    pub fn rejected(&self, msg_type: MessageType) -> u64 {
        self.messages_delivered
            .with_label_values(&[msg_type.as_str(), REJECTED])
            .get()
    }

    pub fn total_rejected(&self) -> u64 {
        MessageType::ALL.iter().map(|t| self.rejected(*t)).sum()
    }

    /// Every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| NodeError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}
