//! Wire messages for the Ring and Data services (§6). Encoding is JSON; the
//! field semantics below are what's normative, per the spec.
use serde::{Deserialize, Serialize};

use crate::config::BootstrapMode;
use crate::identifier::Id;
use crate::node::NodeInfo;
use crate::record::Record;

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub bootstrap_addr: Option<String>,
    pub init: bool,
    pub transfer_data: bool,
}

impl JoinRequest {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        JoinRequest {
            bootstrap_addr: cfg.bootstrap_addr.clone(),
            init: matches!(cfg.bootstrap_mode, BootstrapMode::Init),
            transfer_data: cfg.transfer_data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HopsResponse {
    pub num_hops: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindSuccessorQuery {
    pub key_id: Id,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPeerRequest {
    pub ip_addr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFingerTableRequest {
    pub node: NodeInfo,
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FixFingerTableRequest {
    pub leaver_addr: String,
    pub successor: NodeInfo,
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoiningNodeQuery {
    pub node_id: Id,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetDataQuery {
    pub education: String,
    pub max_awards: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FingerTableEntryView {
    pub start: Id,
    pub node: Id,
    pub node_ip: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordsPayload {
    pub data: Vec<Record>,
}
