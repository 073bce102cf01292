//! Node identity and the mutable ring-state a node carries between RPCs.
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::finger_table::FingerTable;
use crate::identifier::{hash_mod, Id};

/// Opaque transport handle -- `host:port`, per the spec's "address" primitive.
pub type Addr = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: Id,
    pub addr: Addr,
}

impl NodeInfo {
    pub fn new(addr: Addr, ft_size: u32) -> Self {
        let id = hash_mod(&addr, ft_size);
        NodeInfo { id, addr }
    }
}

/// The ring state a live node carries: its own identity, successor,
/// predecessor and finger table. Absent until `join` completes (the node
/// starts "orphan", per the spec's lifecycle note).
#[derive(Debug, Clone)]
pub struct RingState {
    pub me: NodeInfo,
    pub successor: NodeInfo,
    pub predecessor: NodeInfo,
    pub finger_table: FingerTable,
}

/// Increments on every lookup-path RPC (§4.7); accessor/data RPCs never touch it.
#[derive(Debug, Default)]
pub struct HopCounter(AtomicU64);

impl HopCounter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Resets the counter and returns the value it held before the reset.
    pub fn clear(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}
