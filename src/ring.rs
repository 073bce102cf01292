//! The Chord protocol itself: lookup (§4.3), join (§4.4), leave (§4.5) and
//! data handoff (§4.6), grounded throughout in
//! `original_source/init_node/ChordNodeCode/chordNode.py`.
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{ChordError, ChordResult};
use crate::finger_table::FingerTable;
use crate::identifier::{hash_mod, in_arc_closed_open, in_arc_open_closed, in_arc_open_open, modulo, offset, ring_size, Id};
use crate::node::{HopCounter, NodeInfo, RingState};
use crate::record::Record;
use crate::rpc_client::RpcClient;
use crate::store::RecordStore;
use crate::wire::{FingerTableEntryView, JoinRequest};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub struct Ring {
    own: NodeInfo,
    m: u32,
    state: RwLock<RingState>,
    joined: AtomicBool,
    rpc: RpcClient,
    pub store: RecordStore,
    hops: HopCounter,
}

impl RingState {
    fn self_pointing(me: NodeInfo, m: u32) -> Self {
        RingState {
            successor: me.clone(),
            predecessor: me.clone(),
            finger_table: FingerTable::new(me.id, &me.addr, m),
            me,
        }
    }
}

impl Ring {
    pub fn new(cfg: &Config) -> ChordResult<Self> {
        let own = NodeInfo::new(cfg.own_addr(), cfg.ft_size);
        let state = RingState::self_pointing(own.clone(), cfg.ft_size);
        let store = RecordStore::open(&cfg.data_dir, &own.addr)?;
        Ok(Ring {
            own,
            m: cfg.ft_size,
            state: RwLock::new(state),
            joined: AtomicBool::new(false),
            rpc: RpcClient::new(),
            store,
            hops: HopCounter::default(),
        })
    }

    pub fn own_addr(&self) -> &str {
        &self.own.addr
    }

    pub fn own_info(&self) -> NodeInfo {
        self.own.clone()
    }

    pub fn node_info_for(&self, addr: &str) -> NodeInfo {
        NodeInfo::new(addr.to_string(), self.m)
    }

    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::Acquire)
    }

    fn require_joined(&self) -> ChordResult<()> {
        if self.is_joined() {
            Ok(())
        } else {
            Err(ChordError::NotJoined)
        }
    }

    /// Rejects `key_id >= 2^m` per §7's bad-request case, rather than letting
    /// it flow into the arc arithmetic and produce a wrong-but-accepted answer.
    fn require_valid_key(&self, key: Id) -> ChordResult<()> {
        if key < ring_size(self.m) {
            Ok(())
        } else {
            Err(ChordError::BadRequest(format!("key_id {key} out of range for m = {}", self.m)))
        }
    }

    pub fn clear_hops(&self) -> u64 {
        self.hops.clear()
    }

    pub async fn snapshot(&self) -> RingState {
        self.state.read().await.clone()
    }

    pub async fn get_successor_local(&self) -> NodeInfo {
        self.state.read().await.successor.clone()
    }

    pub async fn get_predecessor_local(&self) -> NodeInfo {
        self.state.read().await.predecessor.clone()
    }

    pub async fn set_successor_local(&self, new_successor: NodeInfo) {
        let mut st = self.state.write().await;
        info!("successor now {}", new_successor.addr);
        st.finger_table.set(0, new_successor.clone());
        st.successor = new_successor;
    }

    pub async fn set_predecessor_local(&self, new_predecessor: NodeInfo) {
        info!("predecessor now {}", new_predecessor.addr);
        self.state.write().await.predecessor = new_predecessor;
    }

    pub async fn get_finger_table_view(&self) -> Vec<FingerTableEntryView> {
        let st = self.state.read().await;
        st.finger_table
            .iter()
            .map(|e| FingerTableEntryView { start: e.start, node: e.node.id, node_ip: e.node.addr.clone() })
            .collect()
    }

    pub fn fetch_data(&self, education: &str, max_awards: u32) -> Vec<Record> {
        self.store.fetch_by_query(education, max_awards)
    }

    /// Answers `request_data` for a joining node: records in `(old_pred, new_node_id]`
    /// collapse to "hash <= new_node_id" once the new node has already been
    /// spliced in as our predecessor (§4.6).
    pub fn take_data_for_joiner(&self, new_node_id: Id) -> ChordResult<Vec<Record>> {
        self.store.fetch_and_delete_by_range(Some(new_node_id))
    }

    pub fn store_records(&self, records: Vec<Record>) -> ChordResult<()> {
        self.store.store(records)
    }

    // --- dispatch: calls to `addr` resolve locally when it's our own address
    // (Design Notes §9, "Self-RPC in find_predecessor"). ---

    async fn get_successor_at(&self, addr: &str) -> ChordResult<NodeInfo> {
        if addr == self.own.addr {
            Ok(self.get_successor_local().await)
        } else {
            self.rpc.get_successor(addr).await
        }
    }

    async fn get_predecessor_at(&self, addr: &str) -> ChordResult<NodeInfo> {
        if addr == self.own.addr {
            Ok(self.get_predecessor_local().await)
        } else {
            self.rpc.get_predecessor(addr).await
        }
    }

    async fn set_successor_at(&self, addr: &str, new_successor: NodeInfo) -> ChordResult<()> {
        if addr == self.own.addr {
            self.set_successor_local(new_successor).await;
            Ok(())
        } else {
            self.rpc.set_successor(addr, &new_successor.addr).await
        }
    }

    async fn set_predecessor_at(&self, addr: &str, new_predecessor: NodeInfo) -> ChordResult<()> {
        if addr == self.own.addr {
            self.set_predecessor_local(new_predecessor).await;
            Ok(())
        } else {
            self.rpc.set_predecessor(addr, &new_predecessor.addr).await
        }
    }

    fn closest_preceding_finger_at<'a>(&'a self, addr: &'a str, key: Id) -> BoxFuture<'a, ChordResult<NodeInfo>> {
        Box::pin(async move {
            if addr == self.own.addr {
                self.closest_preceding_finger_local(key).await
            } else {
                self.rpc.closest_preceding_finger(addr, key).await
            }
        })
    }

    fn find_successor_at<'a>(&'a self, addr: &'a str, key: Id) -> BoxFuture<'a, ChordResult<NodeInfo>> {
        Box::pin(async move {
            if addr == self.own.addr {
                self.find_successor(key).await
            } else {
                self.rpc.find_successor(addr, key).await
            }
        })
    }

    fn update_finger_table_at<'a>(
        &'a self,
        addr: &'a str,
        candidate: NodeInfo,
        index: usize,
    ) -> BoxFuture<'a, ChordResult<()>> {
        Box::pin(async move {
            if addr == self.own.addr {
                self.update_finger_table_local(candidate, index).await
            } else {
                self.rpc.update_finger_table(addr, candidate, index).await
            }
        })
    }

    fn fix_finger_table_at<'a>(
        &'a self,
        addr: &'a str,
        leaver_addr: &'a str,
        successor: NodeInfo,
        index: usize,
    ) -> BoxFuture<'a, ChordResult<()>> {
        Box::pin(async move {
            if addr == self.own.addr {
                self.fix_finger_table_local(leaver_addr, successor, index).await
            } else {
                self.rpc.fix_finger_table(addr, leaver_addr, successor, index).await
            }
        })
    }

    async fn request_data_at(&self, addr: &str, new_node_id: Id) -> ChordResult<Vec<Record>> {
        if addr == self.own.addr {
            self.take_data_for_joiner(new_node_id)
        } else {
            self.rpc.request_data(addr, new_node_id).await
        }
    }

    async fn store_at(&self, addr: &str, records: Vec<Record>) -> ChordResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        if addr == self.own.addr {
            self.store_records(records)
        } else {
            self.rpc.store(addr, records).await
        }
    }

    // --- lookup (§4.3) ---

    pub fn find_successor<'a>(&'a self, key: Id) -> BoxFuture<'a, ChordResult<NodeInfo>> {
        Box::pin(async move {
            self.require_joined()?;
            self.require_valid_key(key)?;
            self.hops.increment();
            let pred = self.find_predecessor(key).await?;
            self.get_successor_at(&pred.addr).await
        })
    }

    fn find_predecessor<'a>(&'a self, key: Id) -> BoxFuture<'a, ChordResult<NodeInfo>> {
        Box::pin(async move {
            self.require_valid_key(key)?;
            self.hops.increment();
            let mut cur = self.own.clone();
            let mut cur_succ = self.get_successor_at(&cur.addr).await?;

            if cur_succ.id == cur.id {
                return Ok(cur);
            }

            while !in_arc_open_closed(cur.id, cur_succ.id, key, self.m) {
                cur = self.closest_preceding_finger_at(&cur.addr, key).await?;
                cur_succ = self.get_successor_at(&cur.addr).await?;
            }
            Ok(cur)
        })
    }

    pub async fn closest_preceding_finger_local(&self, key: Id) -> ChordResult<NodeInfo> {
        self.require_valid_key(key)?;
        self.hops.increment();
        let st = self.state.read().await;
        for (_, entry) in st.finger_table.iter_rev_indexed() {
            if in_arc_open_open(st.me.id, key, entry.node.id, self.m) {
                return Ok(entry.node.clone());
            }
        }
        Ok(st.me.clone())
    }

    // --- join (§4.4) ---

    pub async fn join(&self, request: JoinRequest) -> ChordResult<u64> {
        if request.init {
            let mut st = self.state.write().await;
            *st = RingState::self_pointing(self.own.clone(), self.m);
            drop(st);
            self.joined.store(true, Ordering::Release);
            info!("bootstrapped an empty ring as {}", self.own.addr);
            Ok(1)
        } else {
            let bootstrap_addr =
                request.bootstrap_addr.ok_or_else(|| ChordError::BadRequest("bootstrap_addr required".into()))?;
            self.init_finger_table(&bootstrap_addr).await?;
            self.joined.store(true, Ordering::Release);
            self.update_others().await?;
            if request.transfer_data {
                if let Err(e) = self.pull_data_from_successor().await {
                    warn!("data transfer after join failed: {e}");
                }
            }
            info!("joined the ring through {bootstrap_addr}");
            Ok(2)
        }
    }

    async fn init_finger_table(&self, bootstrap_addr: &str) -> ChordResult<()> {
        debug!("{} entering init_finger_table via {bootstrap_addr}", self.own.id);
        let start0 = self.state.read().await.finger_table.entry(0).start;
        let succ0 = self.find_successor_at(bootstrap_addr, start0).await?;

        {
            let mut st = self.state.write().await;
            st.finger_table.set(0, succ0.clone());
        }
        self.set_successor_local(succ0.clone()).await;

        let predecessor = self.get_predecessor_at(&succ0.addr).await?;
        self.set_predecessor_local(predecessor.clone()).await;
        self.set_predecessor_at(&succ0.addr, self.own.clone()).await?;
        self.set_successor_at(&predecessor.addr, self.own.clone()).await?;

        for i in 0..(self.m as usize).saturating_sub(1) {
            let (start_next, node_i) = {
                let st = self.state.read().await;
                (st.finger_table.entry(i + 1).start, st.finger_table.entry(i).node.clone())
            };
            if in_arc_closed_open(self.own.id, node_i.id, start_next) {
                let mut st = self.state.write().await;
                st.finger_table.set(i + 1, node_i);
            } else {
                let succ = self.find_successor_at(bootstrap_addr, start_next).await?;
                let mut st = self.state.write().await;
                st.finger_table.set(i + 1, succ);
            }
        }
        Ok(())
    }

    async fn update_others(&self) -> ChordResult<()> {
        self.hops.increment();
        for i in 0..self.m as usize {
            let key = offset(self.own.id, -(1i64 << i) + 1, self.m);
            let p = self.find_predecessor(key).await?;
            self.update_finger_table_at(&p.addr, self.own.clone(), i).await?;
        }
        Ok(())
    }

    pub fn update_finger_table_local<'a>(
        &'a self,
        candidate: NodeInfo,
        index: usize,
    ) -> BoxFuture<'a, ChordResult<()>> {
        Box::pin(async move {
            self.hops.increment();
            if index >= self.m as usize {
                return Err(ChordError::BadRequest(format!("finger index {index} out of range")));
            }

            let (start_i, node_i, predecessor_addr) = {
                let st = self.state.read().await;
                let entry = st.finger_table.entry(index);
                (entry.start, entry.node.clone(), st.predecessor.addr.clone())
            };

            // when a finger already points at ourselves the upper bound is
            // inclusive of self_id (§4.4's special case).
            let upper_bound_exclusive = if node_i.id == self.own.id { offset(self.own.id, 1, self.m) } else { node_i.id };

            if in_arc_closed_open(start_i, upper_bound_exclusive, candidate.id) {
                {
                    let mut st = self.state.write().await;
                    st.finger_table.set(index, candidate.clone());
                }
                debug!("finger[{index}] on {} now points at {}", self.own.addr, candidate.addr);
                self.update_finger_table_at(&predecessor_addr, candidate, index).await?;
            }
            Ok(())
        })
    }

    // --- leave (§4.5) ---

    pub async fn leave(&self) -> ChordResult<u64> {
        self.require_joined()?;
        let (me, successor, predecessor) = {
            let st = self.state.read().await;
            (st.me.clone(), st.successor.clone(), st.predecessor.clone())
        };

        // the source compares a string address to an integer id here; the
        // intended predicate is "am I the only node" (Design Notes §9).
        if predecessor.addr == me.addr {
            self.store.fetch_and_delete_by_range(None)?;
            let mut st = self.state.write().await;
            *st = RingState::self_pointing(self.own.clone(), self.m);
            drop(st);
            self.joined.store(false, Ordering::Release);
            info!("{} left a single-node ring", me.addr);
            return Ok(5);
        }

        self.set_predecessor_at(&successor.addr, predecessor.clone()).await?;
        self.set_successor_at(&predecessor.addr, successor.clone()).await?;

        let records = self.store.fetch_and_delete_by_range(None)?;
        if let Err(e) = self.store_at(&successor.addr, records).await {
            warn!("failed handing off records to successor on leave: {e}");
        }

        self.fix_others(successor.clone()).await?;

        let mut st = self.state.write().await;
        *st = RingState::self_pointing(self.own.clone(), self.m);
        drop(st);
        self.joined.store(false, Ordering::Release);
        info!("{} left the ring, handed off to {}", me.addr, successor.addr);
        Ok(8)
    }

    async fn fix_others(&self, successor: NodeInfo) -> ChordResult<()> {
        self.hops.increment();
        for i in 0..self.m as usize {
            let key = offset(self.own.id, -(1i64 << i) + 1, self.m);
            let p = self.find_predecessor(key).await?;
            self.fix_finger_table_at(&p.addr, &self.own.addr, successor.clone(), i).await?;
        }
        Ok(())
    }

    /// Scans every finger index pointing at the leaver, not just `index`
    /// (the source's bug, called out in §4.5's open questions).
    pub fn fix_finger_table_local<'a>(
        &'a self,
        leaver_addr: &'a str,
        successor: NodeInfo,
        _index: usize,
    ) -> BoxFuture<'a, ChordResult<()>> {
        Box::pin(async move {
            self.hops.increment();
            let leaver_id = hash_mod(leaver_addr, self.m);
            let predecessor_addr;
            let mut changed = false;
            {
                let mut st = self.state.write().await;
                for i in 0..st.finger_table.len() {
                    if st.finger_table.entry(i).node.id == leaver_id {
                        st.finger_table.set(i, successor.clone());
                        changed = true;
                    }
                }
                predecessor_addr = st.predecessor.addr.clone();
            }
            if changed {
                self.fix_finger_table_at(&predecessor_addr, leaver_addr, successor, _index).await?;
            }
            Ok(())
        })
    }

    async fn pull_data_from_successor(&self) -> ChordResult<()> {
        let successor_addr = self.state.read().await.successor.addr.clone();
        let records = self.request_data_at(&successor_addr, self.own.id).await?;
        if !records.is_empty() {
            info!("pulled {} record(s) from successor {successor_addr}", records.len());
        }
        self.store_records(records)
    }
}

pub fn ring_owner(me_id: Id, hi: Id, m: u32) -> bool {
    // convenience used by tests: is `me_id` the successor of `hi`?
    in_arc_open_closed(modulo(hi.wrapping_sub(1), m), hi, me_id, m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapMode;
    use std::path::PathBuf;

    fn cfg(port: u16, mode: BootstrapMode, data_dir: &str) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port,
            ft_size: 3,
            bootstrap_mode: mode,
            bootstrap_addr: None,
            transfer_data: true,
            data_dir: PathBuf::from(data_dir),
        }
    }

    #[tokio::test]
    async fn single_node_bootstrap_points_at_self() {
        let dir = std::env::temp_dir().join(format!("chord-ring-test-{}", std::process::id()));
        let c = cfg(1, BootstrapMode::Init, dir.to_str().unwrap());
        let ring = Ring::new(&c).unwrap();
        let hops = ring.join(JoinRequest { bootstrap_addr: None, init: true, transfer_data: false }).await.unwrap();
        assert_eq!(hops, 1);

        let st = ring.snapshot().await;
        assert_eq!(st.successor.id, st.me.id);
        assert_eq!(st.predecessor.id, st.me.id);
        for i in 0..3 {
            assert_eq!(st.finger_table.entry(i).node.id, st.me.id);
        }

        let found = ring.find_successor(7).await.unwrap();
        assert_eq!(found.id, st.me.id);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn leave_on_single_node_clears_state() {
        let dir = std::env::temp_dir().join(format!("chord-ring-test-leave-{}", std::process::id()));
        let c = cfg(2, BootstrapMode::Init, dir.to_str().unwrap());
        let ring = Ring::new(&c).unwrap();
        ring.join(JoinRequest { bootstrap_addr: None, init: true, transfer_data: false }).await.unwrap();
        assert!(ring.is_joined());

        let hops = ring.leave().await.unwrap();
        assert_eq!(hops, 5);
        assert!(!ring.is_joined());
        std::fs::remove_dir_all(&dir).ok();
    }
}
