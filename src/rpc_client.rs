//! Outgoing RPCs to peers, over one pooled `reqwest::Client` per node rather
//! than the original's fresh channel per call (Design Notes §9).
use reqwest::Client;

use crate::error::{ChordError, ChordResult};
use crate::node::NodeInfo;
use crate::record::Record;
use crate::wire::*;

#[derive(Clone)]
pub struct RpcClient {
    http: Client,
}

impl RpcClient {
    pub fn new() -> Self {
        RpcClient { http: Client::new() }
    }

    fn peer_error(peer: &str, message: impl std::fmt::Display) -> ChordError {
        ChordError::Transport { peer: peer.to_string(), message: message.to_string() }
    }

    pub async fn find_successor(&self, peer: &str, key_id: u64) -> ChordResult<NodeInfo> {
        let url = format!("http://{peer}/internal/find-successor");
        self.http
            .get(&url)
            .query(&FindSuccessorQuery { key_id })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?
            .json::<NodeInfo>()
            .await
            .map_err(|e| Self::peer_error(peer, e))
    }

    pub async fn closest_preceding_finger(&self, peer: &str, key_id: u64) -> ChordResult<NodeInfo> {
        let url = format!("http://{peer}/internal/closest-preceding-finger");
        self.http
            .get(&url)
            .query(&FindSuccessorQuery { key_id })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?
            .json::<NodeInfo>()
            .await
            .map_err(|e| Self::peer_error(peer, e))
    }

    pub async fn get_successor(&self, peer: &str) -> ChordResult<NodeInfo> {
        let url = format!("http://{peer}/internal/successor");
        self.http.get(&url).send().await.map_err(|e| Self::peer_error(peer, e))?
            .json::<NodeInfo>().await.map_err(|e| Self::peer_error(peer, e))
    }

    pub async fn get_predecessor(&self, peer: &str) -> ChordResult<NodeInfo> {
        let url = format!("http://{peer}/internal/predecessor");
        self.http.get(&url).send().await.map_err(|e| Self::peer_error(peer, e))?
            .json::<NodeInfo>().await.map_err(|e| Self::peer_error(peer, e))
    }

    pub async fn set_successor(&self, peer: &str, new_successor: &str) -> ChordResult<()> {
        let url = format!("http://{peer}/internal/set-successor");
        self.http
            .post(&url)
            .json(&SetPeerRequest { ip_addr: new_successor.to_string() })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?;
        Ok(())
    }

    pub async fn set_predecessor(&self, peer: &str, new_predecessor: &str) -> ChordResult<()> {
        let url = format!("http://{peer}/internal/set-predecessor");
        self.http
            .post(&url)
            .json(&SetPeerRequest { ip_addr: new_predecessor.to_string() })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?;
        Ok(())
    }

    pub async fn update_finger_table(&self, peer: &str, node: NodeInfo, index: usize) -> ChordResult<()> {
        let url = format!("http://{peer}/internal/update-finger-table");
        self.http
            .post(&url)
            .json(&UpdateFingerTableRequest { node, index })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?;
        Ok(())
    }

    pub async fn fix_finger_table(
        &self,
        peer: &str,
        leaver_addr: &str,
        successor: NodeInfo,
        index: usize,
    ) -> ChordResult<()> {
        let url = format!("http://{peer}/internal/fix-finger-table");
        self.http
            .post(&url)
            .json(&FixFingerTableRequest { leaver_addr: leaver_addr.to_string(), successor, index })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?;
        Ok(())
    }

    pub async fn request_data(&self, peer: &str, node_id: u64) -> ChordResult<Vec<Record>> {
        let url = format!("http://{peer}/internal/request-data");
        self.http
            .get(&url)
            .query(&JoiningNodeQuery { node_id })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?
            .json::<RecordsPayload>()
            .await
            .map_err(|e| Self::peer_error(peer, e))
            .map(|p| p.data)
    }

    pub async fn store(&self, peer: &str, records: Vec<Record>) -> ChordResult<()> {
        let url = format!("http://{peer}/internal/store");
        self.http
            .post(&url)
            .json(&RecordsPayload { data: records })
            .send()
            .await
            .map_err(|e| Self::peer_error(peer, e))?;
        Ok(())
    }
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new()
    }
}
