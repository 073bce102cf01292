//! Records stored in the DHT (§3): `{surname, education, awards, hash}`.
use serde::{Deserialize, Serialize};

use crate::identifier::{hash_mod, Id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub surname: String,
    pub education: String,
    pub awards: u32,
    pub hash: Id,
}

impl Record {
    /// Builds a record, computing `hash = SHA256(education) mod 2^m` per §3.
    pub fn new(surname: String, education: String, awards: u32, m: u32) -> Self {
        let hash = hash_mod(&education, m);
        Record { surname, education, awards, hash }
    }
}
