//! Consistent Hash Ring
//!
//! Maps keys to node ids using virtual replicas on a circular `u32` space.
//! All peers of a cluster must use the same hash function and replica count,
//! otherwise they disagree on ownership.

use std::collections::HashMap;

/// Hash function placing keys and replicas on the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default number of virtual replicas per node.
pub const DEFAULT_REPLICAS: usize = 50;

/// CRC-32 (IEEE), the default ring hash.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// == Hash Ring ==
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted ring positions
    positions: Vec<u32>,
    /// Ring position -> node id
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring. `hash` defaults to [`crc32`]; a replica count of
    /// zero is raised to one.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32),
            replicas: replicas.max(1),
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds nodes, placing `replicas` positions for each. Nodes already on the
    /// ring are skipped.
    pub fn add<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            let id = id.as_ref();
            if self.contains(id) {
                continue;
            }
            for i in 0..self.replicas {
                let position = self.replica_position(i, id);
                self.positions.push(position);
                self.owners.insert(position, id.to_string());
            }
        }
        self.positions.sort_unstable();
        self.positions.dedup();
    }

    /// Removes every replica owned by `id`.
    pub fn remove(&mut self, id: &str) {
        self.owners.retain(|_, owner| owner.as_str() != id);
        let owners = &self.owners;
        self.positions.retain(|position| owners.contains_key(position));
    }

    /// Returns the node owning `key`, or None if the ring is empty.
    pub fn route(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&p| p < hash);
        let position = self.positions[idx % self.positions.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Returns true if `id` owns at least one ring position.
    pub fn contains(&self, id: &str) -> bool {
        self.owners.values().any(|owner| owner == id)
    }

    /// Distinct node ids on the ring, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.owners.values().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Returns true if no node is on the ring.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Virtual replicas placed per node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    fn replica_position(&self, replica: usize, id: &str) -> u32 {
        (self.hash)(format!("{replica}{id}").as_bytes())
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS, None)
    }
}
