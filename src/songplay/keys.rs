//! Surrogate key generation

/// Monotonically increasing ids for one shard
///
/// The shard index occupies the upper bits and a per-shard counter the lower
/// 33 bits. Ids are unique across shards and increase in shard order, but
/// are not dense.
#[derive(Debug, Clone)]
pub struct MonotonicIdGenerator {
    base: i64,
    next: i64,
}

impl MonotonicIdGenerator {
    /// Bits reserved for the per-shard counter
    pub const COUNTER_BITS: u32 = 33;

    /// Generator for the given shard
    pub fn for_shard(shard: usize) -> Self {
        Self {
            base: (shard as i64) << Self::COUNTER_BITS,
            next: 0,
        }
    }

    /// Next id in this shard
    pub fn next_id(&mut self) -> i64 {
        debug_assert!(self.next < (1_i64 << Self::COUNTER_BITS));
        let id = self.base | self.next;
        self.next += 1;
        id
    }
}
