//! The transposition table: a fixed array of cache-line-sized slots, each
//! guarded by its own one-byte spinlock.
//!
//! The table is shared by every search worker. Collisions between different
//! keys silently overwrite; the only retention rule is that an All entry
//! never replaces a deeper All entry for the same key. Hit or miss is the
//! caller's decision: [`TranspositionTable::query`] hands the raw slot
//! contents to a callback and the caller compares the stored key against
//! its own hash.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::moves::Move;
use crate::position::Position;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Pv,
    All,
    Cut,
}

/// The payload of one table slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotData {
    pub key: u64,
    pub best: Move,
    pub value: Value,
    pub depth: u8,
    pub kind: NodeKind,
}

/// One slot, padded to a cache line so neighboring slots never share one.
/// The lock byte serializes access to `data`; critical sections are a few
/// field copies and must not allocate, block, or take other locks.
#[repr(align(64))]
struct Slot {
    lock: AtomicU8,
    data: UnsafeCell<SlotData>,
}

// Access to `data` only happens while holding the slot's lock byte.
unsafe impl Sync for Slot {}

impl Slot {
    fn new() -> Slot {
        Slot {
            lock: AtomicU8::new(0),
            data: UnsafeCell::new(SlotData::default()),
        }
    }

    fn acquire(&self) {
        while self
            .lock
            .compare_exchange_weak(0, 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }

    fn release(&self) {
        self.lock.store(0, Ordering::Release);
    }

    fn with<R>(&self, f: impl FnOnce(&mut SlotData) -> R) -> R {
        self.acquire();
        let result = f(unsafe { &mut *self.data.get() });
        self.release();
        result
    }
}

pub struct TranspositionTable {
    slots: Box<[Slot]>,
}

impl TranspositionTable {
    /// Builds a table from a megabyte budget, rounding down to a whole
    /// number of slots. A zero budget still gets one slot so indexing is
    /// always defined.
    pub fn new(size_mb: usize) -> TranspositionTable {
        let count = (size_mb * 1024 * 1024 / std::mem::size_of::<Slot>()).max(1);
        let slots: Vec<Slot> = (0..count).map(|_| Slot::new()).collect();
        TranspositionTable {
            slots: slots.into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, key: u64) -> &Slot {
        &self.slots[(key % self.slots.len() as u64) as usize]
    }

    /// Records an exact (principal variation) entry; overwrites whatever is
    /// in the slot.
    pub fn record_pv(&self, pos: &Position, best: Move, depth: u8, value: Value) {
        let key = pos.hash();
        self.slot(key).with(|data| {
            *data = SlotData {
                key,
                best,
                value,
                depth,
                kind: NodeKind::Pv,
            };
        });
    }

    /// Records a beta-cutoff entry; overwrites whatever is in the slot.
    pub fn record_cut(&self, pos: &Position, best: Move, depth: u8, value: Value) {
        let key = pos.hash();
        self.slot(key).with(|data| {
            *data = SlotData {
                key,
                best,
                value,
                depth,
                kind: NodeKind::Cut,
            };
        });
    }

    /// Records a fail-low entry with no best move. Kept out only by a
    /// deeper All entry for the same key.
    pub fn record_all(&self, pos: &Position, depth: u8, value: Value) {
        let key = pos.hash();
        self.slot(key).with(|data| {
            if data.kind == NodeKind::All && data.key == key && data.depth > depth {
                return;
            }
            *data = SlotData {
                key,
                best: Move::null(),
                value,
                depth,
                kind: NodeKind::All,
            };
        });
    }

    /// Locks the slot for `pos` and passes its contents to `f`. The callback
    /// decides hit versus miss by comparing `data.key` with `pos.hash()`.
    pub fn query<R>(&self, pos: &Position, f: impl FnOnce(&SlotData) -> R) -> R {
        self.slot(pos.hash()).with(|data| f(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    fn table_and_position() -> (TranspositionTable, Position) {
        crate::init();
        let pos = Position::from_fen(START_FEN).expect("valid FEN");
        (TranspositionTable::new(1), pos)
    }

    #[test]
    fn slots_fill_one_cache_line() {
        assert_eq!(std::mem::size_of::<Slot>(), 64);
        assert_eq!(std::mem::align_of::<Slot>(), 64);
    }

    #[test]
    fn sizing_rounds_down_to_whole_slots() {
        let one_mb = TranspositionTable::new(1);
        assert_eq!(one_mb.capacity(), 1024 * 1024 / 64);
        let zero = TranspositionTable::new(0);
        assert_eq!(zero.capacity(), 1);
    }

    #[test]
    fn record_pv_then_query_hits() {
        let (tt, pos) = table_and_position();
        let best = Move::quiet(crate::types::Square::E2, crate::types::Square::E4);
        tt.record_pv(&pos, best, 7, Value::centipawns(33));

        let hit = tt.query(&pos, |data| {
            assert_eq!(data.key, pos.hash());
            assert_eq!(data.best, best);
            assert_eq!(data.depth, 7);
            assert_eq!(data.kind, NodeKind::Pv);
            assert_eq!(data.value, Value::centipawns(33));
            data.key == pos.hash()
        });
        assert!(hit);
    }

    #[test]
    fn query_miss_is_the_callers_key_comparison() {
        let (tt, pos) = table_and_position();
        let miss = tt.query(&pos, |data| data.key == pos.hash());
        assert!(!miss, "empty slot must not report the position's key");
    }

    #[test]
    fn record_all_keeps_deeper_all_entries() {
        let (tt, pos) = table_and_position();
        tt.record_all(&pos, 9, Value::centipawns(-12));

        // A shallower All entry for the same key is rejected.
        tt.record_all(&pos, 3, Value::centipawns(50));
        tt.query(&pos, |data| {
            assert_eq!(data.depth, 9);
            assert_eq!(data.value, Value::centipawns(-12));
        });

        // A deeper one replaces, and All entries carry no best move.
        tt.record_all(&pos, 12, Value::centipawns(4));
        tt.query(&pos, |data| {
            assert_eq!(data.depth, 12);
            assert!(data.best.is_null());
            assert_eq!(data.kind, NodeKind::All);
        });
    }

    #[test]
    fn pv_and_cut_overwrite_unconditionally() {
        let (tt, pos) = table_and_position();
        tt.record_all(&pos, 20, Value::centipawns(1));

        let best = Move::quiet(crate::types::Square::G1, crate::types::Square::F3);
        tt.record_cut(&pos, best, 2, Value::centipawns(90));
        tt.query(&pos, |data| {
            assert_eq!(data.kind, NodeKind::Cut);
            assert_eq!(data.depth, 2);
        });

        tt.record_pv(&pos, best, 1, Value::centipawns(10));
        tt.query(&pos, |data| {
            assert_eq!(data.kind, NodeKind::Pv);
            assert_eq!(data.depth, 1);
        });
    }

    #[test]
    fn colliding_keys_overwrite_silently() {
        crate::init();
        // A single-slot table forces every key into the same slot.
        let tt = TranspositionTable::new(0);
        assert_eq!(tt.capacity(), 1);
        let a = Position::from_fen(START_FEN).expect("valid FEN");
        let b = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("valid FEN");
        assert_ne!(a.hash(), b.hash());

        tt.record_pv(&a, Move::null(), 5, Value::centipawns(1));
        tt.record_pv(&b, Move::null(), 1, Value::centipawns(2));
        tt.query(&a, |data| {
            assert_eq!(data.key, b.hash(), "later write wins the slot");
        });
    }

    #[test]
    fn concurrent_access_stays_coherent() {
        use std::sync::Arc;

        crate::init();
        let tt = Arc::new(TranspositionTable::new(1));
        let pos = Position::from_fen(START_FEN).expect("valid FEN");
        let key = pos.hash();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tt = Arc::clone(&tt);
                let pos = pos.clone();
                std::thread::spawn(move || {
                    for d in 0..500u16 {
                        let depth = (d % 100) as u8;
                        tt.record_pv(&pos, Move::null(), depth, Value::centipawns(i));
                        tt.query(&pos, |data| {
                            // Whatever thread wrote last, the slot must hold
                            // one coherent entry for this key.
                            assert_eq!(data.key, key);
                            assert_eq!(data.kind, NodeKind::Pv);
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
    }
}
