use crate::engine::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    Exact,
    LowerBound, // fail-high
    UpperBound, // fail-low
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub flag: TTFlag,
}

/// Fixed-size, power-of-two table indexed by the low bits of the position hash.
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: usize,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let num_entries = (size_mb * 1024 * 1024) / entry_size;

        let mut size = 1;
        while size <= num_entries {
            size *= 2;
        }
        size /= 2;
        let size = size.max(1024);

        Self {
            entries: vec![None; size],
            mask: size - 1,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        self.entries
            .get(self.index(key))
            .copied()
            .flatten()
            .filter(|entry| entry.key == key)
    }

    pub fn get_move(&self, key: u64) -> Option<Move> {
        self.probe(key).and_then(|e| e.best_move)
    }

    pub fn store(
        &mut self,
        key: u64,
        best_move: Option<Move>,
        score: i32,
        depth: u8,
        flag: TTFlag,
    ) {
        let idx = self.index(key);
        let Some(slot) = self.entries.get_mut(idx) else {
            return;
        };

        // Collisions always replace; the same position only by an equal or deeper search.
        let replace = slot.map_or(true, |entry| entry.key != key || depth >= entry.depth);
        if replace {
            *slot = Some(TTEntry {
                key,
                best_move,
                score,
                depth,
                flag,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }
}
