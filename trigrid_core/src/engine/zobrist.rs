use crate::logic::board::Player;

// Per segment: owner (2) x contest mark (none, P1, P2).
const SEGMENT_VARIANTS: usize = 6;
const TRIANGLE_VARIANTS: usize = 2;

/// Deterministic XorShift generator so keys are identical across runs and targets.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

#[derive(Debug, Clone)]
pub struct ZobristKeys {
    segment_keys: Vec<u64>,
    triangle_keys: Vec<u64>,
    side_key: u64,
}

impl ZobristKeys {
    pub fn new(segments: usize, triangles: usize) -> Self {
        let mut rng = XorShift64::new(0x9E37_79B9_7F4A_7C15);
        let segment_keys = (0..segments * SEGMENT_VARIANTS)
            .map(|_| rng.next())
            .collect();
        let triangle_keys = (0..triangles * TRIANGLE_VARIANTS)
            .map(|_| rng.next())
            .collect();
        let side_key = rng.next();

        Self {
            segment_keys,
            triangle_keys,
            side_key,
        }
    }

    pub fn segment_key(&self, segment: usize, owner: Player, contested_by: Option<Player>) -> u64 {
        let contest = contested_by.map_or(0, |p| p.index() + 1);
        let idx = segment * SEGMENT_VARIANTS + owner.index() * 3 + contest;
        self.segment_keys.get(idx).copied().unwrap_or(0)
    }

    pub fn triangle_key(&self, triangle: usize, owner: Player) -> u64 {
        let idx = triangle * TRIANGLE_VARIANTS + owner.index();
        self.triangle_keys.get(idx).copied().unwrap_or(0)
    }

    /// XORed in while player two is to move.
    pub const fn side_key(&self) -> u64 {
        self.side_key
    }
}
