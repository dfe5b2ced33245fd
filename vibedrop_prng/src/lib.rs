// Deterministic random source for the Vibe Drop generators.
//
// Generation code never touches an ambient RNG. Every generator takes a
// `&mut impl RandomSource`, whose one required capability is "pick an index
// uniformly from 0..n". Everything the generators need (choose a chord from
// the pool, choose a duration, decide whether a step is a rest) is expressed
// on top of that, so a test can pin the whole decision sequence with a
// `ScriptedSource`.
//
// `SeededRng` is the production source: xoshiro256++ (Blackman & Vigna,
// 2019) expanded from a single `u64` seed with SplitMix64. It uses integer
// arithmetic only, so a seed reproduces the same music on every platform.

/// A source of uniform choices.
pub trait RandomSource {
    /// Return an index uniformly distributed in `0..n`.
    ///
    /// Panics if `n == 0`.
    fn choose_index(&mut self, n: usize) -> usize;

    /// Pick one element of `items` uniformly, or `None` if it is empty.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.choose_index(items.len());
        items.get(idx)
    }

    /// Return `true` with probability exactly `1 / n`.
    fn one_in(&mut self, n: usize) -> bool {
        self.choose_index(n) == 0
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn choose_index(&mut self, n: usize) -> usize {
        (**self).choose_index(n)
    }
}

/// Xoshiro256++ generator seeded from a `u64`.
///
/// Two instances created from the same seed produce identical streams.
#[derive(Clone, Debug)]
pub struct SeededRng {
    s: [u64; 4],
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[0, bound)` without modulo bias.
    ///
    /// Panics if `bound == 0`.
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "below: bound must be positive");
        if bound.is_power_of_two() {
            return self.next_u64() & (bound - 1);
        }
        // Values under the threshold would over-represent the low residues.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % bound;
            }
        }
    }
}

impl RandomSource for SeededRng {
    fn choose_index(&mut self, n: usize) -> usize {
        self.below(n as u64) as usize
    }
}

/// Replays a fixed list of picks, cycling when exhausted.
///
/// Each pick is reduced modulo the `n` of the call it answers, so a script
/// written for one pool size stays valid for another.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    picks: Vec<usize>,
    cursor: usize,
}

impl ScriptedSource {
    /// Panics if `picks` is empty.
    pub fn new(picks: Vec<usize>) -> Self {
        assert!(!picks.is_empty(), "ScriptedSource needs at least one pick");
        Self { picks, cursor: 0 }
    }

    /// How many picks have been consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn choose_index(&mut self, n: usize) -> usize {
        assert!(n > 0, "choose_index: n must be positive");
        let pick = self.picks[self.cursor % self.picks.len()];
        self.cursor += 1;
        pick % n
    }
}

/// SplitMix64, used only to expand the seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
