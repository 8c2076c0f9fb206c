use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use strata_error::{StrataResult, ensure, strata_err};

use crate::fitness::Fitness;
use crate::genome::Signature;

#[derive(Clone, Debug, Default)]
struct Slot {
    signature: Signature,
    fitness: Fitness,
    seal: u32,
}

/// A transposition table linking program signatures to fitness values.
///
/// The table is direct mapped: the low bits of the signature pick the one
/// slot a program can live in, and an insert simply evicts whatever was
/// there. Collisions trade cache accuracy for speed and are not errors;
/// `find` detects them by comparing the full signature.
///
/// Each slot carries the `seal` current at insertion time. Bumping the
/// global seal invalidates every slot in O(1) without visiting them.
#[derive(Debug)]
pub struct Cache {
    mask: u64,
    slots: Vec<Slot>,
    seal: u32,
    probes: AtomicU64,
    hits: AtomicU64,
}

impl Cache {
    /// Creates a table with `2^bits` slots.
    pub fn new(bits: u32) -> Cache {
        assert!(bits > 0 && bits < 48);

        Cache {
            mask: (1u64 << bits) - 1,
            slots: vec![Slot::default(); 1usize << bits],
            seal: 1,
            probes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    #[inline]
    fn index(&self, signature: Signature) -> usize {
        (signature.data[0] & self.mask) as usize
    }

    /// Looks up the fitness recorded for `signature`; empty on a miss or a
    /// collision.
    pub fn find(&self, signature: Signature) -> Option<Fitness> {
        self.probes.fetch_add(1, Ordering::Relaxed);

        let slot = &self.slots[self.index(signature)];
        if slot.seal == self.seal && slot.signature == signature {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(slot.fitness.clone());
        }

        None
    }

    /// Unconditionally records `fitness` for `signature` (collision =
    /// eviction).
    pub fn insert(&mut self, signature: Signature, fitness: Fitness) {
        let index = self.index(signature);
        self.slots[index] = Slot {
            signature,
            fitness,
            seal: self.seal,
        };
    }

    /// Invalidates every slot by bumping the seal. O(1).
    pub fn clear(&mut self) {
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.seal += 1;
    }

    /// Invalidates the one slot `signature` maps to.
    pub fn clear_entry(&mut self, signature: Signature) {
        let index = self.index(signature);
        self.slots[index] = Slot::default();
    }

    /// Number of probes since the last clear; every `find` counts.
    pub fn probes(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of successful probes since the last clear.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn live(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .iter()
            .filter(|s| s.seal == self.seal && !s.signature.is_empty())
    }

    pub fn save(&self, out: &mut dyn Write) -> StrataResult<()> {
        writeln!(out, "{}", self.seal)?;
        writeln!(out, "{}", self.live().count())?;

        for slot in self.live() {
            writeln!(out, "{}", slot.signature)?;
            slot.fitness.save(out)?;
        }

        Ok(())
    }

    /// Restores entries saved with [Cache::save] at their current index; a
    /// table of a different size is acceptable. On failure the receiver is
    /// unchanged.
    pub fn load(&mut self, input: &mut dyn BufRead) -> StrataResult<()> {
        let mut line = String::new();

        let mut next_line = move |input: &mut dyn BufRead| -> StrataResult<String> {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Err(strata_err!(Parse: "unexpected end of cache data"));
            }
            Ok(line.trim().to_string())
        };

        let seal = next_line(input)?
            .parse::<u32>()
            .map_err(|_| strata_err!(Parse: "malformed cache seal"))?;
        ensure!(seal > 0, Parse: "cache seal must be positive");

        let count = next_line(input)?
            .parse::<usize>()
            .map_err(|_| strata_err!(Parse: "malformed cache entry count"))?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let signature = Signature::parse(&next_line(input)?)?;
            let fitness = Fitness::parse(&next_line(input)?)?;
            entries.push((signature, fitness));
        }

        // Fully parsed: commit.
        self.slots.fill(Slot::default());
        self.seal = seal;
        for (signature, fitness) in entries {
            self.insert(signature, fitness);
        }

        Ok(())
    }
}
