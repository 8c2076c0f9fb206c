use rand::distr::{Distribution, StandardUniform, uniform::SampleUniform};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngExt, SeedableRng};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::{Arc, LazyLock, Mutex};

static GLOBAL_RNG: LazyLock<Arc<Mutex<SmallRng>>> =
    LazyLock::new(|| Arc::new(Mutex::new(SmallRng::from_rng(&mut rand::rng()))));

thread_local! {
    static TLS_RNG: RefCell<SmallRng> = RefCell::new({
        let mut global = GLOBAL_RNG.lock().unwrap();
        SmallRng::seed_from_u64(global.next_u64())
    });
}

pub fn with_rng<R>(f: impl FnOnce(&mut RdRand<'_>) -> R) -> R {
    TLS_RNG.with(|cell| {
        let mut rng = cell.borrow_mut();
        f(&mut RdRand::new(&mut rng))
    })
}

/// Seeds the caller's thread-local random number generator with the given seed.
pub fn set_seed(seed: u64) {
    TLS_RNG.with(|cell| {
        *cell.borrow_mut() = SmallRng::seed_from_u64(seed);
    });
}

/// Re-seeds the caller's thread-local engine from the operating system.
pub fn randomize() {
    TLS_RNG.with(|cell| {
        *cell.borrow_mut() = SmallRng::from_rng(&mut rand::rng());
    });
}

/// Temporarily sets the seed of the thread-local random number generator to the given seed
/// for the duration of the closure `f`. After `f` completes, the original state of the RNG is
/// restored.
pub fn scoped_seed<R>(seed: u64, f: impl FnOnce() -> R) -> R {
    TLS_RNG.with(|cell| {
        let original = {
            let mut rng = cell.borrow_mut();
            let original = rng.clone();
            *rng = SmallRng::seed_from_u64(seed);
            original
        };

        let result = f();

        let mut rng = cell.borrow_mut();
        *rng = original;

        result
    })
}

/// For floating point types, the number will be in the range [0, 1).
/// For integer types, the number will be in the range [0, MAX).
#[inline(always)]
pub fn random<T>() -> T
where
    T: SampleUniform,
    StandardUniform: Distribution<T>,
{
    with_rng(|rng| rng.random())
}

/// Generates a random boolean with the given probability of being true.
#[inline(always)]
pub fn bool(prob: f64) -> bool {
    with_rng(|rng| rng.bool(prob))
}

/// Generates a random number of type T in the given range.
pub fn range<T>(range: Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    with_rng(|rng| rng.range(range))
}

/// Chooses a random item from the given slice.
pub fn choose<T>(items: &[T]) -> &T {
    with_rng(|rng| rng.choose(items))
}

/// Shuffles the given slice in place.
pub fn shuffle<T>(items: &mut [T]) {
    with_rng(|rng| rng.shuffle(items));
}

/// A random draw on the population ring: an index whose distance from `base`
/// is at most `width / 2`, modulo `n`. Degenerate windows (`base >= n` or
/// `width >= n`) fall back to a uniform draw over `[0, n)`.
pub fn ring(base: usize, width: usize, n: usize) -> usize {
    with_rng(|rng| rng.ring(base, width, n))
}

pub struct RdRand<'a>(&'a mut SmallRng);

impl<'a> RdRand<'a> {
    pub fn new(rng: &'a mut SmallRng) -> Self {
        RdRand(rng)
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        T: SampleUniform,
        StandardUniform: Distribution<T>,
    {
        self.0.random()
    }

    #[inline]
    pub fn range<T>(&mut self, range: Range<T>) -> T
    where
        T: SampleUniform + PartialOrd,
    {
        self.0.random_range(range)
    }

    #[inline]
    pub fn bool(&mut self, prob: f64) -> bool {
        self.0.random_bool(prob)
    }

    #[inline]
    pub fn choose<'b, T>(&mut self, items: &'b [T]) -> &'b T {
        let index = self.0.random_range(0..items.len());
        &items[index]
    }

    #[inline]
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.0);
    }

    #[inline]
    pub fn ring(&mut self, base: usize, width: usize, n: usize) -> usize {
        if base >= n || width >= n || width == 0 {
            return self.0.random_range(0..n);
        }

        let offset = n + base - width / 2;
        (offset + self.0.random_range(0..width)) % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random() {
        for _ in 0..100 {
            let value: f64 = random();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_range() {
        for _ in 0..100 {
            let value: f64 = range(0.0..100.0);
            assert!((0.0..100.0).contains(&value));
        }
    }

    #[test]
    fn test_choose() {
        for _ in 0..100 {
            let items = vec![1, 2, 3, 4, 5];
            let value = choose(&items);
            assert!(items.contains(value));
        }
    }

    #[test]
    fn test_ring_within_window() {
        for _ in 0..1000 {
            let drawn = ring(50, 10, 100);
            let distance = if drawn > 50 { drawn - 50 } else { 50 - drawn };
            assert!(distance <= 5, "drawn {} too far from base", drawn);
        }
    }

    #[test]
    fn test_ring_wraps_around() {
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..1000 {
            let drawn = ring(0, 10, 100);
            if drawn < 5 {
                seen_low = true;
            }
            if drawn >= 95 {
                seen_high = true;
            }
            assert!(drawn < 5 || drawn >= 95);
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn test_ring_panmictic() {
        let mut hits = vec![0usize; 10];
        for _ in 0..1000 {
            hits[ring(3, 100, 10)] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0));
    }

    #[test]
    fn test_scoped_seed_repeats() {
        let a = scoped_seed(7, || (0..8).map(|_| random::<u64>()).collect::<Vec<_>>());
        let b = scoped_seed(7, || (0..8).map(|_| random::<u64>()).collect::<Vec<_>>());
        assert_eq!(a, b);
    }
}
