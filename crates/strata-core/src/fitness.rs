use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use strata_error::{StrataResult, strata_err};

/// A standardized fitness: an ordered vector of components where a greater
/// value is always a better value. Most problems use a single component;
/// additional components act as tie-breakers (comparison is lexicographic)
/// or as objectives for Pareto dominance queries.
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness {
    values: SmallVec<[f64; 1]>,
}

impl Fitness {
    pub fn from_vec(values: Vec<f64>) -> Self {
        Fitness {
            values: SmallVec::from_vec(values),
        }
    }

    /// The worst possible scalar fitness.
    pub fn lowest() -> Self {
        Fitness {
            values: smallvec![f64::MIN],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first component; the one scalar summaries report on.
    pub fn primary(&self) -> f64 {
        self.values.first().copied().unwrap_or(f64::NAN)
    }

    pub fn is_finite(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|v| v.is_finite())
    }

    /// Pareto dominance: every component at least as good and one strictly
    /// better.
    pub fn dominates(&self, other: &Fitness) -> bool {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return false;
        }

        let mut better = false;
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            if a < b {
                return false;
            }
            if a > b {
                better = true;
            }
        }

        better
    }

    pub fn save(&self, out: &mut dyn std::io::Write) -> StrataResult<()> {
        write!(out, "{}", self.values.len())?;
        for v in &self.values {
            write!(out, " {}", v)?;
        }
        writeln!(out)?;

        Ok(())
    }

    /// Parses the `n c0 c1 ...` line produced by [Fitness::save].
    pub fn parse(line: &str) -> StrataResult<Self> {
        let mut parts = line.split_whitespace();
        let n = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed fitness '{}'", line))?;

        let values = parts
            .map(|p| p.parse::<f64>())
            .collect::<Result<SmallVec<[f64; 1]>, _>>()
            .map_err(|_| strata_err!(Parse: "malformed fitness '{}'", line))?;

        if values.len() != n {
            return Err(strata_err!(Parse: "fitness component count mismatch in '{}'", line));
        }

        Ok(Fitness { values })
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.values[..].partial_cmp(&other.values[..])
    }
}

impl From<f64> for Fitness {
    fn from(value: f64) -> Self {
        Fitness {
            values: smallvec![value],
        }
    }
}

impl From<Vec<f64>> for Fitness {
    fn from(values: Vec<f64>) -> Self {
        Fitness::from_vec(values)
    }
}

impl Debug for Fitness {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.values)
    }
}

impl Display for Fitness {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic_comparison() {
        let a = Fitness::from_vec(vec![1.0, 5.0]);
        let b = Fitness::from_vec(vec![1.0, 7.0]);
        let c = Fitness::from_vec(vec![2.0, 0.0]);

        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_dominates() {
        let a = Fitness::from_vec(vec![1.0, 1.0]);
        let b = Fitness::from_vec(vec![1.0, 2.0]);
        let c = Fitness::from_vec(vec![2.0, 0.0]);

        assert!(b.dominates(&a));
        assert!(!a.dominates(&b));
        assert!(!c.dominates(&b));
        assert!(!b.dominates(&c));
        assert!(!a.dominates(&a));
    }

    #[test]
    fn test_save_parse_round_trip() {
        let f = Fitness::from_vec(vec![3.5, -1.0, 0.0]);

        let mut buf = Vec::new();
        f.save(&mut buf).unwrap();

        let parsed = Fitness::parse(std::str::from_utf8(&buf).unwrap()).unwrap();
        assert_eq!(parsed, f);

        assert!(Fitness::parse("2 1.0").is_err());
        assert!(Fitness::parse("x").is_err());
    }

    #[test]
    fn test_lowest_is_worst() {
        assert!(Fitness::lowest() < Fitness::from(-1e300));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let f = Fitness::from_vec(vec![1.0, 2.0]);
        let json = serde_json::to_string(&f).unwrap();
        let back: Fitness = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
