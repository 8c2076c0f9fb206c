use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Write};
use std::ops::{Index, IndexMut};

use strata_error::{StrataResult, ensure, strata_err};

use crate::environment::Environment;
use crate::genome::Mep;
use crate::ops::OpSet;

/// Coordinates of an individual inside the layered population.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Coord {
    pub layer: usize,
    pub index: usize,
}

impl Coord {
    pub fn new(layer: usize, index: usize) -> Coord {
        Coord { layer, index }
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.layer, self.index)
    }
}

/// The individuals being evolved, segregated into age layers.
///
/// Layer 0 is the youngest. The number of layers only grows over a run
/// (bounded by `environment.layers`); each layer holds at most `allowed`
/// individuals and implicitly limits the age of its members through
/// [Population::max_age].
#[derive(Clone, Debug)]
pub struct Population {
    env: Environment,
    layers: Vec<Vec<Mep>>,
    allowed: Vec<usize>,
}

impl Population {
    /// A single-layer population of random individuals.
    pub fn new(env: Environment, ops: &OpSet) -> Population {
        debug_assert!(env.is_valid(false));

        let n = env.individuals();
        let layer = (0..n).map(|_| Mep::random(&env, ops)).collect();

        Population {
            layers: vec![layer],
            allowed: vec![n],
            env,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Number of active layers; monotonically non-decreasing over a run.
    pub fn layers(&self) -> usize {
        self.layers.len()
    }

    /// Total number of individuals across layers.
    pub fn individuals(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    pub fn individuals_in(&self, layer: usize) -> usize {
        self.layers[layer].len()
    }

    pub fn allowed(&self, layer: usize) -> usize {
        self.allowed[layer]
    }

    /// Shrinks (or widens, up to capacity) the population of a layer.
    pub fn set_allowed(&mut self, layer: usize, n: usize) {
        self.layers[layer].truncate(n);
        self.allowed[layer] = n;
    }

    pub fn get(&self, c: Coord) -> &Mep {
        &self.layers[c.layer][c.index]
    }

    pub fn get_mut(&mut self, c: Coord) -> &mut Mep {
        &mut self.layers[c.layer][c.index]
    }

    /// Re-randomises layer `layer` to its allowed size.
    pub fn init_layer(&mut self, layer: usize, ops: &OpSet) {
        let n = self.allowed[layer];
        let env = self.env.clone();

        let fresh = (0..n).map(|_| Mep::random(&env, ops)).collect();
        self.layers[layer] = fresh;
    }

    /// Inserts a fresh random layer at index 0 (the youngest position),
    /// shifting the existing layers up.
    pub fn add_layer(&mut self, ops: &OpSet) {
        let n = self.env.individuals();
        let env = self.env.clone();

        let fresh = (0..n).map(|_| Mep::random(&env, ops)).collect();
        self.layers.insert(0, fresh);
        self.allowed.insert(0, n);
    }

    /// Appends `individual` to layer `layer` if there is room.
    pub fn add_to_layer(&mut self, layer: usize, individual: Mep) {
        if self.layers[layer].len() < self.allowed[layer] {
            self.layers[layer].push(individual);
        }
    }

    /// Increments the age of every individual.
    pub fn inc_age(&mut self) {
        for layer in &mut self.layers {
            for i in layer {
                i.inc_age();
            }
        }
    }

    /// The age limit of a layer under the polynomial aging scheme; the top
    /// layer accepts individuals of any age.
    pub fn max_age(&self, layer: usize) -> usize {
        if layer + 1 == self.layers() {
            return usize::MAX;
        }

        let age_gap = self.env.alps.age_gap();
        match layer {
            0 => age_gap,
            1 => 2 * age_gap,
            l => l * l * age_gap,
        }
    }

    /// True when the individual has outlived its layer.
    pub fn aged(&self, c: Coord) -> bool {
        self.get(c).age() > self.max_age(c.layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Mep)> {
        self.layers.iter().enumerate().flat_map(|(layer, l)| {
            l.iter()
                .enumerate()
                .map(move |(index, i)| (Coord::new(layer, index), i))
        })
    }

    /// Consistency audit over every member and the layer bookkeeping.
    pub fn is_valid(&self, ops: &OpSet) -> bool {
        if self.layers.len() != self.allowed.len() {
            return false;
        }

        for l in 0..self.layers() {
            if self.individuals_in(l) > self.allowed(l) {
                return false;
            }
        }

        self.iter().all(|(_, i)| i.is_valid(ops))
    }

    pub fn save(&self, out: &mut dyn Write) -> StrataResult<()> {
        writeln!(out, "{}", self.layers())?;

        for l in 0..self.layers() {
            writeln!(out, "{} {}", self.allowed(l), self.individuals_in(l))?;
            for i in &self.layers[l] {
                i.save(out)?;
            }
        }

        Ok(())
    }

    /// Restores a population saved with [Population::save]; the receiver is
    /// unchanged on failure.
    pub fn load(&mut self, input: &mut dyn BufRead, ops: &OpSet) -> StrataResult<()> {
        let mut line = String::new();

        let mut next_line = move |input: &mut dyn BufRead| -> StrataResult<String> {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Err(strata_err!(Parse: "unexpected end of population data"));
            }
            Ok(line.trim().to_string())
        };

        let n_layers = next_line(input)?
            .parse::<usize>()
            .map_err(|_| strata_err!(Parse: "malformed layer count"))?;
        ensure!(n_layers > 0, Parse: "a population needs at least one layer");

        let mut layers = Vec::with_capacity(n_layers);
        let mut allowed = Vec::with_capacity(n_layers);

        for _ in 0..n_layers {
            let header = next_line(input)?;
            let mut parts = header.split_whitespace();
            let layer_allowed = parts
                .next()
                .and_then(|p| p.parse::<usize>().ok())
                .ok_or_else(|| strata_err!(Parse: "malformed layer header '{}'", header))?;
            let count = parts
                .next()
                .and_then(|p| p.parse::<usize>().ok())
                .ok_or_else(|| strata_err!(Parse: "malformed layer header '{}'", header))?;

            ensure!(count <= layer_allowed, Parse: "layer holds more than allowed");

            let mut layer = Vec::with_capacity(count);
            for _ in 0..count {
                layer.push(Mep::load(input, ops)?);
            }

            layers.push(layer);
            allowed.push(layer_allowed);
        }

        self.layers = layers;
        self.allowed = allowed;

        Ok(())
    }
}

impl Index<Coord> for Population {
    type Output = Mep;

    fn index(&self, c: Coord) -> &Mep {
        self.get(c)
    }
}

impl IndexMut<Coord> for Population {
    fn index_mut(&mut self, c: Coord) -> &mut Mep {
        self.get_mut(c)
    }
}
