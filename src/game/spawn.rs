//! Weighted spawn selection
//!
//! Picks the next monster to show and where to show it. Selection can never
//! fail: a validated [`Catalog`] is non-empty, and if rounding leaves the draw
//! unmatched the first entry is returned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::constants::spawn::{X_MAX, X_MIN, Y_MAX, Y_MIN};

/// Monster rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterKind {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Kind whose catches are reported to the backend as `epicCount`
pub const BONUS_TRACKED_KIND: MonsterKind = MonsterKind::Epic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: MonsterKind,
    pub score_value: u32,
    pub weight: u32,
}

const fn entry(kind: MonsterKind, score_value: u32, weight: u32) -> CatalogEntry {
    CatalogEntry {
        kind,
        score_value,
        weight,
    }
}

pub const DEFAULT_CATALOG: [CatalogEntry; 4] = [
    entry(MonsterKind::Common, 1, 60),
    entry(MonsterKind::Rare, 3, 25),
    entry(MonsterKind::Epic, 5, 10),
    entry(MonsterKind::Legendary, 10, 5),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog must contain at least one entry")]
    Empty,
    #[error("Catalog entry {0:?} has a zero weight")]
    ZeroWeight(MonsterKind),
    #[error("Catalog entry {0:?} has a zero score")]
    ZeroScore(MonsterKind),
}

/// Non-empty set of spawnable monsters with positive weights
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    total_weight: u64,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        for entry in &entries {
            if entry.weight == 0 {
                return Err(CatalogError::ZeroWeight(entry.kind));
            }
            if entry.score_value == 0 {
                return Err(CatalogError::ZeroScore(entry.kind));
            }
        }
        let total_weight = entries.iter().map(|e| e.weight as u64).sum();
        Ok(Self {
            entries,
            total_weight,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CATALOG.to_vec(),
            total_weight: DEFAULT_CATALOG.iter().map(|e| e.weight as u64).sum(),
        }
    }
}

/// Position on the play surface, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A displayed monster. Superseded after every catch, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnTarget {
    pub kind: MonsterKind,
    pub score_value: u32,
    /// Catalog weight this target was drawn with
    pub selection_weight: u32,
    pub position: Position,
}

/// Draw in `[0, total_weight)` and return the first entry whose cumulative
/// weight reaches it
pub fn pick_target<'a, R: Rng>(rng: &mut R, catalog: &'a Catalog) -> &'a CatalogEntry {
    let draw = rng.gen::<f64>() * catalog.total_weight as f64;
    let mut cumulative = 0.0;
    for entry in &catalog.entries {
        cumulative += entry.weight as f64;
        if draw <= cumulative {
            return entry;
        }
    }
    &catalog.entries[0]
}

/// Independent uniform draws inside the spawn margins
pub fn pick_position<R: Rng>(rng: &mut R) -> Position {
    Position {
        x: X_MIN + rng.gen::<f64>() * (X_MAX - X_MIN),
        y: Y_MIN + rng.gen::<f64>() * (Y_MAX - Y_MIN),
    }
}

/// Supplies the round with targets
pub trait SpawnSource: Send {
    fn next_target(&mut self) -> SpawnTarget;
}

/// Random spawn source over a catalog
pub struct SpawnGenerator<R = StdRng> {
    rng: R,
    catalog: Catalog,
}

impl SpawnGenerator<StdRng> {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            catalog,
        }
    }

    /// Reproducible sequence for tests and benchmarks
    pub fn seeded(catalog: Catalog, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            catalog,
        }
    }
}

impl<R: Rng> SpawnGenerator<R> {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl<R: Rng + Send> SpawnSource for SpawnGenerator<R> {
    fn next_target(&mut self) -> SpawnTarget {
        let entry = *pick_target(&mut self.rng, &self.catalog);
        SpawnTarget {
            kind: entry.kind,
            score_value: entry.score_value,
            selection_weight: entry.weight,
            position: pick_position(&mut self.rng),
        }
    }
}
