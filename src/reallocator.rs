//! Periodic re-spreading of each species' total over the map according to scheduled grids.
//!
//! A schedule maps steps within a period (normally the 365 days of a year) to a set of
//! allocation grids. At step `s` the grids in force are the ones scheduled at or before
//! `s % period`. Totals are taken over the sea cells whose biology matches the reallocator
//! (biomass cells for [`BiomassReallocator`], abundance cells for [`AbundanceReallocator`]) and
//! written back onto the same cells, so the species total is conserved whenever the grid weight
//! lies on matching cells. Weight that lands on any other cell is dropped and reported.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::abundance::StructuredAbundance;
use crate::error::{BiologyError, ConfigError, Result};
use crate::local_biology::{CellMap, LocalBiology};
use crate::spatial::{CellId, DoubleGrid, GridMap, Neighborhood};
use crate::species::GlobalBiology;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    Juvenile,
    Mature,
}

impl AgeGroup {
    pub fn of_bin(bin: usize, first_mature_bin: usize) -> Self {
        if bin >= first_mature_bin {
            AgeGroup::Mature
        } else {
            AgeGroup::Juvenile
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeGroup::Juvenile => write!(f, "juvenile"),
            AgeGroup::Mature => write!(f, "mature"),
        }
    }
}

/// Weights over the sea cells of a map, summing to one. Land weight is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationGrid {
    weights: BTreeMap<CellId, f64>,
}

impl AllocationGrid {
    pub fn new(key: &str, grid: &DoubleGrid, map: &GridMap) -> Result<Self> {
        grid.check_shape(map)?;
        let mut weights = BTreeMap::new();
        for cell in map.sea_cells() {
            let value = grid.get(cell);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidGridWeight {
                    key: key.to_string(),
                    cell,
                    value,
                }
                .into());
            }
            if value > 0.0 {
                weights.insert(cell, value);
            }
        }
        let total: f64 = weights.values().sum();
        if total <= 0.0 {
            return Err(ConfigError::EmptyGrid {
                key: key.to_string(),
            }
            .into());
        }
        for weight in weights.values_mut() {
            *weight /= total;
        }
        Ok(Self { weights })
    }

    pub fn weight(&self, cell: CellId) -> f64 {
        self.weights.get(&cell).copied().unwrap_or(0.0)
    }

    /// Cells with positive weight.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, f64)> + '_ {
        self.weights.iter().map(|(cell, weight)| (*cell, *weight))
    }
}

/// Grids keyed by `K`, scheduled by step within a repeating period.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationGrids<K: Ord> {
    schedule: BTreeMap<u64, BTreeMap<K, AllocationGrid>>,
    period: u64,
}

impl<K: Ord> AllocationGrids<K> {
    pub fn new(schedule: BTreeMap<u64, BTreeMap<K, AllocationGrid>>, period: u64) -> Result<Self> {
        if period == 0 {
            return Err(ConfigError::ZeroPeriod.into());
        }
        if schedule.is_empty() {
            return Err(ConfigError::EmptySchedule.into());
        }
        Ok(Self { schedule, period })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// The grids in force at `step`.
    pub fn at_or_before(&self, step: u64) -> Result<&BTreeMap<K, AllocationGrid>> {
        let within_period = step % self.period;
        self.schedule
            .range(..=within_period)
            .next_back()
            .map(|(_, grids)| grids)
            .ok_or(BiologyError::MissingSchedule {
                step,
                period: self.period,
            })
    }

    /// True when a grid set starts exactly at `step`.
    pub fn is_scheduled(&self, step: u64) -> bool {
        self.schedule.contains_key(&(step % self.period))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedShare {
    pub cell: CellId,
    pub species: String,
    pub key: String,
    pub weight: f64,
}

/// What one reallocation did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReallocationReport {
    pub step: u64,
    /// Species-wide total per grid key before reallocation (kg or fish).
    pub totals: BTreeMap<String, f64>,
    /// The same totals summed per species name.
    pub species_totals: BTreeMap<String, f64>,
    pub dropped: Vec<DroppedShare>,
}

impl ReallocationReport {
    fn new(step: u64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    fn record_total(&mut self, species: &str, key: String, total: f64) {
        self.totals.insert(key, total);
        *self.species_totals.entry(species.to_string()).or_default() += total;
    }

    fn drop_share(&mut self, cell: CellId, species: &str, key: String, weight: f64) {
        warn!("reallocation at step {} drops {:.4} of {} at {}", self.step, weight, key, cell);
        self.dropped.push(DroppedShare {
            cell,
            species: species.to_string(),
            key,
            weight,
        });
    }

    /// Dropped shares belonging to `species`.
    pub fn dropped_for(&self, species: &str) -> usize {
        self.dropped.iter().filter(|d| d.species == species).count()
    }
}

pub trait Reallocator: Send + Sync + fmt::Debug {
    fn reallocate_at_step(
        &self,
        step: u64,
        biology: &GlobalBiology,
        cells: &mut CellMap,
        map: &GridMap,
    ) -> Result<ReallocationReport>;

    fn is_scheduled(&self, step: u64) -> bool;

    fn name(&self) -> &str;
}

// === BIOMASS ===

/// Rewrites the biomass of biomass cells, one grid per species name.
#[derive(Debug, Clone)]
pub struct BiomassReallocator {
    grids: AllocationGrids<String>,
}

impl BiomassReallocator {
    pub fn new(grids: AllocationGrids<String>) -> Self {
        Self { grids }
    }
}

impl Reallocator for BiomassReallocator {
    fn reallocate_at_step(
        &self,
        step: u64,
        biology: &GlobalBiology,
        cells: &mut CellMap,
        map: &GridMap,
    ) -> Result<ReallocationReport> {
        let grids = self.grids.at_or_before(step)?;
        let mut report = ReallocationReport::new(step);
        let sea = map.sea_cells();

        for (name, grid) in grids {
            // species without a grid are left alone; grids for unknown species are rejected
            let species = biology.by_name(name)?;
            let total: f64 = sea
                .iter()
                .filter_map(|cell| match cells.get(cell) {
                    Some(LocalBiology::Biomass(local)) => Some(local.biomass(species)),
                    _ => None,
                })
                .sum();
            report.record_total(name, name.clone(), total);

            for cell in &sea {
                let weight = grid.weight(*cell);
                match cells.get_mut(cell).and_then(LocalBiology::as_biomass_mut) {
                    Some(local) => local.set_biomass(species, total * weight),
                    None if weight > 0.0 => report.drop_share(*cell, name, name.clone(), weight),
                    None => {}
                }
            }
            debug!("reallocated {:.2} kg of {} at step {}", total, name, step);
        }
        Ok(report)
    }

    fn is_scheduled(&self, step: u64) -> bool {
        self.grids.is_scheduled(step)
    }

    fn name(&self) -> &str {
        "Biomass"
    }
}

// === ABUNDANCE ===

/// Rewrites the counts of abundance cells, one grid per species and age group. Bins below a
/// species' first mature bin follow its juvenile grid, the rest its mature grid.
#[derive(Debug, Clone)]
pub struct AbundanceReallocator {
    grids: AllocationGrids<(String, AgeGroup)>,
    first_mature_bin: BTreeMap<String, usize>,
}

impl AbundanceReallocator {
    pub fn new(
        grids: AllocationGrids<(String, AgeGroup)>,
        first_mature_bin: BTreeMap<String, usize>,
    ) -> Result<Self> {
        for grid_set in grids.schedule.values() {
            for (name, _) in grid_set.keys() {
                if !first_mature_bin.contains_key(name) {
                    return Err(ConfigError::MissingFirstMatureBin(name.clone()).into());
                }
            }
        }
        Ok(Self {
            grids,
            first_mature_bin,
        })
    }
}

impl Reallocator for AbundanceReallocator {
    fn reallocate_at_step(
        &self,
        step: u64,
        biology: &GlobalBiology,
        cells: &mut CellMap,
        map: &GridMap,
    ) -> Result<ReallocationReport> {
        let grids = self.grids.at_or_before(step)?;
        let mut report = ReallocationReport::new(step);
        let sea = map.sea_cells();

        for ((name, group), grid) in grids {
            let species = biology.by_name(name)?;
            let first_mature = self
                .first_mature_bin
                .get(name)
                .copied()
                .ok_or_else(|| ConfigError::MissingFirstMatureBin(name.clone()))?;
            let in_group = |bin: usize| AgeGroup::of_bin(bin, first_mature) == *group;
            let key = format!("{} ({})", name, group);

            let mut total = StructuredAbundance::empty_for(species.meristics());
            for cell in &sea {
                if let Some(abundance) = cells
                    .get(cell)
                    .and_then(LocalBiology::as_abundance)
                    .and_then(|local| local.abundance(species))
                {
                    for subdivision in 0..total.subdivisions() {
                        for bin in (0..total.bins()).filter(|b| in_group(*b)) {
                            let summed = total.get(subdivision, bin) + abundance.get(subdivision, bin);
                            total.set(subdivision, bin, summed);
                        }
                    }
                }
            }
            report.record_total(name, key.clone(), total.total());

            for cell in &sea {
                let weight = grid.weight(*cell);
                let target = cells
                    .get_mut(cell)
                    .and_then(LocalBiology::as_abundance_mut)
                    .and_then(|local| local.abundance_mut(species));
                match target {
                    Some(abundance) => {
                        for subdivision in 0..total.subdivisions() {
                            for bin in (0..total.bins()).filter(|b| in_group(*b)) {
                                abundance.set(subdivision, bin, total.get(subdivision, bin) * weight);
                            }
                        }
                    }
                    None if weight > 0.0 => report.drop_share(*cell, name, key.clone(), weight),
                    None => {}
                }
            }
            debug!("reallocated {:.0} {} at step {}", total.total(), key, step);
        }
        Ok(report)
    }

    fn is_scheduled(&self, step: u64) -> bool {
        self.grids.is_scheduled(step)
    }

    fn name(&self) -> &str {
        "Abundance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_biology::{AbundanceLocalBiology, BiomassLocalBiology};
    use crate::meristics::{FromListMeristics, Meristics};
    use crate::species::Species;
    use std::sync::Arc;

    fn biology() -> GlobalBiology {
        let meristics: Arc<dyn Meristics> =
            Arc::new(FromListMeristics::new(vec![1.0, 1.0, 1.0], vec![1.0, 2.0, 3.0], 2).unwrap());
        GlobalBiology::new(vec![
            Species::new("sablefish", meristics.clone()),
            Species::new("yelloweye", meristics),
        ])
        .unwrap()
    }

    fn grid(map: &GridMap, rows: &[Vec<f64>]) -> AllocationGrid {
        AllocationGrid::new("test", &DoubleGrid::from_rows(rows).unwrap(), map).unwrap()
    }

    #[test]
    fn test_grid_is_normalised_over_sea() {
        let map = GridMap::new(2, 1).with_land(&[CellId::new(1, 0)]);
        let grid = grid(&map, &[vec![2.0, 5.0]]);
        assert_eq!(grid.weight(CellId::new(0, 0)), 1.0);
        assert_eq!(grid.weight(CellId::new(1, 0)), 0.0);

        let zero = DoubleGrid::from_rows(&[vec![0.0, 5.0]]).unwrap();
        assert!(AllocationGrid::new("zero", &zero, &map).is_err());
    }

    #[test]
    fn test_schedule_wraps_around_period() {
        let map = GridMap::new(1, 1);
        let mut schedule = BTreeMap::new();
        schedule.insert(10, BTreeMap::from([("a".to_string(), grid(&map, &[vec![1.0]]))]));
        schedule.insert(200, BTreeMap::from([("b".to_string(), grid(&map, &[vec![1.0]]))]));
        let grids = AllocationGrids::new(schedule, 365).unwrap();

        assert!(grids.at_or_before(15).unwrap().contains_key("a"));
        assert!(grids.at_or_before(364).unwrap().contains_key("b"));
        assert!(grids.at_or_before(365 + 210).unwrap().contains_key("b"));
        assert!(grids.is_scheduled(365 + 10));

        let err = grids.at_or_before(365 + 3).unwrap_err();
        assert!(matches!(err, BiologyError::MissingSchedule { step: 368, period: 365 }));
        assert!(err.is_configuration());

        assert!(AllocationGrids::<String>::new(BTreeMap::new(), 365).is_err());
    }

    #[test]
    fn test_biomass_reallocation_conserves_total() {
        let biology = biology();
        let sablefish = biology.get(0).unwrap();
        let yelloweye = biology.get(1).unwrap();
        let map = GridMap::new(2, 2);
        let mut cells = CellMap::new();
        for cell in map.sea_cells() {
            cells.insert(cell, LocalBiology::Biomass(BiomassLocalBiology::new(vec![10.0, 3.0])));
        }

        let mut schedule = BTreeMap::new();
        schedule.insert(
            0,
            BTreeMap::from([(
                "sablefish".to_string(),
                grid(&map, &[vec![1.0, 0.0], vec![0.0, 3.0]]),
            )]),
        );
        let reallocator = BiomassReallocator::new(AllocationGrids::new(schedule, 365).unwrap());
        let report = reallocator.reallocate_at_step(7, &biology, &mut cells, &map).unwrap();

        assert_eq!(report.totals["sablefish"], 40.0);
        assert!(report.dropped.is_empty());
        assert_eq!(cells[&CellId::new(0, 0)].biomass(sablefish), 10.0);
        assert_eq!(cells[&CellId::new(1, 1)].biomass(sablefish), 30.0);
        assert_eq!(cells[&CellId::new(1, 0)].biomass(sablefish), 0.0);
        // no grid: untouched
        assert_eq!(cells[&CellId::new(0, 0)].biomass(yelloweye), 3.0);
    }

    #[test]
    fn test_share_on_mismatched_cell_is_dropped_and_reported() {
        let biology = biology();
        let sablefish = biology.get(0).unwrap();
        let map = GridMap::new(2, 1);
        let mut cells = CellMap::new();
        cells.insert(
            CellId::new(0, 0),
            LocalBiology::Biomass(BiomassLocalBiology::new(vec![10.0, 0.0])),
        );
        cells.insert(CellId::new(1, 0), LocalBiology::Empty);

        let schedule = BTreeMap::from([(
            0,
            BTreeMap::from([("sablefish".to_string(), grid(&map, &[vec![1.0, 1.0]]))]),
        )]);
        let reallocator = BiomassReallocator::new(AllocationGrids::new(schedule, 365).unwrap());
        let report = reallocator.reallocate_at_step(0, &biology, &mut cells, &map).unwrap();

        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].cell, CellId::new(1, 0));
        assert_eq!(report.dropped[0].weight, 0.5);
        assert_eq!(report.dropped_for("sablefish"), 1);
        assert_eq!(report.species_totals["sablefish"], 10.0);
        assert_eq!(cells[&CellId::new(0, 0)].biomass(sablefish), 5.0);
    }

    #[test]
    fn test_abundance_reallocation_by_age_group() {
        let biology = biology();
        let sablefish = biology.get(0).unwrap();
        let map = GridMap::new(2, 1);
        let west = CellId::new(0, 0);
        let east = CellId::new(1, 0);
        let mut cells = CellMap::new();
        for (cell, counts) in [(west, [4.0, 8.0, 2.0]), (east, [0.0, 0.0, 6.0])] {
            let local = AbundanceLocalBiology::new(&biology)
                .with_abundance(
                    sablefish,
                    StructuredAbundance::from_sexes(counts.to_vec(), counts.to_vec()).unwrap(),
                )
                .unwrap();
            cells.insert(cell, LocalBiology::Abundance(local));
        }

        let key = |group| ("sablefish".to_string(), group);
        let schedule = BTreeMap::from([(
            0,
            BTreeMap::from([
                (key(AgeGroup::Juvenile), grid(&map, &[vec![0.0, 1.0]])),
                (key(AgeGroup::Mature), grid(&map, &[vec![3.0, 1.0]])),
            ]),
        )]);
        let reallocator = AbundanceReallocator::new(
            AllocationGrids::new(schedule, 365).unwrap(),
            BTreeMap::from([("sablefish".to_string(), 1)]),
        )
        .unwrap();
        let report = reallocator.reallocate_at_step(0, &biology, &mut cells, &map).unwrap();
        // juveniles 4 + mature 16 per sex
        assert_eq!(report.species_totals["sablefish"], 40.0);

        let counts = |cell: CellId| {
            cells[&cell]
                .as_abundance()
                .and_then(|local| local.abundance(sablefish))
                .map(|a| a.subdivision(0).to_vec())
                .unwrap()
        };
        assert_eq!(counts(west), vec![0.0, 6.0, 6.0]);
        assert_eq!(counts(east), vec![4.0, 2.0, 2.0]);
    }

    #[test]
    fn test_abundance_grids_need_first_mature_bin() {
        let map = GridMap::new(1, 1);
        let schedule = BTreeMap::from([(
            0,
            BTreeMap::from([(
                ("sablefish".to_string(), AgeGroup::Mature),
                grid(&map, &[vec![1.0]]),
            )]),
        )]);
        let result =
            AbundanceReallocator::new(AllocationGrids::new(schedule, 365).unwrap(), BTreeMap::new());
        assert!(result.is_err());
    }
}
