//! The biology driver: one map of cells, every species' processes, and the daily and yearly
//! steps that tie them together.

use log::{debug, info};

use crate::abundance::StructuredAbundance;
use crate::aging::AgingProcess;
use crate::allocator::Allocator;
use crate::catch::Catch;
use crate::diffusion::Diffuser;
use crate::error::{ConfigError, InvariantViolation, Result};
use crate::events::{EventLogger, EventType};
use crate::initializer::SprOracle;
use crate::local_biology::{AbundanceLocalBiology, CellMap, LocalBiology};
use crate::mortality::MortalityProcess;
use crate::reallocator::{ReallocationReport, Reallocator};
use crate::recruitment::{RecruitmentProcess, inject_recruits, validate_female_ratio};
use crate::selectivity::SelectivityGear;
use crate::spatial::{CellId, GridMap};
use crate::species::{GlobalBiology, Species};

pub const DAYS_PER_YEAR: u64 = 365;

/// Everything that moves one species' population through a year.
#[derive(Debug)]
pub struct SpeciesProcesses {
    pub aging: Box<dyn AgingProcess>,
    pub mortality: Box<dyn MortalityProcess>,
    pub recruitment: Box<dyn RecruitmentProcess>,
    pub diffuser: Box<dyn Diffuser>,
    pub recruit_allocator: Allocator,
    pub female_ratio: f64,
    pub spr_oracle: Option<SprOracle>,
}

/// A gear dropped on the same cells every `every_days` days.
#[derive(Debug)]
pub struct Fishery {
    pub gear: SelectivityGear,
    pub cells: Vec<CellId>,
    pub every_days: u64,
}

/// Per-year totals for one species, as reported at the end of `step_year`.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub species: String,
    pub spawning_biomass: Option<f64>,
    pub recruits: f64,
    pub biomass: f64,
    pub abundance: f64,
    pub spr: Option<f64>,
}

#[derive(Debug)]
pub struct BiologyModel {
    biology: GlobalBiology,
    map: GridMap,
    cells: CellMap,
    processes: Vec<Option<SpeciesProcesses>>,
    reallocator: Option<Box<dyn Reallocator>>,
    fishery: Option<Fishery>,
    day: u64,
    events: EventLogger,
}

/// An empty abundance cell on every sea cell of `map` and `Empty` on land.
pub fn abundance_cells(biology: &GlobalBiology, map: &GridMap) -> CellMap {
    (0..map.width())
        .flat_map(|x| (0..map.height()).map(move |y| CellId::new(x, y)))
        .map(|cell| {
            let local = if map.is_sea(cell) {
                LocalBiology::Abundance(AbundanceLocalBiology::new(biology))
            } else {
                LocalBiology::Empty
            };
            (cell, local)
        })
        .collect()
}

impl BiologyModel {
    pub fn new(biology: GlobalBiology, map: GridMap, cells: CellMap) -> Result<Self> {
        if let Some(cell) = cells.keys().find(|cell| !map.contains(**cell)) {
            return Err(ConfigError::InvalidScenario(format!(
                "cell {} lies outside the {}x{} map",
                cell,
                map.width(),
                map.height()
            ))
            .into());
        }
        let processes = (0..biology.len()).map(|_| None).collect();
        Ok(Self {
            biology,
            map,
            cells,
            processes,
            reallocator: None,
            fishery: None,
            day: 0,
            events: EventLogger::new(),
        })
    }

    pub fn with_processes(mut self, species: &str, processes: SpeciesProcesses) -> Result<Self> {
        validate_female_ratio(processes.female_ratio)?;
        processes.recruit_allocator.validate(&self.map)?;
        let index = self.biology.by_name(species)?.index();
        self.processes[index] = Some(processes);
        Ok(self)
    }

    pub fn with_reallocator(mut self, reallocator: Box<dyn Reallocator>) -> Self {
        self.reallocator = Some(reallocator);
        self
    }

    pub fn with_fishery(mut self, fishery: Fishery) -> Result<Self> {
        if fishery.every_days == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "every_days".to_string(),
                reason: "fishing interval must be positive".to_string(),
            }
            .into());
        }
        if let Some(cell) = fishery.cells.iter().find(|c| !self.cells.contains_key(c)) {
            return Err(InvariantViolation::UnknownCell(*cell).into());
        }
        self.fishery = Some(fishery);
        Ok(self)
    }

    // === STEPPING ===

    /// One day: diffusion for every species, then reallocation when one is scheduled, then
    /// fishing when due.
    pub fn step_day(&mut self) -> Result<()> {
        for species in self.biology.real_species() {
            if let Some(processes) = &self.processes[species.index()] {
                processes.diffuser.diffuse(species, &mut self.cells, &self.map);
            }
        }

        if let Some(reallocator) = &self.reallocator {
            if reallocator.is_scheduled(self.day) {
                let report =
                    reallocator.reallocate_at_step(self.day, &self.biology, &mut self.cells, &self.map)?;
                self.log_reallocation(&report);
            }
        }

        if let Some(fishery) = self.fishery.take() {
            let result = if self.day % fishery.every_days == 0 {
                fishery
                    .cells
                    .iter()
                    .try_for_each(|cell| self.fish(*cell, &fishery.gear).map(|_| ()))
            } else {
                Ok(())
            };
            self.fishery = Some(fishery);
            result?;
        }

        self.day += 1;
        Ok(())
    }

    /// Recruitment from the stock as it stands, then mortality and aging in every cell, then
    /// the new recruits spread over the abundance cells.
    pub fn step_year(&mut self) -> Result<Vec<YearSummary>> {
        let year = self.day / DAYS_PER_YEAR;
        let mut summaries = Vec::new();

        for species in self.biology.real_species() {
            let Some(processes) = &self.processes[species.index()] else {
                continue;
            };
            let stock_cells: Vec<CellId> = self
                .cells
                .iter()
                .filter(|(cell, local)| {
                    self.map.is_sea(**cell)
                        && local
                            .as_abundance()
                            .is_some_and(|l| l.abundance(species).is_some())
                })
                .map(|(cell, _)| *cell)
                .collect();
            if stock_cells.is_empty() {
                continue;
            }

            let stock = aggregate(&self.cells, &stock_cells, species);
            let spawning_biomass = processes.recruitment.spawning_biomass(species, &stock);
            let recruits = processes.recruitment.recruit(species, &stock);

            for cell in &stock_cells {
                if let Some(local) = self.cells.get_mut(cell).and_then(LocalBiology::as_abundance_mut) {
                    processes.mortality.apply_locally(local, species);
                    processes.aging.age_locally(local, species);
                }
            }

            let shares = processes.recruit_allocator.shares(&stock_cells, &self.map)?;
            for (cell, share) in shares {
                if let Some(abundance) = self
                    .cells
                    .get_mut(&cell)
                    .and_then(LocalBiology::as_abundance_mut)
                    .and_then(|local| local.abundance_mut(species))
                {
                    inject_recruits(abundance, recruits * share, processes.female_ratio);
                }
            }

            let stock = aggregate(&self.cells, &stock_cells, species);
            let summary = YearSummary {
                species: species.name().to_string(),
                spawning_biomass,
                recruits,
                biomass: total_biomass(&self.cells, species),
                abundance: stock.total(),
                spr: processes.spr_oracle.as_ref().map(|oracle| oracle.spr(species, &stock)),
            };
            debug!(
                "year {}: {} recruited {:.0}, biomass {:.1} kg",
                year, summary.species, summary.recruits, summary.biomass
            );

            self.events.log(
                self.day,
                summary.species.clone(),
                EventType::Recruitment {
                    spawning_biomass,
                    recruits,
                },
            );
            self.events.log(
                self.day,
                summary.species.clone(),
                EventType::YearlySnapshot {
                    year,
                    biomass: summary.biomass,
                    abundance: summary.abundance,
                    spr: summary.spr,
                },
            );
            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// `DAYS_PER_YEAR` daily steps followed by the yearly step, `years` times.
    pub fn run_years(&mut self, years: u64) -> Result<()> {
        for _ in 0..years {
            for _ in 0..DAYS_PER_YEAR {
                self.step_day()?;
            }
            let summaries = self.step_year()?;
            for summary in &summaries {
                info!(
                    "day {}: {} biomass {:.1} kg, {:.0} recruits",
                    self.day, summary.species, summary.biomass, summary.recruits
                );
            }
        }
        Ok(())
    }

    // === FISHING ===

    /// Removes `caught` from the fish at `cell`. Errors carry the cell and the day.
    pub fn react_to_fishing(&mut self, cell: CellId, caught: &Catch, kept: &Catch) -> Result<()> {
        let day = self.day;
        let local = self
            .cells
            .get_mut(&cell)
            .ok_or(InvariantViolation::UnknownCell(cell))?;
        local
            .react_to_fishing(caught, kept, &self.biology)
            .map_err(|e| e.in_cell(cell, day))?;

        for species in self.biology.real_species() {
            let caught_kg = caught.biomass(species.index());
            if caught_kg > 0.0 {
                self.events.log(
                    day,
                    species.name().to_string(),
                    EventType::FishingRemoval {
                        cell,
                        caught_kg,
                        kept_kg: kept.biomass(species.index()),
                    },
                );
            }
        }
        Ok(())
    }

    /// Fishes `cell` with `gear` and removes the catch. Returns what was caught and kept.
    pub fn fish(&mut self, cell: CellId, gear: &SelectivityGear) -> Result<(Catch, Catch)> {
        let local = match self.cells.get(&cell) {
            Some(LocalBiology::Abundance(local)) => local,
            Some(_) => return Err(InvariantViolation::IncompatibleBiology(cell).into()),
            None => return Err(InvariantViolation::UnknownCell(cell).into()),
        };
        let (caught, kept) = gear
            .fish(local, &self.biology)
            .map_err(|e| e.in_cell(cell, self.day))?;
        self.react_to_fishing(cell, &caught, &kept)?;
        Ok((caught, kept))
    }

    // === QUERIES ===

    pub fn total_biomass(&self, species: &Species) -> f64 {
        total_biomass(&self.cells, species)
    }

    pub fn total_abundance(&self, species: &Species) -> f64 {
        self.cells
            .values()
            .filter_map(LocalBiology::as_abundance)
            .map(|local| local.total_abundance(species))
            .sum()
    }

    pub fn biomass_at(&self, cell: CellId, species: &Species) -> Result<f64> {
        self.cells
            .get(&cell)
            .map(|local| local.biomass(species))
            .ok_or_else(|| InvariantViolation::UnknownCell(cell).into())
    }

    /// Counts summed over every abundance cell.
    pub fn aggregate_abundance(&self, species: &Species) -> StructuredAbundance {
        let cells: Vec<CellId> = self.cells.keys().copied().collect();
        aggregate(&self.cells, &cells, species)
    }

    /// Current biomass of every real species, in species order.
    pub fn biomass_by_species(&self) -> Vec<(String, f64)> {
        self.biology
            .real_species()
            .map(|species| (species.name().to_string(), self.total_biomass(species)))
            .collect()
    }

    pub fn cells(&self) -> &CellMap {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut CellMap {
        &mut self.cells
    }

    pub fn biology(&self) -> &GlobalBiology {
        &self.biology
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn processes(&self, species: &Species) -> Option<&SpeciesProcesses> {
        self.processes.get(species.index()).and_then(Option::as_ref)
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    fn log_reallocation(&mut self, report: &ReallocationReport) {
        for (species, total) in &report.species_totals {
            self.events.log(
                self.day,
                species.clone(),
                EventType::Reallocation {
                    total: *total,
                    dropped_cells: report.dropped_for(species),
                },
            );
        }
    }
}

fn total_biomass(cells: &CellMap, species: &Species) -> f64 {
    cells.values().map(|local| local.biomass(species)).sum()
}

fn aggregate(cells: &CellMap, which: &[CellId], species: &Species) -> StructuredAbundance {
    let mut stock = StructuredAbundance::empty_for(species.meristics());
    for abundance in which
        .iter()
        .filter_map(|cell| cells.get(cell))
        .filter_map(LocalBiology::as_abundance)
        .filter_map(|local| local.abundance(species))
    {
        stock.add(abundance);
    }
    stock
}
