use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::events::{Event, EventType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMetrics {
    pub species: String,

    pub initial_biomass: f64,
    pub final_biomass: f64,
    pub peak_biomass: f64,
    pub min_biomass: f64,
    /// Final over initial biomass.
    pub depletion: f64,
    /// Standard deviation of the yearly biomass.
    pub biomass_deviation: f64,

    pub final_abundance: f64,
    pub years_recorded: usize,

    pub recruitment_events: usize,
    pub total_recruits: f64,
    pub mean_recruits: f64,

    pub removals: usize,
    pub total_caught_kg: f64,
    pub total_kept_kg: f64,

    pub total_reallocated: f64,
    pub dropped_shares: usize,

    pub final_spr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_days: u64,
    pub species: BTreeMap<String, SpeciesMetrics>,
    pub total_initial_biomass: f64,
    pub total_final_biomass: f64,
    pub aggregate_depletion: f64,
    pub total_caught_kg: f64,
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn calculate_species_metrics(species: &str, events: &[Event], initial_biomass: f64) -> SpeciesMetrics {
        let mut metrics = SpeciesMetrics {
            species: species.to_string(),
            initial_biomass,
            final_biomass: initial_biomass,
            peak_biomass: initial_biomass,
            min_biomass: initial_biomass,
            depletion: 0.0,
            biomass_deviation: 0.0,
            final_abundance: 0.0,
            years_recorded: 0,
            recruitment_events: 0,
            total_recruits: 0.0,
            mean_recruits: 0.0,
            removals: 0,
            total_caught_kg: 0.0,
            total_kept_kg: 0.0,
            total_reallocated: 0.0,
            dropped_shares: 0,
            final_spr: None,
        };

        let mut biomass_history = vec![initial_biomass];

        for event in events.iter().filter(|e| e.species == species) {
            match &event.event_type {
                EventType::Recruitment { recruits, .. } => {
                    metrics.recruitment_events += 1;
                    metrics.total_recruits += recruits;
                }
                EventType::YearlySnapshot {
                    biomass,
                    abundance,
                    spr,
                    ..
                } => {
                    metrics.years_recorded += 1;
                    metrics.final_biomass = *biomass;
                    metrics.final_abundance = *abundance;
                    metrics.peak_biomass = metrics.peak_biomass.max(*biomass);
                    metrics.min_biomass = metrics.min_biomass.min(*biomass);
                    if spr.is_some() {
                        metrics.final_spr = *spr;
                    }
                    biomass_history.push(*biomass);
                }
                EventType::Reallocation {
                    total,
                    dropped_cells,
                } => {
                    metrics.total_reallocated += total;
                    metrics.dropped_shares += dropped_cells;
                }
                EventType::FishingRemoval {
                    caught_kg, kept_kg, ..
                } => {
                    metrics.removals += 1;
                    metrics.total_caught_kg += caught_kg;
                    metrics.total_kept_kg += kept_kg;
                }
            }
        }

        metrics.depletion = if initial_biomass > 0.0 {
            metrics.final_biomass / initial_biomass
        } else {
            0.0
        };

        if metrics.recruitment_events > 0 {
            metrics.mean_recruits = metrics.total_recruits / metrics.recruitment_events as f64;
        }

        let mean = biomass_history.iter().sum::<f64>() / biomass_history.len() as f64;
        let variance = biomass_history
            .iter()
            .map(|b| (b - mean).powi(2))
            .sum::<f64>()
            / biomass_history.len() as f64;
        metrics.biomass_deviation = variance.sqrt();

        metrics
    }

    pub fn calculate_run_metrics(
        events: &[Event],
        initial_biomass: &[(String, f64)], // (species, biomass when the run started)
        total_days: u64,
    ) -> RunMetrics {
        let mut species = BTreeMap::new();
        let mut total_initial_biomass = 0.0;
        let mut total_final_biomass = 0.0;
        let mut total_caught_kg = 0.0;

        for (name, initial) in initial_biomass {
            let metrics = Self::calculate_species_metrics(name, events, *initial);
            total_initial_biomass += initial;
            total_final_biomass += metrics.final_biomass;
            total_caught_kg += metrics.total_caught_kg;
            species.insert(name.clone(), metrics);
        }

        let aggregate_depletion = if total_initial_biomass > 0.0 {
            total_final_biomass / total_initial_biomass
        } else {
            0.0
        };

        RunMetrics {
            total_days,
            species,
            total_initial_biomass,
            total_final_biomass,
            aggregate_depletion,
            total_caught_kg,
        }
    }
}

impl std::fmt::Display for SpeciesMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Species {} Metrics:", self.species)?;
        writeln!(f, "  Depletion: {:.3}", self.depletion)?;
        writeln!(
            f,
            "  - Biomass: {:.1} → {:.1} kg (peak {:.1}, min {:.1}, σ={:.1})",
            self.initial_biomass,
            self.final_biomass,
            self.peak_biomass,
            self.min_biomass,
            self.biomass_deviation
        )?;
        writeln!(
            f,
            "  - Abundance: {:.0} fish after {} years",
            self.final_abundance, self.years_recorded
        )?;
        writeln!(
            f,
            "  - Recruitment: {:.0} mean over {} years",
            self.mean_recruits, self.recruitment_events
        )?;
        writeln!(
            f,
            "  - Fishing: {:.1} kg caught, {:.1} kg kept in {} removals",
            self.total_caught_kg, self.total_kept_kg, self.removals
        )?;
        if self.dropped_shares > 0 {
            writeln!(f, "  - Reallocation dropped {} shares", self.dropped_shares)?;
        }
        if let Some(spr) = self.final_spr {
            writeln!(f, "  - SPR: {:.3}", spr)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run Metrics ({} days):", self.total_days)?;
        writeln!(
            f,
            "  Total Biomass: {:.1} → {:.1} kg",
            self.total_initial_biomass, self.total_final_biomass
        )?;
        writeln!(
            f,
            "  Aggregate Depletion: {:.1}%",
            self.aggregate_depletion * 100.0
        )?;
        writeln!(f, "  Total Caught: {:.1} kg", self.total_caught_kg)?;
        writeln!(f, "\nSpecies Depletion:")?;
        let mut sorted: Vec<_> = self.species.iter().collect();
        sorted.sort_by(|a, b| a.1.depletion.total_cmp(&b.1.depletion));
        for (name, metrics) in sorted {
            writeln!(f, "  {}: {:.3}", name, metrics.depletion)?;
        }
        Ok(())
    }
}
