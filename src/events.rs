use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BiologyError, Result};
use crate::spatial::CellId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    /// Model day the event happened on.
    pub tick: u64,
    pub species: String,
    pub event_type: EventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    Recruitment {
        spawning_biomass: Option<f64>,
        recruits: f64,
    },
    YearlySnapshot {
        year: u64,
        biomass: f64,
        abundance: f64,
        spr: Option<f64>,
    },
    Reallocation {
        total: f64,
        dropped_cells: usize,
    },
    FishingRemoval {
        cell: CellId,
        caught_kg: f64,
        kept_kg: f64,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.tick, self.species)?;

        match &self.event_type {
            EventType::Recruitment {
                spawning_biomass,
                recruits,
            } => match spawning_biomass {
                Some(ssb) => write!(f, "{:.0} recruits from {:.1} kg spawning biomass", recruits, ssb),
                None => write!(f, "{:.0} recruits", recruits),
            },
            EventType::YearlySnapshot {
                year,
                biomass,
                abundance,
                spr,
            } => {
                write!(
                    f,
                    "Year {} - Biomass:{:.1} kg Abundance:{:.0}",
                    year, biomass, abundance
                )?;
                if let Some(spr) = spr {
                    write!(f, " SPR:{:.3}", spr)?;
                }
                Ok(())
            }
            EventType::Reallocation {
                total,
                dropped_cells,
            } => {
                write!(
                    f,
                    "Reallocated {:.1} ({} shares dropped)",
                    total, dropped_cells
                )
            }
            EventType::FishingRemoval {
                cell,
                caught_kg,
                kept_kg,
            } => {
                write!(
                    f,
                    "Removed {:.1} kg at {} ({:.1} kg kept)",
                    caught_kg, cell, kept_kg
                )
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventLogger {
    events: Vec<Event>,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, tick: u64, species: String, event_type: EventType) {
        self.events.push(Event {
            timestamp: Utc::now(),
            tick,
            species,
            event_type,
        });
    }

    pub fn get_events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_for<'a>(&'a self, species: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |event| event.species == species)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.events).map_err(|e| BiologyError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| BiologyError::Io {
            path: path.to_string(),
            source,
        })
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| BiologyError::Io {
            path: path.to_string(),
            source,
        })?;
        let events: Vec<Event> = serde_json::from_str(&json).map_err(|e| BiologyError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { events })
    }
}
