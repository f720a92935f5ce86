use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::abundance::{StructuredAbundance, weigh};
use crate::aging::create_aging_process;
use crate::allocator::Allocator;
use crate::diffusion::create_diffuser;
use crate::error::{BiologyError, ConfigError, Result};
use crate::initializer::{
    SpeciesCodes, SprOracle, VIRGIN_SPIN_UP_YEARS, VirginStateSimulator, allocate_abundance,
    initial_abundance_from_list,
};
use crate::local_biology::{BiomassLocalBiology, CellMap, LocalBiology};
use crate::meristics::{
    BertalanffyInput, EquallySpacedBertalanffyMeristics, FromListMeristics, Meristics, MeristicsInput,
    StockAssessmentMeristics,
};
use crate::model::{BiologyModel, Fishery, SpeciesProcesses};
use crate::mortality::create_mortality_process;
use crate::parameters::DoubleParameter;
use crate::reallocator::{
    AbundanceReallocator, AgeGroup, AllocationGrid, AllocationGrids, BiomassReallocator, Reallocator,
};
use crate::recruitment::create_recruitment_process;
use crate::selectivity::create_gear;
use crate::spatial::{CellId, DoubleGrid, GridMap, Neighborhood};
use crate::species::{GlobalBiology, Species};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub map: MapConfig,
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub cells: CellKind,
    #[serde(default)]
    pub reallocation: Option<ReallocationConfig>,
    #[serde(default)]
    pub fishing: Option<FishingConfig>,
    /// Data-file code to species name.
    #[serde(default)]
    pub species_codes: BTreeMap<String, String>,
    pub years: u64,
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub land: Vec<CellId>,
}

impl MapConfig {
    pub fn to_grid_map(&self) -> GridMap {
        GridMap::new(self.width, self.height).with_land(&self.land)
    }
}

/// Which kind of local biology sits on the sea cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Abundance,
    Biomass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub name: String,
    #[serde(default)]
    pub imaginary: bool,
    pub meristics: MeristicsConfig,
    #[serde(default)]
    pub aging: AgingConfig,
    #[serde(default)]
    pub mortality: MortalityConfig,
    pub recruitment: RecruitmentConfig,
    #[serde(default)]
    pub diffusion: DiffusionConfig,
    pub initial_abundance: InitialAbundanceConfig,
    /// Spreads both the initial abundance and every year's recruits over the sea.
    #[serde(default)]
    pub allocator: Allocator,
    #[serde(default = "default_female_ratio")]
    pub female_ratio: DoubleParameter,
    /// Length above which fish count towards the spawning potential ratio.
    #[serde(default)]
    pub spr_maturity_length: Option<f64>,
}

fn default_female_ratio() -> DoubleParameter {
    DoubleParameter::Fixed(0.5)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MeristicsConfig {
    StockAssessment(MeristicsInput),
    FromList {
        weights: Vec<f64>,
        lengths: Vec<f64>,
        subdivisions: usize,
        #[serde(default)]
        natural_mortality: Option<f64>,
    },
    /// Size-structured bins of equal length.
    Bertalanffy(BertalanffyInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgingConfig {
    Standard { preserve_last_age: bool },
    /// Length-bin graduation on the meristics' growth curve.
    Boxcar,
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self::Standard {
            preserve_last_age: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MortalityConfig {
    Exponential { yearly_rates: Vec<f64>, rounding: bool },
    Meristics { rounding: bool },
}

impl Default for MortalityConfig {
    fn default() -> Self {
        Self::Meristics { rounding: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecruitmentConfig {
    Fixed {
        recruits: f64,
    },
    /// Beverton-Holt on the meristics' stock-recruitment parameters. With `length_at_maturity`
    /// every female at least that long spawns, otherwise the maturity curve is used.
    SpawningBiomass {
        #[serde(default)]
        length_at_maturity: Option<f64>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiffusionConfig {
    #[default]
    None,
    ConstantRate {
        rate: f64,
        min_bin: usize,
        max_bin: usize,
        #[serde(default = "default_radius")]
        radius: usize,
    },
}

fn default_radius() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InitialAbundanceConfig {
    Empty,
    /// Fish per bin for the whole sea, the same for every subdivision.
    FromList { fish_per_bin: Vec<f64> },
    /// The unfished equilibrium under the species' own recruitment, built over `years`.
    Virgin { years: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterConfig {
    Logistic {
        a: f64,
        b: f64,
    },
    Retention {
        inflection: f64,
        slope: f64,
        asymptote: f64,
    },
    Fixed {
        values: Vec<Vec<f64>>,
    },
    DoubleNormal {
        peak: f64,
        top: f64,
        asc_width: f64,
        dsc_width: f64,
        #[serde(default)]
        initial_scaling: Option<f64>,
        #[serde(default)]
        final_scaling: Option<f64>,
        bin_min: f64,
        bin_max: f64,
        bin_width: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearConfig {
    pub filters: Vec<FilterConfig>,
    pub encounter_rate: f64,
    #[serde(default)]
    pub retention: Option<FilterConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishingConfig {
    pub gear: GearConfig,
    pub cells: Vec<CellId>,
    pub every_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReallocationMode {
    Biomass,
    Abundance { first_mature_bin: BTreeMap<String, usize> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub species: String,
    /// Only read in abundance mode.
    #[serde(default)]
    pub group: Option<AgeGroup>,
    /// `rows[y][x]`, matching the map.
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGrids {
    pub step: u64,
    pub grids: Vec<GridConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationConfig {
    pub mode: ReallocationMode,
    pub period: u64,
    pub schedule: Vec<ScheduledGrids>,
}

impl Scenario {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            map: MapConfig {
                width: 1,
                height: 1,
                land: Vec::new(),
            },
            species: Vec::new(),
            cells: CellKind::Abundance,
            reallocation: None,
            fishing: None,
            species_codes: BTreeMap::new(),
            years: 10,
            random_seed: None,
        }
    }

    pub fn add_species(&mut self, config: SpeciesConfig) {
        self.species.push(config);
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| BiologyError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| BiologyError::Io {
            path: path.to_string(),
            source,
        })
    }

    /// Reads JSON, or YAML when the extension is `yaml` or `yml`.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| BiologyError::Io {
            path: path.to_string(),
            source,
        })?;
        let is_yaml = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let parsed = if is_yaml {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| BiologyError::Parse {
            path: path.to_string(),
            message,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(invalid("map must have at least one cell"));
        }
        if self.map.to_grid_map().sea_cells().is_empty() {
            return Err(invalid("map has no sea cells"));
        }
        if self.species.iter().all(|s| s.imaginary) {
            return Err(invalid("scenario must have at least one real species"));
        }

        for species in &self.species {
            species.female_ratio.validate("female_ratio")?;
            let (low, high) = match species.female_ratio {
                DoubleParameter::Fixed(ratio) => (ratio, ratio),
                DoubleParameter::Uniform { min, max } => (min, max),
            };
            if let Some(ratio) = [low, high].into_iter().find(|r| !(0.0..=1.0).contains(r)) {
                return Err(ConfigError::InvalidSexRatio(ratio).into());
            }
        }

        if let Some(fishing) = &self.fishing {
            if fishing.every_days == 0 {
                return Err(invalid("fishing interval must be positive"));
            }
            let map = self.map.to_grid_map();
            if let Some(cell) = fishing.cells.iter().find(|c| !map.is_sea(**c)) {
                return Err(invalid(&format!("fishing cell {} is not at sea", cell)));
            }
        }

        if let Some(reallocation) = &self.reallocation {
            for grids in &reallocation.schedule {
                for grid in &grids.grids {
                    if !self.species.iter().any(|s| s.name == grid.species) {
                        return Err(ConfigError::UnknownSpecies(grid.species.clone()).into());
                    }
                }
            }
        }

        Ok(())
    }

    pub fn species_codes(&self) -> Result<SpeciesCodes> {
        SpeciesCodes::new(self.species_codes.iter().map(|(code, name)| (code.clone(), name.clone())))
    }

    /// Builds the model, drawing every random parameter from one generator seeded with
    /// `random_seed`.
    pub fn build(&self) -> Result<BiologyModel> {
        self.validate()?;
        let mut rng = match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let map = self.map.to_grid_map();
        let species: Vec<Species> = self
            .species
            .iter()
            .map(SpeciesConfig::build_species)
            .collect::<Result<_>>()?;
        let biology = GlobalBiology::new(species)?;
        let codes = self.species_codes()?;
        for name in self.species_codes.values() {
            biology.by_name(name)?;
        }

        let mut cells = abundance_cells(&biology, &map, self.cells);
        let mut processes = Vec::new();
        for config in &self.species {
            let species = biology.by_name(&config.name)?;
            if species.is_imaginary() {
                continue;
            }
            let female_ratio = config.female_ratio.apply(&mut rng);
            let species_processes = config.build_processes(species, female_ratio)?;

            let total = config.initial_stock(species, &species_processes)?;
            let shares = config.allocator.shares(&map.sea_cells(), &map)?;
            for (cell, abundance) in allocate_abundance(&total, &shares) {
                match cells.get_mut(&cell) {
                    Some(LocalBiology::Abundance(local)) => local.set_abundance(species, abundance)?,
                    Some(LocalBiology::Biomass(local)) => {
                        local.set_biomass(species, weigh(&abundance, species.meristics()))
                    }
                    _ => {}
                }
            }
            debug!(
                "{}: {:.0} fish over {} cells, female ratio {:.3}",
                species.name(),
                total.total(),
                shares.len(),
                female_ratio
            );
            processes.push((config.name.clone(), species_processes));
        }

        let mut model = BiologyModel::new(biology, map, cells)?;
        for (name, species_processes) in processes {
            model = model.with_processes(&name, species_processes)?;
        }
        if let Some(reallocation) = &self.reallocation {
            let reallocator = reallocation.build(model.map())?;
            model = model.with_reallocator(reallocator);
        }
        if let Some(fishing) = &self.fishing {
            model = model.with_fishery(Fishery {
                gear: create_gear(&fishing.gear)?,
                cells: fishing.cells.clone(),
                every_days: fishing.every_days,
            })?;
        }

        info!(
            "built scenario {}: {} species ({} coded) on a {}x{} map",
            self.name,
            model.biology().len(),
            codes.len(),
            self.map.width,
            self.map.height
        );
        Ok(model)
    }
}

fn invalid(reason: &str) -> BiologyError {
    ConfigError::InvalidScenario(reason.to_string()).into()
}

fn abundance_cells(biology: &GlobalBiology, map: &GridMap, kind: CellKind) -> CellMap {
    let mut cells = crate::model::abundance_cells(biology, map);
    if kind == CellKind::Biomass {
        for local in cells.values_mut() {
            if matches!(local, LocalBiology::Abundance(_)) {
                *local = LocalBiology::Biomass(BiomassLocalBiology::empty(biology));
            }
        }
    }
    cells
}

impl SpeciesConfig {
    pub fn build_meristics(&self) -> Result<Arc<dyn Meristics>> {
        Ok(match &self.meristics {
            MeristicsConfig::StockAssessment(input) => {
                Arc::new(StockAssessmentMeristics::new(input.clone())?)
            }
            MeristicsConfig::FromList {
                weights,
                lengths,
                subdivisions,
                natural_mortality,
            } => {
                let meristics = FromListMeristics::new(weights.clone(), lengths.clone(), *subdivisions)?;
                match natural_mortality {
                    Some(m) => Arc::new(meristics.with_natural_mortality(*m)),
                    None => Arc::new(meristics),
                }
            }
            MeristicsConfig::Bertalanffy(input) => {
                Arc::new(EquallySpacedBertalanffyMeristics::new(input.clone())?)
            }
        })
    }

    fn build_species(&self) -> Result<Species> {
        let meristics = self.build_meristics()?;
        Ok(if self.imaginary {
            Species::imaginary(self.name.clone(), meristics)
        } else {
            Species::new(self.name.clone(), meristics)
        })
    }

    pub fn build_processes(&self, species: &Species, female_ratio: f64) -> Result<SpeciesProcesses> {
        let aging = create_aging_process(&self.aging, species)?;
        let mortality = create_mortality_process(&self.mortality, species)?;
        let recruitment = create_recruitment_process(&self.recruitment, species)?;
        let diffuser = create_diffuser(&self.diffusion)?;

        let mut processes = SpeciesProcesses {
            aging,
            mortality,
            recruitment,
            diffuser,
            recruit_allocator: self.allocator.clone(),
            female_ratio,
            spr_oracle: None,
        };
        if let Some(length) = self.spr_maturity_length {
            let virgin = self.virgin_stock(species, &processes, VIRGIN_SPIN_UP_YEARS)?;
            processes.spr_oracle = Some(SprOracle::from_virgin_stock(species, length, &virgin)?);
        }
        Ok(processes)
    }

    pub fn virgin_stock(&self, species: &Species, processes: &SpeciesProcesses, years: usize) -> Result<StructuredAbundance> {
        let simulator = VirginStateSimulator::new(
            processes.aging.as_ref(),
            processes.mortality.as_ref(),
            processes.female_ratio,
        )?;
        Ok(simulator.equilibrium(species, processes.recruitment.as_ref(), years))
    }

    fn initial_stock(&self, species: &Species, processes: &SpeciesProcesses) -> Result<StructuredAbundance> {
        match &self.initial_abundance {
            InitialAbundanceConfig::Empty => Ok(StructuredAbundance::empty_for(species.meristics())),
            InitialAbundanceConfig::FromList { fish_per_bin } => {
                initial_abundance_from_list(species, fish_per_bin)
            }
            InitialAbundanceConfig::Virgin { years } => self.virgin_stock(species, processes, *years),
        }
    }
}

impl ReallocationConfig {
    pub fn build(&self, map: &GridMap) -> Result<Box<dyn Reallocator>> {
        let to_grid = |grid: &GridConfig, key: &str| -> Result<AllocationGrid> {
            AllocationGrid::new(key, &DoubleGrid::from_rows(&grid.rows)?, map)
        };

        match &self.mode {
            ReallocationMode::Biomass => {
                let mut schedule = BTreeMap::new();
                for entry in &self.schedule {
                    let mut grids = BTreeMap::new();
                    for grid in &entry.grids {
                        grids.insert(grid.species.clone(), to_grid(grid, &grid.species)?);
                    }
                    schedule.insert(entry.step, grids);
                }
                Ok(Box::new(BiomassReallocator::new(AllocationGrids::new(schedule, self.period)?)))
            }
            ReallocationMode::Abundance { first_mature_bin } => {
                let mut schedule = BTreeMap::new();
                for entry in &self.schedule {
                    let mut grids = BTreeMap::new();
                    for grid in &entry.grids {
                        // a grid without a group moves both groups alike
                        let groups = match grid.group {
                            Some(group) => vec![group],
                            None => vec![AgeGroup::Juvenile, AgeGroup::Mature],
                        };
                        for group in groups {
                            let key = format!("{} ({})", grid.species, group);
                            grids.insert((grid.species.clone(), group), to_grid(grid, &key)?);
                        }
                    }
                    schedule.insert(entry.step, grids);
                }
                Ok(Box::new(AbundanceReallocator::new(
                    AllocationGrids::new(schedule, self.period)?,
                    first_mature_bin.clone(),
                )?))
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.name)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "\nParameters:")?;
        writeln!(
            f,
            "  Map: {}x{} ({} land cells)",
            self.map.width,
            self.map.height,
            self.map.land.len()
        )?;
        writeln!(f, "  Cells: {:?}", self.cells)?;
        writeln!(f, "  Years to simulate: {}", self.years)?;
        if let Some(seed) = self.random_seed {
            writeln!(f, "  Random seed: {}", seed)?;
        }
        if let Some(reallocation) = &self.reallocation {
            writeln!(
                f,
                "  Reallocation: {} grid sets every {} days",
                reallocation.schedule.len(),
                reallocation.period
            )?;
        }
        if let Some(fishing) = &self.fishing {
            writeln!(
                f,
                "  Fishing: {} cells every {} days",
                fishing.cells.len(),
                fishing.every_days
            )?;
        }

        writeln!(f, "\nSpecies:")?;
        for species in &self.species {
            writeln!(f, "\n  Species: {}", species.name)?;
            if species.imaginary {
                writeln!(f, "    Imaginary")?;
                continue;
            }
            let meristics = match &species.meristics {
                MeristicsConfig::StockAssessment(input) => {
                    format!("stock assessment, max age {}", input.max_age)
                }
                MeristicsConfig::FromList { weights, .. } => format!("from list, {} bins", weights.len()),
                MeristicsConfig::Bertalanffy(input) => format!(
                    "equally spaced, {} bins of {} cm",
                    input.number_of_bins, input.cm_per_bin
                ),
            };
            writeln!(f, "    Meristics: {}", meristics)?;
            writeln!(f, "    Recruitment: {:?}", species.recruitment)?;
            writeln!(f, "    Mortality: {:?}", species.mortality)?;
            writeln!(f, "    Diffusion: {:?}", species.diffusion)?;
            writeln!(f, "    Initial abundance: {:?}", species.initial_abundance)?;
            writeln!(f, "    Female ratio: {}", species.female_ratio)?;
        }

        Ok(())
    }
}

fn sablefish(initial_abundance: InitialAbundanceConfig) -> SpeciesConfig {
    SpeciesConfig {
        name: "Sablefish".to_string(),
        imaginary: false,
        meristics: MeristicsConfig::StockAssessment(MeristicsInput::sablefish()),
        aging: AgingConfig::Standard {
            preserve_last_age: true,
        },
        mortality: MortalityConfig::Meristics { rounding: false },
        recruitment: RecruitmentConfig::SpawningBiomass {
            length_at_maturity: None,
        },
        diffusion: DiffusionConfig::None,
        initial_abundance,
        allocator: Allocator::Uniform,
        female_ratio: DoubleParameter::Fixed(0.5),
        spr_maturity_length: Some(45.0),
    }
}

fn red_fish() -> SpeciesConfig {
    SpeciesConfig {
        name: "Red Fish".to_string(),
        imaginary: false,
        meristics: MeristicsConfig::Bertalanffy(BertalanffyInput::red_fish()),
        aging: AgingConfig::Boxcar,
        mortality: MortalityConfig::Meristics { rounding: false },
        recruitment: RecruitmentConfig::SpawningBiomass {
            length_at_maturity: Some(50.0),
        },
        diffusion: DiffusionConfig::None,
        initial_abundance: InitialAbundanceConfig::Virgin {
            years: VIRGIN_SPIN_UP_YEARS,
        },
        allocator: Allocator::Uniform,
        female_ratio: DoubleParameter::Fixed(0.5),
        spr_maturity_length: Some(50.0),
    }
}

fn constant_recruitment(name: &str, fish_per_bin: Vec<f64>) -> SpeciesConfig {
    let bins = fish_per_bin.len();
    SpeciesConfig {
        name: name.to_string(),
        imaginary: false,
        meristics: MeristicsConfig::FromList {
            weights: (1..=bins).map(|b| b as f64 * 0.5).collect(),
            lengths: (1..=bins).map(|b| b as f64 * 10.0).collect(),
            subdivisions: 2,
            natural_mortality: Some(0.2),
        },
        aging: AgingConfig::Standard {
            preserve_last_age: false,
        },
        mortality: MortalityConfig::Meristics { rounding: false },
        recruitment: RecruitmentConfig::Fixed { recruits: 1000.0 },
        diffusion: DiffusionConfig::ConstantRate {
            rate: 0.01,
            min_bin: 0,
            max_bin: bins - 1,
            radius: 1,
        },
        initial_abundance: InitialAbundanceConfig::FromList { fish_per_bin },
        allocator: Allocator::Uniform,
        female_ratio: DoubleParameter::Fixed(0.5),
        spr_maturity_length: None,
    }
}

pub fn create_standard_scenarios() -> HashMap<String, Scenario> {
    let mut scenarios = HashMap::new();

    let mut virgin = Scenario::new("sablefish_virgin".to_string());
    virgin.description = "Unfished sablefish at its virgin equilibrium".to_string();
    virgin.map = MapConfig {
        width: 4,
        height: 4,
        land: vec![CellId::new(3, 3)],
    };
    virgin.years = 20;
    virgin.random_seed = Some(0);
    virgin.add_species(sablefish(InitialAbundanceConfig::Virgin {
        years: VIRGIN_SPIN_UP_YEARS,
    }));
    scenarios.insert("virgin".to_string(), virgin);

    let mut fished = Scenario::new("sablefish_fished".to_string());
    fished.description = "Sablefish fished with a logistic trawl on the western cells".to_string();
    fished.map = MapConfig {
        width: 4,
        height: 4,
        land: Vec::new(),
    };
    fished.years = 20;
    fished.random_seed = Some(0);
    fished.add_species(sablefish(InitialAbundanceConfig::Virgin {
        years: VIRGIN_SPIN_UP_YEARS,
    }));
    fished.fishing = Some(FishingConfig {
        gear: GearConfig {
            filters: vec![FilterConfig::Logistic { a: 50.0, b: 10.0 }],
            encounter_rate: 0.002,
            retention: Some(FilterConfig::Retention {
                inflection: 45.0,
                slope: 2.0,
                asymptote: 1.0,
            }),
        },
        cells: vec![CellId::new(0, 0), CellId::new(0, 1), CellId::new(0, 2), CellId::new(0, 3)],
        every_days: 7,
    });
    scenarios.insert("fished".to_string(), fished);

    let mut diffusing = Scenario::new("coastal_diffusion".to_string());
    diffusing.description = "Two constant-recruitment species drifting across a coast".to_string();
    diffusing.map = MapConfig {
        width: 5,
        height: 3,
        land: vec![CellId::new(4, 0), CellId::new(4, 1), CellId::new(4, 2)],
    };
    diffusing.years = 10;
    diffusing.random_seed = Some(7);
    let mut cod = constant_recruitment("Cod", vec![5000.0, 3000.0, 2000.0, 1000.0, 500.0]);
    cod.allocator = Allocator::LeftToRight {
        exponent: 2.0,
        min_ratio: 0.1,
    };
    let mut haddock = constant_recruitment("Haddock", vec![2000.0, 2000.0, 1000.0]);
    haddock.female_ratio = DoubleParameter::Uniform { min: 0.4, max: 0.6 };
    diffusing.add_species(cod);
    diffusing.add_species(haddock);
    diffusing.species_codes = BTreeMap::from([
        ("COD".to_string(), "Cod".to_string()),
        ("HAD".to_string(), "Haddock".to_string()),
    ]);
    scenarios.insert("diffusion".to_string(), diffusing);

    let mut seasonal = Scenario::new("seasonal_reallocation".to_string());
    seasonal.description = "Biomass moved between two grids each season".to_string();
    seasonal.map = MapConfig {
        width: 2,
        height: 2,
        land: Vec::new(),
    };
    seasonal.cells = CellKind::Biomass;
    seasonal.years = 2;
    seasonal.random_seed = Some(1);
    seasonal.add_species(constant_recruitment("Hake", vec![1000.0, 500.0]));
    seasonal.reallocation = Some(ReallocationConfig {
        mode: ReallocationMode::Biomass,
        period: 365,
        schedule: vec![
            ScheduledGrids {
                step: 0,
                grids: vec![GridConfig {
                    species: "Hake".to_string(),
                    group: None,
                    rows: vec![vec![1.0, 0.0], vec![0.0, 0.0]],
                }],
            },
            ScheduledGrids {
                step: 182,
                grids: vec![GridConfig {
                    species: "Hake".to_string(),
                    group: None,
                    rows: vec![vec![0.0, 0.0], vec![1.0, 3.0]],
                }],
            },
        ],
    });
    scenarios.insert("seasonal".to_string(), seasonal);

    let mut boxcar = Scenario::new("red_fish_boxcar".to_string());
    boxcar.description = "Size-structured red fish growing through 5 cm length bins".to_string();
    boxcar.map = MapConfig {
        width: 3,
        height: 3,
        land: Vec::new(),
    };
    boxcar.years = 20;
    boxcar.random_seed = Some(2);
    boxcar.add_species(red_fish());
    scenarios.insert("boxcar".to_string(), boxcar);

    scenarios
}
