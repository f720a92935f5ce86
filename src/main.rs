use fishery_biology::error::{BiologyError, ConfigError, Result};
use fishery_biology::initializer::{VIRGIN_SPIN_UP_YEARS, biomass_per_bin};
use fishery_biology::metrics::MetricsCalculator;
use fishery_biology::model::DAYS_PER_YEAR;
use fishery_biology::scenario::{Scenario, create_standard_scenarios};
use log::{error, info};

mod cli;
use cli::{CliArgs, Command, apply_overrides, parse_args, validate_scenario};

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let level = if args.debug {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let outcome = match args.command {
        Command::Run => run(&args),
        Command::Virgin => virgin(&args),
        Command::List => {
            list();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_scenario(args: &CliArgs) -> Result<Scenario> {
    let mut scenario = match &args.scenario_file {
        Some(path) => {
            info!("Loading scenario from {}", path.display());
            Scenario::load_from_file(&path.to_string_lossy())?
        }
        None => create_standard_scenarios()
            .remove(&args.scenario_name)
            .ok_or_else(|| {
                BiologyError::from(ConfigError::InvalidScenario(format!(
                    "unknown scenario '{}', use `list` to see the built-in ones",
                    args.scenario_name
                )))
            })?,
    };
    apply_overrides(&mut scenario, args);
    Ok(scenario)
}

fn run(args: &CliArgs) -> Result<()> {
    let scenario = load_scenario(args)?;
    validate_scenario(&scenario);
    if !args.quiet {
        println!("{}", scenario);
    }

    let mut model = scenario.build()?;
    let initial = model.biomass_by_species();
    model.run_years(scenario.years)?;

    let metrics = MetricsCalculator::calculate_run_metrics(
        model.events().get_events(),
        &initial,
        scenario.years * DAYS_PER_YEAR,
    );
    println!("{}", metrics);

    if let Some(path) = &args.output_file {
        model.events().save_to_file(&path.to_string_lossy())?;
        info!("Saved {} events to {}", model.events().get_events().len(), path.display());
    }
    Ok(())
}

fn virgin(args: &CliArgs) -> Result<()> {
    let scenario = load_scenario(args)?;
    let model = scenario.build()?;

    for config in &scenario.species {
        let species = model.biology().by_name(&config.name)?;
        let Some(processes) = model.processes(species) else {
            continue;
        };
        let stock = config.virgin_stock(species, processes, VIRGIN_SPIN_UP_YEARS)?;
        let biomass = biomass_per_bin(species, &stock);

        println!("\n=== {} (female ratio {:.3}) ===", species.name(), processes.female_ratio);
        println!("{:>5} {:>14} {:>14} {:>14}", "bin", "male", "female", "biomass kg");
        for (bin, kg) in biomass.iter().enumerate() {
            let female = if stock.subdivisions() > 1 { stock.get(1, bin) } else { 0.0 };
            println!("{:>5} {:>14.2} {:>14.2} {:>14.2}", bin, stock.get(0, bin), female, kg);
        }
        println!("Total: {:.2} fish, {:.2} kg", stock.total(), biomass.iter().sum::<f64>());
        if let Some(oracle) = &processes.spr_oracle {
            println!("Virgin spawning biomass: {:.2} kg", oracle.virgin_spawning_biomass());
        }
    }
    Ok(())
}

fn list() {
    let scenarios = create_standard_scenarios();
    let mut names: Vec<_> = scenarios.keys().collect();
    names.sort();

    println!("Built-in scenarios:");
    for name in names {
        let scenario = &scenarios[name];
        println!("  {:<12} {} ({} years)", name, scenario.description, scenario.years);
    }
}
