//! Command-line interface for the fishery biology simulation.

use fishery_biology::scenario::{CellKind, DiffusionConfig, Scenario};
use lexopt::prelude::*;
use std::path::PathBuf;

/// Command-line arguments for the simulation.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
    pub scenario_name: String,
    pub scenario_file: Option<PathBuf>,
    pub years: Option<u64>,
    pub random_seed: Option<u64>,
    pub debug: bool,
    pub quiet: bool,
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Virgin,
    List,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::Run,
            scenario_name: "virgin".to_string(),
            scenario_file: None,
            years: None,
            random_seed: None,
            debug: false,
            quiet: false,
            output_file: None,
        }
    }
}

pub fn parse_args() -> Result<CliArgs, lexopt::Error> {
    parse_from(lexopt::Parser::from_env())
}

fn parse_from(mut args: lexopt::Parser) -> Result<CliArgs, lexopt::Error> {
    let mut cli_args = CliArgs::default();
    let mut subcommand = None;

    while let Some(arg) = args.next()? {
        match arg {
            Value(val) if subcommand.is_none() => subcommand = Some(val.string()?),
            Long("scenario") => {
                cli_args.scenario_name = args.value()?.string()?;
            }
            Long("scenario-file") => {
                cli_args.scenario_file = Some(PathBuf::from(args.value()?.string()?));
            }
            Long("years") | Short('y') => {
                cli_args.years = Some(args.value()?.parse()?);
            }
            Long("seed") => {
                cli_args.random_seed = Some(args.value()?.parse()?);
            }
            Long("output") | Short('o') => {
                cli_args.output_file = Some(PathBuf::from(args.value()?.string()?));
            }
            Long("debug") => cli_args.debug = true,
            Long("quiet") | Short('q') => cli_args.quiet = true,
            Long("help") | Short('h') => {
                print_help();
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    cli_args.command = match subcommand.as_deref() {
        Some("run") | None => Command::Run,
        Some("virgin") => Command::Virgin,
        Some("list") => Command::List,
        Some(cmd) => return Err(lexopt::Error::from(format!("unknown command: {}", cmd))),
    };

    Ok(cli_args)
}

/// Apply CLI overrides to a scenario.
pub fn apply_overrides(scenario: &mut Scenario, args: &CliArgs) {
    if let Some(years) = args.years {
        scenario.years = years;
    }

    if let Some(seed) = args.random_seed {
        scenario.random_seed = Some(seed);
    }
}

/// Print warnings for settings that are legal but probably not what was meant.
pub fn validate_scenario(scenario: &Scenario) {
    if scenario.years == 0 {
        println!("\n⚠️  WARNING: Scenario runs for 0 years; only the initial state is reported\n");
    }

    for species in &scenario.species {
        if let DiffusionConfig::ConstantRate { rate, radius, .. } = species.diffusion {
            let neighbors = ((2 * radius + 1).pow(2) - 1) as f64;
            if rate * neighbors > 1.0 {
                println!(
                    "⚠️  WARNING: {} diffuses {:.3} to each of up to {} neighbours",
                    species.name, rate, neighbors
                );
                println!("   Busy cells will be capped at an even split of their fish\n");
            }
        }
    }

    if scenario.cells == CellKind::Biomass && scenario.fishing.is_some() {
        println!("⚠️  WARNING: Gears need structured cells; fishing will fail on biomass cells\n");
    }
}

fn print_help() {
    println!("\nFishery Biology Simulation\n");
    println!("USAGE:");
    println!("    fishery-biology-sim [COMMAND] [OPTIONS]\n");

    println!("COMMANDS:");
    println!("    run              Run the simulation (default)");
    println!("    virgin           Print the unfished equilibrium of every species");
    println!("    list             List built-in scenarios\n");

    println!("SIMULATION OPTIONS:");
    println!("    --scenario <NAME>          Use a built-in scenario (default: virgin)");
    println!("    --scenario-file <FILE>     Load scenario from a JSON or YAML file");
    println!("    -y, --years <N>            Number of years to simulate");
    println!("    --seed <N>                 Random seed for reproducible runs\n");

    println!("OUTPUT OPTIONS:");
    println!("    -o, --output <FILE>        Output events to specified file");
    println!("    --debug                    Enable debug logging");
    println!("    -q, --quiet                Only log warnings and errors");
    println!("    -h, --help                 Print help information\n");

    println!("EXAMPLES:");
    println!("    # Fish sablefish for 30 years with a fixed seed");
    println!("    fishery-biology-sim run --scenario fished --years 30 --seed 12345\n");

    println!("    # Run a scenario file and keep the events");
    println!("    fishery-biology-sim run --scenario-file coast.yaml -o events.json");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, lexopt::Error> {
        parse_from(lexopt::Parser::from_args(args.iter().copied()))
    }

    #[test]
    fn test_defaults_to_run() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.command, Command::Run);
        assert_eq!(args.scenario_name, "virgin");
    }

    #[test]
    fn test_run_options() {
        let args = parse(&["run", "--scenario", "fished", "--years", "3", "--seed", "9", "-o", "out.json", "--debug"])
            .unwrap();
        assert_eq!(args.scenario_name, "fished");
        assert_eq!(args.years, Some(3));
        assert_eq!(args.random_seed, Some(9));
        assert_eq!(args.output_file, Some(PathBuf::from("out.json")));
        assert!(args.debug);
    }

    #[test]
    fn test_subcommands_and_errors() {
        assert_eq!(parse(&["virgin"]).unwrap().command, Command::Virgin);
        assert_eq!(parse(&["list"]).unwrap().command, Command::List);
        assert!(parse(&["spawn"]).is_err());
        assert!(parse(&["--years", "many"]).is_err());
        assert!(parse(&["run", "extra"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut scenario = Scenario::new("s".to_string());
        let args = parse(&["--years", "7", "--seed", "1"]).unwrap();
        apply_overrides(&mut scenario, &args);
        assert_eq!(scenario.years, 7);
        assert_eq!(scenario.random_seed, Some(1));
    }
}
