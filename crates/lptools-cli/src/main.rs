use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use lptools_solver::{check_tolerance, LinearProgram, SolveError, Solver, DEFAULT_TOLERANCE, OBJECTIVE_KEY};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lptools")]
#[command(about = "Solve linear programs with the simplex method", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem statement and print the optimal solution
    Solve {
        /// The JSON statement file
        file: PathBuf,
        /// Maximum number of pivots
        #[arg(long, default_value_t = 10000)]
        max_iterations: usize,
        /// Tolerance below which tableau entries count as zero
        #[arg(long, default_value_t = DEFAULT_TOLERANCE, value_parser = parse_tolerance)]
        tolerance: f64,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Print the canonical (all <=, maximization) form of a statement
    Canonical {
        /// The JSON statement file
        file: PathBuf,
    },
    /// Print the slack (all equalities) form of a statement
    Slack {
        /// The JSON statement file
        file: PathBuf,
    },
    /// Check a statement file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tol: f64 = s.parse().map_err(|e| format!("{}", e))?;
    check_tolerance(tol).map_err(|e| e.to_string())?;
    Ok(tol)
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose > 0 {
        let level = match verbose {
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn load(file: &Path) -> LinearProgram {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match lptools_lang::parse(&source) {
        Ok(lp) => lp,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_statement(lp: &LinearProgram) {
    match lptools_lang::to_statement(lp).to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error writing statement: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_on_model_error(result: Result<(), SolveError>) {
    if let Err(e) = result {
        eprintln!("Model error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            max_iterations,
            tolerance,
            format,
        } => {
            let mut lp = load(&file);

            let solver = Solver::new()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance);

            match solver.solve(&mut lp) {
                Ok(()) => {
                    let solution = match lp.solution_map() {
                        Ok(s) => s,
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            std::process::exit(1);
                        }
                    };

                    match format {
                        Format::Json => match serde_json::to_string_pretty(&solution) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Error writing solution: {}", e);
                                std::process::exit(1);
                            }
                        },
                        Format::Pretty => {
                            println!("Status: OPTIMAL");
                            println!("Objective: {}", solution[OBJECTIVE_KEY]);
                            println!();
                            println!("Variables:");
                            for name in &lp.variable_names {
                                println!("  {:20} {:12.6}", name, solution[name]);
                            }
                        }
                    }
                }
                Err(SolveError::Infeasible) => {
                    println!("Status: INFEASIBLE");
                    println!("The slack basis is not feasible (a constraint has a negative right-hand side).");
                    std::process::exit(1);
                }
                Err(SolveError::Unbounded) => {
                    println!("Status: UNBOUNDED");
                    println!("The problem has no finite optimal solution.");
                    std::process::exit(1);
                }
                Err(e) => {
                    println!("Status: ERROR");
                    println!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Canonical { file } => {
            let mut lp = load(&file);
            exit_on_model_error(lp.to_canonical_form());
            print_statement(&lp);
        }
        Commands::Slack { file } => {
            let mut lp = load(&file);
            exit_on_model_error(lp.to_slack_form());
            print_statement(&lp);
        }
        Commands::Check { file } => {
            let lp = load(&file);
            if let Err(e) = lp.validate() {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }

            println!("✓ {} is valid", file.display());
            println!("  {} variables", lp.num_variables);
            println!("  {} constraints", lp.num_constraints);
        }
    }
}
