use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};
use vogel_solver::{Snapshot, TransportProblem};

#[derive(Parser)]
#[command(name = "vogel")]
#[command(about = "Initial transportation plans via Vogel's approximation method", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a transportation problem and print the allocation trace
    Solve {
        /// File with the tariff matrix, one supplier row per line
        tariffs: PathBuf,
        /// File with the supply capacities
        supply: PathBuf,
        /// File with the demand requirements
        demand: PathBuf,
        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Print only the final breakdown
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate input files without solving
    Check {
        /// File with the tariff matrix
        tariffs: PathBuf,
        /// File with the supply capacities
        supply: PathBuf,
        /// File with the demand requirements
        demand: PathBuf,
    },
}

#[derive(Error, Debug)]
enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: line {line}: invalid tariff {token:?}", .path.display())]
    BadTariff {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{}: invalid quantity {token:?}", .path.display())]
    BadQuantity { path: PathBuf, token: String },
    #[error("{}: no values found", .path.display())]
    Empty { path: PathBuf },
}

impl LoadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn load_tariffs(path: &Path) -> Result<Vec<Vec<i32>>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::io(path, source))?;
    let mut matrix = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let tariff = token.parse::<i32>().map_err(|_| LoadError::BadTariff {
                path: path.to_path_buf(),
                line: index + 1,
                token: token.to_string(),
            })?;
            row.push(tariff);
        }
        matrix.push(row);
    }
    if matrix.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(matrix)
}

fn load_quantities(path: &Path) -> Result<Vec<Decimal>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::io(path, source))?;
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        let value = token.parse::<Decimal>().map_err(|_| LoadError::BadQuantity {
            path: path.to_path_buf(),
            token: token.to_string(),
        })?;
        values.push(value);
    }
    if values.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(values)
}

fn load_inputs(
    tariffs: &Path,
    supply: &Path,
    demand: &Path,
) -> (Vec<Vec<i32>>, Vec<Decimal>, Vec<Decimal>) {
    let tariffs = match load_tariffs(tariffs) {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Load error: {e}");
            std::process::exit(1);
        }
    };
    let supply = match load_quantities(supply) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("Load error: {e}");
            std::process::exit(1);
        }
    };
    let demand = match load_quantities(demand) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("Load error: {e}");
            std::process::exit(1);
        }
    };
    (tariffs, supply, demand)
}

fn penalty_text(penalty: Option<i32>) -> String {
    match penalty {
        Some(penalty) => penalty.to_string(),
        None => "*".to_string(),
    }
}

/// Lay the snapshot out the way the hand-worked method tableaus do:
/// demand across the top, remaining supply down the side, row penalties in
/// a trailing column and column penalties in a bottom row.
fn snapshot_grid(snapshot: &Snapshot) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(snapshot.rows() + 2);

    let mut header = Vec::with_capacity(snapshot.columns() + 2);
    header.push("res/cons".to_string());
    header.extend(snapshot.demand().iter().map(Decimal::to_string));
    header.push("Diff res".to_string());
    grid.push(header);

    for row in 0..snapshot.rows() {
        let mut line = Vec::with_capacity(snapshot.columns() + 2);
        line.push(snapshot.remaining_supply()[row].to_string());
        for column in 0..snapshot.columns() {
            let cell = snapshot.cell(row, column);
            let suffix = if cell.is_closed() { " (closed)" } else { "" };
            line.push(format!("{cell}{suffix}"));
        }
        line.push(penalty_text(snapshot.row_penalty(row)));
        grid.push(line);
    }

    let mut footer = Vec::with_capacity(snapshot.columns() + 2);
    footer.push("Diff cons".to_string());
    footer.extend((0..snapshot.columns()).map(|column| penalty_text(snapshot.column_penalty(column))));
    footer.push(String::new());
    grid.push(footer);

    grid
}

fn render_table(grid: &[Vec<String>]) -> String {
    let columns = grid[0].len();
    let mut widths = vec![0usize; columns];
    for line in grid {
        for (index, text) in line.iter().enumerate() {
            widths[index] = widths[index].max(text.chars().count());
        }
    }

    let mut border = String::from("+");
    for width in &widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    for line in grid {
        out.push('|');
        for (index, text) in line.iter().enumerate() {
            out.push_str(&format!(" {:<width$} |", text, width = widths[index]));
        }
        out.push('\n');
        out.push_str(&border);
        out.push('\n');
    }
    out
}

fn render_breakdown(last: &Snapshot) -> String {
    let terms: Vec<String> = last
        .allocation_terms()
        .iter()
        .map(|(tariff, quantity)| format!("({tariff} * {quantity})"))
        .collect();
    format!("Total: {} = {}", terms.join(" + "), last.total_cost())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            tariffs,
            supply,
            demand,
            format,
            quiet,
        } => {
            let (tariffs, supply, demand) = load_inputs(&tariffs, &supply, &demand);
            let problem = match TransportProblem::new(tariffs, supply, demand) {
                Ok(problem) => problem,
                Err(e) => {
                    eprintln!("Invalid problem: {e}");
                    std::process::exit(1);
                }
            };
            tracing::debug!(
                suppliers = problem.rows(),
                consumers = problem.columns(),
                "problem loaded"
            );

            let started = Instant::now();
            let chain: Vec<Snapshot> = problem.snapshots().collect();
            let elapsed = started.elapsed();

            if format == "json" {
                let total_cost = chain.last().map(Snapshot::total_cost);
                let trace = serde_json::json!({
                    "steps": chain,
                    "total_cost": total_cost,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&trace)
                        .unwrap_or_else(|e| format!("serialization error: {e}"))
                );
            } else {
                if !quiet {
                    for snapshot in &chain {
                        println!("Step {}", snapshot.step_number());
                        print!("{}", render_table(&snapshot_grid(snapshot)));
                        println!();
                    }
                }
                if let Some(last) = chain.last() {
                    println!("{}", render_breakdown(last));
                }
                println!("Time {} ms", elapsed.as_millis());
            }
        }
        Commands::Check {
            tariffs,
            supply,
            demand,
        } => {
            let (tariffs, supply, demand) = load_inputs(&tariffs, &supply, &demand);
            match TransportProblem::new(tariffs, supply, demand) {
                Ok(problem) => {
                    let supply_total: Decimal = problem.supply().iter().copied().sum();
                    let demand_total: Decimal = problem.demand().iter().copied().sum();
                    println!("✓ problem is valid");
                    println!("  {} suppliers", problem.rows());
                    println!("  {} consumers", problem.columns());
                    println!("  total supply {supply_total}");
                    println!("  total demand {demand_total}");
                }
                Err(e) => {
                    eprintln!("✗ invalid problem: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
