use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use reactorsim_config::ReactorsimConfig;
use reactorsim_core::catalog::{ComponentKind, ALL_CODES, EMPTY_CODE};
use reactorsim_core::{Dimensions, Layout, Reactor, SimulationResults};
use reactorsim_engine::SimulationRuntime;
use reactorsim_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser, Debug)]
#[command(name = "reactorsim", version, about)]
pub struct Cli {
    /// Configuration file (defaults to config/reactorsim.yaml and REACTORSIM_* variables)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate reactor layouts and print their results
    Simulate(SimulateArgs),
    /// List all component codes
    Components,
    /// Print the grid size for a number of extra chambers
    Dimensions(DimensionsArgs),
    /// Run a few ticks and print the heat of every slot
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Grid files, one row per line
    pub files: Vec<PathBuf>,

    /// Comma separated row-major codes, e.g. "U1,VO,XX,..."
    #[arg(long, value_delimiter = ',')]
    pub codes: Option<Vec<String>>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct DimensionsArgs {
    pub extra_chambers: usize,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub file: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub ticks: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Yaml,
}

#[derive(Serialize)]
struct NamedResults<'a> {
    source: &'a str,
    results: &'a SimulationResults,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ReactorsimConfig::load_from_path(path),
        None => ReactorsimConfig::load(),
    }
    .context("failed to load configuration")?;

    EventLogger::init_with(&config.telemetry.log_level, config.telemetry.json);
    debug!("Loaded configuration: {:?}", config);

    let metrics = Arc::new(MetricsRecorder::new().context("failed to register metrics")?);

    match cli.command {
        Commands::Simulate(args) => simulate(args, config, metrics.clone()).await?,
        Commands::Components => print!("{}", components_table()),
        Commands::Dimensions(args) => {
            let dims = Dimensions::for_chambers(args.extra_chambers)?;
            println!("width: {}\nheight: {}", dims.width, dims.height);
        }
        Commands::Inspect(args) => inspect(args)?,
    }

    if cli.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

async fn simulate(
    args: SimulateArgs,
    config: ReactorsimConfig,
    metrics: Arc<MetricsRecorder>,
) -> anyhow::Result<()> {
    let mut sources = Vec::new();
    let mut layouts = Vec::new();

    if let Some(codes) = &args.codes {
        let codes: Vec<&str> = codes.iter().map(|c| c.trim()).collect();
        layouts.push(Layout::from_codes(&codes)?);
        sources.push("--codes".to_string());
    }
    for file in &args.files {
        let layout = Layout::from_file(file)
            .with_context(|| format!("failed to read layout {}", file.display()))?;
        layouts.push(layout);
        sources.push(file.display().to_string());
    }
    if layouts.is_empty() {
        bail!("nothing to simulate: pass grid files or --codes");
    }

    info!(layouts = layouts.len(), "Simulating");
    let runtime = SimulationRuntime::new(config, metrics);
    let outcomes = runtime.run_batch(layouts).await;

    for (source, outcome) in sources.iter().zip(outcomes) {
        let results = outcome.with_context(|| format!("simulation of {source} failed"))?;
        match args.format {
            OutputFormat::Text => print!("{}", format_results(source, &results)),
            OutputFormat::Yaml => {
                let doc = NamedResults {
                    source,
                    results: &results,
                };
                print!("---\n{}", serde_yaml::to_string(&doc)?);
            }
        }
    }
    Ok(())
}

fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let layout = Layout::from_file(&args.file)
        .with_context(|| format!("failed to read layout {}", args.file.display()))?;
    let mut reactor = Reactor::new(&layout);
    for _ in 0..args.ticks {
        reactor.step();
    }

    let state = reactor.committed_state();
    println!(
        "tick {} | core heat {}/{} | EU {}{}{}",
        state.tick,
        state.reactor_heat,
        reactor.max_heat(),
        state.eu_generated,
        if state.meltdown { " | MELTDOWN" } else { "" },
        if state.component_failed {
            " | component failed"
        } else {
            ""
        },
    );
    print!("{}", reactor.render_heat_map());
    Ok(())
}

fn components_table() -> String {
    let mut out = format!("{EMPTY_CODE}  (empty slot)\n");
    for kind in ComponentKind::ALL {
        out.push_str(&format!("{}  {}\n", kind.code(), kind.name()));
    }
    debug_assert_eq!(out.lines().count(), ALL_CODES.len());
    out
}

fn optional(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn format_results(source: &str, r: &SimulationResults) -> String {
    let mark = if r.mark == 0 {
        "none (no fuel)".to_string()
    } else {
        r.mark.to_string()
    };
    let mut out = format!("{source}\n");
    out.push_str(&format!("  mark:                 {mark}\n"));
    out.push_str(&format!("  EU per tick:          {}\n", r.eu_per_tick));
    out.push_str(&format!("  overall EU per tick:  {}\n", r.overall_eu_per_tick));
    out.push_str(&format!("  efficiency:           {:.2}\n", r.efficiency));
    out.push_str(&format!("  EU per cycle:         {}\n", r.total_eu_per_cycle));
    out.push_str(&format!("  cycle ticks:          {}\n", optional(r.cycle_ticks)));
    out.push_str(&format!("  cooldown ticks:       {}\n", r.cooldown_ticks));
    out.push_str(&format!(
        "  cycles before failure: {}\n",
        optional(r.num_iterations_before_failure)
    ));
    out.push_str(&format!(
        "  ticks until meltdown: {}\n",
        optional(r.ticks_until_meltdown)
    ));
    out.push_str(&format!(
        "  ticks until failure:  {}\n",
        optional(r.ticks_until_component_failure)
    ));
    out.push_str(&format!("  timed out:            {}\n", r.timed_out));
    out.push_str(&format!("  single use coolant:   {}\n", r.uses_single_use_coolant));
    out.push_str(&format!("  total cost:           {}\n", r.total_cost));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "reactorsim",
            "--metrics",
            "simulate",
            "a.grid",
            "b.grid",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert!(cli.metrics);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.format, OutputFormat::Yaml);
                assert!(args.codes.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_codes_list() {
        let cli = Cli::try_parse_from(["reactorsim", "simulate", "--codes", "U1,VO,XX"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.codes.unwrap(), vec!["U1", "VO", "XX"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_components_table_lists_every_code() {
        let table = components_table();
        assert_eq!(table.lines().count(), 23);
        assert!(table.starts_with("XX"));
        assert!(table.contains("U4  "));
    }

    #[test]
    fn test_format_results() {
        let results = SimulationResults {
            mark: 2,
            num_iterations_before_failure: Some(7),
            ..Default::default()
        };
        let text = format_results("demo.grid", &results);
        assert!(text.starts_with("demo.grid\n"));
        assert!(text.contains("mark:                 2"));
        assert!(text.contains("cycles before failure: 7"));
        assert!(text.contains("cycle ticks:          -"));
    }
}
