use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use parcelsim::{
    engine::{Engine, EngineSettings},
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Parcel economy simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/small_town.yaml")]
    scenario: PathBuf,

    /// Override day count (uses scenario default when omitted)
    #[arg(long)]
    days: Option<u64>,

    /// Override snapshot interval in days
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Stream daily updates over HTTP instead of printing a summary
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let days = scenario.days(cli.days);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_days);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(web::run(WebServerConfig {
            scenario,
            days,
            snapshot_interval,
            snapshot_dir,
            host: cli.host,
            port: cli.port,
        }));
    }

    let mut sim = scenario.build_simulation()?;
    let mut engine = Engine::new(EngineSettings {
        scenario_name: scenario.name.clone(),
        snapshot_interval_days: snapshot_interval,
        snapshot_dir,
        stats_interval_days: scenario.config.stats_interval_days,
    });
    engine.run(&mut sim, days)?;

    println!(
        "Scenario '{}' completed for {} days. Buildings: {}",
        scenario.name,
        days,
        sim.state().building_count()
    );
    if let Some(report) = engine.last_report() {
        for (rank, owner) in report.update.leaderboard().into_iter().enumerate() {
            println!(
                "{:>3}. {:<16} wealth {:>12.2}  civic {:>7.1}  daily net {:>10.2}",
                rank + 1,
                owner.owner,
                owner.wealth,
                owner.civic_score,
                owner.net_income
            );
        }
    }
    if let Some(avg) = engine.average_day_ms() {
        println!("Average daily cycle: {avg:.3} ms");
    }
    Ok(())
}
