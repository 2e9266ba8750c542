use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use console::style;
use mesisim::{command, Config, Simulation};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(
    version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
    about = "simulate MESI cache coherence between processors with private caches",
)]
pub struct Options {
    #[clap(flatten)]
    pub config: Config,
    #[clap(
        long = "config",
        help = "load the configuration from a yaml or json file instead"
    )]
    pub config_file: Option<PathBuf>,
    #[clap(
        long = "commands",
        help = "yaml or json file of commands to run (defaults to a short demo)"
    )]
    pub commands: Option<PathBuf>,
    #[clap(long = "check", help = "check coherence invariants after every command")]
    pub check: bool,
    #[clap(long = "stats-json", help = "write statistics as json to this file")]
    pub stats_json: Option<PathBuf>,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let start = std::time::Instant::now();
    let options = Options::parse();

    let config = match options.config_file {
        Some(ref path) => Config::from_path(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => options.config.clone(),
    };
    let commands = match options.commands {
        Some(ref path) => command::parse_commands(path)
            .wrap_err_with(|| format!("failed to parse commands {}", path.display()))?,
        None => command::demo(),
    };

    let sim = Simulation::new(&config)?;
    let mut failed = 0;
    for command in &commands {
        match sim.execute(command) {
            Ok(response) => println!(
                "{} {}",
                style(format!("[{}]", response.kind)).cyan(),
                response
            ),
            Err(err) => {
                failed += 1;
                eprintln!("{} {}: {}", style("error").red().bold(), command, err);
            }
        }
        if options.check {
            sim.check_invariants()?;
        }
    }

    println!();
    print!("{}", sim.dump());

    let stats = sim.stats();
    if let Some(ref path) = options.stats_json {
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("failed to create {}", path.display()))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &stats)?;
    }
    for (id, cache) in stats.caches.iter() {
        println!(
            "processor {id}: {} accesses, hit rate {}",
            cache.total_accesses(),
            cache
                .hit_rate()
                .map_or_else(|| "-".to_string(), |rate| format!("{:.1}%", rate * 100.0)),
        );
    }
    println!(
        "ran {} commands ({} failed) in {:?}",
        commands.len(),
        failed,
        start.elapsed()
    );
    Ok(())
}
