use clap::Parser;
use smtododo::config::DEFAULT_CONFIG;
use smtododo::{Config, Converter};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smtododo")]
#[command(version)]
#[command(about = "Convert a StepMania simfile into a Dodo Re Mi custom song", long_about = None)]
struct Args {
    /// Simfile (.ssc/.sm) or the song folder containing it
    simfile_path: PathBuf,

    /// Attach hitsounds to every input
    #[arg(short = 's', long)]
    hitsounds: bool,

    /// Don't add the song to songs.json
    #[arg(short = 'n', long)]
    no_auto_add: bool,

    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

fn main() -> Result<(), smtododo::Error> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smtododo=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let config = Config::load(&args.config)?;
    info!(config = %args.config.display(), "loaded config");

    let mut converter = Converter::new(config);
    converter.hitsounds = args.hitsounds;
    converter.auto_add = !args.no_auto_add;

    let folder = converter.convert_path(&args.simfile_path)?;
    println!("{}", folder.display());

    Ok(())
}
