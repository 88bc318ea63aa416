//! Simfile to JSON dumper

use clap::Parser;
use serde::Serialize;
use smtododo::simfile::notes::GroupedNote;
use smtododo::simfile::timing::{Timing, TimingData, TimingEngine};
use smtododo::Simfile;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sm2json")]
#[command(version)]
#[command(about = "Dump a parsed simfile as JSON", long_about = None)]
struct Args {
    /// Simfile (.ssc/.sm) or the song folder containing it
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

#[derive(Serialize)]
struct ChartJson<'a> {
    #[serde(flatten)]
    chart: &'a smtododo::simfile::Chart,
    resolved_timing: TimingData,
    notes: Vec<NoteJson>,
}

#[derive(Serialize)]
struct NoteJson {
    #[serde(flatten)]
    note: GroupedNote,
    time_ms: i64,
    hittable: bool,
}

#[derive(Serialize)]
struct SimfileJson<'a> {
    title: &'a str,
    subtitle: &'a str,
    artist: &'a str,
    music: &'a str,
    timing: &'a TimingData,
    charts: Vec<ChartJson<'a>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let path = Simfile::locate(&args.input)?;
    let simfile = Simfile::load(&path)?;

    let mut charts = Vec::with_capacity(simfile.charts.len());
    for chart in &simfile.charts {
        let timing = simfile.timing_for(chart);
        let engine = TimingEngine::new(&timing);
        let notes = chart
            .grouped_notes()
            .map_err(|u| format!("unmatched hold in column {} at beat {}", u.column, u.beat))?
            .into_iter()
            .map(|note| NoteJson {
                time_ms: engine.time_at(note.beat),
                hittable: engine.is_hittable(note.beat),
                note,
            })
            .collect();
        charts.push(ChartJson {
            chart,
            resolved_timing: timing,
            notes,
        });
    }

    let dump = SimfileJson {
        title: simfile.display_title(),
        subtitle: &simfile.subtitle,
        artist: simfile.display_artist(),
        music: &simfile.music,
        timing: &simfile.timing,
        charts,
    };

    let json_string = if args.compact {
        serde_json::to_string(&dump)?
    } else {
        serde_json::to_string_pretty(&dump)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}
