use notegrid::builders::{
    ArpeggioParams, DrumSection, MajorScaleParams, NoteDuration, arpeggio, major_scale, rock_drums,
};
use notegrid::midi::{read_midi_file, write_midi_file};
use notegrid::project::{SessionManager, load_track_file, track_file_name};
use notegrid::{MixListener, Passage, TrackMeta, Workshop, WorkshopConfig};
use std::path::{Path, PathBuf};

const USAGE: &str = "\
Usage:
  notegrid demo <out_dir>              build a small arrangement, write MIDI and a session
  notegrid info <file>                 summarize a .mid, .magtrack or session .zip
  notegrid convert <in.mid> <out_dir>  turn a MIDI file into a .magtrack track file
  notegrid config                      print the active configuration";

/// Prints a one-line summary of every published mix
struct MixPrinter;

impl MixListener for MixPrinter {
    fn on_mix(&mut self, mix: &Passage) {
        log::info!(
            "Mix: {} notes, {:.2}s at {} QPM",
            mix.note_count(),
            mix.total_time,
            mix.qpm().unwrap_or_default()
        );
    }
}

fn load_config() -> Result<WorkshopConfig, Box<dyn std::error::Error>> {
    match WorkshopConfig::default_path() {
        Ok(path) => Ok(WorkshopConfig::load_or_default(path)?),
        Err(e) => {
            log::warn!("{}; using default configuration", e);
            Ok(WorkshopConfig::default())
        }
    }
}

fn describe(label: &str, passage: &Passage) {
    println!(
        "{}: {} notes, {:.2}s, {} QPM, grid {}",
        label,
        passage.note_count(),
        passage.total_time,
        passage.qpm().unwrap_or_default(),
        passage
            .steps_per_quarter
            .map_or("none".to_string(), |spq| format!("{} steps/quarter", spq))
    );
}

fn demo(out_dir: &Path, config: WorkshopConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out_dir)?;
    let qpm = config.qpm;
    let spq = config.steps_per_quarter;
    let mut workshop = Workshop::new(config)?;
    workshop.add_listener(Box::new(MixPrinter));

    let scale = major_scale(&MajorScaleParams {
        tonic: 60,
        octaves: 2,
        duration: NoteDuration::Beats(0.5),
        qpm,
        ..Default::default()
    })?;
    let arp = arpeggio(&ArpeggioParams {
        chord: vec![36, 43, 48, 43],
        cycles: 4,
        duration: NoteDuration::Beats(1.0),
        program: 33,
        qpm,
        ..Default::default()
    })?;
    let drums = rock_drums(&[(DrumSection::Verse, 3), (DrumSection::Chorus, 1)], qpm, spq)?;

    let lead = workshop.add_passage(&scale, TrackMeta::new("Lead").with_instrument(73, false))?;
    workshop.add_passage(&arp, TrackMeta::new("Bass").with_instrument(33, false))?;
    workshop.add_passage(&drums, TrackMeta::new("Drums").with_instrument(0, true))?;
    let doubled = workshop.concatenate(lead, lead)?;
    workshop.toggle_track(lead)?;
    describe("Mix", workshop.current());

    let midi_path = out_dir.join("mix.mid");
    std::fs::write(&midi_path, workshop.export_midi()?)?;
    println!("Wrote {}", midi_path.display());

    let track_path = out_dir.join(track_file_name("Lead + Lead"));
    std::fs::write(&track_path, workshop.export_track(doubled)?)?;
    println!("Wrote {}", track_path.display());

    let session_path = out_dir.join("demo_session.zip");
    let manifest = workshop.save_session(&session_path, "Demo")?;
    println!(
        "Wrote {} ({} tracks)",
        session_path.display(),
        manifest.track_count
    );
    Ok(())
}

fn info(path: &Path, config: &WorkshopConfig) -> Result<(), Box<dyn std::error::Error>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "mid" | "midi" => describe("MIDI file", &read_midi_file(path)?),
        "magtrack" => {
            let track = load_track_file(path)?;
            describe(&format!("Track '{}'", track.meta.name), &track.passage);
        }
        "zip" => {
            let session = SessionManager::new(config.app_name.clone()).load(path)?;
            println!(
                "Session '{}' (modified {}), {} tracks",
                session.manifest.title, session.manifest.modified, session.manifest.track_count
            );
            for track in &session.tracks {
                let state = if track.is_active { "active" } else { "muted" };
                describe(&format!("  {} [{}]", track.meta.name, state), &track.passage);
            }
        }
        _ => return Err(format!("Unrecognized file type: {}", path.display()).into()),
    }
    Ok(())
}

fn convert(
    input: &Path,
    out_dir: &Path,
    config: WorkshopConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track")
        .to_string();
    let mut workshop = Workshop::new(config)?;
    let id = workshop.import_midi(&std::fs::read(input)?, TrackMeta::new(name.clone()))?;

    std::fs::create_dir_all(out_dir)?;
    let output = out_dir.join(track_file_name(&name));
    std::fs::write(&output, workshop.export_track(id)?)?;
    println!("Wrote {}", output.display());

    // Keep a normalized MIDI copy next to it for comparison
    let midi_copy = out_dir.join(format!("{}.normalized.mid", track_file_name(&name)));
    if let Some(track) = workshop.mix().track(id) {
        write_midi_file(&midi_copy, &track.passage)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config()?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["demo", out_dir] => demo(&PathBuf::from(out_dir), config),
        ["info", file] => info(Path::new(file), &config),
        ["convert", input, out_dir] => convert(Path::new(input), Path::new(out_dir), config),
        ["config"] => {
            if let Ok(path) = WorkshopConfig::default_path() {
                println!("# {}", path.display());
            }
            println!(
                "{}",
                ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())?
            );
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}
