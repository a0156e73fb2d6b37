// Quick demonstration of the track mix and session persistence
// Run with: cargo run --bin demo_session

use notegrid::builders::{
    AbsoluteParams, ScaleParams, TimedEvent, absolute_sequence, arithmetic_scale,
};
use notegrid::sequencer::compose::{ConcatOptions, concatenate};
use notegrid::{TrackMeta, Workshop, WorkshopConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🎵 notegrid - Track Mix & Session Demo");
    println!("======================================");

    let config = WorkshopConfig::default();
    let qpm = config.qpm;
    let mut workshop = Workshop::new(config)?;

    // Whole-tone run and a short call/response phrase
    let run = arithmetic_scale(&ScaleParams {
        length: 8,
        qpm,
        ..Default::default()
    })?;
    let phrase = absolute_sequence(&AbsoluteParams::new(
        vec![
            TimedEvent::at_beats(67, 0.0, 1.0),
            TimedEvent::at_beats(69, 1.0, 0.5).with_velocity(110),
            TimedEvent::at_beats(71, 1.5, 0.5),
            TimedEvent::at_beats(72, 2.0, 2.0),
        ],
        qpm,
    ))?;
    let both = concatenate(&[run.clone(), phrase.clone()], &ConcatOptions::default())?;

    let run_id = workshop.add_passage(&run, TrackMeta::new("Run"))?;
    let phrase_id =
        workshop.add_passage(&phrase, TrackMeta::new("Phrase").with_instrument(73, false))?;
    println!("✅ Added 2 tracks, mix is {:.2}s", workshop.current().total_time);
    println!("   - Run then phrase would last {:.2}s", both.total_time);

    workshop.toggle_track(phrase_id)?;
    println!(
        "🔇 Muted 'Phrase': {} active track(s), {} notes",
        workshop.mix().active_count(),
        workshop.current().note_count()
    );

    workshop.rename_track(run_id, "Whole-tone run")?;
    let undone = workshop.undo()?;
    println!("↩️  Undo: {}", undone);

    let session_path = std::env::temp_dir().join("notegrid_demo_session.zip");
    let manifest = workshop.save_session(&session_path, "Demo Session")?;
    println!("\n💾 Saved session to: {}", session_path.display());
    println!("   - Tracks: {}", manifest.track_count);
    println!("   - Created: {}", manifest.created);
    println!("   - File size: {} bytes", std::fs::metadata(&session_path)?.len());

    let mut restored = Workshop::new(WorkshopConfig::default())?;
    let loaded = restored.load_session(&session_path)?;
    println!("\n📂 Loaded '{}' successfully:", loaded.title);
    for track in restored.mix().tracks() {
        println!(
            "   - {} ({} notes, {})",
            track.name,
            track.passage.note_count(),
            if track.is_active { "active" } else { "muted" }
        );
    }
    assert_eq!(restored.current().note_count(), workshop.current().note_count());

    std::fs::remove_file(&session_path).ok();
    println!("\n🎉 Demo completed");
    Ok(())
}
