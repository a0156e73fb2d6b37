// Integration test for track files, session archives and MIDI export
// Tests complete save/load cycles with realistic data

use notegrid::builders::{DrumSection, MelodyParams, melody, rock_drums};
use notegrid::midi::{midi_to_passage, passage_to_midi};
use notegrid::mix::{TrackMeta, TrackMixManager};
use notegrid::project::{
    SessionManager, TRACK_FORMAT_VERSION, TrackIoError, serialize_track, track_from_json,
    track_to_json,
};
use notegrid::sequencer::{Note, Passage, normalize};
use tempfile::tempdir;

/// Times cross JSON as decimal text, so compare them with a tolerance
fn assert_same_passage(a: &Passage, b: &Passage) {
    assert_eq!(a.note_count(), b.note_count());
    assert_eq!(a.steps_per_quarter, b.steps_per_quarter);
    assert_eq!(a.total_steps, b.total_steps);
    assert!((a.total_time - b.total_time).abs() < 1e-9);
    for (x, y) in a.notes.iter().zip(&b.notes) {
        assert_eq!(x.pitch, y.pitch);
        assert_eq!(x.velocity, y.velocity);
        assert_eq!(x.program, y.program);
        assert_eq!(x.quantized_start_step, y.quantized_start_step);
        assert_eq!(x.quantized_end_step, y.quantized_end_step);
        assert!((x.start_time - y.start_time).abs() < 1e-9);
        assert!((x.end_time - y.end_time).abs() < 1e-9);
    }
}

fn workshop_mix() -> TrackMixManager {
    let mut mix = TrackMixManager::with_tempo(90.0).unwrap();

    let tune = melody(&MelodyParams {
        qpm: 90.0,
        ..MelodyParams::from_pitches(&[67, 69, 71, 72, 74, 72, 71, 69])
    })
    .unwrap();
    let drums = rock_drums(&[(DrumSection::Verse, 1), (DrumSection::Chorus, 1)], 90.0, 6).unwrap();

    mix.add_track(&tune, TrackMeta::new("Tune").with_instrument(73, false))
        .unwrap();
    let drum_id = mix
        .add_track(&drums, TrackMeta::new("Groove").with_instrument(0, true))
        .unwrap();
    mix.rename_track(drum_id, "Rock Groove").unwrap();
    mix
}

#[test]
fn test_complete_session_persistence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("workshop.zip");
    let mix = workshop_mix();
    let manager = SessionManager::new("notegrid");

    let manifest = manager.save(&path, "Integration Session", &mix).unwrap();
    assert_eq!(manifest.track_count, 2);
    assert_eq!(manifest.spq, Some(6));

    let session = manager.load(&path).unwrap();
    assert_eq!(session.manifest.title, "Integration Session");
    let names: Vec<&str> = session.tracks.iter().map(|t| t.meta.name.as_str()).collect();
    assert_eq!(names, vec!["Tune", "Rock Groove"]);

    for (loaded, original) in session.tracks.iter().zip(mix.tracks()) {
        assert_same_passage(&loaded.passage, &original.passage);
        assert_eq!(loaded.meta, original.meta());
    }

    let mut restored = TrackMixManager::with_tempo(90.0).unwrap();
    manager.restore_into(&session, &mut restored).unwrap();
    assert_eq!(restored.current().note_count(), mix.current().note_count());
    assert_eq!(restored.current().pitches(), mix.current().pitches());
}

#[test]
fn test_track_file_survives_reload_twice() {
    let mix = workshop_mix();
    let track = &mix.tracks()[0];

    let first =
        track_from_json(&track_to_json(&serialize_track(track, "notegrid").unwrap()).unwrap())
            .unwrap();
    let mut mix2 = TrackMixManager::new();
    let id = mix2.add_track(&first.passage, first.meta.clone()).unwrap();
    let second = track_from_json(
        &track_to_json(&serialize_track(mix2.track(id).unwrap(), "notegrid").unwrap()).unwrap(),
    )
    .unwrap();

    assert_same_passage(&first.passage, &second.passage);
    assert_eq!(second.source_version, TRACK_FORMAT_VERSION);
}

#[test]
fn test_legacy_track_file_without_version() {
    let legacy = r#"{
        "type": "magtrack",
        "app": "MagentaJS-Workshop",
        "meta": { "name": "Old Riff", "program": 29 },
        "ns": {
            "notes": [
                { "pitch": 52, "quantizedStartStep": 0, "quantizedEndStep": 3 },
                { "pitch": 55, "quantizedStartStep": 3, "quantizedEndStep": 6, "velocity": 0 },
                { "pitch": "bad", "quantizedStartStep": 6, "quantizedEndStep": 9 }
            ],
            "tempos": [{ "time": 0, "qpm": 90 }],
            "quantizationInfo": { "stepsPerQuarter": 6 }
        }
    }"#;

    let loaded = track_from_json(legacy).unwrap();
    assert_eq!(loaded.source_version, 1);
    assert!(loaded.is_active);
    assert_eq!(loaded.meta.program, 29);
    assert_eq!(loaded.passage.pitches(), vec![52, 55]);
    // Step-only notes get times from the grid: 3 steps at 90 QPM, 6 steps per quarter
    assert!((loaded.passage.notes[1].start_time - 1.0 / 3.0).abs() < 1e-9);
    // Velocity 0 falls back to the default
    assert_eq!(loaded.passage.notes[1].velocity, 96);
}

#[test]
fn test_future_track_file_rejected() {
    let json = format!(
        r#"{{"type":"magtrack","version":{},"meta":{{"name":"x","qpm":120}},"ns":{{"notes":[]}}}}"#,
        TRACK_FORMAT_VERSION + 1
    );
    assert!(matches!(
        track_from_json(&json),
        Err(TrackIoError::UnsupportedVersion { .. })
    ));
}

#[test]
fn test_mix_midi_export_round_trip() {
    let mix = workshop_mix();
    let bytes = passage_to_midi(mix.current()).unwrap();
    assert_eq!(&bytes[..4], b"MThd");

    let decoded = midi_to_passage(&bytes).unwrap();
    assert_eq!(decoded.note_count(), mix.current().note_count());
    assert_eq!(
        decoded.notes.iter().filter(|n| n.is_drum).count(),
        mix.current().notes.iter().filter(|n| n.is_drum).count()
    );
    assert!((decoded.total_time - mix.current().max_end_time()).abs() < 1e-2);
}

#[test]
fn test_normalized_passage_survives_track_file() {
    let passage = normalize(
        &Passage::from_notes(
            vec![
                Note::new(60, 0.0, 0.25).with_velocity(127),
                Note::new(48, 0.0, 1.0).with_program(33),
            ],
            100.0,
        )
        .with_steps_per_quarter(4),
    )
    .unwrap();

    let mut mix = TrackMixManager::new();
    let id = mix
        .add_track(&passage, TrackMeta::new("Pair").preserving_instruments())
        .unwrap();
    let json =
        track_to_json(&serialize_track(mix.track(id).unwrap(), "notegrid").unwrap()).unwrap();

    let loaded = track_from_json(&json).unwrap();
    assert!(loaded.meta.preserve_instruments);
    assert_same_passage(&loaded.passage, &passage);
}
