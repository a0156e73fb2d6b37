// Standard MIDI File codec
//
// Export writes SMF format 1: a tempo track followed by one track per part
// (see `split_into_parts`), drums on channel 10. Import reads any metrical
// SMF using its first tempo only and hands back a raw note sequence that
// still has to go through the boundary checks and the normalizer.

use crate::interchange::{InterchangeError, RawNote, RawNoteSequence, RawTempo};
use crate::mix::split_into_parts;
use crate::sequencer::normalize::normalize;
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{DEFAULT_QPM, TimeGridError};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::HashMap;
use std::path::Path;

/// Ticks per quarter note in exported files
pub const TICKS_PER_QUARTER: u16 = 480;

/// Zero-based channel reserved for General MIDI percussion
pub const DRUM_CHANNEL: u8 = 9;

#[derive(Debug, thiserror::Error)]
pub enum MidiCodecError {
    #[error("Invalid MIDI file: {0}")]
    Parse(#[from] midly::Error),

    #[error("Only metrical (ticks per quarter) MIDI timing is supported")]
    UnsupportedTiming,

    #[error(transparent)]
    Grid(#[from] TimeGridError),

    #[error(transparent)]
    Interchange(#[from] InterchangeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a passage as a Standard MIDI File
pub fn passage_to_midi(passage: &Passage) -> Result<Vec<u8>, MidiCodecError> {
    let passage = normalize(passage)?;
    let qpm = passage.tempo()?.qpm();
    let parts = split_into_parts(&passage)?;
    let ticks_per_second = f64::from(TICKS_PER_QUARTER) * qpm / 60.0;
    let to_tick = |seconds: f64| (seconds * ticks_per_second).round().max(0.0) as u32;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let micros_per_quarter = (60_000_000.0 / qpm).round().clamp(1.0, 16_777_215.0) as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_quarter))),
        },
        end_of_track(0),
    ]);

    let mut melodic_channels = (0u8..16).filter(|c| *c != DRUM_CHANNEL).cycle();
    for part in &parts {
        let channel = if part.is_drum {
            DRUM_CHANNEL
        } else {
            melodic_channels.next().unwrap_or(0)
        };
        let ch = u4::new(channel);

        let mut track: Track = vec![TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name.as_bytes())),
        }];
        if !part.is_drum {
            track.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: ch,
                    message: MidiMessage::ProgramChange {
                        program: u7::new(part.program.min(127)),
                    },
                },
            });
        }

        // (tick, is_on, key, velocity); offs sort ahead of ons on the same tick
        let mut events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(part.passage.notes.len() * 2);
        for note in &part.passage.notes {
            let start = to_tick(note.start_time);
            let end = to_tick(note.end_time).max(start.saturating_add(1));
            events.push((start, true, note.pitch, note.velocity));
            events.push((end, false, note.pitch, 0));
        }
        events.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

        let mut last_tick = 0u32;
        for (tick, is_on, key, velocity) in events {
            let key = u7::new(key.min(127));
            let message = if is_on {
                MidiMessage::NoteOn {
                    key,
                    vel: u7::new(velocity.clamp(1, 127)),
                }
            } else {
                MidiMessage::NoteOff { key, vel: u7::new(0) }
            };
            track.push(TrackEvent {
                delta: u28::new((tick - last_tick).min(0x0FFF_FFFF)),
                kind: TrackEventKind::Midi { channel: ch, message },
            });
            last_tick = tick;
        }
        track.push(end_of_track(0));
        smf.tracks.push(track);
    }

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    log::debug!(
        "Encoded {} notes in {} part(s) as MIDI ({} bytes)",
        passage.note_count(),
        parts.len(),
        buf.len()
    );
    Ok(buf)
}

fn end_of_track(delta: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

/// Decode a Standard MIDI File into a raw note sequence.
///
/// Each note is tagged with the index of the MIDI track it came from.
pub fn midi_to_raw(bytes: &[u8]) -> Result<RawNoteSequence, MidiCodecError> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) if tpq.as_int() > 0 => f64::from(tpq.as_int()),
        _ => return Err(MidiCodecError::UnsupportedTiming),
    };

    let qpm = first_tempo(&smf).unwrap_or(DEFAULT_QPM);
    let seconds_per_tick = 60.0 / (qpm * ticks_per_quarter);

    let mut notes = Vec::new();
    for (index, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        let mut programs = [0u8; 16];
        // Open notes per (channel, key), oldest first
        let mut open: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track {
            tick += u64::from(event.delta.as_int());
            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();
            match message {
                MidiMessage::ProgramChange { program } => {
                    programs[usize::from(channel)] = program.as_int();
                }
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    open.entry((channel, key.as_int()))
                        .or_default()
                        .push((tick, vel.as_int()));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let Some(pending) = open.get_mut(&(channel, key.as_int())) else {
                        continue;
                    };
                    if pending.is_empty() {
                        continue;
                    }
                    let (start, velocity) = pending.remove(0);
                    notes.push(raw_note(
                        key.as_int(),
                        start,
                        tick,
                        velocity,
                        programs[usize::from(channel)],
                        channel,
                        index,
                        seconds_per_tick,
                    ));
                }
                _ => {}
            }
        }

        // Notes still sounding at the end of the track end there
        let mut dangling: Vec<((u8, u8), (u64, u8))> = open
            .into_iter()
            .flat_map(|(k, v)| v.into_iter().map(move |n| (k, n)))
            .collect();
        dangling.sort_by_key(|&((channel, key), (start, _))| (start, channel, key));
        for ((channel, key), (start, velocity)) in dangling {
            notes.push(raw_note(
                key,
                start,
                tick,
                velocity,
                programs[usize::from(channel)],
                channel,
                index,
                seconds_per_tick,
            ));
        }
    }

    let total_time = notes
        .iter()
        .filter_map(|n| n.end_time.as_ref().and_then(|t| t.as_f64()))
        .fold(0.0_f64, f64::max);

    Ok(RawNoteSequence {
        notes,
        tempos: vec![RawTempo {
            time: Some(0.0.into()),
            qpm: Some(qpm.into()),
        }],
        quantization_info: None,
        total_time: Some(total_time.into()),
        total_quantized_steps: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn raw_note(
    key: u8,
    start: u64,
    end: u64,
    velocity: u8,
    program: u8,
    channel: u8,
    track_index: usize,
    seconds_per_tick: f64,
) -> RawNote {
    RawNote {
        pitch: Some(u32::from(key).into()),
        start_time: Some((start as f64 * seconds_per_tick).into()),
        end_time: Some((end as f64 * seconds_per_tick).into()),
        velocity: Some(u32::from(velocity).into()),
        program: Some(u32::from(program).into()),
        is_drum: Some(channel == DRUM_CHANNEL),
        quantized_start_step: None,
        quantized_end_step: None,
        instrument: u32::try_from(track_index).ok().map(Into::into),
    }
}

fn first_tempo(smf: &Smf) -> Option<f64> {
    smf.tracks.iter().flatten().find_map(|event| match event.kind {
        TrackEventKind::Meta(MetaMessage::Tempo(micros)) if micros.as_int() > 0 => {
            Some(60_000_000.0 / f64::from(micros.as_int()))
        }
        _ => None,
    })
}

/// Decode, validate and normalize in one go
pub fn midi_to_passage(bytes: &[u8]) -> Result<Passage, MidiCodecError> {
    let passage = midi_to_raw(bytes)?.into_passage()?;
    Ok(normalize(&passage)?)
}

pub fn write_midi_file<P: AsRef<Path>>(path: P, passage: &Passage) -> Result<(), MidiCodecError> {
    std::fs::write(path, passage_to_midi(passage)?)?;
    Ok(())
}

pub fn read_midi_file<P: AsRef<Path>>(path: P) -> Result<Passage, MidiCodecError> {
    midi_to_passage(&std::fs::read(path)?)
}
