// MIDI - Standard MIDI File import/export

pub mod codec;

pub use codec::{
    DRUM_CHANNEL, MidiCodecError, TICKS_PER_QUARTER, midi_to_passage, midi_to_raw,
    passage_to_midi, read_midi_file, write_midi_file,
};
