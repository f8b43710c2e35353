//! Namco WSG3 (Waveform Sound Generator): the 3-voice wavetable synthesizer
//! on the Pac-Man board.
//!
//! Each voice walks a 32-sample, 4-bit waveform with a 20-bit phase
//! accumulator. The waveforms come from a 256-byte sound PROM holding
//! 8 selectable waveforms.
//!
//! The synthesizer itself is stateless apart from the PROM: voices are
//! owned by the caller (usually a [`VoiceRegisters`] bank that the CPU
//! writes through the memory map) and passed in on every
//! [`next_tick`](NamcoWsg3::next_tick).

use crate::device::DeviceError;

pub const VOICE_COUNT: usize = 3;
pub const WAVEFORM_COUNT: usize = 8;
pub const WAVEFORM_LENGTH: usize = 32;

/// Output rate of the generator on the Pac-Man board (18.432 MHz / 6 / 32).
pub const SAMPLE_RATE: u32 = 96_000;

/// Samples produced per `next_tick`: one 60 Hz video frame.
pub const BUFFER_SIZE: usize = SAMPLE_RATE as usize / 60;

const ACCUMULATOR_MASK: u32 = 0xF_FFFF;

pub type Waveform = [u8; WAVEFORM_LENGTH];

/// One WSG voice as programmed through the sound registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Voice {
    /// 20-bit phase accumulator. Bits 15..19 index the waveform.
    pub accumulator: u32,
    /// 20-bit phase increment added once per output sample.
    pub frequency: u32,
    /// Waveform number, 0..=7.
    pub waveform: u8,
    /// 4-bit volume.
    pub volume: u8,
}

pub struct NamcoWsg3 {
    waveforms: Vec<Waveform>,
}

impl NamcoWsg3 {
    /// Build the generator from decoded waveforms.
    ///
    /// Fails unless exactly [`WAVEFORM_COUNT`] waveforms are given and
    /// every sample fits in 4 bits.
    pub fn new(waveforms: Vec<Waveform>) -> Result<Self, DeviceError> {
        if waveforms.len() != WAVEFORM_COUNT {
            return Err(DeviceError::WaveformCount {
                expected: WAVEFORM_COUNT,
                actual: waveforms.len(),
            });
        }
        for (waveform, samples) in waveforms.iter().enumerate() {
            if let Some((index, &value)) = samples.iter().enumerate().find(|(_, s)| **s > 0x0F) {
                return Err(DeviceError::SampleOutOfRange {
                    waveform,
                    index,
                    value,
                });
            }
        }
        Ok(Self { waveforms })
    }

    /// Build the generator from a raw sound PROM image (8 × 32 bytes).
    ///
    /// Pac-Man's PROM stores each sample in the low nibble; the high
    /// nibble must be clear.
    pub fn from_prom(prom: &[u8]) -> Result<Self, DeviceError> {
        if prom.len() != WAVEFORM_COUNT * WAVEFORM_LENGTH {
            return Err(DeviceError::WaveformCount {
                expected: WAVEFORM_COUNT,
                actual: prom.len().div_ceil(WAVEFORM_LENGTH),
            });
        }
        let waveforms = prom
            .chunks_exact(WAVEFORM_LENGTH)
            .map(|chunk| {
                let mut waveform = [0u8; WAVEFORM_LENGTH];
                waveform.copy_from_slice(chunk);
                waveform
            })
            .collect();
        Self::new(waveforms)
    }

    pub fn waveforms(&self) -> &[Waveform] {
        &self.waveforms
    }

    /// Render [`BUFFER_SIZE`] mixed samples, advancing every voice's
    /// accumulator once per sample.
    ///
    /// `voices` must hold exactly [`VOICE_COUNT`] entries; otherwise no
    /// voice is touched and an error is returned.
    pub fn next_tick(&self, voices: &mut [Voice]) -> Result<Vec<i16>, DeviceError> {
        if voices.len() != VOICE_COUNT {
            return Err(DeviceError::VoiceCount {
                expected: VOICE_COUNT,
                actual: voices.len(),
            });
        }

        let mut buffer = Vec::with_capacity(BUFFER_SIZE);
        for _ in 0..BUFFER_SIZE {
            let mut sample: i16 = 0;
            for voice in voices.iter_mut() {
                voice.accumulator = voice.accumulator.wrapping_add(voice.frequency) & ACCUMULATOR_MASK;
                let index = (voice.accumulator >> 15) as usize;
                let waveform = &self.waveforms[(voice.waveform & 0x07) as usize];
                sample += waveform[index] as i16 * (voice.volume & 0x0F) as i16;
            }
            buffer.push(sample);
        }
        Ok(buffer)
    }
}

// ---------------------------------------------------------------------------
// VoiceRegisters
// ---------------------------------------------------------------------------

/// The 32 nibble-wide sound registers at 0x5040-0x505F, decoded into voices.
///
/// Register map (offsets from 0x5040):
///   0x00-0x04  voice 1 accumulator nibbles 0-4
///   0x05       voice 1 waveform
///   0x06-0x09  voice 2 accumulator nibbles 1-4
///   0x0A       voice 2 waveform
///   0x0B-0x0E  voice 3 accumulator nibbles 1-4
///   0x0F       voice 3 waveform
///   0x10-0x14  voice 1 frequency nibbles 0-4
///   0x15       voice 1 volume
///   0x16-0x19  voice 2 frequency nibbles 1-4
///   0x1A       voice 2 volume
///   0x1B-0x1E  voice 3 frequency nibbles 1-4
///   0x1F       voice 3 volume
///
/// Voices 2 and 3 have no register for nibble 0; it stays zero.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegisters {
    voices: [Voice; VOICE_COUNT],
}

enum Field {
    Accumulator(u32),
    Frequency(u32),
    Waveform,
    Volume,
}

impl VoiceRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one register. Only the low nibble of `value` is used.
    pub fn write_register(&mut self, offset: u8, value: u8) {
        let offset = offset & 0x1F;
        let nibble = value & 0x0F;

        let (voice, field) = match offset {
            0x00..=0x04 => (0, Field::Accumulator(offset as u32)),
            0x05 => (0, Field::Waveform),
            0x06..=0x09 => (1, Field::Accumulator((offset - 0x06 + 1) as u32)),
            0x0A => (1, Field::Waveform),
            0x0B..=0x0E => (2, Field::Accumulator((offset - 0x0B + 1) as u32)),
            0x0F => (2, Field::Waveform),
            0x10..=0x14 => (0, Field::Frequency((offset - 0x10) as u32)),
            0x15 => (0, Field::Volume),
            0x16..=0x19 => (1, Field::Frequency((offset - 0x16 + 1) as u32)),
            0x1A => (1, Field::Volume),
            0x1B..=0x1E => (2, Field::Frequency((offset - 0x1B + 1) as u32)),
            _ => (2, Field::Volume),
        };

        let voice = &mut self.voices[voice];
        match field {
            Field::Accumulator(n) => voice.accumulator = set_nibble(voice.accumulator, n, nibble),
            Field::Frequency(n) => voice.frequency = set_nibble(voice.frequency, n, nibble),
            Field::Waveform => voice.waveform = value & 0x07,
            Field::Volume => voice.volume = nibble,
        }
    }

    pub fn voice(&self, voice: usize) -> Result<&Voice, DeviceError> {
        self.voices.get(voice).ok_or(DeviceError::VoiceOutOfRange {
            voice,
            voices: VOICE_COUNT,
        })
    }

    pub fn voices_mut(&mut self) -> &mut [Voice] {
        &mut self.voices
    }

    pub fn reset(&mut self) {
        self.voices = [Voice::default(); VOICE_COUNT];
    }
}

fn set_nibble(word: u32, nibble: u32, value: u8) -> u32 {
    let shift = nibble * 4;
    (word & !(0x0F << shift)) | ((value as u32) << shift)
}
