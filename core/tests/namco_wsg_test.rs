use cathode_core::device::namco_wsg::{BUFFER_SIZE, WAVEFORM_LENGTH};
use cathode_core::device::{DeviceError, NamcoWsg3, Voice, VoiceRegisters};

/// Waveform n holds the ramp 0..=15 twice; every waveform is the same.
fn ramp_prom() -> Vec<u8> {
    (0..256).map(|i| (i % WAVEFORM_LENGTH) as u8 & 0x0F).collect()
}

fn constant_prom(value: u8) -> Vec<u8> {
    vec![value; 256]
}

// --- Construction ---

#[test]
fn test_prom_length_is_validated() {
    let err = NamcoWsg3::from_prom(&[0; 100]).err().unwrap();
    assert_eq!(
        err,
        DeviceError::WaveformCount {
            expected: 8,
            actual: 4
        }
    );
}

#[test]
fn test_wide_sample_is_rejected() {
    let mut prom = constant_prom(0);
    prom[33] = 0x10;
    let err = NamcoWsg3::from_prom(&prom).err().unwrap();
    assert_eq!(
        err,
        DeviceError::SampleOutOfRange {
            waveform: 1,
            index: 1,
            value: 0x10
        }
    );
}

#[test]
fn test_waveform_count_is_validated() {
    let err = NamcoWsg3::new(vec![[0; WAVEFORM_LENGTH]; 7]).err().unwrap();
    assert_eq!(
        err,
        DeviceError::WaveformCount {
            expected: 8,
            actual: 7
        }
    );
}

// --- Rendering ---

#[test]
fn test_wrong_voice_count_touches_nothing() {
    let wsg = NamcoWsg3::from_prom(&ramp_prom()).unwrap();
    let mut voices = [Voice {
        frequency: 0x100,
        volume: 15,
        ..Voice::default()
    }; 2];

    let err = wsg.next_tick(&mut voices).unwrap_err();
    assert_eq!(
        err,
        DeviceError::VoiceCount {
            expected: 3,
            actual: 2
        }
    );
    assert_eq!(voices[0].accumulator, 0);
}

#[test]
fn test_silent_voices_render_silence() {
    let wsg = NamcoWsg3::from_prom(&ramp_prom()).unwrap();
    let mut voices = [Voice::default(); 3];

    let buffer = wsg.next_tick(&mut voices).unwrap();
    assert_eq!(buffer.len(), BUFFER_SIZE);
    assert_eq!(BUFFER_SIZE, 1600);
    assert!(buffer.iter().all(|&s| s == 0));
}

#[test]
fn test_single_voice_walks_the_waveform() {
    let wsg = NamcoWsg3::from_prom(&ramp_prom()).unwrap();
    let mut voices = [Voice::default(); 3];
    voices[0] = Voice {
        accumulator: 0,
        frequency: 1 << 15, // one sample per output tick
        waveform: 0,
        volume: 2,
    };

    let buffer = wsg.next_tick(&mut voices).unwrap();
    assert_eq!(&buffer[..4], &[2, 4, 6, 8]);
    assert_eq!(buffer[15], 0, "sample 16 of the ramp wraps to 0");
    assert_eq!(voices[0].accumulator, 0, "1600 samples is 50 full periods");
}

#[test]
fn test_voices_are_mixed() {
    let wsg = NamcoWsg3::from_prom(&constant_prom(0x0F)).unwrap();
    let mut voices = [Voice {
        frequency: 0x1234,
        volume: 15,
        ..Voice::default()
    }; 3];

    let buffer = wsg.next_tick(&mut voices).unwrap();
    assert!(buffer.iter().all(|&s| s == 3 * 15 * 15));
}

// --- Registers ---

#[test]
fn test_voice_registers_decode_layout() {
    let mut registers = VoiceRegisters::new();
    registers.write_register(0x10, 0x01);
    registers.write_register(0x11, 0x02);
    registers.write_register(0x15, 0xFA);
    registers.write_register(0x05, 0x0D);
    registers.write_register(0x16, 0x03);
    registers.write_register(0x1F, 0x07);

    let v1 = registers.voice(0).unwrap();
    assert_eq!(v1.frequency, 0x21);
    assert_eq!(v1.volume, 0x0A, "only the low nibble is wired");
    assert_eq!(v1.waveform, 0x05);

    assert_eq!(registers.voice(1).unwrap().frequency, 0x30, "voice 2 starts at nibble 1");
    assert_eq!(registers.voice(2).unwrap().volume, 0x07);
}

#[test]
fn test_voice_out_of_range() {
    let registers = VoiceRegisters::new();
    assert_eq!(
        registers.voice(3).err(),
        Some(DeviceError::VoiceOutOfRange {
            voice: 3,
            voices: 3
        })
    );
}

#[test]
fn test_registers_feed_the_generator() {
    let wsg = NamcoWsg3::from_prom(&constant_prom(0x01)).unwrap();
    let mut registers = VoiceRegisters::new();
    registers.write_register(0x14, 0x01); // voice 1 frequency nibble 4
    registers.write_register(0x15, 0x03);

    let buffer = wsg.next_tick(registers.voices_mut()).unwrap();
    assert_eq!(buffer[0], 3);
    assert_ne!(registers.voice(0).unwrap().accumulator, 0);

    registers.reset();
    assert_eq!(*registers.voice(0).unwrap(), Voice::default());
}
