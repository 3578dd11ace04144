/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_step: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
        sfx_turn: Arc<Vec<u8>>,
        sfx_complete: Arc<Vec<u8>>,
        sfx_achievement: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_step: Arc::new(make_wav(&gen_step())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_turn: Arc::new(make_wav(&gen_turn())),
                sfx_complete: Arc::new(make_wav(&gen_complete())),
                sfx_achievement: Arc::new(make_wav(&gen_achievement())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_step(&self) { self.play(&self.sfx_step); }
        pub fn play_bump(&self) { self.play(&self.sfx_bump); }
        pub fn play_turn(&self) { self.play(&self.sfx_turn); }
        pub fn play_complete(&self) { self.play(&self.sfx_complete); }
        pub fn play_achievement(&self) { self.play(&self.sfx_achievement); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Sum of sine partials `(multiple, weight)` over a base frequency.
    fn tone(freq: f32, t: f32, partials: &[(f32, f32)]) -> f32 {
        partials
            .iter()
            .map(|&(k, w)| (t * freq * k * 2.0 * std::f32::consts::PI).sin() * w)
            .sum()
    }

    /// Footstep: soft filtered noise tap
    fn gen_step() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.05) as usize;
        let mut rng: u32 = 2024;
        let mut lp = 0.0_f32;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                lp += (noise - lp) * 0.2; // one-pole low-pass
                let env = (1.0 - i as f32 / n as f32).powf(2.0);
                lp * env * 0.5
            })
            .collect()
    }

    /// Bump: low thud that drops in pitch
    fn gen_bump() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.09) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 140.0 - p * 70.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                tone(freq, t, &[(1.0, 0.8), (2.0, 0.2)]) * (1.0 - p).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Turn: quick rising swish
    fn gen_turn() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.04) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                tone(500.0 + p * 300.0, t, &[(1.0, 1.0)]) * (1.0 - p) * 0.12
            })
            .collect()
    }

    /// Maze complete: ascending fanfare C5→E5→G5→C6 with a held top note
    fn gen_complete() -> Vec<f32> {
        let notes = [(523.0_f32, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                samples.push(tone(freq, t, &[(1.0, 0.6), (2.0, 0.3), (3.0, 0.1)]) * env * 0.3);
            }
        }
        // Final fade
        let fade_len = samples.len() / 5;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    /// Achievement: bright octave chime G5, G6
    fn gen_achievement() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.08), (1568.0, 0.2)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                samples.push(tone(freq, t, &[(1.0, 0.7), (2.0, 0.3)]) * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_step(&self) {}
    pub fn play_bump(&self) {}
    pub fn play_turn(&self) {}
    pub fn play_complete(&self) {}
    pub fn play_achievement(&self) {}
}
