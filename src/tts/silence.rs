//! Synthetic silent WAV clips, the last-resort speech fallback.

use std::io::Cursor;

/// Sample rate of generated silence.
pub const SILENCE_SAMPLE_RATE: u32 = 16_000;

/// Default length of generated silence.
pub const SILENCE_DURATION_MS: u32 = 500;

/// Header-only PCM WAV (16 kHz mono 16-bit, zero data bytes).
///
/// Returned if encoding ever fails so callers always receive decodable bytes.
pub const MINIMAL_WAV: [u8; 44] = [
    b'R', b'I', b'F', b'F', 0x24, 0, 0, 0, b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ', 16, 0,
    0, 0, 1, 0, 1, 0, 0x80, 0x3E, 0, 0, 0, 0x7D, 0, 0, 2, 0, 16, 0, b'd', b'a', b't', b'a', 0, 0,
    0, 0,
];

/// Encode `duration_ms` of 16-bit mono silence as a WAV file in memory.
pub fn silent_wav(duration_ms: u32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples = (u64::from(sample_rate) * u64::from(duration_ms) / 1000) as usize;
    let mut bytes = Vec::with_capacity(44 + samples * 2);
    let encoded = (|| -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)?;
        for _ in 0..samples {
            writer.write_sample(0i16)?;
        }
        writer.finalize()
    })();
    match encoded {
        Ok(()) => bytes,
        Err(e) => {
            tracing::warn!("silent WAV encoding failed, using bare header: {e}");
            MINIMAL_WAV.to_vec()
        }
    }
}

/// Default synthetic fallback clip.
pub fn default_silence() -> Vec<u8> {
    silent_wav(SILENCE_DURATION_MS, SILENCE_SAMPLE_RATE)
}
