//! Minimal RIFF/WAVE encoding.

/// Sample rate of encoded recordings.
pub const SAMPLE_RATE: u32 = 8000;

const HEADER_LEN: usize = 44;

/// RIFF chunk size excluding the data: header minus the `RIFF` tag and size.
const RIFF_OVERHEAD: u32 = 36;

/// Wraps unsigned 8-bit mono PCM samples in a WAV container.
#[must_use]
pub fn encode_pcm8_mono(samples: &[u8]) -> Vec<u8> {
    let data_len = u32::try_from(samples.len()).unwrap_or(u32::MAX - RIFF_OVERHEAD);
    let mut out = Vec::with_capacity(samples.len() + HEADER_LEN);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&RIFF_OVERHEAD.saturating_add(data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1_u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes()); // byte rate
    out.extend_from_slice(&1_u16.to_le_bytes()); // block align
    out.extend_from_slice(&8_u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(samples);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let wav = encode_pcm8_mono(&[128; 10]);
        assert_eq!(wav.len(), 54);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 46);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 10);
    }
}
