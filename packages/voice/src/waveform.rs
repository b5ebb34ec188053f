//! Frequency buffer → waveform bars.

/// Down-samples a frequency buffer into `bars` amplitudes in `[0, 1]`.
///
/// Bar `i` takes the bin at `floor(i / bars * data.len())`. An empty buffer
/// yields silent bars.
#[must_use]
pub fn amplitude_bars(data: &[u8], bars: usize) -> Vec<f32> {
    if data.is_empty() {
        return vec![0.0; bars];
    }

    (0..bars)
        .map(|i| f32::from(data[i * data.len() / bars]) / 255.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_evenly_spaced_bins() {
        let data: Vec<u8> = (0..128_u8).collect();
        let bars = amplitude_bars(&data, 20);

        assert_eq!(bars.len(), 20);
        for (i, bar) in bars.iter().enumerate() {
            let expected = f32::from(data[i * 128 / 20]) / 255.0;
            assert!((bar - expected).abs() < f32::EPSILON);
        }
        assert!(bars[0].abs() < f32::EPSILON);
        assert!((bars[19] - 121.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn values_stay_normalized() {
        let bars = amplitude_bars(&[255; 64], 20);
        assert!(bars.iter().all(|bar| (bar - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn short_buffers_repeat_bins() {
        let bars = amplitude_bars(&[0, 255], 4);
        assert_eq!(bars, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_buffer_is_silent() {
        assert_eq!(amplitude_bars(&[], 3), [0.0, 0.0, 0.0]);
        assert!(amplitude_bars(&[10, 20], 0).is_empty());
    }
}
