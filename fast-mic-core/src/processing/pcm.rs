//! Sample format helpers shared by backends and front ends.
//!
//! Captured samples are signed 16-bit integers held in host order. Every byte
//! serialization in this workspace is little-endian.

/// Convert one f32 sample `[-1.0, 1.0]` to i16, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Convert a slice of f32 samples to i16.
pub fn convert_f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| f32_to_i16(s)).collect()
}

/// Downmix interleaved multi-channel i16 audio to mono by averaging each frame.
///
/// A trailing partial frame is dropped.
pub fn downmix_to_mono(samples: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Serialize samples as little-endian bytes.
pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

/// Parse little-endian bytes back into samples. A trailing odd byte is ignored.
pub fn from_le_bytes(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// RMS level of i16 samples, normalized to 0.0–1.0.
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let scale = i16::MAX as f32;
    let sum_sq: f32 = samples
        .iter()
        .map(|&s| {
            let v = s as f32 / scale;
            v * v
        })
        .sum();
    (sum_sq / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn f32_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(f32_to_i16(2.5), i16::MAX);
        assert_eq!(f32_to_i16(-3.0), -i16::MAX);
        assert_eq!(convert_f32_to_i16(&[0.5, -0.5]), vec![16383, -16383]);
    }

    #[test]
    fn downmix_averages_frames() {
        let stereo = [100, 300, -200, 200, 7];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![200, 0]);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![1, 2, 3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn le_bytes_layout() {
        let bytes = to_le_bytes(&[0x0102, -1]);
        assert_eq!(bytes, vec![0x02, 0x01, 0xff, 0xff]);
        assert_eq!(from_le_bytes(&bytes), vec![0x0102, -1]);
    }

    #[test]
    fn from_le_bytes_ignores_odd_tail() {
        assert_eq!(from_le_bytes(&[0x10, 0x00, 0x05]), vec![16]);
    }

    #[test]
    fn rms_levels() {
        assert_eq!(rms_level(&[]), 0.0);
        assert_eq!(rms_level(&[0, 0, 0]), 0.0);
        assert_relative_eq!(rms_level(&[i16::MAX, -i16::MAX]), 1.0, epsilon = 1e-6);
        assert_relative_eq!(rms_level(&[16384, -16384]), 0.5, epsilon = 1e-3);
    }
}
