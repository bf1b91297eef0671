//! Audio codec implementations

#[cfg(feature = "opus")]
pub mod opus;

/// Convert mono samples to stereo by duplicating each sample to both channels
pub fn mono_to_stereo(input: &[i16]) -> Vec<i16> {
    let mut out = Vec::with_capacity(input.len() * 2);
    for &s in input {
        out.push(s);
        out.push(s);
    }
    out
}

/// Convert stereo samples to mono by averaging the channels
pub fn stereo_to_mono(input: &[i16]) -> Vec<i16> {
    input
        .chunks_exact(2)
        .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_to_stereo() {
        assert_eq!(mono_to_stereo(&[100, -200]), vec![100, 100, -200, -200]);
    }

    #[test]
    fn test_stereo_to_mono() {
        assert_eq!(stereo_to_mono(&[100, 200, 300, 400]), vec![150, 350]);
    }
}
