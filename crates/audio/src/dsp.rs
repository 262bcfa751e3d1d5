/// Root-mean-square level of a buffer; zero for an empty one.
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
}

/// Crops a frame to its quiet edges: from the first sample in the first half
/// whose magnitude is below `threshold`, up to (excluding) the last such
/// sample in the second half. Without a quiet sample the bounds stay at the
/// start and at `len - 1`.
pub fn trim_quiet_edges(buffer: &[f32], threshold: f32) -> &[f32] {
    let size = buffer.len();
    if size == 0 {
        return buffer;
    }
    let half = size / 2;
    let start = buffer[..half]
        .iter()
        .position(|s| s.abs() < threshold)
        .unwrap_or(0);
    let end = (1..half)
        .map(|offset| size - offset)
        .find(|&index| buffer[index].abs() < threshold)
        .unwrap_or(size - 1);
    &buffer[start..end]
}

/// Unnormalized autocorrelation for every lag in `[0, len)`.
pub fn autocorrelate(buffer: &[f32]) -> Vec<f32> {
    let size = buffer.len();
    (0..size)
        .map(|lag| {
            buffer[..size - lag]
                .iter()
                .zip(&buffer[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Vertex offset of the parabola through three equally spaced points, or
/// `None` when they are collinear.
pub fn parabolic_offset(left: f32, centre: f32, right: f32) -> Option<f32> {
    let a = (left + right - 2.0 * centre) / 2.0;
    let b = (right - left) / 2.0;
    if a == 0.0 {
        return None;
    }
    Some(-b / (2.0 * a))
}
