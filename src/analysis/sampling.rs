/// Thins `points` to at most `max_points` by keeping every n-th element,
/// starting with the first. Short inputs are returned unchanged.
pub fn downsample<T: Clone>(points: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }

    let step = points.len().div_ceil(max_points);
    points.iter().step_by(step).cloned().collect()
}
