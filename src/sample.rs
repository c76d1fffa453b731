use crate::error::{MetricsError, Result};

/// Below this many releases the full list is processed.
pub const MIN_SAMPLED_LEN: usize = 5;

/// Picks a strided subset of `releases`, always keeping the first and last.
///
/// The stride is `max(2, floor(len / max_count - 2))`, so the output length
/// tracks `max_count` loosely rather than being capped by it. Order is preserved.
/// `max_count` is checked before the short-list passthrough, so `max_count < 2`
/// fails even for fewer than [`MIN_SAMPLED_LEN`] releases.
pub fn sample_releases<T: Clone>(releases: &[T], max_count: usize) -> Result<Vec<T>> {
    if max_count < 2 {
        return Err(MetricsError::InvalidArgument(format!(
            "max_count must be at least 2, got {max_count}"
        )));
    }

    if releases.len() < MIN_SAMPLED_LEN {
        return Ok(releases.to_vec());
    }

    let stride = stride(releases.len(), max_count);
    if stride < 2 {
        return Ok(releases.to_vec());
    }

    let last_index = releases.len() - 1;
    let (first, last) = (&releases[0], &releases[last_index]);
    let middle = &releases[1..last_index];

    let mut sampled = Vec::with_capacity(middle.len() / stride + 3);
    sampled.push(first.clone());
    sampled.extend(middle.iter().step_by(stride).cloned());
    sampled.push(last.clone());
    Ok(sampled)
}

// floor(len / max_count - 2) == floor(len / max_count) - 2 for non-negative integers
fn stride(len: usize, max_count: usize) -> usize {
    (len / max_count).saturating_sub(2).max(2)
}
