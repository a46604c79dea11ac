//! Sliding-window framing of a series into supervised training pairs.

use serde::{Deserialize, Serialize};

/// One supervised pair: `window_size` consecutive values and the value that
/// immediately follows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingWindow {
    /// Input sequence, oldest value first
    pub input: Vec<f64>,
    /// The value one step after the input sequence
    pub label: f64,
}

/// Build every contiguous (input, label) pair from `values`.
///
/// A series of length `L` yields exactly `L - window_size` windows when
/// `L > window_size`. Shorter series (and a zero window size) yield no
/// windows at all; whether that is an error is the caller's decision.
pub fn sliding_windows(values: &[f64], window_size: usize) -> Vec<TrainingWindow> {
    if window_size == 0 || values.len() <= window_size {
        return Vec::new();
    }
    (0..values.len() - window_size)
        .map(|start| TrainingWindow {
            input: values[start..start + window_size].to_vec(),
            label: values[start + window_size],
        })
        .collect()
}
