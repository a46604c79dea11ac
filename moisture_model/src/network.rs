//! Stacked recurrent network for one-step-ahead sequence regression.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;
use crate::{ModelError, Result};

/// Anything that can predict the next value from a window of past values.
///
/// The forecasting and validation stages only need this one capability, so
/// they are written against the trait and can be exercised with stub
/// predictors in tests.
pub trait WindowPredictor {
    /// Predict the value that follows `window` (oldest value first).
    fn predict_next(&self, window: &[f64]) -> f64;
}

/// Layer sizes and dropout rate fixing the network architecture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkShape {
    /// Units in the first recurrent layer
    pub hidden1: usize,
    /// Units in the second recurrent layer
    pub hidden2: usize,
    /// Dropout rate applied to the final hidden state during training
    pub dropout: f64,
}

impl Default for NetworkShape {
    fn default() -> Self {
        Self {
            hidden1: 50,
            hidden2: 25,
            dropout: 0.2,
        }
    }
}

impl NetworkShape {
    pub fn validate(&self) -> Result<()> {
        if self.hidden1 == 0 || self.hidden2 == 0 {
            return Err(ModelError::InvalidParameter(
                "hidden layer sizes must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ModelError::InvalidParameter(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Two stacked tanh recurrent layers followed by a dense scalar head.
///
/// The input is consumed one value per time step. Both hidden states start
/// at zero for every prediction, so the network is a pure function of the
/// window it is given and accepts windows of any length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceNet {
    shape: NetworkShape,
    // layer 1: scalar input -> hidden1
    pub(crate) wx1: Vec<f64>,
    pub(crate) wh1: Matrix,
    pub(crate) b1: Vec<f64>,
    // layer 2: hidden1 -> hidden2
    pub(crate) wx2: Matrix,
    pub(crate) wh2: Matrix,
    pub(crate) b2: Vec<f64>,
    // dense head: hidden2 -> scalar
    pub(crate) wo: Vec<f64>,
    pub(crate) bo: f64,
}

/// Per-step activations kept from a forward pass so training can
/// backpropagate through time.
pub(crate) struct ForwardTrace {
    pub(crate) h1: Vec<Vec<f64>>,
    pub(crate) h2: Vec<Vec<f64>>,
}

impl SequenceNet {
    /// Build a freshly initialised network. Weights are drawn from a
    /// centered normal scaled by layer fan-in and fan-out; biases start at
    /// zero. The same seed always produces the same network.
    pub fn cold_start(shape: NetworkShape, rng: &mut impl Rng) -> Result<Self> {
        shape.validate()?;
        let h1 = shape.hidden1;
        let h2 = shape.hidden2;
        let wx1 = sample_weights(rng, 1, h1, h1)?;
        let wh1 = sample_matrix(rng, h1, h1, h1, h1)?;
        let wx2 = sample_matrix(rng, h2, h1, h1, h2)?;
        let wh2 = sample_matrix(rng, h2, h2, h2, h2)?;
        let wo = sample_weights(rng, h2, 1, h2)?;
        Ok(Self {
            shape,
            wx1,
            wh1,
            b1: vec![0.0; h1],
            wx2,
            wh2,
            b2: vec![0.0; h2],
            wo,
            bo: 0.0,
        })
    }

    pub fn shape(&self) -> NetworkShape {
        self.shape
    }

    /// Run the window through both recurrent layers, keeping every hidden
    /// state along the way.
    pub(crate) fn forward(&self, input: &[f64]) -> ForwardTrace {
        let mut h1_prev = vec![0.0; self.shape.hidden1];
        let mut h2_prev = vec![0.0; self.shape.hidden2];
        let mut h1_steps = Vec::with_capacity(input.len());
        let mut h2_steps = Vec::with_capacity(input.len());
        for &x in input {
            let mut h1 = self.wh1.matvec(&h1_prev);
            for (value, (&wx, &b)) in h1.iter_mut().zip(self.wx1.iter().zip(&self.b1)) {
                *value = (*value + wx * x + b).tanh();
            }
            let mut h2 = self.wh2.matvec(&h2_prev);
            let from_h1 = self.wx2.matvec(&h1);
            for (value, (&f, &b)) in h2.iter_mut().zip(from_h1.iter().zip(&self.b2)) {
                *value = (*value + f + b).tanh();
            }
            h1_prev.clone_from(&h1);
            h2_prev.clone_from(&h2);
            h1_steps.push(h1);
            h2_steps.push(h2);
        }
        ForwardTrace {
            h1: h1_steps,
            h2: h2_steps,
        }
    }

    /// Dense head over a (possibly dropout-masked) hidden state.
    pub(crate) fn head(&self, hidden: &[f64]) -> f64 {
        self.wo.iter().zip(hidden).map(|(w, h)| w * h).sum::<f64>() + self.bo
    }

    /// Predict the value following `window`. Dropout is inference-disabled;
    /// an empty window reduces to the head bias over the zero state.
    pub fn predict(&self, window: &[f64]) -> f64 {
        let trace = self.forward(window);
        match trace.h2.last() {
            Some(hidden) => self.head(hidden),
            None => self.bo,
        }
    }

    /// Mutable views of every parameter tensor in canonical order:
    /// wx1, wh1, b1, wx2, wh2, b2, wo, bo.
    pub(crate) fn param_slices_mut(&mut self) -> Vec<&mut [f64]> {
        vec![
            &mut self.wx1[..],
            self.wh1.as_mut_slice(),
            &mut self.b1[..],
            self.wx2.as_mut_slice(),
            self.wh2.as_mut_slice(),
            &mut self.b2[..],
            &mut self.wo[..],
            std::slice::from_mut(&mut self.bo),
        ]
    }

    /// Lengths of the parameter tensors, in the same canonical order.
    pub(crate) fn param_lens(&self) -> Vec<usize> {
        vec![
            self.wx1.len(),
            self.wh1.as_slice().len(),
            self.b1.len(),
            self.wx2.as_slice().len(),
            self.wh2.as_slice().len(),
            self.b2.len(),
            self.wo.len(),
            1,
        ]
    }
}

impl WindowPredictor for SequenceNet {
    fn predict_next(&self, window: &[f64]) -> f64 {
        self.predict(window)
    }
}

fn init_distribution(fan_in: usize, fan_out: usize) -> Result<Normal<f64>> {
    let std_dev = (2.0 / (fan_in + fan_out) as f64).sqrt();
    Normal::new(0.0, std_dev)
        .map_err(|e| ModelError::InvalidParameter(format!("weight init: {}", e)))
}

fn sample_weights(rng: &mut impl Rng, fan_in: usize, fan_out: usize, len: usize) -> Result<Vec<f64>> {
    let dist = init_distribution(fan_in, fan_out)?;
    Ok((0..len).map(|_| dist.sample(rng)).collect())
}

fn sample_matrix(
    rng: &mut impl Rng,
    rows: usize,
    cols: usize,
    fan_in: usize,
    fan_out: usize,
) -> Result<Matrix> {
    let dist = init_distribution(fan_in, fan_out)?;
    Ok(Matrix::from_fn(rows, cols, || dist.sample(rng)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_shape() -> NetworkShape {
        NetworkShape {
            hidden1: 6,
            hidden2: 4,
            dropout: 0.2,
        }
    }

    #[test]
    fn test_same_seed_same_network() {
        let a = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(11)).unwrap();
        let b = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);

        let c = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(12)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let net = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(3)).unwrap();
        let window = [0.31, 0.29, 0.33, 0.35, 0.30];
        assert_eq!(net.predict(&window), net.predict(&window));
    }

    #[test]
    fn test_predict_accepts_any_window_length() {
        let net = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(3)).unwrap();
        for len in [1, 3, 7, 40] {
            let window: Vec<f64> = (0..len).map(|i| 0.2 + 0.01 * i as f64).collect();
            assert!(net.predict(&window).is_finite());
        }
        assert_eq!(net.predict(&[]), 0.0);
    }

    #[test]
    fn test_fresh_biases_are_zero() {
        let net = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(net.b1.iter().all(|&b| b == 0.0));
        assert!(net.b2.iter().all(|&b| b == 0.0));
        assert_eq!(net.bo, 0.0);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let net = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(9)).unwrap();
        let json = serde_json::to_string(&net).unwrap();
        let restored: SequenceNet = serde_json::from_str(&json).unwrap();
        assert_eq!(net, restored);

        let window = [0.4, 0.41, 0.39, 0.42, 0.4, 0.38, 0.4];
        assert_eq!(net.predict(&window), restored.predict(&window));
    }

    #[test]
    fn test_shape_validation() {
        let mut shape = small_shape();
        shape.hidden1 = 0;
        assert!(matches!(
            shape.validate(),
            Err(ModelError::InvalidParameter(_))
        ));

        let mut shape = small_shape();
        shape.dropout = 1.0;
        assert!(shape.validate().is_err());

        let mut shape = small_shape();
        shape.dropout = -0.1;
        assert!(shape.validate().is_err());

        assert!(small_shape().validate().is_ok());
    }

    #[test]
    fn test_param_lens_match_slices() {
        let mut net = SequenceNet::cold_start(small_shape(), &mut StdRng::seed_from_u64(5)).unwrap();
        let lens = net.param_lens();
        let slices = net.param_slices_mut();
        assert_eq!(lens.len(), slices.len());
        for (len, slice) in lens.iter().zip(&slices) {
            assert_eq!(*len, slice.len());
        }
    }
}
