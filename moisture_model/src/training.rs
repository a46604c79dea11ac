//! Training loop: mean-squared-error loss, backpropagation through time,
//! and the Adam optimizer.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::matrix::Matrix;
use crate::network::SequenceNet;
use crate::window::TrainingWindow;
use crate::{ModelError, Result};

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// Hyperparameters for one fit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Full passes over the training windows
    pub epochs: usize,
    /// Windows per gradient step
    pub batch_size: usize,
    /// Adam step size
    pub learning_rate: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 16,
            learning_rate: 1e-3,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ModelError::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidParameter(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// What a fit pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    /// Epochs actually run
    pub epochs: usize,
    /// Training windows seen per epoch
    pub windows: usize,
    /// Mean squared error over the last epoch
    pub final_loss: f64,
}

/// Gradient accumulator shaped like the network's parameters.
struct Gradients {
    wx1: Vec<f64>,
    wh1: Matrix,
    b1: Vec<f64>,
    wx2: Matrix,
    wh2: Matrix,
    b2: Vec<f64>,
    wo: Vec<f64>,
    bo: f64,
}

impl Gradients {
    fn zeros_like(net: &SequenceNet) -> Self {
        let shape = net.shape();
        Self {
            wx1: vec![0.0; shape.hidden1],
            wh1: Matrix::zeros(shape.hidden1, shape.hidden1),
            b1: vec![0.0; shape.hidden1],
            wx2: Matrix::zeros(shape.hidden2, shape.hidden1),
            wh2: Matrix::zeros(shape.hidden2, shape.hidden2),
            b2: vec![0.0; shape.hidden2],
            wo: vec![0.0; shape.hidden2],
            bo: 0.0,
        }
    }

    fn reset(&mut self) {
        self.wx1.fill(0.0);
        self.wh1.reset();
        self.b1.fill(0.0);
        self.wx2.reset();
        self.wh2.reset();
        self.b2.fill(0.0);
        self.wo.fill(0.0);
        self.bo = 0.0;
    }

    /// Views in the network's canonical parameter order.
    fn as_slices(&self) -> Vec<&[f64]> {
        vec![
            &self.wx1[..],
            self.wh1.as_slice(),
            &self.b1[..],
            self.wx2.as_slice(),
            self.wh2.as_slice(),
            &self.b2[..],
            &self.wo[..],
            std::slice::from_ref(&self.bo),
        ]
    }
}

/// Adam first and second moment estimates, one pair per parameter tensor.
struct AdamState {
    step: u64,
    m: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
}

impl AdamState {
    fn for_net(net: &SequenceNet) -> Self {
        let lens = net.param_lens();
        Self {
            step: 0,
            m: lens.iter().map(|&len| vec![0.0; len]).collect(),
            v: lens.iter().map(|&len| vec![0.0; len]).collect(),
        }
    }

    fn apply(&mut self, learning_rate: f64, params: Vec<&mut [f64]>, grads: &[&[f64]]) {
        self.step += 1;
        let correction1 = 1.0 - ADAM_BETA1.powi(self.step as i32);
        let correction2 = 1.0 - ADAM_BETA2.powi(self.step as i32);
        for (tensor, (param, grad)) in params.into_iter().zip(grads).enumerate() {
            let m = &mut self.m[tensor];
            let v = &mut self.v[tensor];
            for i in 0..param.len() {
                let g = grad[i];
                m[i] = ADAM_BETA1 * m[i] + (1.0 - ADAM_BETA1) * g;
                v[i] = ADAM_BETA2 * v[i] + (1.0 - ADAM_BETA2) * g * g;
                let m_hat = m[i] / correction1;
                let v_hat = v[i] / correction2;
                param[i] -= learning_rate * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
            }
        }
    }
}

/// Train `net` in place over the supplied windows.
///
/// Windows are shuffled every epoch and consumed in mini-batches; each batch
/// takes one Adam step on the mean of its per-window gradients. Dropout
/// masks are drawn from `rng`, so a fixed seed makes the whole pass
/// reproducible.
pub fn fit(
    net: &mut SequenceNet,
    windows: &[TrainingWindow],
    options: FitOptions,
    rng: &mut impl Rng,
) -> Result<FitSummary> {
    options.validate()?;
    if windows.is_empty() {
        return Err(ModelError::InsufficientData(
            "no training windows".to_string(),
        ));
    }
    let width = windows[0].input.len();
    if width == 0 {
        return Err(ModelError::InvalidParameter(
            "training windows must hold at least one value".to_string(),
        ));
    }
    if windows.iter().any(|w| w.input.len() != width) {
        return Err(ModelError::InvalidParameter(
            "training windows differ in length".to_string(),
        ));
    }

    let keep = 1.0 - net.shape().dropout;
    let hidden2 = net.shape().hidden2;
    let mut grads = Gradients::zeros_like(net);
    let mut adam = AdamState::for_net(net);
    let mut order: Vec<usize> = (0..windows.len()).collect();
    let mut final_loss = 0.0;

    for _ in 0..options.epochs {
        order.shuffle(rng);
        let mut squared_sum = 0.0;
        for batch in order.chunks(options.batch_size) {
            grads.reset();
            let scale = 1.0 / batch.len() as f64;
            for &index in batch {
                let mask = sample_mask(hidden2, keep, rng);
                squared_sum += forward_backward(net, &windows[index], &mask, &mut grads, scale);
            }
            let grad_slices = grads.as_slices();
            adam.apply(options.learning_rate, net.param_slices_mut(), &grad_slices);
        }
        final_loss = squared_sum / windows.len() as f64;
    }

    Ok(FitSummary {
        epochs: options.epochs,
        windows: windows.len(),
        final_loss,
    })
}

/// Inverted dropout mask: kept units are rescaled so the expected
/// activation stays unchanged.
fn sample_mask(len: usize, keep: f64, rng: &mut impl Rng) -> Vec<f64> {
    if keep >= 1.0 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|_| {
            if rng.gen::<f64>() < keep {
                1.0 / keep
            } else {
                0.0
            }
        })
        .collect()
}

/// One window's forward pass and backpropagation through time.
///
/// Gradients are scaled by `scale` and accumulated into `grads`; the return
/// value is the window's squared error for loss bookkeeping.
fn forward_backward(
    net: &SequenceNet,
    window: &TrainingWindow,
    mask: &[f64],
    grads: &mut Gradients,
    scale: f64,
) -> f64 {
    let trace = net.forward(&window.input);
    let steps = window.input.len();

    let dropped: Vec<f64> = trace.h2[steps - 1]
        .iter()
        .zip(mask)
        .map(|(h, m)| h * m)
        .collect();
    let output = net.head(&dropped);
    let err = output - window.label;
    let dy = 2.0 * err * scale;

    for (acc, &h) in grads.wo.iter_mut().zip(&dropped) {
        *acc += dy * h;
    }
    grads.bo += dy;

    // gradient flowing into h2 at the step being processed
    let mut dh2: Vec<f64> = net
        .wo
        .iter()
        .zip(mask)
        .map(|(w, m)| dy * w * m)
        .collect();
    let mut dh1_from2 = vec![Vec::new(); steps];
    for t in (0..steps).rev() {
        let dz2: Vec<f64> = dh2
            .iter()
            .zip(&trace.h2[t])
            .map(|(d, h)| d * (1.0 - h * h))
            .collect();
        grads.wx2.add_outer(&dz2, &trace.h1[t]);
        if t > 0 {
            grads.wh2.add_outer(&dz2, &trace.h2[t - 1]);
        }
        for (acc, &d) in grads.b2.iter_mut().zip(&dz2) {
            *acc += d;
        }
        dh1_from2[t] = net.wx2.matvec_t(&dz2);
        dh2 = net.wh2.matvec_t(&dz2);
    }

    let mut dh1_rec = vec![0.0; net.shape().hidden1];
    for t in (0..steps).rev() {
        let dz1: Vec<f64> = dh1_from2[t]
            .iter()
            .zip(&dh1_rec)
            .zip(&trace.h1[t])
            .map(|((a, b), h)| (a + b) * (1.0 - h * h))
            .collect();
        for (acc, &d) in grads.wx1.iter_mut().zip(&dz1) {
            *acc += d * window.input[t];
        }
        if t > 0 {
            grads.wh1.add_outer(&dz1, &trace.h1[t - 1]);
        }
        for (acc, &d) in grads.b1.iter_mut().zip(&dz1) {
            *acc += d;
        }
        dh1_rec = net.wh1.matvec_t(&dz1);
    }

    err * err
}
