//! Reference speech model: pooled energy features through a linear head.
//!
//! A compact stand-in for the real speech model, with the same contract a
//! production implementation would have: a fixed parameter manifest, strict
//! loading, per-batch training with AdamW-style updates, and bounded
//! decoding. Useful for simulation runs and as the default model of the
//! `fedsim` binary; not a serious recognizer.

use ndarray::{azip, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use fedsim_data::{Batch, WINDOW_SAMPLES};

use crate::config::{DecodeOptions, ModelOptions, OptimizerOptions};
use crate::error::ModelError;
use crate::model::{BatchEval, SpeechModel};
use crate::params::{ParamSpec, ParameterLayout, ParameterSet};

/// Symbol inventory of the stand-in decoder (ASCII only, so byte index ==
/// symbol index).
const VOCAB: &str = "abcdefghijklmnopqrstuvwxyz' ";

/// Number of pooled energy features per window.
const N_FEATURES: usize = 64;

const IDX_ENCODER: usize = 0;
const IDX_DECODER: usize = 1;
const IDX_BIAS: usize = 2;

fn vocab_size() -> usize {
    VOCAB.len()
}

fn layout_for(hidden: usize) -> ParameterLayout {
    ParameterLayout::new(vec![
        ParamSpec::new("encoder.weight", vec![hidden, N_FEATURES]),
        ParamSpec::new("decoder.weight", vec![vocab_size(), hidden]),
        ParamSpec::new("decoder.bias", vec![vocab_size()]),
    ])
}

/// Pools a fixed window into `N_FEATURES` mean-energy bins.
fn pooled_features(audio: &[f32]) -> Result<Array1<f32>, ModelError> {
    if audio.len() != WINDOW_SAMPLES {
        return Err(ModelError::Inference {
            reason: format!(
                "unexpected audio length {} (want {WINDOW_SAMPLES})",
                audio.len()
            ),
        });
    }
    let frame = WINDOW_SAMPLES / N_FEATURES;
    Ok(Array1::from_iter(audio.chunks(frame).map(|chunk| {
        chunk.iter().map(|s| s.abs()).sum::<f32>() / frame as f32
    })))
}

/// Normalized symbol-frequency target for a transcript.
fn transcript_target(transcript: &str) -> Array1<f32> {
    let mut counts = Array1::<f32>::zeros(vocab_size());
    let mut total = 0.0f32;
    for c in transcript.to_lowercase().chars() {
        if let Some(i) = VOCAB.find(c) {
            counts[i] += 1.0;
            total += 1.0;
        }
    }
    if total > 0.0 {
        counts.mapv_inplace(|x| x / total);
    }
    counts
}

/// Stand-in for the external beam decoder: emits the `beam_width` strongest
/// symbols above the mean score, strongest first, bounded by `max_length`.
fn decode_scores(scores: &Array1<f32>, options: &DecodeOptions) -> String {
    let mean = scores.mean().unwrap_or(0.0);
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(options.beam_width)
        .filter(|&(_, score)| score > mean)
        .filter_map(|(i, _)| VOCAB.as_bytes().get(i).map(|&b| b as char))
        .take(options.max_length)
        .collect()
}

#[derive(Debug, Clone)]
struct AdamState {
    step: u64,
    m_encoder: Array2<f32>,
    v_encoder: Array2<f32>,
    m_decoder: Array2<f32>,
    v_decoder: Array2<f32>,
    m_bias: Array1<f32>,
    v_bias: Array1<f32>,
}

impl AdamState {
    fn zeros(hidden: usize) -> Self {
        let vocab = vocab_size();
        Self {
            step: 0,
            m_encoder: Array2::zeros((hidden, N_FEATURES)),
            v_encoder: Array2::zeros((hidden, N_FEATURES)),
            m_decoder: Array2::zeros((vocab, hidden)),
            v_decoder: Array2::zeros((vocab, hidden)),
            m_bias: Array1::zeros(vocab),
            v_bias: Array1::zeros(vocab),
        }
    }

    /// Forgets all moments; equivalent to constructing a fresh optimizer.
    fn reset(&mut self) {
        self.step = 0;
        self.m_encoder.fill(0.0);
        self.v_encoder.fill(0.0);
        self.m_decoder.fill(0.0);
        self.v_decoder.fill(0.0);
        self.m_bias.fill(0.0);
        self.v_bias.fill(0.0);
    }
}

#[allow(clippy::too_many_arguments)]
fn adam_update<D: ndarray::Dimension>(
    param: &mut ndarray::Array<f32, D>,
    grad: &ndarray::Array<f32, D>,
    m: &mut ndarray::Array<f32, D>,
    v: &mut ndarray::Array<f32, D>,
    lr: f32,
    lr_t: f32,
    opts: &OptimizerOptions,
) {
    let (b1, b2, eps, wd) = (opts.beta1, opts.beta2, opts.epsilon, opts.weight_decay);
    azip!((p in param, &g in grad, m in m, v in v) {
        *m = b1 * *m + (1.0 - b1) * g;
        *v = b2 * *v + (1.0 - b2) * g * g;
        *p -= lr_t * *m / ((*v).sqrt() + eps) + lr * wd * *p;
    });
}

fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Pooled-energy linear model over a fixed symbol inventory.
#[derive(Debug, Clone)]
pub struct LinearAsrModel {
    opts: OptimizerOptions,
    layout: ParameterLayout,
    encoder: Array2<f32>,
    decoder: Array2<f32>,
    bias: Array1<f32>,
    state: AdamState,
}

impl LinearAsrModel {
    /// Creates a freshly initialized model.
    ///
    /// Initialization is deterministic for a given `seed`.
    pub fn new(model: &ModelOptions, optimizer: OptimizerOptions, seed: u64) -> Self {
        let hidden = model.hidden_size;
        let vocab = vocab_size();
        let mut rng = StdRng::seed_from_u64(seed);

        let encoder =
            Array2::from_shape_fn((hidden, N_FEATURES), |_| rng.gen_range(-0.1f32..0.1));
        let decoder = Array2::from_shape_fn((vocab, hidden), |_| rng.gen_range(-0.1f32..0.1));
        let bias = Array1::zeros(vocab);
        debug!(hidden_size = hidden, vocab_size = vocab, "initialized reference model");

        Self {
            opts: optimizer,
            layout: layout_for(hidden),
            encoder,
            decoder,
            bias,
            state: AdamState::zeros(hidden),
        }
    }

    fn forward(&self, features: &Array1<f32>) -> (Array1<f32>, Array1<f32>) {
        let hidden = self.encoder.dot(features).mapv(f32::tanh);
        let scores = self.decoder.dot(&hidden) + &self.bias;
        (hidden, scores)
    }

    fn apply_gradients(
        &mut self,
        g_encoder: &Array2<f32>,
        g_decoder: &Array2<f32>,
        g_bias: &Array1<f32>,
    ) {
        self.state.step += 1;
        let t = self.state.step as i32;
        let lr = self.opts.learning_rate;
        let lr_t = lr * (1.0 - self.opts.beta2.powi(t)).sqrt() / (1.0 - self.opts.beta1.powi(t));

        adam_update(
            &mut self.encoder,
            g_encoder,
            &mut self.state.m_encoder,
            &mut self.state.v_encoder,
            lr,
            lr_t,
            &self.opts,
        );
        adam_update(
            &mut self.decoder,
            g_decoder,
            &mut self.state.m_decoder,
            &mut self.state.v_decoder,
            lr,
            lr_t,
            &self.opts,
        );
        adam_update(
            &mut self.bias,
            g_bias,
            &mut self.state.m_bias,
            &mut self.state.v_bias,
            lr,
            lr_t,
            &self.opts,
        );
    }
}

impl SpeechModel for LinearAsrModel {
    fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    fn export_parameters(&self) -> ParameterSet {
        ParameterSet::new(
            self.layout.clone(),
            vec![
                self.encoder.clone().into_dyn(),
                self.decoder.clone().into_dyn(),
                self.bias.clone().into_dyn(),
            ],
        )
        .expect("model arrays match their own layout")
    }

    fn load_parameters(&mut self, parameters: &ParameterSet) -> Result<(), ModelError> {
        self.layout.ensure_matches(parameters.layout())?;
        self.encoder = parameters.matrix(IDX_ENCODER)?;
        self.decoder = parameters.matrix(IDX_DECODER)?;
        self.bias = parameters.vector(IDX_BIAS)?;
        // Fresh parameters get a fresh optimizer.
        self.state.reset();
        Ok(())
    }

    fn train_batch(&mut self, batch: &Batch) -> Result<f32, ModelError> {
        if batch.is_empty() {
            return Err(ModelError::EmptyBatch);
        }

        let vocab = vocab_size() as f32;
        let mut g_encoder = Array2::<f32>::zeros(self.encoder.raw_dim());
        let mut g_decoder = Array2::<f32>::zeros(self.decoder.raw_dim());
        let mut g_bias = Array1::<f32>::zeros(self.bias.len());
        let mut total_loss = 0.0f32;

        for (audio, transcript) in batch.audio.iter().zip(&batch.transcripts) {
            let features = pooled_features(audio)?;
            let target = transcript_target(transcript);
            let (hidden, scores) = self.forward(&features);

            let diff = &scores - &target;
            total_loss += diff.mapv(|d| d * d).sum() / vocab;

            let d_scores = diff.mapv(|d| 2.0 * d / vocab);
            g_bias += &d_scores;
            g_decoder += &outer(&d_scores, &hidden);
            let d_hidden = self.decoder.t().dot(&d_scores);
            let d_pre = &d_hidden * &hidden.mapv(|h| 1.0 - h * h);
            g_encoder += &outer(&d_pre, &features);
        }

        let inv = 1.0 / batch.len() as f32;
        g_encoder *= inv;
        g_decoder *= inv;
        g_bias *= inv;
        let loss = total_loss * inv;
        if !loss.is_finite() {
            return Err(ModelError::Inference {
                reason: "non-finite training loss".to_string(),
            });
        }

        self.apply_gradients(&g_encoder, &g_decoder, &g_bias);
        Ok(loss)
    }

    fn eval_batch(&self, batch: &Batch, options: &DecodeOptions) -> Result<BatchEval, ModelError> {
        if batch.is_empty() {
            return Err(ModelError::EmptyBatch);
        }

        let vocab = vocab_size() as f32;
        let mut total_loss = 0.0f32;
        let mut transcripts = Vec::with_capacity(batch.len());

        for (audio, transcript) in batch.audio.iter().zip(&batch.transcripts) {
            let features = pooled_features(audio)?;
            let target = transcript_target(transcript);
            let (_, scores) = self.forward(&features);
            total_loss += (&scores - &target).mapv(|d| d * d).sum() / vocab;
            transcripts.push(decode_scores(&scores, options));
        }

        let loss = total_loss / batch.len() as f32;
        if !loss.is_finite() {
            return Err(ModelError::Inference {
                reason: "non-finite evaluation loss".to_string(),
            });
        }

        Ok(BatchEval { loss, transcripts })
    }
}
