// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Gradient training of the memory network with Burn.
//
//   - Training uses an Autodiff backend for gradients
//   - model.valid() drops the autodiff wrapper for evaluation
//   - One optimiser step per mini-batch; batch size 1 gives
//     plain per-question updates
//   - The DataLoader reshuffles the training set every epoch
//
// After each epoch: mean training cost, validation on the
// held-out split, one CSV metrics row, one checkpoint. The
// epoch with the lowest validation loss is also kept as
// model_best.
// Every `eval_every` epochs the model is also scored on the
// full training set and on the test set.
//
// Reference: Burn Book §5 (Training)
//            Duchi et al. (2011) AdaGrad

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{
        momentum::MomentumConfig, AdaGradConfig, AdamConfig, GradientsParams, Optimizer,
        SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::MemBatcher, dataset::MemDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    backend::{BackendKind, CpuBackend, GpuBackend},
    evaluator::{evaluate, EvalReport},
    model::{MemNet, MemNetConfig},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    AdaGrad,
    Adam,
    /// Plain SGD with momentum 0.9
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "adagrad" => Ok(Self::AdaGrad),
            "adam"    => Ok(Self::Adam),
            "sgd"     => Ok(Self::Sgd),
            other => bail!("unknown optimizer '{other}' (expected adagrad, adam or sgd)"),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdaGrad => write!(f, "adagrad"),
            Self::Adam    => write!(f, "adam"),
            Self::Sgd     => write!(f, "sgd"),
        }
    }
}

/// Everything the training loop consumes besides the config.
pub struct TrainingData {
    pub train: MemDataset,
    pub valid: MemDataset,
    /// Test questions scored every `eval_every` epochs, when present
    pub test:  Option<MemDataset>,
}

/// Outcome of a training run.
#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    /// Mean training cost of each epoch, in order
    pub epoch_losses: Vec<f64>,
    /// Epochs after which train/test were scored
    pub eval_epochs:  Vec<usize>,
    /// Epoch with the lowest validation loss, if any was held out
    pub best_epoch:   Option<usize>,
    pub train:        EvalReport,
    pub test:         Option<EvalReport>,
}

pub fn run_training(
    cfg:       &TrainConfig,
    model_cfg: &MemNetConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
) -> Result<TrainReport> {
    match cfg.backend {
        BackendKind::Ndarray => {
            let device = burn::backend::ndarray::NdArrayDevice::Cpu;
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<burn::backend::Autodiff<CpuBackend>>(cfg, model_cfg, data, ckpt, metrics, device)
        }
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<burn::backend::Autodiff<GpuBackend>>(cfg, model_cfg, data, ckpt, metrics, device)
        }
    }
}

/// Build the model and the configured optimiser, then fit.
pub fn train_loop<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    model_cfg: &MemNetConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    B::Device,
) -> Result<TrainReport> {
    B::seed(cfg.seed);

    let model: MemNet<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} hops, embedding_dim={}, vocabulary={}, {} parameters",
        model_cfg.hops, model_cfg.embedding_dim, model_cfg.n_words, model.num_params(),
    );

    let clipping = cfg.clip_norm.map(|max| GradientClippingConfig::Norm(max as f32));

    match cfg.optimizer {
        OptimizerKind::AdaGrad => {
            let optim = AdaGradConfig::new().with_grad_clipping(clipping).init();
            fit(cfg, model, optim, data, ckpt, metrics, device)
        }
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().with_epsilon(1e-8).with_grad_clipping(clipping).init();
            fit(cfg, model, optim, data, ckpt, metrics, device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new()
                .with_momentum(Some(MomentumConfig::new().with_momentum(0.9)))
                .with_gradient_clipping(clipping)
                .init();
            fit(cfg, model, optim, data, ckpt, metrics, device)
        }
    }
}

fn fit<B, O>(
    cfg:       &TrainConfig,
    mut model: MemNet<B>,
    mut optim: O,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    B::Device,
) -> Result<TrainReport>
where
    B: AutodiffBackend,
    O: Optimizer<MemNet<B>, B>,
{
    let TrainingData { train, valid, test } = data;
    let mut report = TrainReport::default();

    if train.sample_count() == 0 {
        bail!("No training questions with memory were found");
    }

    // ── Training data loader (AutodiffBackend, reshuffled each epoch) ─────────
    let train_loader = DataLoaderBuilder::new(MemBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size.max(1))
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train.clone());

    if !cfg.lr_schedule.is_empty() {
        tracing::info!("Learning-rate schedule: {} (base {})", cfg.lr_schedule, cfg.lr);
    }

    let mut best_valid_loss = f64::INFINITY;

    for epoch in 1..=cfg.epochs {
        let lr = cfg.lr_schedule.rate_at(epoch, cfg.lr);

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum  = 0.0f64;
        let mut questions = 0usize;

        for batch in train_loader.iter() {
            let n = batch.answers.dims()[0];
            let (loss, _) = model.forward_loss(
                batch.facts,
                batch.question,
                batch.memory_padding,
                batch.answers,
            );

            loss_sum  += loss.clone().into_scalar().elem::<f64>() * n as f64;
            questions += n;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let train_loss = if questions > 0 { loss_sum / questions as f64 } else { f64::NAN };
        if !train_loss.is_finite() {
            bail!("Training diverged at epoch {epoch} (cost = {train_loss}); try a lower --lr or --clip-norm");
        }
        report.epoch_losses.push(train_loss);
        println!("Epoch {epoch}: {train_loss:.6}");

        // ── Validation phase (InnerBackend, no autodiff) ─────────────────────
        let model_valid = model.valid();
        let valid_report = evaluate(&model_valid, valid.clone(), cfg.batch_size, &device);
        let row = EpochMetrics {
            epoch,
            lr,
            train_loss,
            valid_loss: valid_report.mean_loss(),
            valid_acc:  if valid_report.total() > 0 { valid_report.accuracy() } else { f64::NAN },
        };

        if valid_report.total() > 0 {
            tracing::info!(
                "Epoch {}/{} | lr={} | valid_loss={:.4} | valid_acc={:.1}%",
                epoch, cfg.epochs, lr, row.valid_loss, row.valid_acc * 100.0,
            );
        }
        metrics.log(&row)?;

        ckpt.save_model(&model, epoch)?;
        if row.is_improvement(best_valid_loss) {
            best_valid_loss = row.valid_loss;
            report.best_epoch = Some(epoch);
            ckpt.save_best_model(&model, epoch)?;
            tracing::debug!("New best validation loss {:.4}", best_valid_loss);
        }

        // ── Periodic evaluation on train and test sets ────────────────────────
        let periodic = cfg.eval_every > 0 && epoch % cfg.eval_every == 0;
        if periodic || epoch == cfg.epochs {
            report.eval_epochs.push(epoch);
            report.train = evaluate(&model_valid, train.clone(), cfg.batch_size, &device);
            println!("train: {}", report.train);

            report.test = test
                .as_ref()
                .map(|t| evaluate(&model_valid, t.clone(), cfg.batch_size, &device));
            if let Some(test_report) = &report.test {
                println!("test: {}", test_report);
            }
        }
    }

    if let Some(best) = report.best_epoch {
        tracing::info!("Lowest validation loss at epoch {} (saved as model_best)", best);
    }
    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    Ok(report)
}
