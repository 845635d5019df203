// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `eval` and `ask`,
// with all their flags.
//
// Typed flags (optimizer, backend, schedule) are parsed with
// their FromStr impls, so clap reports bad values itself.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::{derive_test_path, TrainConfig};
use crate::ml::{backend::BackendKind, schedule::LrSchedule, trainer::OptimizerKind};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a memory network on a bAbI train file
    Train(TrainArgs),

    /// Score a trained checkpoint on a bAbI file
    Eval(EvalArgs),

    /// Answer a question about a story using a trained checkpoint
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// bAbI training file, e.g. qa1_single-supporting-fact_train.txt
    pub train_file: String,

    /// Number of passes over the training questions
    #[arg(default_value_t = 10)]
    pub epochs: usize,

    /// Test file; defaults to the train file with "train" replaced by "test"
    #[arg(long)]
    pub test_file: Option<String>,

    /// Directory for checkpoints, vocabulary, configs and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Size of every word embedding
    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Number of memory hops
    #[arg(long, default_value_t = 3)]
    pub hops: usize,

    /// Base learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Learning-rate changes as "epoch:lr" pairs, e.g. "1:0.02,20:0.01"
    #[arg(long, default_value = "")]
    pub lr_schedule: LrSchedule,

    /// adagrad, adam or sgd (with momentum 0.9)
    #[arg(long, default_value = "adagrad")]
    pub optimizer: OptimizerKind,

    /// Clip gradients to this L2 norm
    #[arg(long)]
    pub clip_norm: Option<f64>,

    /// Questions per optimiser step
    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Keep only the N most recent facts in memory (0 = all)
    #[arg(long, default_value_t = 0)]
    pub memory_size: usize,

    /// Fraction of training questions held out for validation
    #[arg(long, default_value_t = 0.0)]
    pub valid_fraction: f64,

    /// Score train and test sets every N epochs (0 = only at the end)
    #[arg(long, default_value_t = 5)]
    pub eval_every: usize,

    /// Seed for weight init, shuffling and the validation split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// ndarray (CPU) or wgpu (GPU)
    #[arg(long, default_value = "ndarray")]
    pub backend: BackendKind,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let test_file = a.test_file.or_else(|| derive_test_path(&a.train_file));
        TrainConfig {
            train_file:     a.train_file,
            test_file,
            checkpoint_dir: a.checkpoint_dir,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            lr_schedule:    a.lr_schedule,
            optimizer:      a.optimizer,
            clip_norm:      a.clip_norm,
            embedding_dim:  a.embedding_dim,
            hops:           a.hops,
            memory_size:    a.memory_size,
            valid_fraction: a.valid_fraction,
            eval_every:     a.eval_every,
            seed:           a.seed,
            backend:        a.backend,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// bAbI file to score
    pub file: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Text file with one fact per line (bAbI line numbers optional)
    #[arg(long)]
    pub story: String,

    /// The question to answer
    #[arg(long)]
    pub question: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
