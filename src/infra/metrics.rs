// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch:
//
//   epoch,lr,train_loss,valid_loss,valid_acc
//   1,0.010000,2.301442,2.210311,0.188000
//
// valid_loss / valid_acc are NaN when no validation split was
// held out.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub lr:         f64,
    /// Mean cross entropy over the training questions
    pub train_loss: f64,
    pub valid_loss: f64,
    pub valid_acc:  f64,
}

impl EpochMetrics {
    pub fn is_improvement(&self, best_valid_loss: f64) -> bool {
        self.valid_loss < best_valid_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,lr,train_loss,valid_loss,valid_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.lr, m.train_loss, m.valid_loss, m.valid_acc,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics { epoch: 2, lr: 0.01, train_loss: 2.5, valid_loss: 2.3, valid_acc: 0.2 };
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
        // NaN never counts as an improvement
        let none = EpochMetrics { valid_loss: f64::NAN, ..m };
        assert!(!none.is_improvement(3.0));
    }

    #[test]
    fn test_appends_rows_under_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics { epoch: 1, lr: 0.01, train_loss: 1.5, valid_loss: 1.25, valid_acc: 0.5 }).unwrap();
        logger.log(&EpochMetrics { epoch: 2, lr: 0.01, train_loss: 1.0, valid_loss: f64::NAN, valid_acc: f64::NAN }).unwrap();

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,lr,train_loss,valid_loss,valid_acc");
        assert_eq!(lines[1], "1,0.010000,1.500000,1.250000,0.500000");
        assert!(lines[2].starts_with("2,0.010000,1.000000,NaN"));
    }
}
