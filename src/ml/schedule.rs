// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// A piecewise-constant schedule: a map from epoch number to
// learning rate. When an epoch listed in the map starts, the
// rate switches to that value and stays there until the next
// listed epoch. Before the first listed epoch the base rate
// applies.
//
// Written on the command line as "epoch:lr" pairs:
//   --lr-schedule "1:0.02,20:0.01,50:0.005"
//
// Epochs are numbered from 1, like the training log.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LrSchedule {
    steps: BTreeMap<usize, f64>,
}

impl LrSchedule {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn with_step(mut self, epoch: usize, lr: f64) -> Self {
        self.steps.insert(epoch, lr);
        self
    }

    /// Learning rate in effect during `epoch`
    pub fn rate_at(&self, epoch: usize, base: f64) -> f64 {
        self.steps
            .range(..=epoch)
            .next_back()
            .map_or(base, |(_, lr)| *lr)
    }
}

impl FromStr for LrSchedule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut schedule = LrSchedule::default();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((epoch, lr)) = part.split_once(':') else {
                bail!("expected 'epoch:lr', got '{part}'");
            };
            let epoch: usize = epoch
                .trim()
                .parse()
                .with_context(|| format!("invalid epoch in '{part}'"))?;
            let lr: f64 = lr
                .trim()
                .parse()
                .with_context(|| format!("invalid learning rate in '{part}'"))?;
            if !(lr > 0.0) {
                bail!("learning rate must be positive in '{part}'");
            }
            schedule.steps.insert(epoch, lr);
        }

        Ok(schedule)
    }
}

impl fmt::Display for LrSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|(epoch, lr)| format!("{epoch}:{lr}"))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
