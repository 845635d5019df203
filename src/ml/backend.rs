// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The model code is generic over Burn's Backend trait; this
// is the one place that names concrete backends.
//
//   ndarray — CPU, always available
//   wgpu    — GPU through WebGPU (Vulkan / Metal / DX12)
//
// Training wraps either one in Autodiff for gradients.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub type CpuBackend = burn::backend::NdArray;
pub type GpuBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ndarray,
    Wgpu,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ndarray" | "cpu" => Ok(Self::Ndarray),
            "wgpu" | "gpu"    => Ok(Self::Wgpu),
            other => bail!("unknown backend '{other}' (expected ndarray or wgpu)"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ndarray => write!(f, "ndarray"),
            Self::Wgpu    => write!(f, "wgpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_aliases() {
        assert_eq!("CPU".parse::<BackendKind>().unwrap(), BackendKind::Ndarray);
        assert_eq!("wgpu".parse::<BackendKind>().unwrap(), BackendKind::Wgpu);
        assert!("cuda".parse::<BackendKind>().is_err());
    }
}
