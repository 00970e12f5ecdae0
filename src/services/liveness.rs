//! Backend liveness, advisory only.

use std::fmt;

use tracing::{info, warn};

use super::backend::AnalysisBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Liveness {
    /// Probe not started or still in flight.
    #[default]
    Unknown,
    Up,
    Down,
}

impl Liveness {
    pub fn label(&self) -> &'static str {
        match self {
            Liveness::Unknown => "Syncing",
            Liveness::Up => "Ready",
            Liveness::Down => "Offline",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Liveness::Unknown)
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runs one health probe. Every failure folds into `Down`.
pub async fn probe(backend: &dyn AnalysisBackend) -> Liveness {
    match backend.health().await {
        Ok(true) => {
            info!("Analysis backend is up");
            Liveness::Up
        }
        Ok(false) => {
            warn!("Analysis backend reported not ok");
            Liveness::Down
        }
        Err(e) => {
            warn!(error = %e, "Analysis backend health probe failed");
            Liveness::Down
        }
    }
}
