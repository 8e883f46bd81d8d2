//! Error type for tuning loading and player commands
//!
//! The tick itself never fails; only explicit commands and config loading do.

use thiserror::Error;

use crate::sim::GamePhase;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read tuning file: {0}")]
    TuningIo(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    TuningParse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    InvalidTuning { field: &'static str, reason: String },
    #[error("no upgrade selection pending (phase is {phase:?})")]
    NoUpgradePending { phase: GamePhase },
    #[error("upgrade choice {index} out of range ({available} offered)")]
    ChoiceOutOfRange { index: usize, available: usize },
    #[error("restart is only valid after game over (phase is {phase:?})")]
    RestartWhileAlive { phase: GamePhase },
}
