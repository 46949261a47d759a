//! Recorded traces, replay and paced playback
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod history;
pub mod playback;
pub mod trace;

pub use self::history::{ExecutionHistory, HistoryError, Replay, DEFAULT_CHECKPOINT_INTERVAL};
pub use self::playback::{
    Playback, PlaybackCommand, PlaybackConfig, PlaybackEnd, PlaybackError, PlaybackReport,
};
pub use self::trace::{ExecutionTrace, TraceMetadata, TraceStep};
