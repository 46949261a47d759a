//! Paced playback of a finished trace
//!
//! A spawned task emits the recorded steps one at a time over a bounded
//! channel, sleeping `delay` between steps. Play, pause and stop arrive
//! through a `watch` channel and are only observed between steps, so a
//! consumer always receives whole steps. Playback never re-runs the
//! engine: it only walks the trace.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::execution::trace::{ExecutionTrace, TraceStep};

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    pub delay: Duration,
    /// First step to emit
    pub start_at: usize,
    pub start_paused: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_STEP_DELAY,
            start_at: 0,
            start_paused: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEnd {
    /// Every step up to the end of the trace was emitted
    Finished,
    Stopped,
    /// The consumer or the controller went away
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub emitted: usize,
    pub end: PlaybackEnd,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Running playback: step receiver plus its controls
#[derive(Debug)]
pub struct Playback<S> {
    control: watch::Sender<PlaybackCommand>,
    steps: mpsc::Receiver<S>,
    task: JoinHandle<PlaybackReport>,
}

impl<S: TraceStep + 'static> Playback<S> {
    /// Spawns the playback task on the current tokio runtime
    pub fn start(trace: ExecutionTrace<S>, config: PlaybackConfig) -> Self {
        let initial = if config.start_paused {
            PlaybackCommand::Pause
        } else {
            PlaybackCommand::Play
        };
        let (control, commands) = watch::channel(initial);
        let (sender, steps) = mpsc::channel(1);
        log::debug!(
            "playback of {} ({} steps) from step {}",
            trace.metadata().algorithm,
            trace.len(),
            config.start_at
        );
        let task = tokio::spawn(run(trace, config, commands, sender));
        Self {
            control,
            steps,
            task,
        }
    }

    pub fn play(&self) {
        self.send(PlaybackCommand::Play);
    }

    pub fn pause(&self) {
        self.send(PlaybackCommand::Pause);
    }

    pub fn stop(&self) {
        self.send(PlaybackCommand::Stop);
    }

    fn send(&self, command: PlaybackCommand) {
        if self.control.send(command).is_err() {
            log::trace!("playback already ended, ignoring {command:?}");
        }
    }

    /// Next emitted step; `None` once playback has ended and the
    /// channel is drained
    pub async fn next(&mut self) -> Option<S> {
        self.steps.recv().await
    }

    /// Drains remaining steps and waits for the task's report
    pub async fn finish(mut self) -> Result<PlaybackReport, PlaybackError> {
        self.steps.close();
        while self.steps.recv().await.is_some() {}
        Ok(self.task.await?)
    }
}

async fn run<S: TraceStep>(
    trace: ExecutionTrace<S>,
    config: PlaybackConfig,
    mut commands: watch::Receiver<PlaybackCommand>,
    sender: mpsc::Sender<S>,
) -> PlaybackReport {
    let mut emitted = 0;
    let report = |emitted, end| {
        log::debug!("playback ended after {emitted} steps: {end:?}");
        PlaybackReport { emitted, end }
    };

    for step in trace.steps().iter().skip(config.start_at) {
        // Hold here while paused.
        loop {
            let command = *commands.borrow_and_update();
            match command {
                PlaybackCommand::Play => break,
                PlaybackCommand::Stop => return report(emitted, PlaybackEnd::Stopped),
                PlaybackCommand::Pause => {
                    if commands.changed().await.is_err() {
                        return report(emitted, PlaybackEnd::Disconnected);
                    }
                }
            }
        }

        if sender.send(step.clone()).await.is_err() {
            return report(emitted, PlaybackEnd::Disconnected);
        }
        emitted += 1;
        log::trace!("played {}", step.describe());

        tokio::select! {
            _ = sleep(config.delay) => {}
            changed = commands.changed() => {
                if changed.is_err() {
                    return report(emitted, PlaybackEnd::Disconnected);
                }
            }
        }
    }
    report(emitted, PlaybackEnd::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::path_finding::{GraphSearch, SearchStep, SearchStrategy};
    use crate::algorithm::presets;
    use crate::algorithm::traits::Algorithm;
    use tokio::time::timeout;

    fn trace() -> ExecutionTrace<SearchStep> {
        GraphSearch::new(SearchStrategy::AStar)
            .execute(&presets::weighted_search_problem())
            .unwrap()
            .trace
    }

    fn fast() -> PlaybackConfig {
        PlaybackConfig {
            delay: Duration::from_millis(1),
            ..PlaybackConfig::default()
        }
    }

    #[tokio::test]
    async fn test_plays_every_step_in_order() {
        let trace = trace();
        let expected = trace.len();
        let mut playback = Playback::start(trace, fast());
        let mut indices = Vec::new();
        while let Some(step) = playback.next().await {
            indices.push(step.index());
        }
        assert_eq!(indices, (0..expected).collect::<Vec<_>>());
        let report = playback.finish().await.unwrap();
        assert_eq!(report, PlaybackReport { emitted: expected, end: PlaybackEnd::Finished });
    }

    #[tokio::test]
    async fn test_paused_playback_waits_for_play() {
        let config = PlaybackConfig {
            start_paused: true,
            start_at: 2,
            ..fast()
        };
        let mut playback = Playback::start(trace(), config);
        assert!(timeout(Duration::from_millis(50), playback.next()).await.is_err());

        playback.play();
        let step = playback.next().await.unwrap();
        assert_eq!(step.index(), 2);
    }

    #[tokio::test]
    async fn test_stop_ends_playback_between_steps() {
        let trace = trace();
        let len = trace.len();
        let config = PlaybackConfig {
            delay: Duration::from_millis(200),
            ..PlaybackConfig::default()
        };
        let mut playback = Playback::start(trace, config);
        assert_eq!(playback.next().await.unwrap().index(), 0);
        playback.stop();

        let report = playback.finish().await.unwrap();
        assert_eq!(report.end, PlaybackEnd::Stopped);
        assert!(report.emitted < len);
    }
}
