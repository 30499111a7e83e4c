// src/engine.rs
use crate::config::ViewerConfig;
use crate::drivers::{ActivityPipeline, GridViewerError, SimulatedSource};
use crate::types::*;
use anyhow::Context;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// idle wait between command polls when not acquiring
const IDLE_POLL: Duration = Duration::from_millis(50);

pub fn spawn_thread(
    config: ViewerConfig,
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<EngineCommand>,
) -> anyhow::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("acquisition".to_owned())
        .spawn(move || {
            let mut engine = AcquisitionEngine::new(config, tx);
            engine.send_log("Acquisition engine ready.");
            engine.run(rx_cmd);
            log::info!("acquisition engine stopped");
        })
        .context("failed to spawn acquisition thread")
}

/// Producer schedule: owns the pipeline (and so the aggregator) for the selected stream.
struct AcquisitionEngine {
    config: ViewerConfig,
    tx: Sender<EngineMessage>,
    pipeline: Option<ActivityPipeline<SimulatedSource>>,
    is_acquiring: bool,
    next_block_at: Instant,
}

impl AcquisitionEngine {
    fn new(config: ViewerConfig, tx: Sender<EngineMessage>) -> Self {
        Self {
            config,
            tx,
            pipeline: None,
            is_acquiring: false,
            next_block_at: Instant::now(),
        }
    }

    fn run(&mut self, rx_cmd: Receiver<EngineCommand>) {
        loop {
            // 1. wait for a command until the next block is due; commands interrupt the wait
            let wait = if self.is_acquiring {
                self.next_block_at.saturating_duration_since(Instant::now())
            } else {
                IDLE_POLL
            };
            match rx_cmd.recv_timeout(wait) {
                Ok(EngineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    self.stop_acquisition();
                    return;
                }
                Ok(cmd) => {
                    self.handle_command(cmd);
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            // 2. one block of data
            if self.is_acquiring {
                self.pump_block();
            }
        }
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SelectStream(stream) => self.select_stream(stream),
            EngineCommand::StartAcquisition => self.start_acquisition(),
            EngineCommand::StopAcquisition => self.stop_acquisition(),
            EngineCommand::Shutdown => {}
        }
    }

    fn select_stream(&mut self, stream: StreamInfo) {
        if self.is_acquiring {
            self.send_log("Stop acquisition before switching streams.");
            return;
        }
        let source = SimulatedSource::new(stream.clone(), self.config.block_size);
        match ActivityPipeline::new(
            source,
            stream.clone(),
            self.config.update_interval,
            self.config.target_sample_rate_hz,
        ) {
            Ok(pipeline) => {
                let num_channels = pipeline.num_channels();
                let effective_rate_hz = pipeline.effective_rate_hz();
                self.send_log(&format!(
                    "Stream '{}': {} Hz, {} channels (tracking {}), skip {} -> {:.0} Hz",
                    stream.name,
                    stream.sample_rate_hz,
                    stream.channel_count,
                    num_channels,
                    pipeline.skip(),
                    effective_rate_hz
                ));
                self.tx
                    .send(EngineMessage::StreamChanged {
                        stream,
                        num_channels,
                        effective_rate_hz,
                        reader: pipeline.reader(),
                    })
                    .ok();
                self.pipeline = Some(pipeline);
            }
            Err(err) => self.report(&err),
        }
    }

    fn start_acquisition(&mut self) {
        if self.is_acquiring {
            return;
        }
        let Some(pipeline) = &mut self.pipeline else {
            self.send_log("No stream selected.");
            return;
        };
        pipeline.reset();
        self.is_acquiring = true;
        self.next_block_at = Instant::now();
        self.tx.send(EngineMessage::Acquiring(true)).ok();
        self.send_log("Acquisition started.");
    }

    fn stop_acquisition(&mut self) {
        if !self.is_acquiring {
            return;
        }
        self.is_acquiring = false;
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.reset();
        }
        self.tx.send(EngineMessage::Acquiring(false)).ok();
        self.send_log("Acquisition stopped.");
    }

    fn pump_block(&mut self) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };
        // the next block is due once this one has played out at the native rate
        let block_duration = match pipeline.pump_once() {
            Ok(Some(block)) => {
                log::trace!("block settled {} windows", block.settled);
                block.duration
            }
            Ok(None) => {
                log::debug!("source returned no data");
                IDLE_POLL
            }
            Err(err) => {
                self.report(&err);
                self.stop_acquisition();
                return;
            }
        };
        self.next_block_at += block_duration;
        // fell behind (e.g. a slow block); resync instead of bursting
        let now = Instant::now();
        if self.next_block_at + block_duration < now {
            self.next_block_at = now;
        }
    }

    fn report(&self, err: &GridViewerError) {
        log::warn!("{err}");
        self.tx.send(EngineMessage::Log(format!("Error: {err}"))).ok();
    }

    fn send_log(&self, msg: &str) {
        log::info!("{msg}");
        self.tx.send(EngineMessage::Log(msg.to_owned())).ok();
    }
}
