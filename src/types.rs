// src/types.rs
use crate::drivers::ActivityReader;
use serde::{Deserialize, Serialize};

// One selectable input stream
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: u16,
    pub name: String,
    pub sample_rate_hz: f32,
    pub channel_count: usize,
}

impl StreamInfo {
    pub fn new(id: u16, name: impl Into<String>, sample_rate_hz: f32, channel_count: usize) -> Self {
        Self { id, name: name.into(), sample_rate_hz, channel_count }
    }
}

// GUI -> acquisition engine
#[derive(Clone, Debug)]
pub enum EngineCommand {
    SelectStream(StreamInfo),
    StartAcquisition,
    StopAcquisition,
    Shutdown,
}

// acquisition engine -> GUI
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    // A new aggregator was built; the old reader is stale from here on
    StreamChanged {
        stream: StreamInfo,
        num_channels: usize,
        // native rate after the downsampling skip
        effective_rate_hz: f32,
        reader: ActivityReader,
    },
    Acquiring(bool),
}
