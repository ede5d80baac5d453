//! Simulated charge/measure hardware for tests.
//!
//! Time only moves while the scan flag is polled, one microsecond per poll, so a
//! cycle of `duration` microseconds measures as exactly `duration` when it
//! completes and as exactly the deadline when it is cut short.

use std::collections::VecDeque;

use crate::measurement::{ChannelId, ChargeMeasurement};
use crate::timing;

#[derive(Clone, Copy, Debug)]
pub struct Cycle {
    pub duration: u32,
    pub magnitude: u16,
    /// Move the clock back by this much when the result is read
    pub rewind_on_read: u32,
}

pub struct SimChannel {
    time: u32,
    script: VecDeque<Cycle>,
    idle: Cycle,
    current: Option<(Cycle, u32)>,
    refused: Vec<ChannelId>,
    pub started: Vec<ChannelId>,
}

impl SimChannel {
    /// A channel whose clock starts at `time` and whose every cycle takes
    /// `duration` unless scripted otherwise
    pub fn new(time: u32, duration: u32, magnitude: u16) -> Self {
        Self {
            time,
            script: VecDeque::new(),
            idle: Cycle { duration, magnitude, rewind_on_read: 0 },
            current: None,
            refused: Vec::new(),
            started: Vec::new(),
        }
    }

    /// Queue one cycle ahead of the idle ones
    pub fn then(mut self, duration: u32, magnitude: u16) -> Self {
        self.push(duration, magnitude);
        self
    }

    /// Queue a cycle whose read sends the clock backwards
    pub fn then_rewind(mut self, duration: u32, magnitude: u16, rewind_on_read: u32) -> Self {
        self.script.push_back(Cycle { duration, magnitude, rewind_on_read });
        self
    }

    /// Report `channel` as one the hardware cannot drive
    pub fn refuse(mut self, channel: ChannelId) -> Self {
        self.refused.push(channel);
        self
    }

    pub fn push(&mut self, duration: u32, magnitude: u16) {
        self.script.push_back(Cycle { duration, magnitude, rewind_on_read: 0 });
    }

    /// Change what unscripted cycles look like
    pub fn set_idle(&mut self, duration: u32, magnitude: u16) {
        self.idle = Cycle { duration, magnitude, rewind_on_read: 0 };
    }

    pub fn cycles(&self) -> usize {
        self.started.len()
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    fn finished(&self) -> bool {
        match self.current {
            Some((cycle, start)) => timing::elapsed(start, self.time) >= cycle.duration,
            None => true,
        }
    }
}

impl ChargeMeasurement for SimChannel {
    fn begin_charge(&mut self, channel: ChannelId) {
        let cycle = self.script.pop_front().unwrap_or(self.idle);
        self.current = Some((cycle, self.time));
        self.started.push(channel);
    }

    fn scan_in_progress(&mut self, _channel: ChannelId) -> bool {
        self.time = self.time.wrapping_add(1);
        !self.finished()
    }

    fn read_raw(&mut self, _channel: ChannelId) -> u16 {
        let value = if self.finished() {
            self.current.map(|(c, _)| c.magnitude).unwrap_or(0)
        } else {
            0
        };
        if let Some((cycle, _)) = self.current {
            self.time = self.time.wrapping_sub(cycle.rewind_on_read);
        }
        value
    }

    fn now(&mut self) -> u32 {
        self.time
    }

    fn supports(&self, channel: ChannelId) -> bool {
        !self.refused.contains(&channel)
    }
}
