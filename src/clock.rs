#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Stopped or paused, nothing counted.
    Idle,
    Running { remaining: u64 },
    /// Time ran out on the turn the clock was armed for.
    Expired { turn: u64 },
}

/// Per-turn countdown in whole seconds, ticked once per second by an outside scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnClock {
    remaining: u64,
    turn: u64,
    running: bool,
    paused: bool,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the clock for `turn` with `seconds` on it.
    pub fn start(&mut self, turn: u64, seconds: u64) {
        self.turn = turn;
        self.remaining = seconds;
        self.running = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_low(&self, threshold: u64) -> bool {
        self.running && self.remaining > 0 && self.remaining <= threshold
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running || self.paused {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return Tick::Expired { turn: self.turn };
        }
        Tick::Running {
            remaining: self.remaining,
        }
    }
}
