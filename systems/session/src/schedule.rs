//! Wave pacing between the start countdown, force-advance and completion.

use path_defence_core::SessionRules;

/// Outcome of checking whether the running wave has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    /// The wave is still running, or no wave is in progress.
    Ongoing,
    /// The wave finished and further waves remain.
    Completed,
    /// The final wave finished.
    AllWavesCleared,
}

/// Tracks which wave runs next and when it starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveSchedule {
    total: usize,
    started: usize,
    in_progress: bool,
    start_timer: f32,
    force_timer: f32,
    inter_wave_delay: f32,
    force_after: f32,
}

impl WaveSchedule {
    /// Creates a schedule for `total` waves paced by `rules`.
    #[must_use]
    pub fn new(total: usize, rules: &SessionRules) -> Self {
        Self {
            total,
            started: 0,
            in_progress: false,
            start_timer: rules.first_wave_delay,
            force_timer: 0.0,
            inter_wave_delay: rules.inter_wave_delay,
            force_after: rules.wave_force_after,
        }
    }

    /// Advances both timers by `dt` seconds.
    ///
    /// Returns the index of a wave that must start now. A wave that has run
    /// for longer than the force threshold stops counting as in progress, so
    /// the next one starts on the following call even if enemies remain.
    pub fn advance(&mut self, dt: f32) -> Option<usize> {
        let mut starting = None;
        if !self.in_progress && self.has_remaining() {
            self.start_timer -= dt;
            if self.start_timer <= 0.0 {
                starting = self.begin_next();
            }
        }

        if self.in_progress {
            self.force_timer += dt;
            if self.force_timer >= self.force_after && self.has_remaining() {
                self.start_timer = 0.0;
                self.in_progress = false;
            }
        }
        starting
    }

    /// Starts the next wave immediately, overlapping a running one.
    pub fn skip(&mut self) -> Option<usize> {
        if !self.has_remaining() {
            return None;
        }
        if !self.in_progress {
            self.start_timer = 0.0;
        }
        self.begin_next()
    }

    /// Closes the running wave once nothing is left to spawn or kill.
    pub fn settle(&mut self, spawning: bool, enemies_remaining: usize) -> WaveProgress {
        if !self.in_progress || spawning || enemies_remaining > 0 {
            return WaveProgress::Ongoing;
        }

        self.in_progress = false;
        self.start_timer = self.inter_wave_delay;
        self.force_timer = 0.0;
        if self.has_remaining() {
            WaveProgress::Completed
        } else {
            WaveProgress::AllWavesCleared
        }
    }

    /// Number of waves started so far.
    #[must_use]
    pub fn started(&self) -> usize {
        self.started
    }

    /// Number of waves in the level.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Reports whether a wave is running.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Seconds until the next wave starts while waiting between waves.
    #[must_use]
    pub fn next_wave_in(&self) -> Option<f32> {
        (!self.in_progress && self.has_remaining()).then_some(self.start_timer.max(0.0))
    }

    /// Seconds the running wave has been counted toward force-advance.
    #[must_use]
    pub fn force_elapsed(&self) -> f32 {
        self.force_timer
    }

    fn has_remaining(&self) -> bool {
        self.started < self.total
    }

    fn begin_next(&mut self) -> Option<usize> {
        if !self.has_remaining() {
            return None;
        }
        let index = self.started;
        self.started += 1;
        self.in_progress = true;
        self.force_timer = 0.0;
        Some(index)
    }
}
