#![forbid(unsafe_code)]

//! Media-timing clock.
//!
//! A run's local timeline is derived from the host timeline by
//! `local = (now - begin_time) * speed + time_offset`. Pausing freezes the
//! local time where it stands; scrubbing places it at `duration * percent`
//! past the pause origin; resuming continues forward play from the
//! scrubbed point; reversing plays backward from it. All times are f64
//! seconds on whatever monotonic timeline the director advances.

/// Local-timeline state for one transition run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionClock {
    speed: f64,
    time_offset: f64,
    begin_time: f64,
    paused_time: f64,
}

impl TransitionClock {
    /// A clock playing forward from `now`, local time zero.
    #[must_use]
    pub fn started_at(now: f64) -> Self {
        Self {
            speed: 1.0,
            time_offset: 0.0,
            begin_time: now,
            paused_time: 0.0,
        }
    }

    /// Host time mapped onto the local timeline.
    #[must_use]
    pub fn local_time(&self, now: f64) -> f64 {
        (now - self.begin_time) * self.speed + self.time_offset
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.speed == 0.0
    }

    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.speed < 0.0
    }

    /// Freeze the local timeline where it stands.
    pub fn pause(&mut self, now: f64) {
        self.paused_time = self.local_time(now);
        self.speed = 0.0;
        self.time_offset = self.paused_time;
    }

    /// While paused, place the local timeline `duration * percent` past
    /// the pause origin.
    pub fn scrub(&mut self, duration: f64, percent: f64) {
        self.time_offset = self.paused_time + duration * percent;
    }

    /// Continue forward play from wherever the local timeline stands.
    pub fn resume(&mut self, now: f64) {
        let resume_from = self.time_offset;
        self.speed = 1.0;
        self.time_offset = 0.0;
        self.begin_time = now - resume_from;
        self.paused_time = 0.0;
    }

    /// Play backward from wherever the local timeline stands.
    pub fn reverse(&mut self, now: f64) {
        let at = self.local_time(now);
        self.speed = -1.0;
        self.begin_time = now;
        self.time_offset = at;
    }
}
