use foundation::time::Millis;

/// Frame metadata for the render loop.
///
/// Frames are stamped with the event-loop time handed in by the host, so a
/// recorded sequence of timestamps replays to the same frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Time since the previous frame (milliseconds, 0 for the first frame).
    pub dt_ms: f64,
    /// Event-loop time at the start of the frame.
    pub now: Millis,
}

impl Frame {
    pub fn first(now: Millis) -> Self {
        Self {
            index: 0,
            dt_ms: 0.0,
            now,
        }
    }

    pub fn next(self, now: Millis) -> Self {
        Self {
            index: self.index + 1,
            dt_ms: now.since(self.now),
            now,
        }
    }
}
