/// Event-loop timestamp in milliseconds.
///
/// Everything time dependent (timers, click suppression, frame deltas) takes
/// an explicit `Millis` instead of reading a wall clock, so behaviour can be
/// replayed in tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Millis(pub f64);

impl Millis {
    pub const ZERO: Millis = Millis(0.0);

    pub fn after(self, delay_ms: f64) -> Self {
        Millis(self.0 + delay_ms.max(0.0))
    }

    pub fn since(self, earlier: Millis) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 / 1000.0
    }
}
