use foundation::math::stable_total_cmp_f64;
use foundation::time::Millis;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TimerStats {
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
}

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    due: Millis,
    payload: T,
}

/// Virtual-clock timer queue.
///
/// Key properties:
/// - Timers fire in `(due, id)` order, so equal deadlines fire in scheduling order.
/// - Nothing fires until the host calls [`TimerQueue::pop_due`] with the current time.
/// - Cancellation removes the timer outright; a cancelled timer can never fire.
/// - Lifetime counters record scheduled/fired/cancelled timers for diagnostics.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
    stats: TimerStats,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
            stats: TimerStats::default(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry { id, due, payload });
        self.stats.scheduled += 1;
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        self.entries.remove(pos);
        self.stats.cancelled += 1;
        true
    }

    /// Cancels every pending timer and returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        self.stats.cancelled += n as u64;
        n
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.earliest().map(|idx| self.entries[idx].due)
    }

    /// Removes and returns the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerId, T)> {
        let idx = self.earliest()?;
        if self.entries[idx].due.0 > now.0 {
            return None;
        }
        let entry = self.entries.remove(idx);
        self.stats.fired += 1;
        Some((entry.id, entry.payload))
    }

    pub fn stats(&self) -> TimerStats {
        self.stats
    }

    fn earliest(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                stable_total_cmp_f64(a.due.0, b.due.0).then_with(|| a.id.cmp(&b.id))
            })
            .map(|(idx, _)| idx)
    }
}
