use std::rc::Rc;

use formats::{DirectionKey, PlaybackConfig};
use foundation::time::Millis;
use graph::{EdgeTarget, LocationGraph};
use runtime::{TimerId, TimerQueue, TimerStats};
use tracing::debug;

use crate::confirm::PendingMove;
use crate::error::{ConfirmError, NavigationError};
use crate::hop::{Hop, HopHandler, HopOrigin, HopResult, HopToken};
use crate::playback::{EngineState, Progress, Speed};

/// Observable transitions, drained by the host after each call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SequenceStarted { total: usize },
    Hopped { node_id: String, origin: HopOrigin },
    Paused,
    Resumed,
    SequenceFinished,
    SequenceCancelled,
    ConfirmationRequested(PendingMove),
    ConfirmationClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowOutcome {
    /// No usable edge in that direction.
    NoEdge,
    Moved { destination: String },
    /// Several destinations; a confirmation asking for a choice was opened.
    ChoiceRequired(PendingMove),
}

#[derive(Debug, Copy, Clone)]
struct HopTimer {
    index: usize,
    due: Millis,
}

#[derive(Debug, Copy, Clone)]
struct Awaiting {
    token: HopToken,
    origin: HopOrigin,
}

/// Owns the current node and drives every move.
///
/// Key properties:
/// - At most one hop timer exists; every control clears it before scheduling.
/// - A hop whose handler reports `Pending` blocks the sequence until
///   `hop_complete` brings back its token. Tokens of interrupted hops are ignored.
/// - Time only advances through [`NavigationEngine::tick`].
#[derive(Debug)]
pub struct NavigationEngine {
    graph: Rc<LocationGraph>,
    playback: PlaybackConfig,
    speed: Speed,
    state: EngineState,
    current: Option<String>,
    path: Vec<String>,
    next_index: usize,
    timers: TimerQueue<HopTimer>,
    timer: Option<TimerId>,
    awaiting: Option<Awaiting>,
    next_token: u64,
    clock: Millis,
    confirmation: Option<PendingMove>,
    events: Vec<EngineEvent>,
}

impl NavigationEngine {
    pub fn new(graph: Rc<LocationGraph>, playback: PlaybackConfig) -> Self {
        Self {
            graph,
            playback,
            speed: Speed::default(),
            state: EngineState::Idle,
            current: None,
            path: Vec::new(),
            next_index: 0,
            timers: TimerQueue::new(),
            timer: None,
            awaiting: None,
            next_token: 0,
            clock: Millis::ZERO,
            confirmation: None,
            events: Vec::new(),
        }
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn clock(&self) -> Millis {
        self.clock
    }

    pub fn pending_confirmation(&self) -> Option<&PendingMove> {
        self.confirmation.as_ref()
    }

    /// Timers currently scheduled; never more than one.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_hop_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timers.stats()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_sequence_active(&self) -> bool {
        matches!(
            self.state,
            EngineState::Sequential | EngineState::SequentialPaused
        )
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current_index: if self.path.is_empty() {
                None
            } else {
                self.next_index.checked_sub(1)
            },
            total_steps: self.path.len(),
            active: self.is_sequence_active(),
            paused: self.state == EngineState::SequentialPaused,
            speed: self.speed,
        }
    }

    /// Direct jump. Unknown ids are ignored; a running sequence is cancelled.
    pub fn jump_to(&mut self, node_id: &str, handler: &mut impl HopHandler) -> bool {
        self.go(node_id, HopOrigin::Jump, handler)
    }

    /// Follows `direction` from the current node. A single destination moves
    /// right away; several open a confirmation that needs a choice.
    pub fn follow(&mut self, direction: DirectionKey, handler: &mut impl HopHandler) -> FollowOutcome {
        let Some(current) = self.current.clone() else {
            return FollowOutcome::NoEdge;
        };
        match self.graph.resolve_edge(&current, direction) {
            None => FollowOutcome::NoEdge,
            Some(EdgeTarget::One(destination)) => {
                self.go(&destination, HopOrigin::Jump, handler);
                FollowOutcome::Moved { destination }
            }
            Some(EdgeTarget::Many(destinations)) => {
                let pending = PendingMove {
                    direction: Some(direction),
                    destinations,
                };
                self.request_confirmation(pending.clone());
                FollowOutcome::ChoiceRequired(pending)
            }
        }
    }

    /// Opens (or replaces) the confirmation gate. Moves without any
    /// destination are refused.
    pub fn request_confirmation(&mut self, pending: PendingMove) -> bool {
        if pending.destinations.is_empty() {
            return false;
        }
        debug!(destinations = ?pending.destinations, "confirmation requested");
        self.events
            .push(EngineEvent::ConfirmationRequested(pending.clone()));
        self.confirmation = Some(pending);
        true
    }

    /// Approves the pending move. `choice` picks among several destinations
    /// and may be omitted when there is only one.
    pub fn confirm(
        &mut self,
        choice: Option<&str>,
        handler: &mut impl HopHandler,
    ) -> Result<String, ConfirmError> {
        let pending = self
            .confirmation
            .as_ref()
            .ok_or(ConfirmError::NothingPending)?;
        let destination = match choice {
            Some(choice) if pending.destinations.iter().any(|d| d == choice) => choice.to_string(),
            Some(choice) => {
                return Err(ConfirmError::InvalidChoice {
                    choice: choice.to_string(),
                });
            }
            None if pending.is_ambiguous() => {
                return Err(ConfirmError::ChoiceRequired {
                    options: pending.destinations.clone(),
                });
            }
            None => pending
                .destinations
                .first()
                .cloned()
                .ok_or(ConfirmError::NothingPending)?,
        };
        if !self.go(&destination, HopOrigin::Confirmed, handler) {
            return Err(ConfirmError::InvalidChoice {
                choice: destination,
            });
        }
        Ok(destination)
    }

    pub fn dismiss_confirmation(&mut self) -> bool {
        self.close_confirmation()
    }

    /// Starts autoplay of `path`. The first hop fires after one delay.
    pub fn start_navigation(&mut self, path: Vec<String>) -> Result<(), NavigationError> {
        if path.is_empty() {
            return Err(NavigationError::EmptyPath);
        }
        if let Some(unknown) = path.iter().find(|id| !self.graph.contains(id)) {
            return Err(NavigationError::UnknownNode {
                id: unknown.clone(),
            });
        }
        if self.is_sequence_active() {
            self.end_sequence(EngineEvent::SequenceCancelled);
        }
        self.awaiting = None;
        debug!(steps = path.len(), speed = %self.speed, "sequence started");
        self.events
            .push(EngineEvent::SequenceStarted { total: path.len() });
        self.path = path;
        self.next_index = 0;
        self.state = EngineState::Sequential;
        self.schedule_next(self.clock);
        Ok(())
    }

    pub fn pause(&mut self) -> bool {
        if self.state != EngineState::Sequential {
            return false;
        }
        self.clear_timer();
        self.state = EngineState::SequentialPaused;
        self.events.push(EngineEvent::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != EngineState::SequentialPaused {
            return false;
        }
        self.state = EngineState::Sequential;
        self.events.push(EngineEvent::Resumed);
        if self.awaiting.is_none() {
            self.continue_sequence(self.clock);
        }
        true
    }

    /// Visits the next path element now, without waiting for the timer.
    pub fn step_forward(&mut self, handler: &mut impl HopHandler) -> bool {
        if !self.is_sequence_active() || self.next_index >= self.path.len() {
            return false;
        }
        self.hop_to_index(self.next_index, handler);
        true
    }

    /// Revisits the previous path element.
    pub fn step_backward(&mut self, handler: &mut impl HopHandler) -> bool {
        if !self.is_sequence_active() || self.next_index < 2 {
            return false;
        }
        self.hop_to_index(self.next_index - 2, handler);
        true
    }

    /// Jumps to the last path element and ends the sequence.
    pub fn skip_to_end(&mut self, handler: &mut impl HopHandler) -> bool {
        if !self.is_sequence_active() {
            return false;
        }
        let Some(last) = self.path.len().checked_sub(1) else {
            return false;
        };
        self.clear_timer();
        self.next_index = self.path.len();
        let node_id = self.path[last].clone();
        self.perform(&node_id, HopOrigin::Sequence { index: last }, handler);
        self.end_sequence(EngineEvent::SequenceFinished);
        true
    }

    /// Returns to `Idle` from any active state. Pending hops become inert.
    pub fn cancel_navigation(&mut self) -> bool {
        match self.state {
            EngineState::Idle => false,
            EngineState::Navigating => {
                self.awaiting = None;
                self.state = EngineState::Idle;
                true
            }
            EngineState::Sequential | EngineState::SequentialPaused => {
                self.end_sequence(EngineEvent::SequenceCancelled);
                true
            }
        }
    }

    /// Goes back to the first path element and keeps playing from there.
    pub fn restart_navigation(&mut self, handler: &mut impl HopHandler) -> bool {
        if !self.is_sequence_active() {
            return false;
        }
        self.awaiting = None;
        self.state = EngineState::Sequential;
        self.hop_to_index(0, handler);
        true
    }

    /// Changes the delay preset. A running countdown is rescheduled with the
    /// new delay, counted from now. Returns whether that happened.
    pub fn set_speed(&mut self, speed: Speed) -> bool {
        self.speed = speed;
        if self.state != EngineState::Sequential || self.timer.is_none() {
            return false;
        }
        debug!(%speed, "rescheduling next hop");
        self.schedule_next(self.clock);
        true
    }

    /// Advances the virtual clock and fires due hops.
    pub fn tick(&mut self, now: Millis, handler: &mut impl HopHandler) {
        if now > self.clock {
            self.clock = now;
        }
        while let Some((id, timer)) = self.timers.pop_due(now) {
            if self.timer == Some(id) {
                self.timer = None;
            }
            if self.state != EngineState::Sequential || timer.index >= self.path.len() {
                continue;
            }
            self.next_index = timer.index + 1;
            let node_id = self.path[timer.index].clone();
            let origin = HopOrigin::Sequence { index: timer.index };
            if self.perform(&node_id, origin, handler) == HopResult::Complete {
                self.continue_sequence(timer.due);
            }
        }
    }

    /// Reports that the hop identified by `token` finished. Unknown or
    /// outdated tokens are ignored.
    pub fn hop_complete(&mut self, token: HopToken) -> bool {
        let Some(awaiting) = self.awaiting else {
            return false;
        };
        if awaiting.token != token {
            debug!(token = token.0, "ignoring completion of an interrupted hop");
            return false;
        }
        self.awaiting = None;
        match awaiting.origin {
            HopOrigin::Sequence { .. } => {
                if self.state == EngineState::Sequential {
                    self.continue_sequence(self.clock);
                } else if self.state == EngineState::SequentialPaused
                    && self.next_index >= self.path.len()
                {
                    self.end_sequence(EngineEvent::SequenceFinished);
                }
            }
            HopOrigin::Jump | HopOrigin::Confirmed => {
                if self.state == EngineState::Navigating {
                    self.state = EngineState::Idle;
                }
            }
        }
        true
    }

    fn go(&mut self, node_id: &str, origin: HopOrigin, handler: &mut impl HopHandler) -> bool {
        if !self.graph.contains(node_id) {
            debug!(node = node_id, "ignoring move to unknown node");
            return false;
        }
        if self.is_sequence_active() {
            self.end_sequence(EngineEvent::SequenceCancelled);
        }
        self.state = EngineState::Navigating;
        if self.perform(node_id, origin, handler) == HopResult::Complete {
            self.state = EngineState::Idle;
        }
        true
    }

    fn hop_to_index(&mut self, index: usize, handler: &mut impl HopHandler) {
        self.clear_timer();
        self.next_index = index + 1;
        let node_id = self.path[index].clone();
        if self.perform(&node_id, HopOrigin::Sequence { index }, handler) == HopResult::Complete {
            self.after_manual_step();
        }
    }

    fn after_manual_step(&mut self) {
        match self.state {
            EngineState::Sequential => self.continue_sequence(self.clock),
            EngineState::SequentialPaused if self.next_index >= self.path.len() => {
                self.end_sequence(EngineEvent::SequenceFinished)
            }
            _ => {}
        }
    }

    fn perform(&mut self, node_id: &str, origin: HopOrigin, handler: &mut impl HopHandler) -> HopResult {
        // A pending move belongs to the node being left.
        self.close_confirmation();
        let token = HopToken(self.next_token);
        self.next_token += 1;
        let hop = Hop {
            token,
            node_id: node_id.to_string(),
            starting_angle: self.graph.get_node(node_id).and_then(|n| n.starting_angle),
            origin,
        };
        self.current = Some(hop.node_id.clone());
        self.events.push(EngineEvent::Hopped {
            node_id: hop.node_id.clone(),
            origin,
        });
        debug!(node = node_id, ?origin, "hop");

        let result = handler.hop(&hop);
        self.awaiting = match result {
            HopResult::Complete => None,
            HopResult::Pending => Some(Awaiting { token, origin }),
        };
        result
    }

    /// After a sequence hop finished at `from`: end or wait for the next one.
    fn continue_sequence(&mut self, from: Millis) {
        if self.next_index >= self.path.len() {
            self.end_sequence(EngineEvent::SequenceFinished);
        } else {
            self.schedule_next(from);
        }
    }

    fn schedule_next(&mut self, from: Millis) {
        self.clear_timer();
        let due = from.after(self.speed.delay_ms(&self.playback));
        let index = self.next_index;
        self.timer = Some(self.timers.schedule(due, HopTimer { index, due }));
    }

    fn clear_timer(&mut self) {
        if let Some(id) = self.timer.take() {
            self.timers.cancel(id);
        }
    }

    fn end_sequence(&mut self, event: EngineEvent) {
        self.clear_timer();
        self.awaiting = None;
        self.path.clear();
        self.next_index = 0;
        self.state = EngineState::Idle;
        debug!(?event, "sequence ended");
        self.events.push(event);
    }

    fn close_confirmation(&mut self) -> bool {
        if self.confirmation.take().is_some() {
            self.events.push(EngineEvent::ConfirmationClosed);
            true
        } else {
            false
        }
    }
}
