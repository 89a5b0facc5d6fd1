/// Identifies one hop so an asynchronous completion can be matched to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HopToken(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HopOrigin {
    Jump,
    Confirmed,
    Sequence { index: usize },
}

/// A move to `node_id` the host has to carry out: set the current node,
/// reset the camera to `starting_angle` and load the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub token: HopToken,
    pub node_id: String,
    pub starting_angle: Option<f64>,
    pub origin: HopOrigin,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HopResult {
    Complete,
    /// The host finishes later and reports back through `hop_complete`.
    Pending,
}

pub trait HopHandler {
    fn hop(&mut self, hop: &Hop) -> HopResult;
}

impl<F> HopHandler for F
where
    F: FnMut(&Hop) -> HopResult,
{
    fn hop(&mut self, hop: &Hop) -> HopResult {
        self(hop)
    }
}
