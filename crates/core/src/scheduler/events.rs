use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::analytics::aggregator::AggregateStats;
use crate::shared::frame::Frame;

/// Push notifications for the presentation layer.
///
/// The core writes into the channel and never assumes anything about the
/// consumer's thread or drain cadence; marshaling onto a UI context is the
/// consumer's business. A dropped receiver silently ends delivery.
#[derive(Clone, Debug)]
pub enum SchedulerEvent {
    /// Crowd statistics for a completed detection cycle.
    Stats(AggregateStats),
    /// Annotated detection image for a completed cycle (preview enabled).
    Overlay(Arc<Frame>),
    /// The previous overlay is no longer valid and must not be shown.
    OverlayCleared,
}

pub fn event_channel() -> (Sender<SchedulerEvent>, Receiver<SchedulerEvent>) {
    crossbeam_channel::unbounded()
}
