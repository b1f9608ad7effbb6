//! Notifications raised by the allocation engine.
//!
//! Events are queued on an [`EventLog`] for the host to drain after each
//! phase, and pushed synchronously to any registered [`EventSubscriber`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activities::{ActivityId, ActivityStatus};
use crate::allocation::{ResourceRequest, ShortfallReason};
use crate::resources::ResourceGroupId;

/// A request that could not be met in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallReport {
    pub date: NaiveDate,
    pub activity: ActivityId,
    pub activity_name: String,
    pub group: ResourceGroupId,
    pub resource: String,
    pub required: f64,
    pub available: f64,
    pub reasons: Vec<ShortfallReason>,
}

impl ShortfallReport {
    pub fn from_request(date: NaiveDate, request: &ResourceRequest) -> Self {
        Self {
            date,
            activity: request.claimant,
            activity_name: request.activity_name.clone(),
            group: request.group,
            resource: request.type_name.clone(),
            required: request.required,
            available: request.available,
            reasons: request.shortfall_reasons.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    Activity,
    Folder,
    Timer,
}

/// An activity (or one of its timers) reached its status for the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedReport {
    pub date: NaiveDate,
    pub node: ActivityId,
    pub name: String,
    pub status: ActivityStatus,
    pub kind: ReportKind,
    /// Depth below the farm container
    pub level: usize,
    pub labour_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FarmEvent {
    ShortfallOccurred(ShortfallReport),
    ActivityPerformed(PerformedReport),
}

/// Receives every event as it is raised.
pub trait EventSubscriber {
    fn on_event(&mut self, event: &FarmEvent);
}

#[derive(Default)]
pub struct EventLog {
    events: Vec<FarmEvent>,
    subscribers: Vec<Box<dyn EventSubscriber>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn raise(&mut self, event: FarmEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.on_event(&event);
        }
        self.events.push(event);
    }

    pub fn shortfall(&mut self, date: NaiveDate, request: &ResourceRequest) {
        self.raise(FarmEvent::ShortfallOccurred(ShortfallReport::from_request(
            date, request,
        )));
    }

    pub fn performed(&mut self, report: PerformedReport) {
        self.raise(FarmEvent::ActivityPerformed(report));
    }

    /// Hand queued events to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<FarmEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending(&self) -> &[FarmEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter(Rc<RefCell<usize>>);

    impl EventSubscriber for Counter {
        fn on_event(&mut self, _event: &FarmEvent) {
            *self.0.borrow_mut() += 1;
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut log = EventLog::new();
        let mut req = ResourceRequest::new(ResourceGroupId::Finance, "Bank", 10.0);
        req.available = 4.0;
        log.shortfall(date(), &req);
        assert_eq!(log.len(), 1);

        let drained = log.drain();
        assert!(log.is_empty());
        match &drained[0] {
            FarmEvent::ShortfallOccurred(r) => {
                assert_eq!(r.resource, "Bank");
                assert_eq!(r.required - r.available, 6.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_subscribers_see_each_event() {
        let seen = Rc::new(RefCell::new(0));
        let mut log = EventLog::new();
        log.subscribe(Box::new(Counter(seen.clone())));
        log.performed(PerformedReport {
            date: date(),
            node: ActivityId(1),
            name: "Feed".into(),
            status: ActivityStatus::Success,
            kind: ReportKind::Activity,
            level: 1,
            labour_cost: 0.0,
        });
        log.drain();
        log.performed(PerformedReport {
            date: date(),
            node: ActivityId(2),
            name: "Muster".into(),
            status: ActivityStatus::Ignored,
            kind: ReportKind::Activity,
            level: 1,
            labour_cost: 0.0,
        });
        assert_eq!(*seen.borrow(), 2);
    }
}
