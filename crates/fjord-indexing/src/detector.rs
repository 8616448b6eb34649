//! Change detection for live indexing.
//!
//! Entity lifecycle events become index/unindex jobs. The detector never
//! waits for the job to run, and a queue transport outage must not fail the
//! save or delete that triggered it: such errors are swallowed and reported
//! to the operator instead.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use fjord_types::{Job, TypeIdentifier, WorkItem};

use crate::doctype::DocTypeRegistry;
use crate::error::IndexingError;
use crate::notify::Notifier;
use crate::queue::{JobQueue, QueueError};

/// Subject of the notification sent when the queue transport is down.
pub const TRANSPORT_ERROR_SUBJECT: &str = "queue transport error";

/// Live indexing switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveIndexConfig {
    pub enabled: bool,
}

/// Entity lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    PostSave,
    PreDelete,
}

/// The entity an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub doctype: TypeIdentifier,
    pub id: u64,
}

/// A lifecycle event as delivered by the persistence layer.
///
/// Either part may be missing; such events are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub signal: Option<Signal>,
    pub instance: Option<EntityRef>,
}

impl LifecycleEvent {
    pub fn new(signal: Signal, doctype: TypeIdentifier, id: u64) -> Self {
        Self {
            signal: Some(signal),
            instance: Some(EntityRef { doctype, id }),
        }
    }
}

/// What the detector did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorOutcome {
    /// Nothing to do (disabled, incomplete event or type not opted in)
    Ignored,
    /// A job was enqueued
    Enqueued(Job),
    /// The queue transport was down; the operator was notified
    TransportFailed,
}

/// Turns entity lifecycle events into indexing jobs.
pub struct ChangeDetector {
    config: LiveIndexConfig,
    registry: Arc<DocTypeRegistry>,
    queue: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
    live_types: HashSet<TypeIdentifier>,
}

impl ChangeDetector {
    pub fn new(
        config: LiveIndexConfig,
        registry: Arc<DocTypeRegistry>,
        queue: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            registry,
            queue,
            notifier,
            live_types: HashSet::new(),
        }
    }

    /// Opt an entity type into live indexing.
    pub fn register_live_index(&mut self, doctype: TypeIdentifier) -> Result<(), IndexingError> {
        if !self.registry.contains(&doctype) {
            return Err(IndexingError::UnknownDocType(doctype.to_string()));
        }
        debug!(doctype = %doctype, "Registered for live indexing");
        self.live_types.insert(doctype);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Handle one lifecycle event.
    pub fn handle(&self, event: &LifecycleEvent) -> Result<DetectorOutcome, QueueError> {
        let (signal, instance) = match (&event.signal, &event.instance) {
            (Some(signal), Some(instance)) if self.config.enabled => (*signal, instance),
            _ => return Ok(DetectorOutcome::Ignored),
        };
        if !self.live_types.contains(&instance.doctype) {
            return Ok(DetectorOutcome::Ignored);
        }

        let item = WorkItem::new(instance.doctype.clone(), instance.id);
        let job = match signal {
            Signal::PostSave => Job::IndexItem(item),
            Signal::PreDelete => Job::UnindexItem(item),
        };

        match self.queue.enqueue(job.clone()) {
            Ok(()) => Ok(DetectorOutcome::Enqueued(job)),
            Err(err) if err.is_transport_unavailable() => {
                warn!(
                    doctype = %instance.doctype,
                    entity_id = instance.id,
                    error = %err,
                    "Could not enqueue live indexing job"
                );
                self.notifier.notify(TRANSPORT_ERROR_SUBJECT, &err.to_string());
                Ok(DetectorOutcome::TransportFailed)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, response_type, RecordingNotifier, RecordingQueue};

    fn detector(
        enabled: bool,
        queue: Arc<RecordingQueue>,
        notifier: Arc<RecordingNotifier>,
    ) -> ChangeDetector {
        let mut detector =
            ChangeDetector::new(LiveIndexConfig { enabled }, registry(), queue, notifier);
        detector.register_live_index(response_type()).unwrap();
        detector
    }

    #[test]
    fn test_save_and_delete_enqueue_one_job_each() {
        let queue = Arc::new(RecordingQueue::default());
        let detector = detector(true, queue.clone(), Arc::default());

        detector
            .handle(&LifecycleEvent::new(Signal::PostSave, response_type(), 7))
            .unwrap();
        detector
            .handle(&LifecycleEvent::new(Signal::PreDelete, response_type(), 7))
            .unwrap();

        assert_eq!(
            queue.immediate(),
            vec![
                Job::IndexItem(WorkItem::new(response_type(), 7)),
                Job::UnindexItem(WorkItem::new(response_type(), 7)),
            ]
        );
    }

    #[test]
    fn test_disabled_enqueues_nothing() {
        let queue = Arc::new(RecordingQueue::default());
        let detector = detector(false, queue.clone(), Arc::default());

        let outcome = detector
            .handle(&LifecycleEvent::new(Signal::PostSave, response_type(), 7))
            .unwrap();
        assert_eq!(outcome, DetectorOutcome::Ignored);
        assert!(queue.immediate().is_empty());
    }

    #[test]
    fn test_incomplete_events_ignored() {
        let queue = Arc::new(RecordingQueue::default());
        let detector = detector(true, queue.clone(), Arc::default());

        let no_instance = LifecycleEvent {
            signal: Some(Signal::PostSave),
            instance: None,
        };
        let no_signal = LifecycleEvent {
            signal: None,
            instance: Some(EntityRef {
                doctype: response_type(),
                id: 1,
            }),
        };
        assert_eq!(detector.handle(&no_instance).unwrap(), DetectorOutcome::Ignored);
        assert_eq!(detector.handle(&no_signal).unwrap(), DetectorOutcome::Ignored);
        assert!(queue.immediate().is_empty());
    }

    #[test]
    fn test_type_not_opted_in_ignored() {
        let queue = Arc::new(RecordingQueue::default());
        let detector = ChangeDetector::new(
            LiveIndexConfig { enabled: true },
            registry(),
            queue.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        let outcome = detector
            .handle(&LifecycleEvent::new(Signal::PostSave, response_type(), 1))
            .unwrap();
        assert_eq!(outcome, DetectorOutcome::Ignored);
    }

    #[test]
    fn test_register_unknown_type_rejected() {
        let mut detector = ChangeDetector::new(
            LiveIndexConfig { enabled: true },
            registry(),
            Arc::new(RecordingQueue::default()),
            Arc::new(RecordingNotifier::default()),
        );
        assert!(detector
            .register_live_index("feedback.survey".parse().unwrap())
            .is_err());
    }

    #[test]
    fn test_transport_failure_swallowed_with_one_notification() {
        let queue = Arc::new(RecordingQueue::failing(|| {
            QueueError::TransportUnavailable("connection refused".to_string())
        }));
        let notifier = Arc::new(RecordingNotifier::default());
        let detector = detector(true, queue, notifier.clone());

        let outcome = detector
            .handle(&LifecycleEvent::new(Signal::PostSave, response_type(), 3))
            .unwrap();
        assert_eq!(outcome, DetectorOutcome::TransportFailed);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "queue transport error");
        assert!(sent[0].1.contains("connection refused"));
    }

    #[test]
    fn test_other_failures_propagate_without_notification() {
        let queue = Arc::new(RecordingQueue::failing(|| {
            QueueError::Rejected("payload too large".to_string())
        }));
        let notifier = Arc::new(RecordingNotifier::default());
        let detector = detector(true, queue, notifier.clone());

        let err = detector
            .handle(&LifecycleEvent::new(Signal::PreDelete, response_type(), 3))
            .unwrap_err();
        assert!(matches!(err, QueueError::Rejected(msg) if msg == "payload too large"));
        assert!(notifier.sent().is_empty());
    }
}
