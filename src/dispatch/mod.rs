//! Event dispatch: typed decoding and subscriber fan-out.
//!
//! The dispatcher owns the [`ParserRegistry`] and two observer lists: exact
//! handlers keyed by `(kind, code)` and debug handlers that see every event.
//! Delivery is a direct synchronous fan-out on the thread that produced the
//! frame; each handler call is individually error-isolated so one failing
//! subscriber can never starve the others or abort dispatch.
//!
//! An optional broadcast tap mirrors every dispatched event into a
//! `tokio::sync::broadcast` channel for stream-based consumers (see
//! [`crate::stream`]); lagging stream subscribers lose events rather than
//! applying back-pressure to the capture path.

mod registry;

pub use registry::{DecodeFn, ParserRegistry};

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::{error, trace};

use crate::decode::{Frame, FrameKind};
use crate::events::{DomainEvent, EventPayload};

/// Capacity of the broadcast tap; lagging stream consumers skip ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Opaque token identifying a registered handler, for unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(&DomainEvent) -> anyhow::Result<()> + Send>;

/// Synchronous event dispatcher with per-handler error isolation.
pub struct Dispatcher {
    registry: ParserRegistry,
    handlers: HashMap<(FrameKind, u16), Vec<(HandlerId, Handler)>>,
    debug_handlers: Vec<(HandlerId, Handler)>,
    next_id: u64,
    tap: broadcast::Sender<DomainEvent>,
}

impl Dispatcher {
    /// Create a dispatcher around an explicitly constructed registry.
    pub fn new(registry: ParserRegistry) -> Self {
        let (tap, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { registry, handlers: HashMap::new(), debug_handlers: Vec::new(), next_id: 0, tap }
    }

    /// Register `handler` for the given kind and codes.
    ///
    /// With `kind == FrameKind::Debug` the handler becomes a catch-all
    /// receiving every event regardless of type or code; any `codes` are
    /// ignored, since decoded frames are never Debug-kind and per-code
    /// Debug keys could not fire. Otherwise the handler fires for each
    /// listed code; handlers for one code run in registration order.
    pub fn register<F>(&mut self, kind: FrameKind, codes: Option<&[u16]>, handler: F) -> HandlerId
    where
        F: Fn(&DomainEvent) -> anyhow::Result<()> + Send + Clone + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        match codes {
            _ if kind == FrameKind::Debug => {
                self.debug_handlers.push((id, Box::new(handler)));
            }
            None => {}
            Some(codes) => {
                for &code in codes {
                    self.handlers
                        .entry((kind, code))
                        .or_default()
                        .push((id, Box::new(handler.clone())));
                }
            }
        }
        id
    }

    /// Remove every registration made under `id`. Returns true when
    /// anything was removed.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        for list in self.handlers.values_mut() {
            let before = list.len();
            list.retain(|(hid, _)| *hid != id);
            removed |= list.len() != before;
        }
        let before = self.debug_handlers.len();
        self.debug_handlers.retain(|(hid, _)| *hid != id);
        removed | (self.debug_handlers.len() != before)
    }

    /// Subscribe a broadcast receiver to every dispatched event.
    pub fn tap(&self) -> broadcast::Receiver<DomainEvent> {
        self.tap.subscribe()
    }

    /// Sender side of the broadcast tap, for handing to streams after the
    /// dispatcher moves into the pipeline task.
    pub fn tap_sender(&self) -> broadcast::Sender<DomainEvent> {
        self.tap.clone()
    }

    /// Decode and deliver one frame, returning the dispatched event.
    pub fn dispatch(&self, frame: Frame) -> DomainEvent {
        let payload = match self.registry.get(frame.kind, frame.code) {
            Some(decode) => decode(&frame),
            None => EventPayload::Raw,
        };

        let event = DomainEvent { code: frame.code, kind: frame.kind, raw: frame.params, payload };

        trace!(kind = ?event.kind, code = event.code, "dispatching event");

        if let Some(list) = self.handlers.get(&(event.kind, event.code)) {
            for (id, handler) in list {
                Self::invoke(*id, handler, &event);
            }
        }
        for (id, handler) in &self.debug_handlers {
            Self::invoke(*id, handler, &event);
        }

        // Err means no stream subscriber right now; that's fine.
        let _ = self.tap.send(event.clone());

        event
    }

    /// Run one handler, logging failures instead of propagating them.
    fn invoke(id: HandlerId, handler: &Handler, event: &DomainEvent) {
        if let Err(e) = handler(event) {
            error!(
                handler = id.0,
                kind = ?event.kind,
                code = event.code,
                error = %e,
                "event handler failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Parameters, Value};
    use crate::events::{Movement, codes};
    use std::sync::{Arc, Mutex};

    fn move_frame() -> Frame {
        let mut params = Parameters::new();
        params.insert(0, Value::Int(11));
        Frame::new(FrameKind::Event, codes::MOVE, params)
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(crate::events::builtin_registry().unwrap())
    }

    #[test]
    fn typed_decoding_keeps_raw_parameters() {
        let dispatcher = dispatcher();
        let event = dispatcher.dispatch(move_frame());

        assert_eq!(event.code, codes::MOVE);
        assert_eq!(event.raw.get(&0), Some(&Value::Int(11)));
        assert_eq!(
            event.payload,
            EventPayload::Movement(Movement { entity_id: 11, ..Movement::default() })
        );
    }

    #[test]
    fn unregistered_code_passes_through_raw() {
        let dispatcher = dispatcher();
        let frame = Frame::new(FrameKind::Event, 999, Parameters::new());
        let event = dispatcher.dispatch(frame);
        assert_eq!(event.payload, EventPayload::Raw);
    }

    #[test]
    fn dispatch_is_idempotent_without_handler_state() {
        let dispatcher = dispatcher();
        let first = dispatcher.dispatch(move_frame());
        let second = dispatcher.dispatch(move_frame());
        assert_eq!(first, second);
    }

    #[test]
    fn failing_handler_does_not_block_the_next() {
        let mut dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        dispatcher.register(FrameKind::Event, Some(&[codes::MOVE]), |_e: &DomainEvent| {
            anyhow::bail!("this handler always fails")
        });

        let seen_ok = Arc::clone(&seen);
        dispatcher.register(FrameKind::Event, Some(&[codes::MOVE]), move |e: &DomainEvent| {
            seen_ok.lock().unwrap().push(e.code);
            Ok(())
        });

        dispatcher.dispatch(move_frame());
        dispatcher.dispatch(move_frame());
        assert_eq!(*seen.lock().unwrap(), vec![codes::MOVE, codes::MOVE]);
    }

    #[test]
    fn debug_handlers_see_every_event() {
        let mut dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_dbg = Arc::clone(&seen);
        dispatcher.register(FrameKind::Debug, None, move |e: &DomainEvent| {
            seen_dbg.lock().unwrap().push((e.kind, e.code));
            Ok(())
        });

        dispatcher.dispatch(move_frame());
        dispatcher.dispatch(Frame::new(FrameKind::Response, 777, Parameters::new()));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(FrameKind::Event, codes::MOVE), (FrameKind::Response, 777)]
        );
    }

    #[test]
    fn debug_registration_with_codes_is_still_a_catch_all() {
        let mut dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_dbg = Arc::clone(&seen);
        dispatcher.register(FrameKind::Debug, Some(&[codes::MOVE]), move |e: &DomainEvent| {
            seen_dbg.lock().unwrap().push((e.kind, e.code));
            Ok(())
        });

        // Events outside the listed code still reach the handler.
        dispatcher.dispatch(move_frame());
        dispatcher.dispatch(Frame::new(FrameKind::Request, codes::MOVE_REQUEST, Parameters::new()));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(FrameKind::Event, codes::MOVE), (FrameKind::Request, codes::MOVE_REQUEST)]
        );
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut dispatcher = dispatcher();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            dispatcher.register(FrameKind::Event, Some(&[codes::MOVE]), move |_e| {
                order.lock().unwrap().push(tag);
                Ok(())
            });
        }

        dispatcher.dispatch(move_frame());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unregister_removes_all_registrations() {
        let mut dispatcher = dispatcher();
        let count = Arc::new(Mutex::new(0usize));

        let c = Arc::clone(&count);
        let id = dispatcher.register(
            FrameKind::Event,
            Some(&[codes::MOVE, codes::LEAVE]),
            move |_e| {
                *c.lock().unwrap() += 1;
                Ok(())
            },
        );

        dispatcher.dispatch(move_frame());
        assert_eq!(*count.lock().unwrap(), 1);

        assert!(dispatcher.unregister(id));
        dispatcher.dispatch(move_frame());
        assert_eq!(*count.lock().unwrap(), 1);

        assert!(!dispatcher.unregister(id));
    }

    #[tokio::test]
    async fn broadcast_tap_mirrors_dispatch() {
        let dispatcher = dispatcher();
        let mut rx = dispatcher.tap();

        let dispatched = dispatcher.dispatch(move_frame());
        let received = rx.recv().await.unwrap();
        assert_eq!(received, dispatched);
    }
}
