//! Event dispatcher - the only thing the input consumer ever sees.
//!
//! Session transitions and input arrivals are squeezed into three event
//! kinds and handed to one registered consumer, synchronously, on the
//! caller's context.  Nothing is queued: a slow consumer slows the
//! caller.

use crate::config::MAX_INPUT_REPORT_LEN;
use crate::error::Error;

/// One input report, borrowed for the duration of the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputReport<'a> {
    data: &'a [u8],
    timestamp_ms: u64,
}

impl<'a> InputReport<'a> {
    /// Validate the length the radio stack claims against the payload.
    pub fn new(payload: &'a [u8], length: usize, timestamp_ms: u64) -> Result<Self, Error> {
        if length == 0 || length > payload.len() || length > MAX_INPUT_REPORT_LEN {
            return Err(Error::MalformedReport);
        }
        Ok(Self {
            data: &payload[..length],
            timestamp_ms,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arrival time (ms).
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// The closed event vocabulary delivered to the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HidEvent<'a> {
    Opened { name: &'a str },
    Closed,
    Input(InputReport<'a>),
}

/// Receives dispatched events.
pub trait InputConsumer {
    fn on_event(&mut self, event: HidEvent<'_>);
}

impl<F> InputConsumer for F
where
    F: FnMut(HidEvent<'_>),
{
    fn on_event(&mut self, event: HidEvent<'_>) {
        self(event)
    }
}

/// Holds at most one consumer and enforces event ordering.
#[derive(Default)]
pub struct EventDispatcher<'c> {
    consumer: Option<&'c mut dyn InputConsumer>,
    open: bool,
}

impl<'c> EventDispatcher<'c> {
    pub const fn new() -> Self {
        Self {
            consumer: None,
            open: false,
        }
    }

    /// Install `consumer`, returning the one it replaces.
    pub fn register(
        &mut self,
        consumer: &'c mut dyn InputConsumer,
    ) -> Option<&'c mut dyn InputConsumer> {
        let previous = self.consumer.replace(consumer);
        info!("Input consumer registered (replaced: {})", previous.is_some());
        previous
    }

    pub fn unregister(&mut self) -> Option<&'c mut dyn InputConsumer> {
        self.consumer.take()
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// `true` between `Opened` and `Closed`.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn deliver(&mut self, event: HidEvent<'_>) {
        match self.consumer.as_mut() {
            Some(consumer) => consumer.on_event(event),
            None => trace!("No input consumer registered - event dropped"),
        }
    }

    pub fn opened(&mut self, name: &str) {
        if self.open {
            // Never let the consumer see two overlapping sessions.
            self.closed();
        }
        self.open = true;
        self.deliver(HidEvent::Opened { name });
    }

    pub fn closed(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.deliver(HidEvent::Closed);
    }

    pub fn input(&mut self, report: InputReport<'_>) {
        if !self.open {
            debug!("Input outside an open session - dropped");
            return;
        }
        self.deliver(HidEvent::Input(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::string::{String, ToString};
    use std::vec::Vec;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Opened(String),
        Closed,
        Input(Vec<u8>),
    }

    fn record(log: &RefCell<Vec<Seen>>) -> impl FnMut(HidEvent<'_>) + '_ {
        move |event| {
            log.borrow_mut().push(match event {
                HidEvent::Opened { name } => Seen::Opened(name.to_string()),
                HidEvent::Closed => Seen::Closed,
                HidEvent::Input(r) => Seen::Input(r.data().to_vec()),
            })
        }
    }

    #[test]
    fn report_length_is_validated() {
        let payload = [1u8, 2, 3, 4];
        assert_eq!(InputReport::new(&payload, 3, 7).unwrap().data(), &[1u8, 2, 3]);
        assert_eq!(InputReport::new(&payload, 0, 7), Err(Error::MalformedReport));
        assert_eq!(InputReport::new(&payload, 5, 7), Err(Error::MalformedReport));

        let big = [0u8; MAX_INPUT_REPORT_LEN + 1];
        assert_eq!(
            InputReport::new(&big, MAX_INPUT_REPORT_LEN + 1, 0),
            Err(Error::MalformedReport)
        );
    }

    #[test]
    fn events_reach_registered_consumer_in_order() {
        let log = RefCell::new(Vec::new());
        let mut sink = record(&log);
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(&mut sink);

        let payload = [0x01, 0x05, 0xFB];
        dispatcher.opened("Mouse");
        dispatcher.input(InputReport::new(&payload, 3, 0).unwrap());
        dispatcher.closed();

        assert_eq!(
            *log.borrow(),
            [
                Seen::Opened("Mouse".to_string()),
                Seen::Input(payload.to_vec()),
                Seen::Closed
            ]
        );
    }

    #[test]
    fn input_and_close_without_open_are_suppressed() {
        let log = RefCell::new(Vec::new());
        let mut sink = record(&log);
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(&mut sink);

        dispatcher.input(InputReport::new(&[1, 2, 3], 3, 0).unwrap());
        dispatcher.closed();

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn second_open_is_balanced_with_close() {
        let log = RefCell::new(Vec::new());
        let mut sink = record(&log);
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(&mut sink);

        dispatcher.opened("A");
        dispatcher.opened("B");

        assert_eq!(
            *log.borrow(),
            [
                Seen::Opened("A".to_string()),
                Seen::Closed,
                Seen::Opened("B".to_string())
            ]
        );
    }

    #[test]
    fn register_replaces_previous_consumer() {
        let first = RefCell::new(Vec::new());
        let second = RefCell::new(Vec::new());
        let mut sink1 = record(&first);
        let mut sink2 = record(&second);
        let mut dispatcher = EventDispatcher::new();

        assert!(dispatcher.register(&mut sink1).is_none());
        dispatcher.opened("A");
        assert!(dispatcher.register(&mut sink2).is_some());
        dispatcher.closed();

        assert_eq!(*first.borrow(), [Seen::Opened("A".to_string())]);
        assert_eq!(*second.borrow(), [Seen::Closed]);
    }

    #[test]
    fn events_without_consumer_still_track_session() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.opened("A");
        assert!(dispatcher.is_open());
        dispatcher.closed();
        assert!(!dispatcher.is_open());
        assert!(!dispatcher.has_consumer());
    }
}
