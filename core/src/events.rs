//! Synchronous change-notification bus.
//!
//! Listeners subscribe to an event *kind*, either globally or scoped to one
//! event *source* (e.g. a tree node). Publishing an event first runs the
//! local listeners registered on the event's source, then bubbles the event
//! to the global listeners for its kind.
//!
//! # Ordering
//!
//! Delivery order among listeners registered for the same kind (and, for
//! local listeners, the same source) is unspecified and may differ between
//! runs. Listeners must not depend on each other's side effects. The only
//! ordering guarantee is local-before-global for a single publish.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// An event that can travel through an [`EventBus`].
pub trait BusEvent: 'static {
    /// Discriminant used to route the event to listeners.
    type Kind: Copy + Eq + Hash + fmt::Debug;
    /// Identity of the object the event is about.
    type Source: Copy + Eq + Hash + fmt::Debug;

    /// The routing kind of this event.
    fn kind(&self) -> Self::Kind;

    /// The object this event is scoped to, if any. Events without a source
    /// are delivered to global listeners only.
    fn source(&self) -> Option<Self::Source>;
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A type-erased listener.
type Handler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Where a listener is registered; kept for O(1) unsubscribe.
enum Scope<E: BusEvent> {
    Global(E::Kind),
    Local(E::Source, E::Kind),
}

/// Synchronous observer fan-out keyed by event kind.
pub struct EventBus<E: BusEvent> {
    global: HashMap<E::Kind, HashMap<ListenerId, Handler<E>>>,
    local: HashMap<(E::Source, E::Kind), HashMap<ListenerId, Handler<E>>>,
    scopes: HashMap<ListenerId, Scope<E>>,
    next_id: u64,
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            global: HashMap::new(),
            local: HashMap::new(),
            scopes: HashMap::new(),
            next_id: 0,
        }
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Registers a listener for every event of `kind`.
    pub fn subscribe(
        &mut self,
        kind: E::Kind,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.global
            .entry(kind)
            .or_default()
            .insert(id, Box::new(handler));
        self.scopes.insert(id, Scope::Global(kind));
        id
    }

    /// Registers a listener for events of `kind` whose source is `source`.
    pub fn subscribe_local(
        &mut self,
        source: E::Source,
        kind: E::Kind,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.local
            .entry((source, kind))
            .or_default()
            .insert(id, Box::new(handler));
        self.scopes.insert(id, Scope::Local(source, kind));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let Some(scope) = self.scopes.remove(&id) else {
            return false;
        };
        match scope {
            Scope::Global(kind) => {
                if let Some(handlers) = self.global.get_mut(&kind) {
                    handlers.remove(&id);
                    if handlers.is_empty() {
                        self.global.remove(&kind);
                    }
                }
            }
            Scope::Local(source, kind) => {
                let key = (source, kind);
                if let Some(handlers) = self.local.get_mut(&key) {
                    handlers.remove(&id);
                    if handlers.is_empty() {
                        self.local.remove(&key);
                    }
                }
            }
        }
        true
    }

    /// Delivers `event` to its local listeners, then to global listeners.
    ///
    /// Returns the number of listeners invoked.
    pub fn publish(&self, event: &E) -> usize {
        let kind = event.kind();
        let mut delivered = 0;

        if let Some(source) = event.source()
            && let Some(handlers) = self.local.get(&(source, kind))
        {
            for handler in handlers.values() {
                handler(event);
                delivered += 1;
            }
        }

        if let Some(handlers) = self.global.get(&kind) {
            for handler in handlers.values() {
                handler(event);
                delivered += 1;
            }
        }

        delivered
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if at least one listener could receive `kind`.
    pub fn has_listeners(&self, kind: E::Kind) -> bool {
        self.global.contains_key(&kind) || self.local.keys().any(|(_, k)| *k == kind)
    }

    /// Removes every listener registered on `source`.
    pub fn clear_source(&mut self, source: E::Source) {
        self.local.retain(|(s, _), _| *s != source);
        self.scopes
            .retain(|_, scope| !matches!(scope, Scope::Local(s, _) if *s == source));
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.global.clear();
        self.local.clear();
        self.scopes.clear();
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("global_kinds", &self.global.len())
            .field("local_scopes", &self.local.len())
            .field("listeners", &self.scopes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Added,
        Removed,
    }

    #[derive(Debug)]
    struct Ping {
        kind: Kind,
        source: Option<u32>,
    }

    impl BusEvent for Ping {
        type Kind = Kind;
        type Source = u32;

        fn kind(&self) -> Kind {
            self.kind
        }

        fn source(&self) -> Option<u32> {
            self.source
        }
    }

    fn ping(kind: Kind, source: Option<u32>) -> Ping {
        Ping { kind, source }
    }

    #[test]
    fn global_listener_receives_matching_kind() {
        let mut bus = EventBus::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bus.subscribe(Kind::Added, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(&ping(Kind::Added, None)), 1);
        assert_eq!(bus.publish(&ping(Kind::Removed, None)), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_listener_only_sees_its_source() {
        let mut bus = EventBus::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bus.subscribe_local(7, Kind::Added, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ping(Kind::Added, Some(8)));
        bus.publish(&ping(Kind::Added, None));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.publish(&ping(Kind::Added, Some(7)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_runs_before_bubbling_to_global() {
        let mut bus = EventBus::<Ping>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        bus.subscribe(Kind::Added, move |_| l.lock().unwrap().push("global"));
        let l = log.clone();
        bus.subscribe_local(1, Kind::Added, move |_| l.lock().unwrap().push("local"));

        assert_eq!(bus.publish(&ping(Kind::Added, Some(1))), 2);
        assert_eq!(*log.lock().unwrap(), vec!["local", "global"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = bus.subscribe(Kind::Added, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&ping(Kind::Added, None));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(), 0);
        assert!(!bus.has_listeners(Kind::Added));
    }

    #[test]
    fn clear_source_drops_only_that_source() {
        let mut bus = EventBus::<Ping>::new();
        bus.subscribe_local(1, Kind::Added, |_| {});
        bus.subscribe_local(2, Kind::Added, |_| {});
        bus.subscribe(Kind::Removed, |_| {});

        bus.clear_source(1);
        assert_eq!(bus.listener_count(), 2);
        assert_eq!(bus.publish(&ping(Kind::Added, Some(1))), 0);
        assert_eq!(bus.publish(&ping(Kind::Added, Some(2))), 1);
    }

    /// Listeners accumulate into a commutative sum, so the outcome must not
    /// depend on which order they were registered in.
    #[rstest]
    #[case(&[1, 2, 3])]
    #[case(&[3, 2, 1])]
    #[case(&[2, 3, 1])]
    #[case(&[1, 3, 2])]
    fn outcome_independent_of_registration_order(#[case] weights: &[usize]) {
        let mut bus = EventBus::<Ping>::new();
        let total = Arc::new(AtomicUsize::new(0));
        for &weight in weights {
            let t = total.clone();
            bus.subscribe(Kind::Added, move |_| {
                t.fetch_add(weight, Ordering::SeqCst);
            });
        }

        assert_eq!(bus.publish(&ping(Kind::Added, None)), 3);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn clear_removes_everything() {
        let mut bus = EventBus::<Ping>::new();
        bus.subscribe(Kind::Added, |_| {});
        bus.subscribe_local(4, Kind::Removed, |_| {});
        bus.clear();
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.publish(&ping(Kind::Removed, Some(4))), 0);
    }
}
