use crate::model::Cattle;
use std::sync::{Arc, Mutex, Weak};

type Callback = Arc<dyn Fn(&[Cattle]) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Listeners on the cattle collection.
#[derive(Clone, Default)]
pub struct Watchers {
    registry: Arc<Mutex<Registry>>,
}

impl Watchers {
    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Cattle]) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, callback));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Callbacks run after the registry lock is released, so a listener may
    /// unsubscribe itself.
    pub fn notify(&self, cattle: &[Cattle]) {
        let callbacks: Vec<Callback> = lock(&self.registry)
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(cattle);
        }
    }
}

/// Live listener handle. Dropping it detaches the listener.
#[must_use = "dropping a subscription detaches it immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::Watchers;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dropped_subscription_stops_receiving() {
        let watchers = Watchers::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = watchers.add(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        watchers.notify(&[]);
        subscription.unsubscribe();
        watchers.notify(&[]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(watchers.is_empty());
    }

    #[test]
    fn subscriptions_are_independent() {
        let watchers = Watchers::default();
        let first = watchers.add(|_| {});
        let _second = watchers.add(|_| {});

        drop(first);

        assert_eq!(watchers.len(), 1);
    }
}
