//! Active-field state cell

use fieldsage_domain::FieldDescriptor;
use tokio::sync::watch;

/// Remembers the last focused field across message turns.
///
/// Deny-listed fields are stored too; filtering is the reader's job.
#[derive(Debug)]
pub struct ActiveFieldTracker {
    tx: watch::Sender<Option<FieldDescriptor>>,
}

impl Default for ActiveFieldTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveFieldTracker {
    /// Empty tracker
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Current active field
    pub fn get(&self) -> Option<FieldDescriptor> {
        self.tx.borrow().clone()
    }

    /// Record a newly focused field. Returns false when it was already active
    /// with the same value, in which case subscribers are not woken.
    pub fn set(&self, field: FieldDescriptor) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&field) {
                return false;
            }
            *current = Some(field);
            true
        })
    }

    /// Forget the active field
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Receiver woken on every change
    pub fn subscribe(&self) -> watch::Receiver<Option<FieldDescriptor>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_subscribe() {
        let tracker = ActiveFieldTracker::new();
        let mut rx = tracker.subscribe();
        assert!(tracker.get().is_none());

        let field = FieldDescriptor::new("desc", "Description", "");
        assert!(tracker.set(field.clone()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&field));

        // Same field again is not a change
        assert!(!tracker.set(field.clone()));
        assert!(!rx.has_changed().unwrap());

        tracker.clear();
        assert!(tracker.get().is_none());
    }
}
