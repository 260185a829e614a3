//! The single "currently focused item" index and its subscribers.
//!
//! Each item owns a region on a line (progress space for scrubbed sections,
//! document pixels for stacked ones). A probe on the same line selects the
//! first region containing it, or the nearest region when it falls in a gap
//! or beyond either end. Changes are delivered to subscribers synchronously,
//! before [`ActiveBroadcaster::update`] returns.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::registration::Revertible;
use crate::scroll::Direction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveConfig {
    /// Reference line for stacked sections, as a fraction of viewport
    /// height from the top.
    pub reference_ratio: f64,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            reference_ratio: 0.5,
        }
    }
}

/// Half-open interval `[start, end)` on the probe's axis, owned by the
/// item `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Region {
    pub fn new(index: usize, start: f64, end: f64) -> Self {
        Self { index, start, end }
    }

    pub fn contains(&self, probe: f64) -> bool {
        probe >= self.start && probe < self.end
    }

    /// Distance from the probe to the nearest point of the region.
    pub fn distance(&self, probe: f64) -> f64 {
        if probe < self.start {
            self.start - probe
        } else if probe >= self.end {
            probe - self.end
        } else {
            0.0
        }
    }
}

/// The item index of the region the probe selects. Regions are tried in
/// slice order. `None` only when there are no regions.
pub fn resolve_active(probe: f64, regions: &[Region]) -> Option<usize> {
    if let Some(hit) = regions.iter().find(|r| r.contains(probe)) {
        return Some(hit.index);
    }
    regions
        .iter()
        .fold(None, |best: Option<(usize, f64)>, r| {
            let d = r.distance(probe);
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((r.index, d)),
            }
        })
        .map(|(index, _)| index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Reached scrolling forward.
    Enter,
    /// Reached scrolling backward.
    EnterBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveChange {
    pub previous: Option<usize>,
    pub current: usize,
    pub trigger: Trigger,
}

type Listener = Box<dyn FnMut(&ActiveChange)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
pub struct ActiveBroadcaster {
    current: Option<usize>,
    listeners: Rc<RefCell<Listeners>>,
}

impl ActiveBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Recompute from `probe` and publish if the index changed.
    pub fn update(
        &mut self,
        probe: f64,
        regions: &[Region],
        direction: Direction,
    ) -> Option<ActiveChange> {
        let next = resolve_active(probe, regions)?;
        if self.current == Some(next) {
            return None;
        }
        let change = ActiveChange {
            previous: self.current,
            current: next,
            trigger: match direction {
                Direction::Forward => Trigger::Enter,
                Direction::Backward => Trigger::EnterBack,
            },
        };
        self.current = Some(next);
        tracing::debug!(
            previous = ?change.previous,
            current = change.current,
            trigger = ?change.trigger,
            "active index changed"
        );
        self.publish(&change);
        Some(change)
    }

    /// Forget the current index without notifying (the owning section's
    /// items were torn down).
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Register a listener. Subscribing from inside a listener is refused
    /// and yields an inactive handle.
    pub fn subscribe(&self, listener: impl FnMut(&ActiveChange) + 'static) -> Subscription {
        let Ok(mut listeners) = self.listeners.try_borrow_mut() else {
            tracing::warn!("subscribe during publish ignored");
            return Subscription {
                id: u64::MAX,
                listeners: Weak::new(),
            };
        };
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Box::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .try_borrow()
            .map_or(0, |listeners| listeners.entries.len())
    }

    fn publish(&self, change: &ActiveChange) {
        match self.listeners.try_borrow_mut() {
            Ok(mut listeners) => {
                for (_, listener) in listeners.entries.iter_mut() {
                    listener(change);
                }
            }
            Err(_) => tracing::warn!("re-entrant active index publish skipped"),
        }
    }
}

impl fmt::Debug for ActiveBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveBroadcaster")
            .field("current", &self.current)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to one subscription. Dropping or reverting it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .and_then(|l| {
                l.try_borrow()
                    .ok()
                    .map(|l| l.entries.iter().any(|(id, _)| *id == self.id))
            })
            .unwrap_or(false)
    }
}

impl Revertible for Subscription {
    fn revert(&mut self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        match listeners.try_borrow_mut() {
            Ok(mut listeners) => listeners.entries.retain(|(id, _)| *id != self.id),
            Err(_) => tracing::warn!(id = self.id, "unsubscribe during publish ignored"),
        }
        self.listeners = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.revert();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<Region> {
        vec![
            Region::new(0, 0.12, 0.32),
            Region::new(1, 0.37, 0.57),
            Region::new(2, 0.62, 0.82),
            Region::new(3, 0.87, 1.0),
        ]
    }

    #[test]
    fn containing_region_wins() {
        assert_eq!(resolve_active(0.2, &regions()), Some(0));
        assert_eq!(resolve_active(0.4, &regions()), Some(1));
    }

    #[test]
    fn gaps_and_ends_pick_nearest() {
        assert_eq!(resolve_active(0.0, &regions()), Some(0));
        assert_eq!(resolve_active(0.33, &regions()), Some(0));
        assert_eq!(resolve_active(0.36, &regions()), Some(1));
        assert_eq!(resolve_active(1.0, &regions()), Some(3));
        assert_eq!(resolve_active(0.5, &[]), None);
    }

    #[test]
    fn ties_go_to_the_earlier_region() {
        let regions = [Region::new(0, 0.0, 1.0), Region::new(1, 2.0, 3.0)];
        assert_eq!(resolve_active(1.5, &regions), Some(0));
    }

    #[test]
    fn reports_the_region_owner() {
        // Item 1 was skipped; the second region belongs to item 2.
        let regions = [Region::new(0, 0.0, 1.0), Region::new(2, 1.0, 2.0)];
        assert_eq!(resolve_active(1.5, &regions), Some(2));
    }

    #[test]
    fn publishes_synchronously_with_direction() {
        let mut broadcaster = ActiveBroadcaster::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = broadcaster.subscribe(move |c| sink.borrow_mut().push(*c));

        broadcaster.update(0.4, &regions(), Direction::Forward);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(broadcaster.update(0.45, &regions(), Direction::Forward), None);
        broadcaster.update(0.2, &regions(), Direction::Backward);

        let seen = seen.borrow();
        assert_eq!(
            seen[0],
            ActiveChange {
                previous: None,
                current: 1,
                trigger: Trigger::Enter
            }
        );
        assert_eq!(
            seen[1],
            ActiveChange {
                previous: Some(1),
                current: 0,
                trigger: Trigger::EnterBack
            }
        );
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let broadcaster = ActiveBroadcaster::new();
        let sub = broadcaster.subscribe(|_| {});
        assert!(sub.is_active());
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn reverted_subscription_receives_nothing() {
        let mut broadcaster = ActiveBroadcaster::new();
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        let mut sub = broadcaster.subscribe(move |_| *sink.borrow_mut() += 1);
        sub.revert();
        broadcaster.update(0.2, &regions(), Direction::Forward);
        assert_eq!(*hits.borrow(), 0);
        assert!(!sub.is_active());
    }
}
