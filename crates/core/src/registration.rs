//! Scoped registrations torn down together.
//!
//! Listeners, subscriptions and frame loops are added to a
//! [`RegistrationGroup`] as they are installed. One [`RegistrationGroup::revert`]
//! undoes all of them, newest first, so nothing outlives its siblings.

use std::fmt;

/// Something that can be undone exactly once.
pub trait Revertible {
    /// Undo the registration. Calling this again must be a no-op.
    fn revert(&mut self);
}

/// A one-shot teardown closure.
pub struct Cleanup(Option<Box<dyn FnOnce()>>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }
}

impl Revertible for Cleanup {
    fn revert(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cleanup").field(&self.is_pending()).finish()
    }
}

#[derive(Default)]
pub struct RegistrationGroup {
    label: String,
    members: Vec<Box<dyn Revertible>>,
    reverted: bool,
}

impl RegistrationGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            members: Vec::new(),
            reverted: false,
        }
    }

    /// Add a registration. Adding to an already reverted group reverts the
    /// newcomer immediately, so a late install cannot leak.
    pub fn add(&mut self, mut member: impl Revertible + 'static) {
        if self.reverted {
            tracing::warn!(group = %self.label, "registration added after revert");
            member.revert();
            return;
        }
        self.members.push(Box::new(member));
    }

    pub fn on_revert(&mut self, f: impl FnOnce() + 'static) {
        self.add(Cleanup::new(f));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_reverted(&self) -> bool {
        self.reverted
    }

    /// Reopen a reverted group for a fresh set of registrations.
    pub fn reset(&mut self) {
        self.revert();
        self.reverted = false;
    }
}

impl Revertible for RegistrationGroup {
    fn revert(&mut self) {
        if self.reverted {
            return;
        }
        self.reverted = true;
        let count = self.members.len();
        while let Some(mut member) = self.members.pop() {
            member.revert();
        }
        tracing::debug!(group = %self.label, count, "registrations reverted");
    }
}

impl Drop for RegistrationGroup {
    fn drop(&mut self) {
        self.revert();
    }
}

impl fmt::Debug for RegistrationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationGroup")
            .field("label", &self.label)
            .field("members", &self.members.len())
            .field("reverted", &self.reverted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Cleanup) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| {
            let sink = Rc::clone(&sink);
            Cleanup::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn reverts_newest_first() {
        let (log, make) = recorder();
        let mut group = RegistrationGroup::new("section");
        group.add(make("scroll"));
        group.add(make("resize"));
        group.add(make("frame"));
        group.revert();
        assert_eq!(*log.borrow(), vec!["frame", "resize", "scroll"]);
        assert!(group.is_empty());
    }

    #[test]
    fn revert_is_idempotent() {
        let (log, make) = recorder();
        let mut group = RegistrationGroup::new("section");
        group.add(make("scroll"));
        group.revert();
        group.revert();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn drop_reverts() {
        let (log, make) = recorder();
        {
            let mut group = RegistrationGroup::new("section");
            group.add(make("scroll"));
        }
        assert_eq!(*log.borrow(), vec!["scroll"]);
    }

    #[test]
    fn late_registration_is_reverted_immediately() {
        let (log, make) = recorder();
        let mut group = RegistrationGroup::new("section");
        group.revert();
        group.add(make("late"));
        assert_eq!(*log.borrow(), vec!["late"]);
        assert!(group.is_empty());
    }

    #[test]
    fn reset_reopens_group() {
        let (log, make) = recorder();
        let mut group = RegistrationGroup::new("section");
        group.add(make("desktop"));
        group.reset();
        group.add(make("mobile"));
        assert_eq!(group.len(), 1);
        drop(group);
        assert_eq!(*log.borrow(), vec!["desktop", "mobile"]);
    }
}
