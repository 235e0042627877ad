use std::collections::BTreeMap;

/// Host events the background listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    Resize,
    PointerMove,
    VisibilityChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ambient signals and listener registry supplied by the host page.
///
/// Reads are cheap snapshots of the current environment. Listener
/// registrations are bookkeeping only: the host consults them to decide which
/// events to forward to the background.
pub trait EnvironmentProbe {
    fn is_reduced_motion(&self) -> bool;
    fn viewport_width(&self) -> u32;
    fn viewport_height(&self) -> u32;
    fn is_page_visible(&self) -> bool;
    fn subscribe(&mut self, kind: ListenerKind) -> ListenerId;
    /// Returns false when `id` is not (or no longer) registered.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// In-process probe whose signals are set directly by the host.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    reduced_motion: bool,
    width: u32,
    height: u32,
    visible: bool,
    next_id: u64,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    removals: u64,
}

impl StaticProbe {
    /// Visible page, no reduced-motion preference, no listeners.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            reduced_motion: false,
            width,
            height,
            visible: true,
            next_id: 0,
            listeners: BTreeMap::new(),
            removals: 0,
        }
    }

    /// Sets the `prefers-reduced-motion` answer.
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    /// Starts the page hidden when `visible` is false.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Updates the size reported by the viewport reads. Does not notify the
    /// background; the host forwards a resize event for that.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// True while at least one listener of `kind` is registered.
    pub fn is_subscribed(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|registered| *registered == kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of successful deregistrations over the probe's lifetime.
    pub fn removals(&self) -> u64 {
        self.removals
    }
}

impl EnvironmentProbe for StaticProbe {
    fn is_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn viewport_width(&self) -> u32 {
        self.width
    }

    fn viewport_height(&self) -> u32 {
        self.height
    }

    fn is_page_visible(&self) -> bool {
        self.visible
    }

    fn subscribe(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, kind);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            self.removals += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriptions_are_tracked_per_kind() {
        let mut probe = StaticProbe::new(1024, 768);
        let resize = probe.subscribe(ListenerKind::Resize);
        probe.subscribe(ListenerKind::PointerMove);
        assert!(probe.is_subscribed(ListenerKind::Resize));
        assert!(!probe.is_subscribed(ListenerKind::VisibilityChange));
        assert!(probe.unsubscribe(resize));
        assert!(!probe.unsubscribe(resize));
        assert_eq!(probe.listener_count(), 1);
        assert_eq!(probe.removals(), 1);
    }

    #[test]
    fn builder_flags_apply() {
        let probe = StaticProbe::new(500, 900)
            .with_reduced_motion(true)
            .with_visible(false);
        assert!(probe.is_reduced_motion());
        assert!(!probe.is_page_visible());
        assert_eq!(probe.viewport_width(), 500);
    }
}
