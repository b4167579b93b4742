//! Fallback values and their fail-fast latch

/// What a read should produce while no value has arrived, or after the
/// source failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback<T> {
    /// Parameter omitted: the engine default for the no-value slot, fail-fast
    /// for the error slot
    UseDefault,
    /// No substitute; fail instead
    Sentinel,
    /// Substitute this value
    Value(Option<T>),
}

impl<T> Default for Fallback<T> {
    fn default() -> Self {
        Self::UseDefault
    }
}

impl<T> Fallback<T> {
    pub fn value(value: T) -> Self {
        Self::Value(Some(value))
    }

    /// Substitute "no value".
    pub fn none() -> Self {
        Self::Value(None)
    }
}

/// A fallback as remembered between reads.
///
/// A sentinel slot records the state version at which it last raised.
/// It stays quiet only while that version is current, so a new state or a
/// new source re-arms it. Replacing the slot re-arms it too.
#[derive(Debug, Clone)]
pub(crate) enum Slot<T> {
    Value(Option<T>),
    Sentinel { raised_at: Option<u64> },
}

/// What consulting a slot decided.
#[derive(Debug, PartialEq)]
pub(crate) enum Verdict<T> {
    Substitute(Option<T>),
    Raise,
    AlreadyRaised,
}

impl<T: Clone + PartialEq> Slot<T> {
    pub(crate) fn sentinel() -> Self {
        Self::Sentinel { raised_at: None }
    }

    /// Turn a caller's fallback into a slot. `omitted` is what
    /// `Fallback::UseDefault` stands for in this position.
    pub(crate) fn from_fallback(fallback: Fallback<T>, omitted: impl FnOnce() -> Self) -> Self {
        match fallback {
            Fallback::UseDefault => omitted(),
            Fallback::Sentinel => Self::sentinel(),
            Fallback::Value(value) => Self::Value(value),
        }
    }

    /// Replace the slot if the fallback differs. Returns true if replaced.
    pub(crate) fn update(&mut self, next: Slot<T>) -> bool {
        let unchanged = match (&*self, &next) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Sentinel { .. }, Self::Sentinel { .. }) => true,
            _ => false,
        };
        if !unchanged {
            *self = next;
        }
        !unchanged
    }

    pub(crate) fn consult(&mut self, version: u64) -> Verdict<T> {
        match self {
            Self::Value(value) => Verdict::Substitute(value.clone()),
            Self::Sentinel { raised_at } if *raised_at == Some(version) => Verdict::AlreadyRaised,
            Self::Sentinel { raised_at } => {
                *raised_at = Some(version);
                Verdict::Raise
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_raises_once_per_version() {
        let mut slot = Slot::<i32>::sentinel();
        assert_eq!(slot.consult(1), Verdict::Raise);
        assert_eq!(slot.consult(1), Verdict::AlreadyRaised);
        assert_eq!(slot.consult(2), Verdict::Raise);
    }

    #[test]
    fn unchanged_sentinel_keeps_latch() {
        let mut slot = Slot::<i32>::sentinel();
        slot.consult(1);
        assert!(!slot.update(Slot::sentinel()));
        assert_eq!(slot.consult(1), Verdict::AlreadyRaised);
    }

    #[test]
    fn changed_fallback_rearms() {
        let mut slot = Slot::<i32>::sentinel();
        slot.consult(1);
        assert!(slot.update(Slot::Value(Some(3))));
        assert_eq!(slot.consult(1), Verdict::Substitute(Some(3)));
        assert!(slot.update(Slot::sentinel()));
        assert_eq!(slot.consult(1), Verdict::Raise);
    }

    #[test]
    fn use_default_maps_per_position() {
        let slot = Slot::<i32>::from_fallback(Fallback::UseDefault, || Slot::Value(Some(0)));
        assert!(matches!(slot, Slot::Value(Some(0))));
        let slot = Slot::<i32>::from_fallback(Fallback::UseDefault, Slot::sentinel);
        assert!(matches!(slot, Slot::Sentinel { raised_at: None }));
    }
}
