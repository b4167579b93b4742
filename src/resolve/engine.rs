//! AsyncResolver: one binding's view of its current asynchronous source
//!
//! The resolver is re-read on demand by a polling host. Each read may swap
//! the source; the resolver keeps exactly one subscription alive, caches
//! the latest state it delivered, and answers from that cache.

use super::config::ResolverConfig;
use super::error::ResolveError;
use super::fallback::{Fallback, Slot, Verdict};
use crate::source::{
    classify_and_subscribe, same_source, CancellationToken, Failure, SourceRef, Subscription,
};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Told when the cached state changes after the read that subscribed.
///
/// Implementations should schedule another read, not perform one inline.
pub trait ChangeNotifier {
    fn notify_changed(&self);
}

impl<F: Fn()> ChangeNotifier for F {
    fn notify_changed(&self) {
        self()
    }
}

/// The latest thing the current source delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestState<T> {
    /// Nothing observed since the subscription was established
    Pending,
    /// A value; `None` when an empty source resolved to an absent default
    Resolved(Option<T>),
    /// The source failed
    Failed(Failure),
}

impl<T> LatestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved(_) => "resolved",
            Self::Failed(_) => "failed",
        }
    }
}

struct Versioned<T> {
    state: LatestState<T>,
    version: u64,
}

/// State shared between the resolver and its subscription callbacks.
struct Shared<T> {
    latest: RefCell<Versioned<T>>,
    suppress_notify: Cell<bool>,
    notifier: Box<dyn ChangeNotifier>,
    label: String,
}

impl<T> Shared<T> {
    fn transition(&self, state: LatestState<T>) {
        let mut latest = self.latest.borrow_mut();
        latest.state = state;
        latest.version += 1;
    }

    /// Callback entry point. Fenced by the subscription's token.
    fn record(&self, token: &CancellationToken, state: LatestState<T>) {
        if token.is_cancelled() {
            tracing::trace!(binding = %self.label, "dropping emission from a replaced source");
            return;
        }
        let kind = state.kind();
        self.transition(state);

        if self.suppress_notify.get() {
            tracing::trace!(binding = %self.label, state = kind, "synchronous emission");
        } else {
            tracing::trace!(binding = %self.label, state = kind, "asynchronous emission");
            self.notifier.notify_changed();
        }
    }
}

/// Holds notifications off for the synchronous part of a subscribe.
/// Released on every exit path, unwinding included.
struct SuppressNotify<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> SuppressNotify<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for SuppressNotify<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

enum CurrentSource<T> {
    /// Nothing accepted yet, or disposed
    Unset,
    /// The empty marker
    Empty,
    Source(SourceRef<T>),
}

impl<T> CurrentSource<T> {
    fn matches(&self, incoming: Option<&SourceRef<T>>) -> bool {
        match (self, incoming) {
            (Self::Empty, None) => true,
            (Self::Source(current), Some(incoming)) => same_source(current, incoming),
            _ => false,
        }
    }
}

/// The live subscription plus the token fencing its callbacks.
struct ActiveSubscription {
    token: CancellationToken,
    _subscription: Subscription,
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        // Cancel first so nothing the teardown triggers can land
        self.token.cancel();
    }
}

/// Resolves the value of an asynchronous source for a polling reader.
///
/// One resolver serves one binding. `read` is called once per evaluation
/// pass; the change notifier given at construction fires whenever the
/// cached state changes after the read that subscribed, so the host knows
/// to evaluate again.
///
/// Reads and source callbacks must be serialized by the host; the resolver
/// does no locking.
pub struct AsyncResolver<T> {
    config: ResolverConfig<T>,
    shared: Rc<Shared<T>>,
    current_source: CurrentSource<T>,
    active: Option<ActiveSubscription>,
    last_returned: Option<T>,
    no_value: Slot<T>,
    on_error: Slot<T>,
}

impl<T: Clone + PartialEq + 'static> AsyncResolver<T> {
    pub fn new(notifier: impl ChangeNotifier + 'static) -> Self {
        Self::with_config(notifier, ResolverConfig::default())
    }

    pub fn with_config(notifier: impl ChangeNotifier + 'static, config: ResolverConfig<T>) -> Self {
        let shared = Rc::new(Shared {
            latest: RefCell::new(Versioned {
                state: LatestState::Pending,
                version: 0,
            }),
            suppress_notify: Cell::new(false),
            notifier: Box::new(notifier),
            label: config.label().to_string(),
        });
        Self {
            no_value: Slot::Value(config.default_value.clone()),
            on_error: Slot::sentinel(),
            config,
            shared,
            current_source: CurrentSource::Unset,
            active: None,
            last_returned: None,
        }
    }

    /// Resolve the current value of `source`.
    ///
    /// `None` is the empty source. A source identical to the previous one is
    /// not re-subscribed. Returns the latest value, or the matching fallback
    /// while nothing has arrived or after the source failed.
    ///
    /// A fail-fast fallback raises its error once per state; repeated reads
    /// of the same state return the previous read's value instead.
    pub fn read(
        &mut self,
        source: Option<&SourceRef<T>>,
        no_value: Fallback<T>,
        on_error: Fallback<T>,
    ) -> Result<Option<T>, ResolveError> {
        self.update_fallbacks(no_value, on_error);
        self.update_source(source)?;

        let value = self.resolve_latest()?;
        self.last_returned = value.clone();
        Ok(value)
    }

    /// Drop the subscription and forget the source. Idempotent.
    pub fn dispose(&mut self) {
        if self.active.is_some() {
            tracing::debug!(binding = %self.shared.label, "disposing subscription");
        }
        self.teardown();
        self.current_source = CurrentSource::Unset;
    }

    /// Snapshot of the cached state.
    pub fn state(&self) -> LatestState<T> {
        self.shared.latest.borrow().state.clone()
    }

    /// True while a stream or future subscription is held. The empty source
    /// never holds one.
    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// The value handed out by the last successful read.
    pub fn last_returned(&self) -> Option<&T> {
        self.last_returned.as_ref()
    }

    fn update_fallbacks(&mut self, no_value: Fallback<T>, on_error: Fallback<T>) {
        let default_value = &self.config.default_value;
        let no_value = Slot::from_fallback(no_value, || Slot::Value(default_value.clone()));
        if self.no_value.update(no_value) {
            tracing::trace!(binding = %self.shared.label, "no-value fallback changed");
        }
        if self.on_error.update(Slot::from_fallback(on_error, Slot::sentinel)) {
            tracing::trace!(binding = %self.shared.label, "error fallback changed");
        }
    }

    fn update_source(&mut self, source: Option<&SourceRef<T>>) -> Result<(), ResolveError> {
        if self.current_source.matches(source) {
            return Ok(());
        }

        self.teardown();
        self.current_source = match source {
            Some(source) => CurrentSource::Source(Rc::clone(source)),
            None => CurrentSource::Empty,
        };
        tracing::debug!(
            binding = %self.shared.label,
            source = %source.map(|s| s.describe()).unwrap_or_else(|| "empty".to_string()),
            "switching source"
        );

        let token = CancellationToken::new();
        let on_value = callback(&self.shared, &token, LatestState::Resolved);
        let on_error = callback(&self.shared, &token, LatestState::Failed);

        let subscribed = {
            let _quiet = SuppressNotify::engage(&self.shared.suppress_notify);
            classify_and_subscribe(
                source.map(|s| &**s),
                on_value,
                on_error,
                self.config.default_value.clone(),
            )
        };

        match subscribed {
            // The empty source delivered inline and holds nothing open
            Ok(_) if source.is_none() => Ok(()),
            Ok(subscription) => {
                self.active = Some(ActiveSubscription {
                    token,
                    _subscription: subscription,
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(binding = %self.shared.label, "{err}");
                Err(err.into())
            }
        }
    }

    fn resolve_latest(&mut self) -> Result<Option<T>, ResolveError> {
        let latest = self.shared.latest.borrow();
        let version = latest.version;

        match &latest.state {
            LatestState::Resolved(value) => Ok(value.clone()),
            LatestState::Pending => match self.no_value.consult(version) {
                Verdict::Substitute(value) => Ok(value),
                Verdict::Raise => {
                    tracing::debug!(
                        binding = %self.shared.label,
                        "no value yet and no initial value"
                    );
                    Err(ResolveError::MissingInitialValue)
                }
                Verdict::AlreadyRaised => Ok(self.last_returned.clone()),
            },
            LatestState::Failed(failure) => match self.on_error.consult(version) {
                Verdict::Substitute(value) => Ok(value),
                Verdict::Raise => {
                    tracing::debug!(
                        binding = %self.shared.label,
                        %failure,
                        "surfacing source failure"
                    );
                    Err(ResolveError::from_failure(failure.clone()))
                }
                Verdict::AlreadyRaised => Ok(self.last_returned.clone()),
            },
        }
    }

    /// Dispose the active subscription and return to `Pending`.
    fn teardown(&mut self) {
        self.active = None;
        self.shared.transition(LatestState::Pending);
    }
}

/// Build a subscription callback that records into `shared` unless `token`
/// was cancelled or the resolver is gone.
fn callback<T, V>(
    shared: &Rc<Shared<T>>,
    token: &CancellationToken,
    into_state: fn(V) -> LatestState<T>,
) -> impl Fn(V) + 'static
where
    T: 'static,
    V: 'static,
{
    let shared: Weak<Shared<T>> = Rc::downgrade(shared);
    let token = token.clone();
    move |payload| {
        if let Some(shared) = shared.upgrade() {
            shared.record(&token, into_state(payload));
        }
    }
}

impl<T> fmt::Debug for AsyncResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let latest = self.shared.latest.borrow();
        f.debug_struct("AsyncResolver")
            .field("binding", &self.shared.label)
            .field("state", &latest.state.kind())
            .field("version", &latest.version)
            .field("subscribed", &self.active.is_some())
            .finish()
    }
}
