//! The gesture state machine.
//!
//! `GestureEngine` owns the single live session, the click accumulator, every
//! timer and the return animator. Stimuli come in through `pointer`,
//! `advance` and `frame`; results pile up as [`Emitted`] events that the
//! caller drains with [`GestureEngine::take_events`].

use log::{debug, info, warn};
use serde::Serialize;

use crate::animation::{Easing, ReturnAnimator};
use crate::config::GestureConfig;
use crate::gestures::{ClickAccumulator, GestureId, Resolution, ResolveMode, classify};
use crate::input::{Phase, PointerSample};
use crate::ripple::{Ripple, ripple_for};
use crate::timers::{Fired, TimerHandle, TimerQueue};
use crate::tracker::{Bounds, Session, Vec2, lock_axes, resisted_offset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Pressing,
    Dragging,
    HoldPending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureEvent {
    pub gesture: GestureId,
    pub action: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SessionStart,
    SessionEnd,
    Position { offset: Vec2 },
    Ripple(Ripple),
    RippleFade,
    Gesture(GestureEvent),
    IconReset { icon: Option<String> },
    /// Back at rest; the raised visual state can be dropped.
    Settled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitted {
    pub at: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    HoldDelay,
    HoldRepeat,
    ClickDebounce,
    IconReset,
    RippleFade,
}

/// Shortest time a ripple is shown before it may fade.
const RIPPLE_MIN_MS: u64 = 200;

#[derive(Debug, Default)]
struct Handles {
    hold: Option<TimerHandle>,
    repeat: Option<TimerHandle>,
    click: Option<TimerHandle>,
    icon: Option<TimerHandle>,
    fade: Option<TimerHandle>,
}

#[derive(Debug)]
pub struct GestureEngine {
    config: GestureConfig,
    origin: Vec2,
    bounds: Option<Bounds>,
    state: EngineState,
    session: Option<Session>,
    clicks: ClickAccumulator,
    timers: TimerQueue<TimerKind>,
    handles: Handles,
    animator: ReturnAnimator,
    events: Vec<Emitted>,
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Self {
        let th = &config.thresholds;
        let animator = ReturnAnimator::new(th.return_ms, Easing::from_damping(th.spring_damping));
        Self {
            config,
            origin: Vec2::ZERO,
            bounds: None,
            state: EngineState::Idle,
            session: None,
            clicks: ClickAccumulator::default(),
            timers: TimerQueue::new(),
            handles: Handles::default(),
            animator,
            events: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.set_bounds(bounds);
        self
    }

    /// Resting center comes from the button rectangle; call again on resize.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.origin = bounds.center();
        self.bounds = Some(bounds);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_active()
    }

    pub fn pending_clicks(&self) -> u8 {
        self.clicks.count()
    }

    /// Earliest instant at which `advance` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn take_events(&mut self) -> Vec<Emitted> {
        std::mem::take(&mut self.events)
    }

    pub fn pointer(&mut self, sample: PointerSample) {
        // timers due at exactly sample.t lose to the sample
        self.run_timers(sample.t, false);

        if !sample.pos().is_finite() {
            warn!("engine: non-finite pointer sample {sample:?}; discarding session");
            self.abort(sample.t);
            return;
        }

        match sample.phase {
            Phase::Start => self.press(sample.pos(), sample.t),
            Phase::Move => self.drag(sample.pos(), sample.t),
            Phase::End => self.release(sample.t),
            Phase::Cancel => self.abort(sample.t),
        }
    }

    /// Fire every timer due at or before `now`.
    pub fn advance(&mut self, now: u64) {
        self.run_timers(now, true);
    }

    /// Animation-frame callback.
    pub fn frame(&mut self, now: u64) {
        let Some(f) = self.animator.sample(now) else {
            return;
        };
        if f.done {
            self.emit(now, EngineEvent::Position { offset: Vec2::ZERO });
            self.emit(now, EngineEvent::Settled);
        } else {
            let offset = self.display_offset(f.displacement);
            self.emit(now, EngineEvent::Position { offset });
        }
    }

    /// Drop the live session without classifying it.
    pub fn cancel(&mut self, now: u64) {
        self.abort(now);
    }

    fn press(&mut self, pointer: Vec2, t: u64) {
        if self.session.is_some() {
            warn!("engine: press while a session is live; discarding it");
            self.abort(t);
        }

        let real_position = match self.animator.cancel() {
            Some(d) => {
                debug!("engine: grabbed mid-return at {d:?}");
                self.origin + d
            }
            None => self.origin,
        };

        self.session = Some(Session::begin(self.origin, real_position, pointer, t));
        self.state = EngineState::Pressing;
        self.emit(t, EngineEvent::SessionStart);
        if let Some(h) = self.handles.fade.take() {
            self.timers.cancel(h);
            self.emit(t, EngineEvent::RippleFade);
        }
        if let Some(bounds) = self.bounds {
            self.emit(t, EngineEvent::Ripple(ripple_for(&bounds, pointer)));
        }

        let due = t + self.config.thresholds.hold_ms;
        self.handles.hold = Some(self.timers.schedule(due, TimerKind::HoldDelay));
        debug!("engine: pressing at t={t}");
    }

    fn drag(&mut self, pointer: Vec2, t: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.track(pointer);
        let displacement = session.displacement();
        if self.state == EngineState::Pressing && displacement != Vec2::ZERO {
            self.state = EngineState::Dragging;
        }
        let offset = self.display_offset(displacement);
        self.emit(t, EngineEvent::Position { offset });
    }

    fn release(&mut self, t: u64) {
        let Some(session) = self.session.take() else {
            debug!("engine: release without press at t={t}");
            self.state = EngineState::Idle;
            return;
        };
        self.finish(session, t, true);
    }

    fn finish(&mut self, mut session: Session, t: u64, classify_release: bool) {
        self.cancel_timer(TimerKind::HoldDelay);
        self.cancel_timer(TimerKind::HoldRepeat);

        if classify_release && !session.hold_fired {
            let deadzone = self.config.thresholds.deadzone;
            self.resolve(&mut session, deadzone, ResolveMode::Release, t);
        }

        self.state = EngineState::Idle;
        self.emit(t, EngineEvent::SessionEnd);
        self.fade_ripple(session.started_at, t);

        let displacement = session.displacement();
        if displacement != Vec2::ZERO {
            self.animator.start(displacement, t);
        } else {
            self.emit(t, EngineEvent::Settled);
        }
        debug!("engine: session ended at t={t}");
    }

    fn abort(&mut self, t: u64) {
        self.cancel_timer(TimerKind::HoldDelay);
        self.cancel_timer(TimerKind::HoldRepeat);
        self.state = EngineState::Idle;
        if let Some(session) = self.session.take() {
            self.emit(t, EngineEvent::SessionEnd);
            self.fade_ripple(session.started_at, t);
            self.emit(t, EngineEvent::Position { offset: Vec2::ZERO });
            self.emit(t, EngineEvent::Settled);
        }
    }

    /// Fade now, or once the ripple has been up for `RIPPLE_MIN_MS`.
    fn fade_ripple(&mut self, pressed_at: u64, t: u64) {
        if self.bounds.is_none() {
            return;
        }
        let due = pressed_at + RIPPLE_MIN_MS;
        if due <= t {
            self.emit(t, EngineEvent::RippleFade);
        } else {
            self.handles.fade = Some(self.timers.schedule(due, TimerKind::RippleFade));
        }
    }

    fn run_timers(&mut self, now: u64, inclusive: bool) {
        while let Some(fired) = self.timers.pop_due(now, inclusive) {
            self.on_timer(fired);
        }
    }

    fn on_timer(&mut self, fired: Fired<TimerKind>) {
        let at = fired.at;
        match fired.kind {
            TimerKind::HoldDelay => {
                self.handles.hold = None;
                self.on_hold(at);
            }
            TimerKind::HoldRepeat => self.on_repeat(at),
            TimerKind::ClickDebounce => {
                self.handles.click = None;
                self.resolve_clicks(at);
            }
            TimerKind::IconReset => {
                self.handles.icon = None;
                let icon = self.config.bindings.resting_icon().map(str::to_string);
                self.emit(at, EngineEvent::IconReset { icon });
            }
            TimerKind::RippleFade => {
                self.handles.fade = None;
                self.emit(at, EngineEvent::RippleFade);
            }
        }
    }

    fn on_hold(&mut self, at: u64) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.hold_fired = true;
        self.state = EngineState::HoldPending;

        let deadzone = self.config.thresholds.deadzone * 2.0;
        if self.resolve(&mut session, deadzone, ResolveMode::Repeat, at) == Resolution::Hold {
            self.finish(session, at, false);
            return;
        }

        let every = self.config.thresholds.repeat_ms;
        self.handles.repeat =
            Some(self.timers.schedule_repeating(at + every, every, TimerKind::HoldRepeat));
        self.session = Some(session);
    }

    fn on_repeat(&mut self, at: u64) {
        let Some(mut session) = self.session.take() else {
            self.cancel_timer(TimerKind::HoldRepeat);
            return;
        };
        let deadzone = self.config.thresholds.deadzone * 2.0;
        self.resolve(&mut session, deadzone, ResolveMode::Repeat, at);
        self.session = Some(session);
    }

    fn resolve(
        &mut self,
        session: &mut Session,
        deadzone: f64,
        mode: ResolveMode,
        now: u64,
    ) -> Resolution {
        let resolution = classify(session.displacement(), deadzone, mode, session.action_counter);
        match resolution {
            Resolution::Hold => self.fire(GestureId::Hold, now),
            Resolution::Tap => self.register_tap(now),
            Resolution::Swipe(g) => self.fire(g, now),
            Resolution::Nothing => {}
        }

        session.action_counter += 1;
        self.cancel_timer(TimerKind::IconReset);
        let due = now + self.config.thresholds.icon_reset_ms;
        self.handles.icon = Some(self.timers.schedule(due, TimerKind::IconReset));
        resolution
    }

    fn register_tap(&mut self, now: u64) {
        let count = self.clicks.register();
        self.cancel_timer(TimerKind::ClickDebounce);
        if count >= self.config.max_click_multiplicity {
            self.resolve_clicks(now);
        } else {
            let due = now + self.config.thresholds.multi_click_ms;
            self.handles.click = Some(self.timers.schedule(due, TimerKind::ClickDebounce));
        }
    }

    fn resolve_clicks(&mut self, now: u64) {
        self.cancel_timer(TimerKind::ClickDebounce);
        let count = self.clicks.take();
        debug!("engine: click count {count}");
        if let Some(g) = GestureId::from_click_count(count) {
            self.fire(g, now);
        }
    }

    fn fire(&mut self, gesture: GestureId, now: u64) {
        let binding = self.config.bindings.get(gesture);
        let action = binding.and_then(|b| b.action.clone());
        let icon = binding.and_then(|b| b.icon.clone());
        match &action {
            Some(a) => info!("gesture {gesture:?} -> {a}"),
            None => debug!("gesture {gesture:?} has no action"),
        }
        self.emit(
            now,
            EngineEvent::Gesture(GestureEvent {
                gesture,
                action,
                icon,
            }),
        );
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        let slot = match kind {
            TimerKind::HoldDelay => &mut self.handles.hold,
            TimerKind::HoldRepeat => &mut self.handles.repeat,
            TimerKind::ClickDebounce => &mut self.handles.click,
            TimerKind::IconReset => &mut self.handles.icon,
            TimerKind::RippleFade => &mut self.handles.fade,
        };
        if let Some(h) = slot.take() {
            self.timers.cancel(h);
        }
    }

    fn display_offset(&self, displacement: Vec2) -> Vec2 {
        let th = &self.config.thresholds;
        let offset = resisted_offset(displacement, th.max_drag, th.stop_speed_factor);
        if th.lock_non_entity_dirs {
            lock_axes(offset, self.config.bindings.axis_mask())
        } else {
            offset
        }
    }

    fn emit(&mut self, at: u64, event: EngineEvent) {
        self.events.push(Emitted { at, event });
    }
}
