//! One draggable button: engine, input normalization, dispatcher and
//! presentation callbacks wired together.

use log::debug;

use crate::actions::ActionDispatcher;
use crate::config::GestureConfig;
use crate::engine::{EngineEvent, GestureEngine, GestureEvent};
use crate::input::{PointerNormalizer, PointerSample, RawPointerEvent};
use crate::ripple::Ripple;
use crate::timers::Clock;
use crate::tracker::{Bounds, Vec2};

/// Presentation side of the widget. Every method defaults to a no-op.
pub trait EngineObserver {
    fn on_position_update(&mut self, _offset: Vec2) {}
    fn on_gesture_resolved(&mut self, _gesture: &GestureEvent) {}
    fn on_session_start(&mut self) {}
    fn on_session_end(&mut self) {}
    fn on_ripple(&mut self, _ripple: &Ripple) {}
    fn on_ripple_fade(&mut self) {}
    fn on_icon_reset(&mut self, _icon: Option<&str>) {}
    fn on_settled(&mut self) {}

    /// Entry point for every engine event; routes to the methods above.
    fn on_event(&mut self, _at: u64, event: &EngineEvent) {
        match event {
            EngineEvent::SessionStart => self.on_session_start(),
            EngineEvent::SessionEnd => self.on_session_end(),
            EngineEvent::Position { offset } => self.on_position_update(*offset),
            EngineEvent::Ripple(r) => self.on_ripple(r),
            EngineEvent::RippleFade => self.on_ripple_fade(),
            EngineEvent::Gesture(g) => self.on_gesture_resolved(g),
            EngineEvent::IconReset { icon } => self.on_icon_reset(icon.as_deref()),
            EngineEvent::Settled => self.on_settled(),
        }
    }
}

impl EngineObserver for () {}

#[derive(Debug)]
pub struct DragButton<C, D, O> {
    clock: C,
    engine: GestureEngine,
    normalizer: PointerNormalizer,
    dispatcher: D,
    observer: O,
}

impl<C: Clock, D: ActionDispatcher, O: EngineObserver> DragButton<C, D, O> {
    pub fn new(config: GestureConfig, clock: C, dispatcher: D, observer: O) -> Self {
        let normalizer = PointerNormalizer::new(config.thresholds.touch_mouse_guard_ms);
        Self {
            clock,
            engine: GestureEngine::new(config),
            normalizer,
            dispatcher,
            observer,
        }
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.engine.set_bounds(bounds);
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn handle_raw(&mut self, raw: &RawPointerEvent) {
        if let Some(sample) = self.normalizer.normalize(raw) {
            self.handle_sample(sample);
        }
    }

    pub fn handle_sample(&mut self, sample: PointerSample) {
        self.engine.pointer(sample);
        self.flush();
    }

    /// Run timers and one animation frame at the clock's current time.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        self.engine.advance(now);
        self.engine.frame(now);
        self.flush();
    }

    fn flush(&mut self) {
        for emitted in self.engine.take_events() {
            if let EngineEvent::Gesture(g) = &emitted.event {
                match g.action.as_deref() {
                    Some(action) => self.dispatcher.invoke(action),
                    None => {
                        debug!("widget: {:?} unbound, not reported", g.gesture);
                        continue;
                    }
                }
            }
            self.observer.on_event(emitted.at, &emitted.event);
        }
    }
}
