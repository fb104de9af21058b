//! Deterministic replay of recorded pointer traces under a manual clock.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::actions::{ServiceCall, ServiceDispatcher};
use crate::config::GestureConfig;
use crate::engine::{Emitted, EngineEvent, EngineState};
use crate::input::RawPointerEvent;
use crate::timers::ManualClock;
use crate::tracker::Bounds;
use crate::widget::{DragButton, EngineObserver};

fn default_frame_ms() -> u64 {
    16
}

fn default_settle_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    pub bounds: Option<Bounds>,
    #[serde(default, rename = "event")]
    pub events: Vec<RawPointerEvent>,
}

impl Trace {
    pub fn from_toml(txt: &str) -> Result<Self> {
        let mut trace: Trace = toml::from_str(txt)?;
        trace.frame_ms = trace.frame_ms.max(1);
        trace.events.sort_by_key(|e| e.t);
        Ok(trace)
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&txt).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Engine(Emitted),
    Service { at: u64, call: ServiceCall },
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Emitted>,
}

impl EngineObserver for Recorder {
    fn on_event(&mut self, at: u64, event: &EngineEvent) {
        self.events.push(Emitted {
            at,
            event: event.clone(),
        });
    }
}

/// Run `trace` through a fresh widget. Frames tick every `frame_ms`; the run
/// ends `settle_ms` after the last event, or later while timers or the return
/// animation still have work.
pub fn run(trace: &Trace, config: GestureConfig) -> Vec<Record> {
    let clock = ManualClock::new(0);
    let mut widget = DragButton::new(config, &clock, ServiceDispatcher::new(), Recorder::default());
    if let Some(b) = trace.bounds {
        widget.set_bounds(b);
    }

    let mut records = Vec::new();
    let last = trace.events.last().map_or(0, |e| e.t);
    let end = last + trace.settle_ms;
    let mut next_frame = 0;

    for ev in &trace.events {
        while next_frame < ev.t {
            clock.set(next_frame);
            widget.tick();
            collect(&mut widget, next_frame, &mut records);
            next_frame += trace.frame_ms;
        }
        clock.set(ev.t);
        widget.handle_raw(ev);
        collect(&mut widget, ev.t, &mut records);
    }

    loop {
        let engine = widget.engine();
        // a press still held at the end of the trace keeps its timers; stop anyway
        let busy = engine.is_animating()
            || (engine.state() == EngineState::Idle && engine.next_deadline().is_some());
        if next_frame > end && !busy {
            break;
        }
        clock.set(next_frame);
        widget.tick();
        collect(&mut widget, next_frame, &mut records);
        next_frame += trace.frame_ms;
    }

    records
}

type ReplayWidget<'c> = DragButton<&'c ManualClock, ServiceDispatcher, Recorder>;

fn collect(widget: &mut ReplayWidget<'_>, at: u64, records: &mut Vec<Record>) {
    records.extend(widget.observer_mut().events.drain(..).map(Record::Engine));
    records.extend(
        widget
            .dispatcher_mut()
            .drain()
            .into_iter()
            .map(|call| Record::Service { at, call }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bindings, Thresholds};
    use crate::gestures::GestureId;

    fn config() -> GestureConfig {
        let bindings = Bindings::default()
            .bind(GestureId::Right, "button.right")
            .bind(GestureId::Click, "button.enter")
            .bind(GestureId::DoubleClick, "script.back");
        GestureConfig::new(Thresholds::default(), bindings)
    }

    const SWIPE: &str = r#"
        [bounds]
        left = 0.0
        top = 0.0
        width = 200.0
        height = 150.0

        [[event]]
        t = 0
        kind = "mouse_down"
        x = 100
        y = 75

        [[event]]
        t = 50
        kind = "mouse_move"
        x = 250
        y = 65

        [[event]]
        t = 100
        kind = "mouse_up"
        x = 250
        y = 65
    "#;

    #[test]
    fn swipe_trace_produces_service_call_and_settles() {
        let trace = Trace::from_toml(SWIPE).unwrap();
        let records = run(&trace, config());

        let calls: Vec<&ServiceCall> = records
            .iter()
            .filter_map(|r| match r {
                Record::Service { call, .. } => Some(call),
                _ => None,
            })
            .collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].entity_id, "button.right");
        assert_eq!(calls[0].service, "press");

        let settled = records
            .iter()
            .any(|r| matches!(r, Record::Engine(e) if e.event == EngineEvent::Settled));
        assert!(settled);
    }

    #[test]
    fn replay_keeps_running_until_click_window_closes() {
        let trace = Trace::from_toml(
            r#"
            settle_ms = 0
            [[event]]
            t = 0
            kind = "touch_start"
            [[event]]
            t = 40
            kind = "touch_end"
            "#,
        )
        .unwrap();
        let records = run(&trace, config());
        let clicks: Vec<u64> = records
            .iter()
            .filter_map(|r| match r {
                Record::Engine(Emitted {
                    at,
                    event: EngineEvent::Gesture(g),
                }) if g.gesture == GestureId::Click => Some(*at),
                _ => None,
            })
            .collect();
        assert_eq!(clicks, vec![340]);
    }

    #[test]
    fn records_serialize_as_json_lines() {
        let trace = Trace::from_toml(SWIPE).unwrap();
        for r in run(&trace, config()) {
            let line = serde_json::to_string(&r).unwrap();
            assert!(line.starts_with("{\"kind\":"));
        }
    }
}
