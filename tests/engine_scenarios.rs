use dragbutton::engine::Emitted;
use dragbutton::timers::ManualClock;
use dragbutton::tracker::{Vec2, resistance};
use dragbutton::{
    Bindings, DragButton, EngineEvent, GestureConfig, GestureEngine, GestureId, Phase,
    PointerSample, RawKind, RawPointerEvent, ServiceDispatcher, Thresholds,
};

fn cfg(thresholds: Thresholds, bindings: Bindings) -> GestureConfig {
    GestureConfig::new(thresholds, bindings)
}

fn remote() -> Bindings {
    Bindings::default()
        .bind(GestureId::Up, "button.ir_up")
        .bind(GestureId::Down, "button.ir_down")
        .bind(GestureId::Left, "button.ir_left")
        .bind(GestureId::Right, "button.ir_right")
        .bind(GestureId::Click, "button.ir_enter")
        .bind(GestureId::Hold, "script.ir_menu")
}

fn press(e: &mut GestureEngine, x: f64, y: f64, t: u64) {
    e.pointer(PointerSample::new(Phase::Start, x, y, t));
}

fn drag(e: &mut GestureEngine, x: f64, y: f64, t: u64) {
    e.pointer(PointerSample::new(Phase::Move, x, y, t));
}

fn lift(e: &mut GestureEngine, x: f64, y: f64, t: u64) {
    e.pointer(PointerSample::new(Phase::End, x, y, t));
}

/// Run timers and frames every 16 ms over `from..=to`.
fn run_frames(e: &mut GestureEngine, from: u64, to: u64, out: &mut Vec<Emitted>) {
    let mut t = from;
    while t <= to {
        e.advance(t);
        e.frame(t);
        out.extend(e.take_events());
        t += 16;
    }
}

fn fired(events: &[Emitted]) -> Vec<(u64, GestureId)> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            EngineEvent::Gesture(g) => Some((e.at, g.gesture)),
            _ => None,
        })
        .collect()
}

fn last_offset(events: &[Emitted]) -> Option<Vec2> {
    events.iter().rev().find_map(|e| match e.event {
        EngineEvent::Position { offset } => Some(offset),
        _ => None,
    })
}

#[test]
fn two_quick_taps_make_a_double_click_and_never_a_click() {
    let th = Thresholds {
        deadzone: 20.0,
        multi_click_ms: 300,
        ..Thresholds::default()
    };
    let mut e = GestureEngine::new(cfg(th, remote().bind(GestureId::DoubleClick, "button.ir_back")));
    let mut ev = Vec::new();

    press(&mut e, 10.0, 10.0, 0);
    lift(&mut e, 10.0, 10.0, 50);
    run_frames(&mut e, 50, 149, &mut ev);
    press(&mut e, 10.0, 10.0, 150);
    lift(&mut e, 10.0, 10.0, 200);
    ev.extend(e.take_events());
    run_frames(&mut e, 200, 1_500, &mut ev);

    assert_eq!(fired(&ev), vec![(200, GestureId::DoubleClick)]);
}

#[test]
fn lone_tap_waits_out_the_window_when_double_is_bound() {
    let mut e = GestureEngine::new(cfg(
        Thresholds::default(),
        remote().bind(GestureId::DoubleClick, "button.ir_back"),
    ));
    let mut ev = Vec::new();
    press(&mut e, 0.0, 0.0, 0);
    lift(&mut e, 0.0, 0.0, 50);
    run_frames(&mut e, 50, 1_000, &mut ev);
    assert_eq!(fired(&ev), vec![(350, GestureId::Click)]);
}

#[test]
fn stationary_press_fires_hold_once() {
    let mut e = GestureEngine::new(cfg(Thresholds::default(), remote()));
    let mut ev = Vec::new();
    press(&mut e, 50.0, 50.0, 0);
    run_frames(&mut e, 0, 2_000, &mut ev);
    lift(&mut e, 50.0, 50.0, 2_000);
    ev.extend(e.take_events());
    assert_eq!(fired(&ev), vec![(800, GestureId::Hold)]);
}

#[test]
fn mostly_horizontal_drag_is_a_right_swipe() {
    let mut e = GestureEngine::new(cfg(Thresholds::default(), remote()));
    press(&mut e, 0.0, 0.0, 0);
    drag(&mut e, 150.0, -10.0, 30);
    lift(&mut e, 150.0, -10.0, 60);
    assert_eq!(fired(&e.take_events()), vec![(60, GestureId::Right)]);
}

#[test]
fn holding_a_direction_repeats_the_swipe() {
    let mut e = GestureEngine::new(cfg(Thresholds::default(), remote()));
    let mut ev = Vec::new();
    press(&mut e, 0.0, 0.0, 0);
    drag(&mut e, 100.0, 0.0, 50);
    run_frames(&mut e, 50, 1_290, &mut ev);
    lift(&mut e, 100.0, 0.0, 1_300);
    run_frames(&mut e, 1_300, 3_000, &mut ev);
    ev.extend(e.take_events());

    assert_eq!(
        fired(&ev),
        vec![
            (800, GestureId::Right),
            (1_000, GestureId::Right),
            (1_200, GestureId::Right),
        ]
    );
}

#[test]
fn return_animation_lands_on_origin_for_any_damping() {
    for damping in [0.3, 1.0, 2.0, 5.0] {
        let th = Thresholds {
            spring_damping: damping,
            ..Thresholds::default()
        };
        let mut e = GestureEngine::new(cfg(th, remote()));
        let mut ev = Vec::new();
        press(&mut e, 0.0, 0.0, 0);
        drag(&mut e, -70.0, 30.0, 20);
        lift(&mut e, -70.0, 30.0, 40);
        ev.extend(e.take_events());
        run_frames(&mut e, 40, 600, &mut ev);

        assert!(!e.is_animating(), "damping {damping}");
        assert_eq!(last_offset(&ev), Some(Vec2::ZERO), "damping {damping}");
        assert_eq!(
            ev.iter().filter(|x| x.event == EngineEvent::Settled).count(),
            1,
            "damping {damping}"
        );
    }
}

#[test]
fn repeated_interruptions_still_settle_at_origin() {
    let th = Thresholds {
        spring_damping: 0.5,
        ..Thresholds::default()
    };
    let mut e = GestureEngine::new(cfg(th, remote()));
    let mut ev = Vec::new();
    let mut t = 0;
    for _ in 0..5 {
        press(&mut e, 0.0, 0.0, t);
        drag(&mut e, 60.0, 10.0, t + 10);
        lift(&mut e, 60.0, 10.0, t + 20);
        run_frames(&mut e, t + 20, t + 80, &mut ev);
        assert!(e.is_animating());
        t += 100;
    }
    run_frames(&mut e, t, t + 600, &mut ev);
    assert!(!e.is_animating());
    assert_eq!(last_offset(&ev), Some(Vec2::ZERO));
}

#[test]
fn grabbing_mid_return_continues_from_visual_position() {
    let th = Thresholds {
        return_ms: 200,
        spring_damping: 2.0,
        ..Thresholds::default()
    };
    let mut e = GestureEngine::new(cfg(th, remote()));
    press(&mut e, 0.0, 0.0, 0);
    drag(&mut e, 80.0, 0.0, 5);
    lift(&mut e, 80.0, 0.0, 10);
    assert_eq!(fired(&e.take_events()), vec![(10, GestureId::Right)]);

    // halfway through the ease-out the button is about 25 units from home
    e.frame(110);
    let remaining = 80.0 * 0.5f64.powf(1.675);
    assert!((remaining - 25.05).abs() < 0.1);
    let shown = last_offset(&e.take_events()).unwrap();
    assert!((shown.x - resistance(remaining, 100.0, 1.0)).abs() < 1e-6);

    press(&mut e, 200.0, 200.0, 110);
    drag(&mut e, 205.0, 200.0, 120);
    lift(&mut e, 205.0, 200.0, 130);
    // 25 + 5 is past the deadzone even though the pointer only moved 5
    assert_eq!(fired(&e.take_events()), vec![(130, GestureId::Right)]);
}

#[test]
fn resistance_saturates_below_max_drag() {
    let max_drag = 100.0;
    assert_eq!(resistance(0.0, max_drag, 1.0), 0.0);
    let mut prev = 0.0;
    for i in 1..200 {
        let r = resistance(f64::from(i) * 25.0, max_drag, 1.0);
        assert!(r > prev);
        assert!(r < max_drag);
        prev = r;
    }
    assert!((resistance(100.0, max_drag, 1.0) - 50.0).abs() < 1e-9);
}

#[test]
fn widget_turns_swipes_into_service_calls() {
    let clock = ManualClock::new(0);
    let mut w = DragButton::new(
        cfg(Thresholds::default(), remote()),
        &clock,
        ServiceDispatcher::new(),
        (),
    );
    let raw = |t, kind, x, y| RawPointerEvent { t, kind, x, y };
    w.handle_raw(&raw(0, RawKind::TouchStart, 40.0, 40.0));
    w.handle_raw(&raw(20, RawKind::TouchMove, 40.0, 120.0));
    w.handle_raw(&raw(40, RawKind::TouchEnd, 40.0, 120.0));
    // emulated mouse events after touch are swallowed
    w.handle_raw(&raw(60, RawKind::MouseDown, 40.0, 120.0));
    w.handle_raw(&raw(70, RawKind::MouseUp, 40.0, 120.0));
    clock.set(400);
    w.tick();

    let calls = w.dispatcher_mut().drain();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entity_id, "button.ir_down");
    assert_eq!(calls[0].service, "press");
}
