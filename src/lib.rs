//! Gesture recognition for a draggable multi-gesture button.
//!
//! A single press is classified as a swipe in one of four directions, an
//! N-fold click, or a hold; holding in a direction repeats the swipe. After
//! release the button springs back to its resting position.

pub mod actions;
pub mod animation;
pub mod config;
pub mod engine;
pub mod gestures;
pub mod input;
pub mod replay;
pub mod ripple;
pub mod timers;
pub mod tracker;
pub mod widget;

pub use actions::{ActionDispatcher, ServiceCall, ServiceDispatcher};
pub use config::{Bindings, GestureConfig, Profile, Thresholds};
pub use engine::{EngineEvent, EngineState, GestureEngine, GestureEvent};
pub use gestures::GestureId;
pub use input::{Phase, PointerSample, RawKind, RawPointerEvent};
pub use widget::{DragButton, EngineObserver};
