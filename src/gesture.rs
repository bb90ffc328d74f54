use crate::tabs::Tab;
use iced::{event, keyboard, mouse, touch, Event, Point};

/// Raw input relevant to tab navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Point),
    Pressed,
    Released,
    TouchPressed(Point),
    TouchLifted(Point),
    /// A press some widget already consumed; no swipe may start from it.
    PressCaptured,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
}

impl Swipe {
    /// Swiping left reveals the panel to the right.
    pub fn apply(self, tab: Tab) -> Tab {
        match self {
            Swipe::Left => tab.next(),
            Swipe::Right => tab.previous(),
        }
    }
}

/// Detects horizontal drags between a press and its release.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f32,
    cursor: Option<Point>,
    origin: Option<Point>,
}

impl SwipeTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            cursor: None,
            origin: None,
        }
    }

    /// Feed one event. Returns the tab navigation it completes, if any.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Swipe> {
        match event {
            PointerEvent::Moved(position) => {
                self.cursor = Some(position);
                None
            }
            PointerEvent::Pressed => {
                self.origin = self.cursor;
                None
            }
            PointerEvent::Released => {
                let end = self.cursor;
                self.finish(end)
            }
            PointerEvent::TouchPressed(position) => {
                self.cursor = Some(position);
                self.origin = Some(position);
                None
            }
            PointerEvent::TouchLifted(position) => {
                self.cursor = Some(position);
                self.finish(Some(position))
            }
            PointerEvent::PressCaptured => {
                self.origin = None;
                None
            }
            PointerEvent::ArrowLeft => Some(Swipe::Right),
            PointerEvent::ArrowRight => Some(Swipe::Left),
        }
    }

    fn finish(&mut self, end: Option<Point>) -> Option<Swipe> {
        let (start, end) = (self.origin.take()?, end?);
        let dx = end.x - start.x;
        let dy = end.y - start.y;

        if dx.abs() < self.threshold || dx.abs() <= dy.abs() {
            return None;
        }

        if dx < 0.0 {
            Some(Swipe::Left)
        } else {
            Some(Swipe::Right)
        }
    }
}

/// Filter for `iced::event::listen_with`.
///
/// Keys and presses captured by a widget (the focused text input, a button)
/// belong to that widget and never navigate tabs.
pub fn pointer_event(event: Event, status: event::Status) -> Option<PointerEvent> {
    let captured = status == event::Status::Captured;

    match event {
        Event::Mouse(mouse::Event::CursorMoved { position }) => Some(PointerEvent::Moved(position)),
        Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => Some(if captured {
            PointerEvent::PressCaptured
        } else {
            PointerEvent::Pressed
        }),
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
            Some(PointerEvent::Released)
        }
        Event::Touch(touch::Event::FingerPressed { position, .. }) => Some(if captured {
            PointerEvent::PressCaptured
        } else {
            PointerEvent::TouchPressed(position)
        }),
        Event::Touch(touch::Event::FingerLifted { position, .. }) => {
            Some(PointerEvent::TouchLifted(position))
        }
        Event::Keyboard(_) if captured => None,
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(named),
            ..
        }) => match named {
            keyboard::key::Named::ArrowLeft => Some(PointerEvent::ArrowLeft),
            keyboard::key::Named::ArrowRight => Some(PointerEvent::ArrowRight),
            _ => None,
        },
        _ => None,
    }
}
