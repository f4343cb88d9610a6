//! Input aggregation
//!
//! Keyboard, pointer, touch and the on-screen pad all feed one model of four
//! directions plus two buttons (and pause). Each logical button remembers
//! *which sources* currently hold it, so releasing a touch never clears a
//! direction that a key is still holding down.
//!
//! The simulation only ever sees an [`InputFrame`], a snapshot taken once per
//! display frame.

use glam::Vec2;

/// Minimum finger travel (px) for a touch to count as a swipe
pub const SWIPE_THRESHOLD: f32 = 30.0;

/// Grid/cardinal direction (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    #[inline]
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Cell offset as (dx, dy)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn vector(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    pub fn button(self) -> Button {
        match self {
            Direction::Up => Button::Up,
            Direction::Down => Button::Down,
            Direction::Left => Button::Left,
            Direction::Right => Button::Right,
        }
    }
}

/// Logical input shared by every device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    /// Fire / confirm / hard drop
    A,
    /// Secondary action
    B,
    Pause,
}

impl Button {
    pub const COUNT: usize = 7;
    pub const ALL: [Button; Button::COUNT] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::Pause,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Button::Up => Some(Direction::Up),
            Button::Down => Some(Direction::Down),
            Button::Left => Some(Direction::Left),
            Button::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Physical origin of an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Keyboard,
    Pointer,
    Touch,
    /// On-screen directional pad
    Pad,
}

impl Source {
    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Small bitset of buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    #[inline]
    pub fn contains(&self, b: Button) -> bool {
        self.0 & (1 << b.index()) != 0
    }

    #[inline]
    pub fn insert(&mut self, b: Button) {
        self.0 |= 1 << b.index();
    }

    #[inline]
    pub fn remove(&mut self, b: Button) {
        self.0 &= !(1 << b.index());
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Input as seen by one simulation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// Buttons held by at least one source
    pub held: ButtonSet,
    /// Buttons that went from released to held since the last snapshot
    pub pressed: ButtonSet,
    direction: Option<Direction>,
    /// Last pointer/touch position on the play surface
    pub pointer: Option<Vec2>,
    /// Pointer position if it moved since the last snapshot (edge)
    pub pointer_moved: Option<Vec2>,
    /// Click or tap position (edge)
    pub click: Option<Vec2>,
    /// Digit key 1-9 (edge)
    pub digit: Option<u8>,
    /// Erase key (edge)
    pub erase: bool,
}

impl InputFrame {
    #[inline]
    pub fn is_held(&self, b: Button) -> bool {
        self.held.contains(b)
    }

    #[inline]
    pub fn was_pressed(&self, b: Button) -> bool {
        self.pressed.contains(b)
    }

    /// Most recently pressed direction that is new this frame or still held
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// 8-way axis from held directions
    pub fn axis(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        for d in Direction::ALL {
            if self.is_held(d.button()) {
                v += d.vector();
            }
        }
        v
    }

    /// Same frame with every edge-triggered event removed
    pub fn without_edges(&self) -> Self {
        Self {
            held: self.held,
            pressed: ButtonSet::default(),
            direction: self.held_direction(),
            pointer: self.pointer,
            pointer_moved: None,
            click: None,
            digit: None,
            erase: false,
        }
    }

    /// Carry edges from an earlier frame that no simulation step consumed
    pub fn absorb_edges(&mut self, earlier: &InputFrame) {
        self.pressed.0 |= earlier.pressed.0;
        if self.click.is_none() {
            self.click = earlier.click;
        }
        if self.pointer_moved.is_none() {
            self.pointer_moved = earlier.pointer_moved;
        }
        if self.digit.is_none() {
            self.digit = earlier.digit;
        }
        self.erase |= earlier.erase;
        if self.direction.is_none() {
            self.direction = earlier.direction;
        }
    }

    fn held_direction(&self) -> Option<Direction> {
        self.direction.filter(|d| self.is_held(d.button()))
    }

    // Builders, mostly for driving games directly

    pub fn hold(mut self, b: Button) -> Self {
        self.held.insert(b);
        if let Some(d) = b.direction() {
            self.direction = Some(d);
        }
        self
    }

    pub fn press(mut self, b: Button) -> Self {
        self.pressed.insert(b);
        if let Some(d) = b.direction() {
            self.direction = Some(d);
        }
        self
    }

    pub fn with_pointer(mut self, pos: Vec2) -> Self {
        self.pointer = Some(pos);
        self.pointer_moved = Some(pos);
        self
    }

    pub fn with_click(mut self, pos: Vec2) -> Self {
        self.pointer = Some(pos);
        self.click = Some(pos);
        self
    }

    pub fn with_digit(mut self, digit: u8) -> Self {
        self.digit = Some(digit);
        self
    }

    pub fn with_erase(mut self) -> Self {
        self.erase = true;
        self
    }
}

/// Map a DOM `KeyboardEvent.key` to a logical button
pub fn key_button(key: &str) -> Option<Button> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Button::Up),
        "ArrowDown" | "s" | "S" => Some(Button::Down),
        "ArrowLeft" | "a" | "A" => Some(Button::Left),
        "ArrowRight" | "d" | "D" => Some(Button::Right),
        " " | "Spacebar" | "Enter" | "Control" => Some(Button::A),
        "b" | "B" | "Shift" => Some(Button::B),
        "p" | "P" | "Escape" => Some(Button::Pause),
        _ => None,
    }
}

/// Merges every input source into per-frame snapshots
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    /// Bitmask of holding sources per button
    active: [u8; Button::COUNT],
    pressed: ButtonSet,
    /// Held directions, oldest press first
    direction_order: Vec<Direction>,
    pressed_direction: Option<Direction>,
    pointer: Option<Vec2>,
    pointer_moved: Option<Vec2>,
    click: Option<Vec2>,
    digit: Option<u8>,
    erase: bool,
    touch_origin: Option<Vec2>,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button, source: Source) {
        let slot = &mut self.active[button.index()];
        let was_released = *slot == 0;
        *slot |= source.bit();
        if was_released {
            self.pressed.insert(button);
            if let Some(d) = button.direction() {
                self.direction_order.retain(|&o| o != d);
                self.direction_order.push(d);
                self.pressed_direction = Some(d);
            }
        }
    }

    pub fn release(&mut self, button: Button, source: Source) {
        let slot = &mut self.active[button.index()];
        *slot &= !source.bit();
        if *slot == 0 {
            if let Some(d) = button.direction() {
                self.direction_order.retain(|&o| o != d);
            }
        }
    }

    /// Drop everything one source holds (touch end, focus loss)
    pub fn release_source(&mut self, source: Source) {
        for b in Button::ALL {
            self.release(b, source);
        }
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.active[button.index()] != 0
    }

    /// Returns whether the key means something to the games
    pub fn key_down(&mut self, key: &str) -> bool {
        if let Some(b) = key_button(key) {
            self.press(b, Source::Keyboard);
            return true;
        }
        match key {
            "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9" => {
                self.digit = key.parse().ok();
                true
            }
            "0" | "Backspace" | "Delete" => {
                self.erase = true;
                true
            }
            _ => false,
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(b) = key_button(key) {
            self.release(b, Source::Keyboard);
        }
    }

    fn move_pointer(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
        self.pointer_moved = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.move_pointer(pos);
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.move_pointer(pos);
        self.click = Some(pos);
    }

    pub fn touch_start(&mut self, pos: Vec2) {
        self.touch_origin = Some(pos);
        self.move_pointer(pos);
    }

    pub fn touch_move(&mut self, pos: Vec2) {
        self.move_pointer(pos);
    }

    /// A long enough drag is a one-shot direction; anything shorter is a tap
    pub fn touch_end(&mut self, pos: Vec2) {
        if let Some(origin) = self.touch_origin.take() {
            let d = pos - origin;
            if d.length() >= SWIPE_THRESHOLD {
                let dir = if d.x.abs() > d.y.abs() {
                    if d.x > 0.0 { Direction::Right } else { Direction::Left }
                } else if d.y > 0.0 {
                    Direction::Down
                } else {
                    Direction::Up
                };
                self.press(dir.button(), Source::Touch);
            } else {
                self.click = Some(pos);
            }
        }
        self.release_source(Source::Touch);
    }

    pub fn pad_press(&mut self, button: Button) {
        self.press(button, Source::Pad);
    }

    pub fn pad_release(&mut self, button: Button) {
        self.release(button, Source::Pad);
    }

    /// Take a snapshot and consume the edge-triggered events
    pub fn snapshot(&mut self) -> InputFrame {
        let mut held = ButtonSet::default();
        for b in Button::ALL {
            if self.is_held(b) {
                held.insert(b);
            }
        }
        let direction = self
            .pressed_direction
            .take()
            .or_else(|| self.direction_order.last().copied());

        InputFrame {
            held,
            pressed: std::mem::take(&mut self.pressed),
            direction,
            pointer: self.pointer,
            pointer_moved: self.pointer_moved.take(),
            click: self.click.take(),
            digit: self.digit.take(),
            erase: std::mem::take(&mut self.erase),
        }
    }

    /// Forget everything (game reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_from_other_source_keeps_button_held() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowLeft");
        input.pad_press(Button::Left);
        input.pad_release(Button::Left);
        assert!(input.is_held(Button::Left));
        input.key_up("ArrowLeft");
        assert!(!input.is_held(Button::Left));
    }

    #[test]
    fn test_press_is_edge_triggered() {
        let mut input = InputAggregator::new();
        input.key_down(" ");
        let f1 = input.snapshot();
        assert!(f1.was_pressed(Button::A));
        assert!(f1.is_held(Button::A));

        // Key repeat while held is not a new press
        input.key_down(" ");
        let f2 = input.snapshot();
        assert!(!f2.was_pressed(Button::A));
        assert!(f2.is_held(Button::A));
    }

    #[test]
    fn test_second_source_is_not_a_new_press() {
        let mut input = InputAggregator::new();
        input.key_down("Enter");
        input.snapshot();
        input.pad_press(Button::A);
        assert!(!input.snapshot().was_pressed(Button::A));
    }

    #[test]
    fn test_direction_prefers_latest() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowUp");
        input.key_down("ArrowRight");
        assert_eq!(input.snapshot().direction(), Some(Direction::Right));
        input.key_up("ArrowRight");
        assert_eq!(input.snapshot().direction(), Some(Direction::Up));
        input.key_up("ArrowUp");
        assert_eq!(input.snapshot().direction(), None);
    }

    #[test]
    fn test_quick_tap_still_reports_direction() {
        let mut input = InputAggregator::new();
        input.key_down("a");
        input.key_up("a");
        let f = input.snapshot();
        assert_eq!(f.direction(), Some(Direction::Left));
        assert!(!f.is_held(Button::Left));
    }

    #[test]
    fn test_swipe_and_tap() {
        let mut input = InputAggregator::new();
        input.touch_start(Vec2::new(100.0, 100.0));
        input.touch_end(Vec2::new(100.0, 160.0));
        let f = input.snapshot();
        assert_eq!(f.direction(), Some(Direction::Down));
        assert!(f.was_pressed(Button::Down));
        assert!(!f.is_held(Button::Down));

        input.touch_start(Vec2::new(50.0, 50.0));
        input.touch_end(Vec2::new(52.0, 51.0));
        let f = input.snapshot();
        assert_eq!(f.click, Some(Vec2::new(52.0, 51.0)));
        assert_eq!(f.direction(), None);
    }

    #[test]
    fn test_touch_end_keeps_keyboard_hold() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowRight");
        input.touch_start(Vec2::ZERO);
        input.touch_end(Vec2::new(40.0, 0.0));
        assert!(input.is_held(Button::Right));
    }

    #[test]
    fn test_digits_and_erase() {
        let mut input = InputAggregator::new();
        assert!(input.key_down("7"));
        assert!(input.key_down("Backspace"));
        assert!(!input.key_down("q"));
        let f = input.snapshot();
        assert_eq!(f.digit, Some(7));
        assert!(f.erase);
        let f = input.snapshot();
        assert_eq!(f.digit, None);
        assert!(!f.erase);
    }

    #[test]
    fn test_axis_and_without_edges() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowUp");
        input.key_down("ArrowLeft");
        input.pointer_down(Vec2::new(3.0, 4.0));
        let f = input.snapshot();
        assert_eq!(f.axis(), Vec2::new(-1.0, -1.0));
        let later = f.without_edges();
        assert!(later.is_held(Button::Up));
        assert!(!later.was_pressed(Button::Up));
        assert!(later.click.is_none());
        assert_eq!(later.pointer, Some(Vec2::new(3.0, 4.0)));
        assert_eq!(f.pointer_moved, Some(Vec2::new(3.0, 4.0)));
        assert!(later.pointer_moved.is_none());
    }

    #[test]
    fn test_pointer_move_is_edge_but_position_sticks() {
        let mut input = InputAggregator::new();
        input.pointer_move(Vec2::new(200.0, 100.0));
        let f = input.snapshot();
        assert_eq!(f.pointer_moved, Some(Vec2::new(200.0, 100.0)));

        input.key_down("ArrowRight");
        let f = input.snapshot();
        assert!(f.pointer_moved.is_none());
        assert_eq!(f.pointer, Some(Vec2::new(200.0, 100.0)));
        assert!(f.is_held(Button::Right));
    }

    #[test]
    fn test_absorb_edges() {
        let earlier = InputFrame::default().press(Button::A).with_digit(4);
        let mut now = InputFrame::default();
        now.absorb_edges(&earlier);
        assert!(now.was_pressed(Button::A));
        assert_eq!(now.digit, Some(4));
    }
}
