//! Pointer-driven drag/resize state machine for overlay widgets.
//!
//! An [`OverlayWidgetController`] owns one widget's geometry and interaction
//! mode. The host feeds it pointer events in widget-local coordinates and it
//! pushes the resulting geometry and cursor hints to a [`Drawable`].
//!
//! Only the top-right corner is a resize handle. A resize keeps the aspect
//! ratio captured when the gesture started and pins the bottom edge, so the
//! widget grows and shrinks from the top.

use std::ops::{Add, Sub};

/// Radius around the top-right corner that starts a resize.
pub const DEFAULT_RESIZE_MARGIN: f64 = 30.0;
/// Smallest width or height a resize may produce.
pub const DEFAULT_MIN_SIZE: i32 = 50;
/// Largest width or height a resize may produce.
pub const DEFAULT_MAX_SIZE: i32 = 2000;

/// Integer point, either in parent-window space or widget-local space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Position and size of a widget in parent-window space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Geometry {
    pub position: Point,
    pub size: Size,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            position: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.position.y + self.size.height
    }

    /// Whether a parent-space point falls inside the widget.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x < self.position.x + self.size.width
            && point.y < self.position.y + self.size.height
    }

    /// Convert a parent-space point into widget-local coordinates.
    pub fn to_local(&self, point: Point) -> Point {
        point - self.position
    }
}

/// What the pointer is currently doing to a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Resizing,
}

/// Cursor shape the host should show over a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    OpenHand,
    DiagonalResize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A pointer event in widget-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { local: Point, button: PointerButton },
    Move { local: Point, primary_held: bool },
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Control,
    Other,
}

/// Size bounds and handle radius used by a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionLimits {
    pub resize_margin: f64,
    pub min_size: i32,
    pub max_size: i32,
}

impl Default for InteractionLimits {
    fn default() -> Self {
        Self {
            resize_margin: DEFAULT_RESIZE_MARGIN,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl InteractionLimits {
    fn clamp(&self, value: f64) -> f64 {
        value.min(self.max_size as f64).max(self.min_size as f64)
    }
}

/// The visual side of a widget. The controller pushes geometry and cursor
/// changes here; each UI binding implements it for its own surface type.
pub trait Drawable {
    fn move_to(&mut self, position: Point);
    fn resize(&mut self, size: Size);
    fn set_cursor(&mut self, hint: CursorHint);
    fn set_dashed_border(&mut self, visible: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Drag {
        /// Pointer position inside the widget at press time
        offset: Point,
    },
    Resize {
        start_size: Size,
        start_pointer: Point,
        start_bottom_y: i32,
        aspect_ratio: f64,
    },
}

/// Geometry plus the in-flight gesture, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayWidgetState {
    pub geometry: Geometry,
    gesture: Option<Gesture>,
}

impl OverlayWidgetState {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            gesture: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        match self.gesture {
            None => InteractionMode::Idle,
            Some(Gesture::Drag { .. }) => InteractionMode::Dragging,
            Some(Gesture::Resize { .. }) => InteractionMode::Resizing,
        }
    }

    /// Aspect ratio locked by the current resize gesture.
    pub fn aspect_ratio(&self) -> Option<f64> {
        match self.gesture {
            Some(Gesture::Resize { aspect_ratio, .. }) => Some(aspect_ratio),
            _ => None,
        }
    }

    /// Pointer offset recorded when the current drag started.
    pub fn drag_offset(&self) -> Option<Point> {
        match self.gesture {
            Some(Gesture::Drag { offset }) => Some(offset),
            _ => None,
        }
    }
}

/// Drives one overlay widget from pointer and key events.
#[derive(Debug, Clone)]
pub struct OverlayWidgetController {
    state: OverlayWidgetState,
    limits: InteractionLimits,
    resizable: bool,
}

impl OverlayWidgetController {
    /// Controller with drag and top-right resize.
    pub fn new(geometry: Geometry, limits: InteractionLimits) -> Self {
        Self {
            state: OverlayWidgetState::new(geometry),
            limits,
            resizable: true,
        }
    }

    /// Controller that only drags. Moves are ignored unless the primary
    /// button is held.
    pub fn drag_only(geometry: Geometry, limits: InteractionLimits) -> Self {
        Self {
            resizable: false,
            ..Self::new(geometry, limits)
        }
    }

    pub fn state(&self) -> &OverlayWidgetState {
        &self.state
    }

    pub fn geometry(&self) -> Geometry {
        self.state.geometry
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode()
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn limits(&self) -> &InteractionLimits {
        &self.limits
    }

    /// Replace the geometry outside of a gesture (initial placement, media
    /// reporting its natural size).
    pub fn set_geometry(&mut self, geometry: Geometry, surface: &mut dyn Drawable) {
        self.apply(geometry, surface);
    }

    /// Whether a local point hits the top-right resize handle.
    pub fn in_resize_zone(&self, local: Point) -> bool {
        if !self.resizable {
            return false;
        }
        let dx = (local.x - self.state.geometry.size.width) as f64;
        let dy = local.y as f64;
        dx.hypot(dy) < self.limits.resize_margin
    }

    /// Feed one pointer event.
    pub fn handle(&mut self, event: PointerEvent, surface: &mut dyn Drawable) {
        match event {
            PointerEvent::Press { local, button } => self.press(local, button),
            PointerEvent::Move {
                local,
                primary_held,
            } => self.pointer_moved(local, primary_held, surface),
            PointerEvent::Release => self.release(surface),
        }
    }

    /// Abort any gesture, as if the pointer had been released.
    pub fn cancel(&mut self, surface: &mut dyn Drawable) {
        self.release(surface);
    }

    pub fn key_down(&mut self, key: ModifierKey, auto_repeat: bool, surface: &mut dyn Drawable) {
        if self.resizable && key == ModifierKey::Control && !auto_repeat {
            surface.set_dashed_border(true);
        }
    }

    pub fn key_up(&mut self, key: ModifierKey, auto_repeat: bool, surface: &mut dyn Drawable) {
        if self.resizable && key == ModifierKey::Control && !auto_repeat {
            surface.set_dashed_border(false);
        }
    }

    fn press(&mut self, local: Point, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }

        if self.in_resize_zone(local) {
            let size = self.state.geometry.size;
            self.state.gesture = Some(Gesture::Resize {
                start_size: size,
                start_pointer: local,
                start_bottom_y: self.state.geometry.bottom(),
                aspect_ratio: size.width as f64 / size.height.max(1) as f64,
            });
            log::debug!("Resize started at {:?}, size {:?}", local, size);
        } else {
            self.state.gesture = Some(Gesture::Drag { offset: local });
            log::debug!("Drag started with offset {:?}", local);
        }
    }

    fn pointer_moved(&mut self, local: Point, primary_held: bool, surface: &mut dyn Drawable) {
        match self.state.gesture {
            Some(Gesture::Resize {
                start_size,
                start_pointer,
                start_bottom_y,
                aspect_ratio,
            }) => {
                let dx = local.x - start_pointer.x;
                let dy = start_pointer.y - local.y;

                let (width, height) = if dx.abs() > dy.abs() {
                    let width = (start_size.width + dx) as f64;
                    (width, width / aspect_ratio)
                } else {
                    let height = (start_size.height + dy) as f64;
                    (height * aspect_ratio, height)
                };

                // Each axis is clamped on its own, after the aspect-preserving step
                let width = self.limits.clamp(width) as i32;
                let height = self.limits.clamp(height) as i32;

                let geometry = Geometry::new(
                    self.state.geometry.position.x,
                    start_bottom_y - height,
                    width,
                    height,
                );
                self.apply(geometry, surface);
            }
            Some(Gesture::Drag { offset }) => {
                if !self.resizable && !primary_held {
                    return;
                }
                let position = self.state.geometry.position + (local - offset);
                self.state.geometry.position = position;
                surface.move_to(position);
            }
            None => {
                if self.resizable {
                    let hint = if self.in_resize_zone(local) {
                        CursorHint::DiagonalResize
                    } else {
                        CursorHint::OpenHand
                    };
                    surface.set_cursor(hint);
                }
            }
        }
    }

    fn release(&mut self, surface: &mut dyn Drawable) {
        if self.state.gesture.take().is_some() {
            log::debug!("Gesture finished at {:?}", self.state.geometry);
        }
        surface.set_cursor(CursorHint::Default);
    }

    fn apply(&mut self, geometry: Geometry, surface: &mut dyn Drawable) {
        self.state.geometry = geometry;
        surface.move_to(geometry.position);
        surface.resize(geometry.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        position: Point,
        size: Size,
        cursor: CursorHint,
        dashed: bool,
        moves: usize,
    }

    impl Drawable for RecordingSurface {
        fn move_to(&mut self, position: Point) {
            self.position = position;
            self.moves += 1;
        }

        fn resize(&mut self, size: Size) {
            self.size = size;
        }

        fn set_cursor(&mut self, hint: CursorHint) {
            self.cursor = hint;
        }

        fn set_dashed_border(&mut self, visible: bool) {
            self.dashed = visible;
        }
    }

    fn widget(x: i32, y: i32, width: i32, height: i32) -> OverlayWidgetController {
        OverlayWidgetController::new(Geometry::new(x, y, width, height), InteractionLimits::default())
    }

    fn press(controller: &mut OverlayWidgetController, surface: &mut RecordingSurface, x: i32, y: i32) {
        controller.handle(
            PointerEvent::Press {
                local: Point::new(x, y),
                button: PointerButton::Primary,
            },
            surface,
        );
    }

    fn drag_to(controller: &mut OverlayWidgetController, surface: &mut RecordingSurface, x: i32, y: i32) {
        controller.handle(
            PointerEvent::Move {
                local: Point::new(x, y),
                primary_held: true,
            },
            surface,
        );
    }

    #[test]
    fn test_press_near_handle_starts_resize() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        assert_eq!(controller.mode(), InteractionMode::Resizing);
        assert_eq!(controller.state().aspect_ratio(), Some(2.0));
    }

    #[test]
    fn test_press_exactly_on_margin_is_a_drag() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        // 18-24-30 triangle: distance to (200, 0) is exactly 30
        assert!(!controller.in_resize_zone(Point::new(182, 24)));
        assert!(!controller.in_resize_zone(Point::new(170, 0)));
        assert!(controller.in_resize_zone(Point::new(171, 0)));

        press(&mut controller, &mut surface, 182, 24);
        assert_eq!(controller.mode(), InteractionMode::Dragging);
    }

    #[test]
    fn test_width_driven_resize_pins_bottom_edge() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        drag_to(&mut controller, &mut surface, 245, 5);

        assert_eq!(controller.geometry(), Geometry::new(0, -25, 250, 125));
        assert_eq!(surface.position, Point::new(0, -25));
        assert_eq!(surface.size, Size::new(250, 125));
    }

    #[test]
    fn test_height_driven_resize_when_moving_up() {
        let mut controller = widget(40, 300, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        drag_to(&mut controller, &mut surface, 200, -35);

        // dx = 5, dy = 40: height drives
        assert_eq!(controller.geometry(), Geometry::new(40, 260, 280, 140));
    }

    #[test]
    fn test_equal_deltas_go_to_height() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        drag_to(&mut controller, &mut surface, 205, -5);

        // |dx| == |dy| == 10, height = 110, width = 220
        assert_eq!(controller.geometry().size, Size::new(220, 110));
        assert_eq!(controller.geometry().bottom(), 100);
    }

    #[test]
    fn test_resize_truncates_fractional_sizes() {
        let mut controller = widget(0, 0, 300, 200);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 295, 5);
        drag_to(&mut controller, &mut surface, 296, 5);

        // 301 / 1.5 = 200.67
        assert_eq!(controller.geometry(), Geometry::new(0, 0, 301, 200));
    }

    #[test]
    fn test_clamp_is_per_axis_and_may_distort_aspect() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        drag_to(&mut controller, &mut surface, 2995, 5);

        // width 3000 -> 2000, height 1500 stays: ratio is no longer 2.0
        let geometry = controller.geometry();
        assert_eq!(geometry, Geometry::new(0, -1400, 2000, 1500));
        assert_eq!(geometry.bottom(), 100);
    }

    #[test]
    fn test_clamp_to_minimum() {
        let mut controller = widget(10, 10, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        drag_to(&mut controller, &mut surface, 45, 5);

        // width 50, height 25 -> 50
        assert_eq!(controller.geometry(), Geometry::new(10, 60, 50, 50));
    }

    #[test]
    fn test_sizes_stay_in_bounds_over_a_gesture() {
        let mut controller = widget(0, 500, 120, 80);
        let mut surface = RecordingSurface::default();
        press(&mut controller, &mut surface, 118, 2);

        for step in -60..60 {
            let x = 118 + step * 47;
            let y = 2 - step * 13;
            drag_to(&mut controller, &mut surface, x, y);
            let size = controller.geometry().size;
            assert!((50..=2000).contains(&size.width), "width {}", size.width);
            assert!((50..=2000).contains(&size.height), "height {}", size.height);
        }
    }

    #[test]
    fn test_bottom_edge_constant_without_clamping() {
        let mut controller = widget(0, 400, 200, 100);
        let mut surface = RecordingSurface::default();
        press(&mut controller, &mut surface, 195, 5);

        for (x, y) in [(215, 5), (230, 0), (190, -20), (260, 30), (199, -3)] {
            drag_to(&mut controller, &mut surface, x, y);
            assert_eq!(controller.geometry().bottom(), 500);
            assert_eq!(controller.mode(), InteractionMode::Resizing);
        }
    }

    #[test]
    fn test_drag_keeps_pointer_offset() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 10, 10);
        assert_eq!(controller.mode(), InteractionMode::Dragging);
        assert_eq!(controller.state().drag_offset(), Some(Point::new(10, 10)));

        drag_to(&mut controller, &mut surface, 110, 60);
        assert_eq!(controller.geometry().position, Point::new(100, 50));
        assert_eq!(controller.geometry().size, Size::new(200, 100));

        // Host converts the next global pointer position with the new origin
        let global = Point::new(150, 75);
        let local = controller.geometry().to_local(global);
        drag_to(&mut controller, &mut surface, local.x, local.y);
        assert_eq!(controller.geometry().to_local(global), Point::new(10, 10));
    }

    #[test]
    fn test_release_twice_is_idle_and_keeps_geometry() {
        let mut controller = widget(5, 6, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 50, 50);
        controller.handle(PointerEvent::Release, &mut surface);
        let geometry = controller.geometry();
        controller.handle(PointerEvent::Release, &mut surface);

        assert_eq!(controller.mode(), InteractionMode::Idle);
        assert_eq!(controller.geometry(), geometry);
        assert_eq!(surface.cursor, CursorHint::Default);
        assert_eq!(surface.moves, 0);
    }

    #[test]
    fn test_idle_move_only_updates_cursor() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        let hover = |x, y| PointerEvent::Move {
            local: Point::new(x, y),
            primary_held: false,
        };

        controller.handle(hover(190, 8), &mut surface);
        assert_eq!(surface.cursor, CursorHint::DiagonalResize);

        controller.handle(hover(20, 50), &mut surface);
        assert_eq!(surface.cursor, CursorHint::OpenHand);
        assert_eq!(surface.moves, 0);
        assert_eq!(controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_secondary_press_is_ignored() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        controller.handle(
            PointerEvent::Press {
                local: Point::new(195, 5),
                button: PointerButton::Secondary,
            },
            &mut surface,
        );
        assert_eq!(controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_new_press_replaces_previous_mode() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 195, 5);
        assert_eq!(controller.mode(), InteractionMode::Resizing);
        press(&mut controller, &mut surface, 20, 20);
        assert_eq!(controller.mode(), InteractionMode::Dragging);
        assert_eq!(controller.state().aspect_ratio(), None);
    }

    #[test]
    fn test_drag_only_widget_never_resizes() {
        let mut controller = OverlayWidgetController::drag_only(
            Geometry::new(0, 0, 200, 100),
            InteractionLimits::default(),
        );
        let mut surface = RecordingSurface::default();

        press(&mut controller, &mut surface, 199, 1);
        assert_eq!(controller.mode(), InteractionMode::Dragging);

        // Without the button held nothing moves
        controller.handle(
            PointerEvent::Move {
                local: Point::new(250, 40),
                primary_held: false,
            },
            &mut surface,
        );
        assert_eq!(controller.geometry().position, Point::new(0, 0));

        drag_to(&mut controller, &mut surface, 250, 40);
        assert_eq!(controller.geometry(), Geometry::new(51, 39, 200, 100));
    }

    #[test]
    fn test_control_key_toggles_dashed_border() {
        let mut controller = widget(0, 0, 200, 100);
        let mut surface = RecordingSurface::default();

        controller.key_down(ModifierKey::Control, false, &mut surface);
        assert!(surface.dashed);

        controller.key_up(ModifierKey::Control, true, &mut surface);
        assert!(surface.dashed);

        controller.key_up(ModifierKey::Control, false, &mut surface);
        assert!(!surface.dashed);
        assert_eq!(controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_custom_limits() {
        let limits = InteractionLimits {
            resize_margin: 10.0,
            min_size: 20,
            max_size: 300,
        };
        let mut controller = OverlayWidgetController::new(Geometry::new(0, 0, 100, 100), limits);
        let mut surface = RecordingSurface::default();

        assert!(!controller.in_resize_zone(Point::new(85, 5)));
        press(&mut controller, &mut surface, 95, 5);
        drag_to(&mut controller, &mut surface, 995, 5);
        assert_eq!(controller.geometry(), Geometry::new(0, -200, 300, 300));
    }
}
