//! The set of overlay widgets on the window and pointer routing between them

use std::fmt;

use deskpet_ui::{
    CursorHint, Drawable, Geometry, InteractionLimits, Media, ModifierKey,
    OverlayWidgetController, Point, PointerButton, PointerEvent, Size,
};
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke};

use crate::assets::AssetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Where a widget's content came from.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSource {
    Asset(AssetId),
    Remote(String),
    /// Loaded from a path outside the library (startup image)
    File(std::path::PathBuf),
}

/// What a widget draws.
pub enum WidgetContent {
    Media(Media),
    /// Videos are not decoded, only represented
    VideoPlaceholder { name: String },
    /// A GIF that failed to decode
    InvalidGif,
}

impl WidgetContent {
    fn is_animated(&self) -> bool {
        matches!(self, Self::Media(media) if media.is_animated())
    }
}

/// Drawing state the controller writes into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visual {
    pub position: Point,
    pub size: Size,
    pub cursor: CursorHint,
    pub dashed_border: bool,
}

impl Visual {
    fn new(geometry: Geometry) -> Self {
        Self {
            position: geometry.position,
            size: geometry.size,
            ..Default::default()
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.position.x as f32, self.position.y as f32),
            egui::vec2(self.size.width as f32, self.size.height as f32),
        )
    }
}

impl Drawable for Visual {
    fn move_to(&mut self, position: Point) {
        self.position = position;
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn set_cursor(&mut self, hint: CursorHint) {
        self.cursor = hint;
    }

    fn set_dashed_border(&mut self, visible: bool) {
        self.dashed_border = visible;
    }
}

pub struct OverlayWidget {
    pub id: WidgetId,
    pub source: WidgetSource,
    pub name: String,
    controller: OverlayWidgetController,
    visual: Visual,
    content: WidgetContent,
}

impl OverlayWidget {
    pub fn geometry(&self) -> Geometry {
        self.controller.geometry()
    }

    pub fn controller(&self) -> &OverlayWidgetController {
        &self.controller
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    pub fn content(&self) -> &WidgetContent {
        &self.content
    }

    fn handle(&mut self, event: PointerEvent) {
        self.controller.handle(event, &mut self.visual);
    }

    fn local(&self, position: Point) -> Point {
        self.controller.geometry().to_local(position)
    }

    fn paint(&self, painter: &Painter) {
        let rect = self.visual.rect();
        match &self.content {
            WidgetContent::Media(media) => {
                painter.image(
                    media.current_texture().id(),
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
            WidgetContent::VideoPlaceholder { name } => {
                painter.rect_filled(rect, 4.0, Color32::from_rgba_unmultiplied(20, 20, 20, 220));
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    format!("▶ {}", name),
                    FontId::proportional(16.0),
                    Color32::WHITE,
                );
            }
            WidgetContent::InvalidGif => {
                painter.rect_filled(rect, 0.0, Color32::from_black_alpha(120));
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "GIF invalid",
                    FontId::proportional(16.0),
                    Color32::WHITE,
                );
            }
        }

        if self.visual.dashed_border {
            let points = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
                rect.left_top(),
            ];
            painter.extend(Shape::dashed_line(
                &points,
                Stroke::new(2.0, Color32::WHITE),
                6.0,
                4.0,
            ));
        }
    }
}

/// Result of a pointer press on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Nothing under the pointer
    Missed,
    /// The widget captured the pointer
    Captured(WidgetId),
    /// Secondary press on a widget
    ContextMenu(WidgetId),
}

/// Overlay widgets in z-order, last on top.
pub struct Stage {
    widgets: Vec<OverlayWidget>,
    next_id: u64,
    limits: InteractionLimits,
    captured: Option<WidgetId>,
    focused: Option<WidgetId>,
    hovered: Option<WidgetId>,
}

impl Stage {
    pub fn new(limits: InteractionLimits) -> Self {
        Self {
            widgets: Vec::new(),
            next_id: 1,
            limits,
            captured: None,
            focused: None,
            hovered: None,
        }
    }

    /// Put a widget on top of the stage.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: WidgetSource,
        content: WidgetContent,
        geometry: Geometry,
        resizable: bool,
    ) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;

        let controller = if resizable {
            OverlayWidgetController::new(geometry, self.limits)
        } else {
            OverlayWidgetController::drag_only(geometry, self.limits)
        };
        let name = name.into();
        log::info!("Added {} ({}) at {:?}", id, name, geometry);

        self.widgets.push(OverlayWidget {
            id,
            source,
            name,
            controller,
            visual: Visual::new(geometry),
            content,
        });
        id
    }

    /// Take a widget off the stage. It receives no further events.
    pub fn remove(&mut self, id: WidgetId) -> Option<OverlayWidget> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        for slot in [&mut self.captured, &mut self.focused, &mut self.hovered] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        let widget = self.widgets.remove(index);
        log::info!("Removed {} ({})", id, widget.name);
        Some(widget)
    }

    pub fn get(&self, id: WidgetId) -> Option<&OverlayWidget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    fn get_mut(&mut self, id: WidgetId) -> Option<&mut OverlayWidget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn widgets(&self) -> &[OverlayWidget] {
        &self.widgets
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn captured(&self) -> Option<WidgetId> {
        self.captured
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    /// Topmost widget containing `position`.
    pub fn widget_at(&self, position: Point) -> Option<WidgetId> {
        self.widgets
            .iter()
            .rev()
            .find(|w| w.geometry().contains(position))
            .map(|w| w.id)
    }

    pub fn hit_test(&self, position: Point) -> bool {
        self.captured.is_some() || self.widget_at(position).is_some()
    }

    pub fn pointer_pressed(&mut self, position: Point, button: PointerButton) -> PressOutcome {
        let Some(id) = self.widget_at(position) else {
            if button == PointerButton::Primary {
                self.focused = None;
            }
            return PressOutcome::Missed;
        };

        match button {
            PointerButton::Primary => {
                if let Some(widget) = self.get_mut(id) {
                    let local = widget.local(position);
                    widget.handle(PointerEvent::Press { local, button });
                }
                self.captured = Some(id);
                self.focused = Some(id);
                PressOutcome::Captured(id)
            }
            PointerButton::Secondary => PressOutcome::ContextMenu(id),
            PointerButton::Middle => PressOutcome::Missed,
        }
    }

    /// Route a move. `over_ui` means an egui panel is on top of the stage here.
    pub fn pointer_moved(&mut self, position: Point, primary_held: bool, over_ui: bool) {
        if let Some(id) = self.captured {
            if let Some(widget) = self.get_mut(id) {
                let local = widget.local(position);
                widget.handle(PointerEvent::Move { local, primary_held });
            }
            return;
        }

        self.hovered = if over_ui { None } else { self.widget_at(position) };
        if let Some(id) = self.hovered {
            if let Some(widget) = self.get_mut(id) {
                let local = widget.local(position);
                widget.handle(PointerEvent::Move {
                    local,
                    primary_held: false,
                });
            }
        }
    }

    /// Any button release ends the gesture of the captured widget.
    pub fn pointer_released(&mut self) {
        if let Some(id) = self.captured.take() {
            if let Some(widget) = self.get_mut(id) {
                widget.handle(PointerEvent::Release);
            }
        }
    }

    /// End any gesture, e.g. when the window loses focus mid-drag.
    pub fn cancel(&mut self) {
        if let Some(id) = self.captured.take() {
            if let Some(widget) = self.get_mut(id) {
                widget.controller.cancel(&mut widget.visual);
            }
        }
    }

    pub fn key_changed(&mut self, key: ModifierKey, pressed: bool, repeat: bool) {
        let Some(id) = self.focused else {
            return;
        };
        if let Some(widget) = self.get_mut(id) {
            if pressed {
                widget.controller.key_down(key, repeat, &mut widget.visual);
            } else {
                widget.controller.key_up(key, repeat, &mut widget.visual);
            }
        }
    }

    /// Cursor for the captured widget, else the hovered one.
    pub fn cursor_hint(&self) -> CursorHint {
        self.captured
            .or(self.hovered)
            .and_then(|id| self.get(id))
            .map(|w| w.visual.cursor)
            .unwrap_or_default()
    }

    /// Advance animations. Returns true if any visible frame changed.
    pub fn update(&mut self, delta: f32) -> bool {
        let mut changed = false;
        for widget in &mut self.widgets {
            if let WidgetContent::Media(media) = &mut widget.content {
                changed |= media.update(delta);
            }
        }
        changed
    }

    pub fn is_animating(&self) -> bool {
        self.widgets.iter().any(|w| w.content.is_animated())
    }

    /// Draw every widget bottom to top.
    pub fn paint(&self, painter: &Painter) {
        for widget in &self.widgets {
            widget.paint(painter);
        }
    }
}
