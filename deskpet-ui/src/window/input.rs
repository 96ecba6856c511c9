//! Translation from tao input to egui input and controller types

use tao::event::MouseButton;
use tao::keyboard::{KeyCode, ModifiersState};
use tao::window::CursorIcon;

use crate::interaction::{CursorHint, ModifierKey, PointerButton};

/// Keys egui needs for text fields and menus.
pub fn egui_key(code: KeyCode) -> Option<egui::Key> {
    let key = match code {
        KeyCode::Escape => egui::Key::Escape,
        KeyCode::Tab => egui::Key::Tab,
        KeyCode::Backspace => egui::Key::Backspace,
        KeyCode::Enter | KeyCode::NumpadEnter => egui::Key::Enter,
        KeyCode::Space => egui::Key::Space,
        KeyCode::Delete => egui::Key::Delete,
        KeyCode::ArrowDown => egui::Key::ArrowDown,
        KeyCode::ArrowLeft => egui::Key::ArrowLeft,
        KeyCode::ArrowRight => egui::Key::ArrowRight,
        KeyCode::ArrowUp => egui::Key::ArrowUp,
        KeyCode::Home => egui::Key::Home,
        KeyCode::End => egui::Key::End,
        KeyCode::KeyA => egui::Key::A,
        KeyCode::KeyC => egui::Key::C,
        KeyCode::KeyV => egui::Key::V,
        KeyCode::KeyX => egui::Key::X,
        KeyCode::KeyZ => egui::Key::Z,
        _ => return None,
    };
    Some(key)
}

pub fn modifier_key(code: KeyCode) -> ModifierKey {
    match code {
        KeyCode::ControlLeft | KeyCode::ControlRight => ModifierKey::Control,
        _ => ModifierKey::Other,
    }
}

pub fn egui_modifiers(modifiers: ModifiersState) -> egui::Modifiers {
    egui::Modifiers {
        alt: modifiers.alt_key(),
        ctrl: modifiers.control_key(),
        shift: modifiers.shift_key(),
        mac_cmd: cfg!(target_os = "macos") && modifiers.super_key(),
        command: if cfg!(target_os = "macos") {
            modifiers.super_key()
        } else {
            modifiers.control_key()
        },
    }
}

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

pub fn egui_button(button: PointerButton) -> egui::PointerButton {
    match button {
        PointerButton::Primary => egui::PointerButton::Primary,
        PointerButton::Secondary => egui::PointerButton::Secondary,
        PointerButton::Middle => egui::PointerButton::Middle,
    }
}

pub fn hint_cursor(hint: CursorHint) -> CursorIcon {
    match hint {
        CursorHint::Default => CursorIcon::Default,
        CursorHint::OpenHand => CursorIcon::Grab,
        CursorHint::DiagonalResize => CursorIcon::NeswResize,
    }
}

/// Cursor requested by egui while the pointer is over a panel.
pub fn egui_cursor(icon: egui::CursorIcon) -> CursorIcon {
    match icon {
        egui::CursorIcon::PointingHand => CursorIcon::Hand,
        egui::CursorIcon::Text => CursorIcon::Text,
        egui::CursorIcon::Grab => CursorIcon::Grab,
        egui::CursorIcon::Grabbing => CursorIcon::Grabbing,
        egui::CursorIcon::Move => CursorIcon::Move,
        egui::CursorIcon::ResizeHorizontal | egui::CursorIcon::ResizeColumn => CursorIcon::EwResize,
        egui::CursorIcon::ResizeVertical | egui::CursorIcon::ResizeRow => CursorIcon::NsResize,
        egui::CursorIcon::ResizeNeSw => CursorIcon::NeswResize,
        egui::CursorIcon::ResizeNwSe => CursorIcon::NwseResize,
        egui::CursorIcon::NotAllowed => CursorIcon::NotAllowed,
        _ => CursorIcon::Default,
    }
}
