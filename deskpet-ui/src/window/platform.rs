//! Platform-specific window configuration

use tao::window::Window;

/// Configure platform-specific window properties for transparency and click-through behavior.
pub fn configure_window(window: &Window, click_through: bool) {
    if click_through {
        set_pass_through(window, true);
    }

    #[cfg(target_os = "windows")]
    configure_windows(window);
}

/// Toggle whether pointer events fall through to the windows below.
pub fn set_pass_through(window: &Window, pass_through: bool) {
    if let Err(e) = window.set_ignore_cursor_events(pass_through) {
        log::warn!("Failed to set cursor pass-through: {}", e);
    }
}

#[cfg(target_os = "windows")]
fn configure_windows(window: &Window) {
    use tao::platform::windows::WindowExtWindows;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Dwm::{DwmExtendFrameIntoClientArea, MARGINS};

    // Extend the glass frame over the client area so alpha reaches the compositor
    unsafe {
        let hwnd = window.hwnd();
        let margins = MARGINS {
            cxLeftWidth: -1,
            cxRightWidth: -1,
            cyTopHeight: -1,
            cyBottomHeight: -1,
        };
        let _ = DwmExtendFrameIntoClientArea(HWND(hwnd as _), &margins);
    }
}
