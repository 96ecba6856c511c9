//! Window configuration types

/// Configuration for creating an overlay window.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    /// Inner size in logical pixels. `None` covers the primary monitor.
    pub size: Option<(u32, u32)>,
    /// Whether the window should always stay on top.
    pub always_on_top: bool,
    /// Whether mouse clicks should pass through the window entirely.
    pub click_through: bool,
    /// Let clicks through where no widget or panel is under the cursor (macOS only).
    pub pass_through_empty: bool,
    /// Window title (not visible for borderless windows).
    pub title: String,
    /// Frame rate while something is animating.
    pub target_fps: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: None,
            always_on_top: true,
            click_through: false,
            pass_through_empty: false,
            title: "Animated Desktop".to_string(),
            target_fps: 30.0,
        }
    }
}
