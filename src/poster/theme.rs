use crate::config::PosterConfig;
use crate::foundation::core::Rgba8;
use crate::poster::icons::Icon;

/// Theme color used for styles without an entry.
pub const FALLBACK_COLOR: Rgba8 = Rgba8::rgb(0x4c, 0xaf, 0x50);

struct BuiltinStyle {
    key: &'static str,
    name: &'static str,
    color: Rgba8,
    icon: Icon,
    occasions: &'static str,
}

const BUILTIN: [BuiltinStyle; 3] = [
    BuiltinStyle {
        key: "日常",
        name: "日常风",
        color: Rgba8::rgb(0x4e, 0xcd, 0xc4),
        icon: Icon::Sun,
        occasions: "通勤 · 约会 · 日常出行 · 朋友聚会",
    },
    BuiltinStyle {
        key: "古装",
        name: "古装风",
        color: Rgba8::rgb(0xff, 0x6b, 0x6b),
        icon: Icon::Pagoda,
        occasions: "古风活动 · 写真拍摄 · 演出表演 · 文化节",
    },
    BuiltinStyle {
        key: "晚宴",
        name: "晚宴风",
        color: Rgba8::rgb(0xc7, 0x79, 0xd0),
        icon: Icon::Toast,
        occasions: "正式晚宴 · 派对 · 庆典 · 红毯活动",
    },
];

/// Style keys with built-in themes, in display order.
pub fn builtin_styles() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|s| s.key)
}

/// Look of one clothing style on the poster.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleTheme {
    /// Style key, e.g. `晚宴`.
    pub style: String,
    /// Display name, e.g. `晚宴风`.
    pub name: String,
    /// Main theme color.
    pub color: Rgba8,
    /// Style icon.
    pub icon: Icon,
    /// Recommended occasions line.
    pub occasions: String,
}

impl StyleTheme {
    /// Theme for `style`, with the color overridden from `cfg.theme_colors` when present.
    pub fn for_style(style: &str, cfg: &PosterConfig) -> Self {
        let mut theme = match BUILTIN.iter().find(|s| s.key == style) {
            Some(b) => Self {
                style: style.to_string(),
                name: b.name.to_string(),
                color: b.color,
                icon: b.icon,
                occasions: b.occasions.to_string(),
            },
            None => Self {
                style: style.to_string(),
                name: style.to_string(),
                color: FALLBACK_COLOR,
                icon: Icon::Shirt,
                occasions: "多种场合".to_string(),
            },
        };
        if let Some(c) = cfg.theme_colors.get(style) {
            theme.color = *c;
        }
        theme
    }

    /// Theme color at a CSS-style hex alpha (`0x30` for `#RRGGBB30`).
    pub fn tint(&self, alpha: u8) -> Rgba8 {
        self.color.with_alpha(alpha)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poster/theme.rs"]
mod tests;
