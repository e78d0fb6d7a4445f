use super::*;

#[test]
fn builtin_styles_have_colors_icons_and_occasions() {
    let cfg = PosterConfig::default();
    let evening = StyleTheme::for_style("晚宴", &cfg);
    assert_eq!(evening.name, "晚宴风");
    assert_eq!(evening.color, Rgba8::rgb(0xc7, 0x79, 0xd0));
    assert_eq!(evening.icon, Icon::Toast);
    assert!(evening.occasions.contains("红毯活动"));

    assert_eq!(builtin_styles().collect::<Vec<_>>(), ["日常", "古装", "晚宴"]);
}

#[test]
fn unknown_style_falls_back() {
    let t = StyleTheme::for_style("运动", &PosterConfig::default());
    assert_eq!(t.color, FALLBACK_COLOR);
    assert_eq!(t.icon, Icon::Shirt);
    assert_eq!(t.name, "运动");
    assert_eq!(t.occasions, "多种场合");
}

#[test]
fn config_overrides_theme_color() {
    let mut cfg = PosterConfig::default();
    cfg.theme_colors
        .insert("古装".to_string(), Rgba8::rgb(1, 2, 3));
    let t = StyleTheme::for_style("古装", &cfg);
    assert_eq!(t.color, Rgba8::rgb(1, 2, 3));
    assert_eq!(t.tint(0x30), Rgba8::rgba(1, 2, 3, 0x30));
}
