use super::*;
use crate::foundation::core::Rgba8Premul;

fn raster() -> Arc<Raster> {
    Arc::new(Raster::filled(8, 8, Rgba8Premul::from_straight_rgba(255, 0, 0, 255)).unwrap())
}

fn content<'a>(host: Option<Arc<Raster>>, model: Option<Arc<Raster>>) -> PosterContent<'a> {
    PosterContent {
        style: "晚宴",
        outfit: "D",
        description: "星空蓝闪钻晚宴裙",
        date_label: Some("2026/10/19"),
        host,
        model,
    }
}

fn icons(doc: &PosterDocument) -> Vec<Icon> {
    doc.nodes()
        .iter()
        .filter_map(|n| match n {
            PosterNode::Icon(i) => Some(i.icon),
            _ => None,
        })
        .collect()
}

#[test]
fn captures_fill_their_slots() {
    let doc = PosterDocument::build(&content(Some(raster()), Some(raster())), &PosterConfig::default());
    assert_eq!(doc.canvas(), Canvas { width: 800, height: 1100 });

    let model = doc.image_slot(SlotRole::Model).unwrap();
    assert_eq!(model.rect, Rect::new(150.0, 208.0, 650.0, 708.0));
    assert_eq!(model.clip, SlotClip::Rounded(30.0));
    let host = doc.image_slot(SlotRole::Host).unwrap();
    assert_eq!(host.clip, SlotClip::Circle);

    assert!(doc.contains_text("星空蓝闪钻晚宴裙"));
    assert!(doc.contains_text("D · 款"));
    assert!(doc.contains_text("晚宴风"));
    assert!(doc.contains_text("正式晚宴"));
    assert!(doc.contains_text("2026/10/19"));
    assert!(doc.contains_text("换装体验馆"));
    assert!(!doc.contains_text("款式 D"));
    assert!(!icons(&doc).contains(&Icon::Mic));
}

#[test]
fn missing_captures_become_placeholders() {
    let doc = PosterDocument::build(&content(None, None), &PosterConfig::default());
    assert!(doc.image_slot(SlotRole::Model).is_none());
    assert!(doc.image_slot(SlotRole::Host).is_none());
    assert!(doc.contains_text("款式 D"));
    let icons = icons(&doc);
    assert!(icons.contains(&Icon::Mic));
    assert_eq!(icons.iter().filter(|i| **i == Icon::Toast).count(), 2);
}

#[test]
fn theme_color_drives_the_chrome() {
    let doc = PosterDocument::build(&content(None, None), &PosterConfig::default());
    let purple = Rgba8::rgb(0xc7, 0x79, 0xd0);
    let solid_theme = doc
        .nodes()
        .iter()
        .filter(|n| matches!(n, PosterNode::Shape(Shape { paint: Paint::Solid(c), .. }) if *c == purple))
        .count();
    assert!(solid_theme >= 3, "ring, badge and pill use the theme color");
}

#[test]
fn footer_omits_missing_date() {
    let mut c = content(None, None);
    c.date_label = None;
    let doc = PosterDocument::build(&c, &PosterConfig::default());
    assert!(doc.contains_text("虚拟换装体验馆"));
    assert!(!doc.contains_text("2026"));
}

#[test]
fn width_estimate_treats_cjk_as_one_em() {
    assert_eq!(estimate_text_width("换装", 10.0), 20.0);
    assert!((estimate_text_width("AB", 10.0) - 12.0).abs() < 1e-4);
}
