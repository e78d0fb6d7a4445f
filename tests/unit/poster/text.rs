use super::*;

#[test]
fn missing_font_file_is_an_error() {
    let cfg = PosterConfig {
        font_path: Some(PathBuf::from("/definitely/not/here.ttf")),
        ..PosterConfig::default()
    };
    assert!(FontFace::resolve(&cfg).is_err());
}

#[test]
fn system_fonts_can_be_disabled() {
    let cfg = PosterConfig {
        system_fonts: false,
        ..PosterConfig::default()
    };
    assert!(FontFace::resolve(&cfg).unwrap().is_none());
}

#[test]
fn system_face_lays_out_wrapped_lines() {
    // Hosts without any installed font have nothing to lay out with.
    let Some(face) = FontFace::system() else {
        return;
    };
    assert!(matches!(face.source(), FontSource::System(_)));
    let mut engine = TextLayoutEngine::new(&face).unwrap();
    let layout = engine
        .layout_plain(
            "VIRTUAL DRESSING ROOM VIRTUAL DRESSING ROOM",
            20.0,
            TextBrushRgba8::from(Rgba8::WHITE),
            Some(120.0),
        )
        .unwrap();
    assert!(layout.lines().count() > 1);
    assert!(engine.layout_plain("x", 0.0, TextBrushRgba8::default(), None).is_err());
}
