use super::*;

const ALL: [Icon; 6] = [
    Icon::Sparkle,
    Icon::Sun,
    Icon::Pagoda,
    Icon::Toast,
    Icon::Shirt,
    Icon::Mic,
];

#[test]
fn every_icon_parses_and_draws_something() {
    let mut atlas = IconAtlas::new();
    for icon in ALL {
        let tree = atlas.tree(icon).unwrap();
        assert_eq!(tree.size().width(), 100.0, "{icon:?}");
        let sprite = atlas.sprite(icon, 32, 32).unwrap();
        assert_eq!(sprite.pixels.len(), 32 * 32 * 4);
        assert!(sprite.pixels.chunks_exact(4).any(|p| p[3] > 0), "{icon:?} is blank");
    }
}

#[test]
fn atlas_reuses_parsed_trees() {
    let mut atlas = IconAtlas::new();
    let a = atlas.tree(Icon::Mic).unwrap();
    let b = atlas.tree(Icon::Mic).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn sprites_are_rendered_once_per_size() {
    let mut atlas = IconAtlas::new();
    let a = atlas.sprite(Icon::Sun, 40, 40).unwrap();
    let b = atlas.sprite(Icon::Sun, 40, 40).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    atlas.sprite(Icon::Sun, 20, 40).unwrap();
    assert_eq!(atlas.sprite_count(), 2);
}

#[test]
fn sprites_stretch_over_the_requested_size() {
    let mut atlas = IconAtlas::new();
    // The shirt body fills x 30..70 on its 100x100 canvas; at 10x40 column 5 is inside it.
    let sprite = atlas.sprite(Icon::Shirt, 10, 40).unwrap();
    assert_eq!((sprite.width, sprite.height), (10, 40));
    let at = |x: usize, y: usize| sprite.pixels[(y * 10 + x) * 4 + 3];
    assert_eq!(at(5, 32), 255);
    assert_eq!(at(0, 39), 0);
}

#[test]
fn degenerate_and_huge_sprites_are_composition_errors() {
    let mut atlas = IconAtlas::new();
    for (w, h) in [(0, 10), (10, 0), (100_000, 10)] {
        let err = atlas.sprite(Icon::Mic, w, h).unwrap_err();
        assert!(matches!(err, RoomError::Composition(_)), "{w}x{h}: {err}");
    }
    assert_eq!(atlas.sprite_count(), 0);
}
