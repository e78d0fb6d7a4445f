use super::*;

#[test]
fn filled_raster_and_pixel_access() {
    let r = Raster::filled(3, 2, Rgba8Premul::from_straight_rgba(255, 0, 0, 128)).unwrap();
    assert_eq!(r.data().len(), 3 * 2 * 4);
    assert_eq!(r.pixel(2, 1), Some([128, 0, 0, 128]));
    assert_eq!(r.pixel(3, 0), None);
    assert!(Raster::new(0, 4).is_err());
}

#[test]
fn from_premul_checks_length() {
    assert!(Raster::from_premul(2, 2, vec![0; 15]).is_err());
    assert!(Raster::from_premul(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn checksum_tracks_content_and_size() {
    let a = Raster::new(4, 4).unwrap();
    let b = Raster::new(4, 4).unwrap();
    let c = Raster::new(2, 8).unwrap();
    assert_eq!(a.checksum(), b.checksum());
    assert_ne!(a.checksum(), c.checksum());

    let mut d = a.clone();
    d.data_mut()[0] = 1;
    assert_ne!(a.checksum(), d.checksum());
}

#[test]
fn png_round_trip_unpremultiplies() {
    let r = Raster::filled(2, 2, Rgba8Premul::from_straight_rgba(200, 100, 0, 128)).unwrap();
    let png = r.encode_png().unwrap();
    assert_eq!(&png[1..4], b"PNG");

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 2));
    let px = decoded.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!((i32::from(px[0]) - 200).abs() <= 2);
    assert!((i32::from(px[1]) - 100).abs() <= 2);
}
