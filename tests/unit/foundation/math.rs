use super::*;

#[test]
fn fnv_is_order_sensitive_and_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"ab");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"ba");
    assert_ne!(a.finish(), b.finish());

    let empty = Fnv1a64::new_default().finish();
    assert_eq!(empty, Fnv1a64::OFFSET_BASIS);
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn over_opaque_source_replaces_destination() {
    let out = over_premul([10, 20, 30, 255], [200, 100, 50, 255], 255);
    assert_eq!(out, [200, 100, 50, 255]);
}

#[test]
fn over_zero_coverage_keeps_destination() {
    let out = over_premul([10, 20, 30, 255], [200, 100, 50, 255], 0);
    assert_eq!(out, [10, 20, 30, 255]);
}
