use super::*;

#[test]
fn fnv_hash_is_stable_across_chunking() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"filter");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"fil");
    b.write_bytes(b"ter");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_u64_order_matters() {
    let mut a = Fnv1a64::new_default();
    a.write_u64(1);
    a.write_u64(2);
    let mut b = Fnv1a64::new_default();
    b.write_u64(2);
    b.write_u64(1);
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn f64_key_folds_signed_zero() {
    assert_eq!(f64_key(0.0), f64_key(-0.0));
    assert_ne!(f64_key(1.0), f64_key(-1.0));
}
