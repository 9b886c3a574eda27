use proptest::prelude::*;
use pump_core::history::{LARGER_RECORD_LEN, STANDARD_RECORD_LEN};
use pump_core::{
    BolusNormalEvent, BolusType, DecodeError, DeviceProfile, UnabsorbedInsulinRecord,
    record_length,
};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

fn larger_record(programmed: u16, amount: u16, unabsorbed: u16, half_hours: u8) -> Vec<u8> {
    let mut v = vec![0x01];
    v.extend_from_slice(&programmed.to_be_bytes());
    v.extend_from_slice(&amount.to_be_bytes());
    v.extend_from_slice(&unabsorbed.to_be_bytes());
    v.push(half_hours);
    v.extend_from_slice(&[0x2f, 0xd8, 0x0a, 0x07, 0x10]);
    v
}

#[test]
fn larger_amount_forty_strokes_is_one_unit() {
    // amount bytes 0x00 0x28 at offset 3
    let buf = larger_record(0x0050, 0x0028, 0, 0);
    let ev = BolusNormalEvent::decode(&buf, &DeviceProfile::larger_memory()).unwrap();
    assert!((ev.amount - 1.0).abs() < 1e-12);
    assert!((ev.programmed - 2.0).abs() < 1e-12);
    assert_eq!(ev.bolus_type, BolusType::Normal);
}

#[test]
fn standard_duration_byte_two_is_one_hour_square() {
    let buf = [0x01, 0x14, 0x14, 0x02, 0x00, 0x00, 0x00, 0x01, 0x11];
    let ev = BolusNormalEvent::decode(&buf, &DeviceProfile::standard_memory()).unwrap();
    assert_eq!(ev.duration, Duration::from_secs(60 * 60));
    assert_eq!(ev.bolus_type, BolusType::Square);
    assert!((ev.programmed - 2.0).abs() < 1e-12);
}

#[rstest]
#[case(true, 13)]
#[case(false, 9)]
fn record_length_is_fixed_per_model(#[case] larger: bool, #[case] len: usize) {
    assert_eq!(record_length(larger), len);
}

#[rstest]
#[case(DeviceProfile::larger_memory(), 0)]
#[case(DeviceProfile::larger_memory(), 12)]
#[case(DeviceProfile::standard_memory(), 0)]
#[case(DeviceProfile::standard_memory(), 8)]
fn short_buffers_fail_without_partial_result(#[case] profile: DeviceProfile, #[case] len: usize) {
    let buf = vec![0xffu8; len];
    let err = BolusNormalEvent::decode(&buf, &profile).unwrap_err();
    assert_eq!(
        err,
        DecodeError::InsufficientData {
            needed: record_length(profile.larger_memory),
            available: len
        }
    );
}

#[test]
fn trailing_bytes_are_not_consumed() {
    let mut buf = larger_record(40, 40, 0, 0);
    buf.extend_from_slice(&[0xaa; 7]);
    let ev = BolusNormalEvent::decode(&buf, &DeviceProfile::larger_memory()).unwrap();
    assert_eq!(ev.raw_data.len(), LARGER_RECORD_LEN);
    assert_eq!(ev.raw_data, buf[..LARGER_RECORD_LEN].to_vec());
}

#[test]
fn summary_omits_absent_fields() {
    let ev = BolusNormalEvent::decode(&larger_record(40, 40, 0, 0), &DeviceProfile::larger_memory())
        .unwrap();
    let dict = ev.dictionary_representation();
    assert_eq!(dict.get("_type"), Some(&json!("BolusNormal")));
    assert_eq!(dict.get("amount"), Some(&json!(1.0)));
    assert_eq!(dict.get("programmed"), Some(&json!(1.0)));
    assert_eq!(dict.get("type"), Some(&json!("Normal")));
    assert!(!dict.contains_key("appended"));
    assert!(!dict.contains_key("unabsorbed"));
    assert!(!dict.contains_key("duration"));
}

#[test]
fn summary_includes_present_fields() {
    let mut ev = BolusNormalEvent::decode(
        &larger_record(80, 60, 20, 3),
        &DeviceProfile::larger_memory(),
    )
    .unwrap();
    ev.attach_unabsorbed(UnabsorbedInsulinRecord {
        raw_data: vec![0x5c, 0x05],
        summary: json!({ "_type": "UnabsorbedInsulin", "data": [] }),
    });
    let dict = ev.dictionary_representation();
    assert_eq!(dict.get("type"), Some(&json!("Square")));
    assert_eq!(dict.get("unabsorbed"), Some(&json!(0.5)));
    assert_eq!(dict.get("duration"), Some(&json!(5_400.0)));
    assert_eq!(
        dict.get("appended"),
        Some(&json!({ "_type": "UnabsorbedInsulin", "data": [] }))
    );
}

fn any_profile() -> impl Strategy<Value = DeviceProfile> {
    prop_oneof![
        Just(DeviceProfile::larger_memory()),
        Just(DeviceProfile::standard_memory()),
    ]
}

proptest! {
    #[test]
    fn exact_length_buffers_always_decode(profile in any_profile(), seed in prop::collection::vec(any::<u8>(), LARGER_RECORD_LEN)) {
        let len = record_length(profile.larger_memory);
        let ev = BolusNormalEvent::decode(&seed[..len], &profile).unwrap();
        prop_assert_eq!(ev.raw_data.len(), len);
        prop_assert_eq!(ev.length, len);
    }

    #[test]
    fn short_buffers_always_fail(profile in any_profile(), buf in prop::collection::vec(any::<u8>(), 0..STANDARD_RECORD_LEN)) {
        let is_insufficient = matches!(
            BolusNormalEvent::decode(&buf, &profile),
            Err(DecodeError::InsufficientData { .. })
        );
        prop_assert!(is_insufficient);
    }

    #[test]
    fn kind_is_square_iff_duration(profile in any_profile(), buf in prop::collection::vec(any::<u8>(), LARGER_RECORD_LEN..40)) {
        let ev = BolusNormalEvent::decode(&buf, &profile).unwrap();
        prop_assert_eq!(ev.bolus_type == BolusType::Square, ev.duration > Duration::ZERO);
    }

    #[test]
    fn redecoding_raw_data_is_identical(profile in any_profile(), buf in prop::collection::vec(any::<u8>(), LARGER_RECORD_LEN..40)) {
        let ev = BolusNormalEvent::decode(&buf, &profile).unwrap();
        let again = BolusNormalEvent::decode(&ev.raw_data, &profile).unwrap();
        prop_assert_eq!(ev, again);
    }
}
