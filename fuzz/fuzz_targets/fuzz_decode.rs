#![no_main]
use libfuzzer_sys::fuzz_target;
use pump_core::{BolusNormalEvent, DeviceProfile, decode_stream, record_length};

fuzz_target!(|data: &[u8]| {
    for profile in [DeviceProfile::larger_memory(), DeviceProfile::standard_memory()] {
        let len = record_length(profile.larger_memory);
        match BolusNormalEvent::decode(data, &profile) {
            Ok(ev) => {
                assert_eq!(ev.raw_data.len(), len);
                assert_eq!(ev.duration.is_zero(), ev.bolus_type == pump_core::BolusType::Normal);
                let again = BolusNormalEvent::decode(&ev.raw_data, &profile);
                assert_eq!(again.as_ref(), Ok(&ev));
                let _ = ev.dictionary_representation();
                let _ = ev.timestamp.to_naive();
            }
            Err(_) => assert!(data.len() < len),
        }
        let (events, rest) = decode_stream(data, &profile);
        assert_eq!(events.len() * len + rest, data.len());
    }
});
