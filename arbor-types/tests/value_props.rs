//! Property tests for the platform-encoding coercions.

use arbor_types::{filetime_to_utc, utc_to_filetime, Error, Value};
use chrono::DateTime;
use proptest::prelude::*;

proptest! {
    // Any timestamp from the 1601 epoch up to year 9999, at 100ns
    // granularity, survives the split-and-recombine round trip.
    #[test]
    fn filetime_round_trips(
        secs in -11_644_473_600i64..=253_402_300_799i64,
        ticks in 0u32..10_000_000u32,
    ) {
        let ts = DateTime::from_timestamp(secs, ticks * 100).unwrap();
        let (high, low) = utc_to_filetime(ts);
        prop_assert_eq!(filetime_to_utc(high, low).unwrap(), ts);
    }

    #[test]
    fn guid_decoding_accepts_exactly_16_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let result = Value::guid_from_bytes(&bytes);
        if bytes.len() == 16 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(Error::GuidLength(n)) if n == bytes.len()));
        }
    }
}
