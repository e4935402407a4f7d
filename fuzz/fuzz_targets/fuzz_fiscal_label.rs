#![no_main]

use billdesk::FiscalYear;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(fy) = s.parse::<FiscalYear>() {
            let (start, end) = billdesk::range_of(s).unwrap();
            assert!(start < end);
            assert_eq!(FiscalYear::containing(start), fy);
            assert_eq!(FiscalYear::containing(end), fy);
        }
    }
});
