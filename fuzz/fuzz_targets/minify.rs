#![no_main]
use jsontree::minify_vec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut once = data.to_vec();
    minify_vec(&mut once);
    assert!(once.len() <= data.len());
    let mut twice = once.clone();
    minify_vec(&mut twice);
    assert_eq!(once, twice);
});
