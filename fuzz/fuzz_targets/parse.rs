#![no_main]
use jsontree::{Arena, ParseOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut arena = Arena::new();
    for options in [
        ParseOptions::new(),
        ParseOptions::new().require_null_terminated(true),
        ParseOptions::new().allow_comments(true),
        ParseOptions::new().length(Some(data.len() / 2)),
    ] {
        if let Ok((root, end)) = arena.parse_with_opts(data, &options) {
            assert!(end <= data.len());
            assert!(arena.delete(root));
        }
    }
    assert!(arena.is_empty());
});
