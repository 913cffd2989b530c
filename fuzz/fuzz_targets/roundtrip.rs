#![no_main]
use jsontree::Arena;
use libfuzzer_sys::fuzz_target;

// Anything the parser accepts must print, parse back and print the same way again.
fuzz_target!(|data: &[u8]| {
    let mut arena = Arena::new();
    let Ok(root) = arena.parse_bytes(data) else {
        return;
    };
    for pretty in [false, true] {
        let print = |arena: &Arena, id| {
            if pretty {
                arena.print_pretty(id)
            } else {
                arena.print_compact(id)
            }
            .expect("Parsed trees are printable")
        };
        let text = print(&arena, root);
        let reparsed = arena.parse(&text).expect("Printed output is valid JSON");
        assert_eq!(print(&arena, reparsed), text);

        let mut buffer = vec![0; text.len()];
        let written = arena
            .print_preallocated(root, &mut buffer, pretty)
            .expect("Output fits");
        assert_eq!(&buffer[..written], text.as_bytes());
        assert!(arena.delete(reparsed));
    }
    let copy = arena.duplicate(root, true).expect("Allocation succeeds");
    assert_eq!(arena.print_compact(copy).ok(), arena.print_compact(root).ok());
});
