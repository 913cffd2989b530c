use jsontree::{Arena, Error, Kind, ParseErrorKind, ParseOptions};
use serde_json::Value;
use test_case::test_case;

#[test]
fn test_example_document() {
    let mut arena = Arena::new();
    let root = arena
        .parse(r#"{"a":[1,2,3],"b":null}"#)
        .expect("Valid JSON");
    assert_eq!(arena.kind(root), Kind::Object);
    assert_eq!(arena.array_size(root), 2);
    let a = arena.object_item(root, "a").expect("Member exists");
    let numbers: Vec<_> = arena
        .items(a)
        .map(|item| arena.number_value(item))
        .collect();
    assert_eq!(numbers, [1.0, 2.0, 3.0]);
    assert!(arena.is_null(arena.object_item(root, "b").expect("Member exists")));
    assert_eq!(
        arena.print_compact(root).expect("Printable"),
        r#"{"a":[1,2,3],"b":null}"#
    );
}

#[test_case(r#"{"key": "value", "list": [1, 2.5, -3, true, false, null]}"#; "flat")]
#[test_case(r#"[[[]], {}, [{}], {"a": {"b": {"c": []}}}]"#; "nested containers")]
#[test_case(r#""é中😀 \"quoted\" \\ \/""#; "escapes")]
#[test_case(r#"[0, -0.5, 1.5E-3, 123456789, -987654321]"#; "numbers")]
#[test_case(r#"{"unicode": "ключ", "emoji": "🎉"}"#; "non-ascii")]
fn test_agrees_with_serde_json(input: &str) {
    let mut arena = Arena::new();
    let root = arena.parse(input).expect("Valid JSON");
    let printed = arena.print_compact(root).expect("Printable");
    let expected: Value = serde_json::from_str(input).expect("Valid JSON");
    let actual: Value = serde_json::from_str(&printed).expect("Printed JSON is valid");
    assert_eq!(actual, expected);
}

#[test_case("1e10", "10000000000"; "exponent")]
#[test_case("2.0", "2"; "fraction of zero")]
#[test_case("1.5e300", "1.5e300"; "large exponent")]
fn test_float_literals_with_integral_values(input: &str, expected: &str) {
    let mut arena = Arena::new();
    let root = arena.parse(input).expect("Valid JSON");
    assert_eq!(arena.as_i64(root), None);
    let printed = arena.print_compact(root).expect("Printable");
    assert_eq!(printed, expected);
    let reparsed = arena.parse(&printed).expect("Printed JSON is valid");
    assert!(arena.compare(root, reparsed, true));
}

#[test_case("[1,]"; "trailing comma in array")]
#[test_case(r#"{"a":1,}"#; "trailing comma in object")]
#[test_case("'single'"; "single quotes")]
#[test_case("[NaN]"; "nan literal")]
#[test_case("+1"; "leading plus")]
#[test_case(".5"; "leading dot")]
#[test_case("[\"unterminated]"; "unterminated string")]
#[test_case("{\"a\"}"; "missing colon")]
fn test_rejects_invalid_documents(input: &str) {
    let mut arena = Arena::new();
    let options = ParseOptions::new().require_null_terminated(true);
    assert!(matches!(
        arena.parse_with_opts(input.as_bytes(), &options),
        Err(Error::Parse(_))
    ));
    assert!(serde_json::from_str::<Value>(input).is_err());
    assert!(arena.is_empty());
}

#[test]
fn test_error_offset_points_at_failure() {
    let mut arena = Arena::new();
    let error = arena
        .parse("{\"a\": [1, 2, x]}")
        .expect_err("Invalid JSON");
    assert_eq!(error.offset(), Some(13));
    match error {
        Error::Parse(error) => assert_eq!(error.kind, ParseErrorKind::UnexpectedToken),
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_end_allows_parsing_a_stream_of_values() {
    let mut arena = Arena::new();
    let input = b"[1] {\"a\":2} \"three\"";
    let mut offset = 0;
    let mut kinds = Vec::new();
    while offset < input.len() {
        let (root, end) = arena
            .parse_with_opts(&input[offset..], &ParseOptions::default())
            .expect("Valid JSON");
        kinds.push(arena.kind(root));
        offset += end;
        while input.get(offset) == Some(&b' ') {
            offset += 1;
        }
    }
    assert_eq!(kinds, [Kind::Array, Kind::Object, Kind::String]);
}

#[test]
fn test_deep_nesting_within_limit() {
    let mut arena = Arena::new();
    let depth = 500;
    let input = format!("{}{}", "{\"a\":".repeat(depth), "null".to_owned() + &"}".repeat(depth));
    let root = arena.parse(&input).expect("Valid JSON");
    assert_eq!(arena.print_compact(root).expect("Printable"), input);
    assert!(arena.delete(root));
    assert!(arena.is_empty());
}
