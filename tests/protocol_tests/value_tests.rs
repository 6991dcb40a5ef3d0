//! Value Tests

use redwire::protocol::Value;
use rstest::rstest;

#[rstest]
#[case::text(Value::text("OK"), "STR \"OK\"")]
#[case::error(Value::error_copy(b"ERR bad"), "ERR \"ERR bad\"")]
#[case::binary(Value::binary(b"\x00a\n"), "RAW(3) \"\\x00a\\n\"")]
#[case::integer(Value::integer(-7), "INT -7")]
#[case::nil(Value::nil(), "NIL")]
fn test_display(#[case] value: Value<'static>, #[case] expected: &str) {
    assert_eq!(value.to_string(), expected);
}

#[test]
fn test_binary_classification() {
    assert!(Value::binary(b"x").is_binary());
    assert!(Value::nil().is_binary());
    assert!(!Value::text("x").is_binary());
    assert!(!Value::integer(1).is_binary());
    assert!(!Value::error_copy(b"x").is_binary());
}

#[test]
fn test_borrowed_and_owned() {
    let owned = {
        let data = b"payload".to_vec();
        let borrowed = Value::binary(&data);

        assert!(!borrowed.is_owned());
        assert!(Value::binary_copy(&data).is_owned());
        borrowed.into_owned()
    };

    assert!(owned.is_owned());
    assert_eq!(owned.as_bytes(), Some(&b"payload"[..]));
}

#[test]
fn test_payload_mut_fills_in_place() {
    let mut value = Value::binary_with_len(3);
    assert_eq!(value.as_bytes(), Some(&[0u8, 0, 0][..]));

    value.payload_mut().unwrap().copy_from_slice(b"abc");

    assert_eq!(value, Value::binary(b"abc"));
}

#[test]
fn test_payload_mut_copies_borrowed() {
    let data = [1u8, 2];
    let mut value = Value::binary(&data);

    value.payload_mut().unwrap()[0] = 9;

    assert!(value.is_owned());
    assert_eq!(data, [1, 2]);
    assert_eq!(value.as_bytes(), Some(&[9u8, 2][..]));
}

#[test]
fn test_accessors() {
    assert_eq!(Value::text("hi").as_str(), Some("hi"));
    assert_eq!(Value::binary(b"\xff").as_str(), None);
    assert_eq!(Value::integer(4).as_integer(), Some(4));
    assert_eq!(Value::integer(4).as_bytes(), None);
    assert!(Value::nil().is_nil());
    assert!(Value::error_copy(b"E").is_error());
}

#[test]
fn test_conversions() {
    let bytes: &[u8] = b"raw";

    assert_eq!(Value::from("word"), Value::text("word"));
    assert_eq!(Value::from(bytes), Value::binary(b"raw"));
    assert_eq!(Value::from(12i64), Value::Integer(12));
}
