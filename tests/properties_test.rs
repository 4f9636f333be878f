//! Property tests for scrubbing, escaping and text round trips.

mod common;

use proptest::prelude::*;

use common::parse;
use rustyxml_writer::{check_text, escape_attribute_value, escape_text, scrub, Serializer};

/// Position of every `&` is the start of one of the writer's entity references
fn entities_well_formed(out: &[u8]) -> bool {
    const ENTITIES: [&[u8]; 7] = [
        b"&amp;", b"&lt;", b"&gt;", b"&quot;", b"&#xD;", b"&#x9;", b"&#xA;",
    ];
    out.iter()
        .enumerate()
        .all(|(i, &b)| b != b'&' || ENTITIES.iter().any(|e| out[i..].starts_with(e)))
}

proptest! {
    #[test]
    fn prop_scrub_never_lengthens(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        let clean = scrub(&input);
        prop_assert!(clean.len() <= input.len());
        prop_assert!(check_text(&clean).is_ok());
    }

    #[test]
    fn prop_scrub_idempotent(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        let once = scrub(&input).into_owned();
        let twice = scrub(&once).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_scrub_keeps_clean_text(s in "[a-zA-Z0-9 <>&\"'\t\n\u{e9}\u{4e2d}]{0,64}") {
        let scrubbed = scrub(s.as_bytes());
        prop_assert_eq!(scrubbed.as_ref(), s.as_bytes());
    }

    #[test]
    fn prop_escaped_text_has_no_markup(s in any::<String>()) {
        let clean = scrub(s.as_bytes()).into_owned();
        let escaped = escape_text(&clean).unwrap();
        prop_assert!(!escaped.contains(&b'<'));
        prop_assert!(!escaped.contains(&b'>'));
        prop_assert!(!escaped.contains(&b'\r'));
        prop_assert!(entities_well_formed(&escaped));
    }

    #[test]
    fn prop_escaped_attribute_has_no_quotes(s in any::<String>()) {
        let clean = scrub(s.as_bytes()).into_owned();
        let escaped = escape_attribute_value(&clean).unwrap();
        prop_assert!(!escaped.contains(&b'"'));
        prop_assert!(!escaped.contains(&b'<'));
        prop_assert!(!escaped.contains(&b'\n'));
        prop_assert!(!escaped.contains(&b'\t'));
        prop_assert!(entities_well_formed(&escaped));
    }

    #[test]
    fn prop_text_and_attribute_survive_parsing(s in any::<String>()) {
        let clean = String::from_utf8(scrub(s.as_bytes()).into_owned()).unwrap();

        let mut ser = Serializer::new(Vec::new(), "prop.xml", 0).unwrap();
        ser.start_element("t").unwrap();
        ser.attribute("v", &clean).unwrap();
        ser.characters(&clean).unwrap();
        ser.end_element().unwrap();
        let out = ser.into_inner().unwrap();

        let root = parse(&out, false);
        prop_assert_eq!(root.attr("v"), Some(clean.as_str()));
        prop_assert_eq!(root.text(), clean);
    }
}
