use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use url::{Url, form_urlencoded};

use crate::error::Result;
use crate::types::WordCount;
use crate::words::Room;

pub const DATA_PARAM: &str = "data";
pub const ROOM_PARAM: &str = "room";

/// JSON, then base64, then URL-component escaping.
pub fn encode(counts: &WordCount) -> Result<String> {
    let json = serde_json::to_vec(counts)?;
    let b64 = STANDARD.encode(json);
    Ok(form_urlencoded::byte_serialize(b64.as_bytes()).collect())
}

/// Reads the `data` parameter out of a query string (`?data=…` or
/// `data=…`) or a full URL. Missing or malformed payloads give `None`.
pub fn decode_query(search: &str) -> Option<WordCount> {
    let data = query_param(search, DATA_PARAM)?;
    let bytes = STANDARD.decode(data.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// The `room` parameter of a link, if it names one.
pub fn room_from_query(search: &str) -> Option<Room> {
    query_param(search, ROOM_PARAM)
        .filter(|room| !room.trim().is_empty())
        .map(|room| Room::parse(&room))
}

fn query_param(search: &str, name: &str) -> Option<String> {
    let query = match search.split_once('?') {
        Some((_, rest)) => rest,
        None => search,
    };
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `base` with its query replaced by the encoded counts.
pub fn link(base: &Url, counts: &WordCount) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(Some(&format!("{DATA_PARAM}={}", encode(counts)?)));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u32)]) -> WordCount {
        entries.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    mod round_trip {
        use super::*;

        #[test]
        fn encode_then_decode_returns_equal_mapping() {
            let original = counts(&[("excited", 3), ("scared", 1)]);
            let encoded = encode(&original).expect("encode");
            let decoded = decode_query(&format!("?data={encoded}")).expect("decode");
            assert_eq!(decoded, original);
        }

        #[test]
        fn hyphenated_words_survive() {
            let original = counts(&[("self-aware", 2), ("un-sure", 7)]);
            let encoded = encode(&original).expect("encode");
            assert_eq!(decode_query(&format!("data={encoded}")), Some(original));
        }

        #[test]
        fn encoded_payload_is_url_safe() {
            let original = counts(&[("overwhelmed", 12), ("fascinated", 4)]);
            let encoded = encode(&original).expect("encode");
            assert!(
                encoded
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "%-._*".contains(c))
            );
        }
    }

    mod decode_query_fn {
        use super::*;

        #[test]
        fn decodes_empty_object() {
            assert_eq!(decode_query("?data=e30%3D"), Some(WordCount::new()));
        }

        #[test]
        fn missing_parameter_gives_none() {
            assert_eq!(decode_query("?room=acme"), None);
            assert_eq!(decode_query(""), None);
        }

        #[test]
        fn malformed_payload_gives_none() {
            assert_eq!(decode_query("?data=!!!"), None);
            // base64 of "[1,2]" is valid but not a word map
            assert_eq!(decode_query("?data=WzEsMl0%3D"), None);
        }

        #[test]
        fn accepts_full_urls_with_other_params() {
            let original = counts(&[("curious", 1)]);
            let encoded = encode(&original).expect("encode");
            let url = format!("https://example.org/cloud.html?room=acme&data={encoded}");
            assert_eq!(decode_query(&url), Some(original));
        }
    }

    mod room_from_query_fn {
        use super::*;

        #[test]
        fn reads_and_normalises_the_room() {
            let room = room_from_query("https://example.org/cloud.html?room=Acme101&data=e30%3D");
            assert_eq!(room.as_ref().map(Room::as_str), Some("acme101"));
        }

        #[test]
        fn absent_or_blank_room_gives_none() {
            assert_eq!(room_from_query("?data=e30%3D"), None);
            assert_eq!(room_from_query("?room=%20%20"), None);
        }
    }

    mod link_fn {
        use super::*;

        #[test]
        fn builds_decodable_link() {
            let base = Url::parse("https://example.org/cloud.html?old=1").expect("url");
            let original = counts(&[("hopeful", 5)]);
            let url = link(&base, &original).expect("link");
            assert_eq!(url.path(), "/cloud.html");
            assert_eq!(decode_query(url.as_str()), Some(original));
        }
    }
}
