//! Querystring extraction and serialization
//!
//! Both directions work on raw text: nothing is percent-decoded on the way
//! in and nothing is percent-encoded on the way out.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Characters a JavaScript `.` refuses to match
const LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Largest integer a JavaScript number holds exactly, 2^53
const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// Value of the first `name=value` pair in `querystring`.
///
/// A pair only counts when it starts right after `?` or `&` and its key is
/// exactly `name`. The value runs up to the next `&` or the end of input.
/// `Some("")` means the key is present with an empty value; `None` means
/// there is no such key.
///
/// ```
/// use helpers::query;
///
/// assert_eq!(query("hello", "?hello=js"), Some("js"));
/// assert_eq!(query("name", "?name="), Some(""));
/// assert_eq!(query("name", "?name1=content"), None);
/// ```
pub fn query<'a>(name: &str, querystring: &'a str) -> Option<&'a str> {
    querystring
        .match_indices(|c: char| c == '?' || c == '&')
        .find_map(|(pos, _)| {
            let rest = querystring[pos + 1..]
                .strip_prefix(name)?
                .strip_prefix('=')?;
            let value = rest.find('&').map_or(rest, |end| &rest[..end]);

            // A value may not span lines; such a pair is skipped entirely
            if value.contains(&LINE_TERMINATORS[..]) {
                return None;
            }
            Some(value)
        })
}

/// Turn a JSON value into `key=value` pairs joined by `&`.
///
/// Objects contribute their keys in JavaScript enumeration order, arrays
/// their indices, strings their UTF-16 code unit positions. `null`, booleans
/// and numbers have no enumerable keys and produce an empty string.
///
/// A character outside the Basic Multilingual Plane spans two positions.
/// Each half is a lone surrogate, which a Rust `String` cannot hold, so
/// both are written as U+FFFD.
pub fn serialize(data: &Value) -> String {
    let pairs: Vec<String> = match data {
        Value::Object(map) => ordered_keys(map)
            .into_iter()
            .map(|key| format!("{}={}", key, to_js_string(&map[key])))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}={}", i, to_js_string(item)))
            .collect(),
        Value::String(s) => s
            .encode_utf16()
            .enumerate()
            .map(|(i, unit)| {
                let c = char::decode_utf16([unit])
                    .next()
                    .and_then(|decoded| decoded.ok())
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                format!("{}={}", i, c)
            })
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) => Vec::new(),
    };
    pairs.join("&")
}

/// Serialize any `Serialize` value through its JSON form.
///
/// `None` and unit serialize to `null` and therefore to an empty string.
pub fn serialize_value<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serialize(&serde_json::to_value(data)?))
}

/// Join already typed pairs as `key=value&key=value`
pub fn serialize_pairs<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Display,
    V: Display,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Array-index keys ascending first, then the rest in insertion order
fn ordered_keys(map: &Map<String, Value>) -> Vec<&String> {
    let (mut indices, names): (Vec<&String>, Vec<&String>) =
        map.keys().partition(|key| array_index(key).is_some());
    indices.sort_by_key(|key| array_index(key));
    indices.extend(names);
    indices
}

/// Canonical array index: decimal without leading zeros, below 2^32 - 1
fn array_index(key: &str) -> Option<u32> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&i| i != u32::MAX)
}

/// JavaScript `String(value)` for JSON values.
///
/// Integers beyond 2^53 are rounded to the nearest double first, as
/// `JSON.parse` would have done.
pub fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) if i.unsigned_abs() <= MAX_SAFE_INTEGER => i.to_string(),
            (_, Some(u)) if u <= MAX_SAFE_INTEGER => u.to_string(),
            _ => n.as_f64().map_or_else(|| n.to_string(), js_number),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// `Number.prototype.toString()` for finite doubles
fn js_number(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }

    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_normal() {
        assert_eq!(query("name", "?name=xiaomi"), Some("xiaomi"));
        assert_eq!(query("name", "?name=xiaomi&name2=mitu"), Some("xiaomi"));
        assert_eq!(query("name", "?name2=apple&name=huawei"), Some("huawei"));
        assert_eq!(query("name", "?a&name=lenovo"), Some("lenovo"));
        assert_eq!(query("name", "?name=dell&"), Some("dell"));
    }

    #[test]
    fn test_query_abnormal() {
        assert_eq!(query("name", "?name="), Some(""));
        assert_eq!(query("name", "="), None);
        assert_eq!(query("name", "?name1=content"), None);
        assert_eq!(query("name", "?1name=content"), None);
        assert_eq!(query("name", "name=no-leading-separator"), None);
    }

    #[test]
    fn test_query_first_pair_wins() {
        assert_eq!(query("a", "?a=1&a=2"), Some("1"));
        assert_eq!(query("a", "https://x.test/p?b=1&a=2#frag"), Some("2#frag"));
    }

    #[test]
    fn test_query_key_is_literal() {
        assert_eq!(query("a.c", "?abc=1&a.c=2"), Some("2"));
        assert_eq!(query("", "?=anon"), Some("anon"));
    }

    #[test]
    fn test_query_value_cannot_span_lines() {
        assert_eq!(query("a", "?a=x\ny"), None);
        assert_eq!(query("a", "?a=x\ny&a=z"), Some("z"));
        assert_eq!(query("a", "?a=x&b=\n"), Some("x"));
    }

    #[test]
    fn test_serialize_normal() {
        assert_eq!(serialize(&json!({ "name": "xiaomi" })), "name=xiaomi");
        assert_eq!(
            serialize(&json!({ "name": "zimi", "name2": "dami" })),
            "name=zimi&name2=dami"
        );
        assert_eq!(serialize(&json!({ "num": 1 })), "num=1");
    }

    #[test]
    fn test_serialize_abnormal() {
        assert_eq!(serialize(&json!({})), "");
        assert_eq!(serialize(&Value::Null), "");
        assert_eq!(serialize(&json!([1, 2, 3])), "0=1&1=2&2=3");
        assert_eq!(serialize(&json!(true)), "");
        assert_eq!(serialize(&json!("ab")), "0=a&1=b");
    }

    #[test]
    fn test_serialize_key_order() {
        let data = json!({ "b": 1, "10": "x", "a": 2, "2": "y", "01": "z" });
        assert_eq!(serialize(&data), "2=y&10=x&b=1&a=2&01=z");
    }

    #[test]
    fn test_serialize_does_not_encode() {
        assert_eq!(serialize(&json!({ "q": "a b&c=d" })), "q=a b&c=d");
    }

    #[test]
    fn test_serialize_value_stringification() {
        let data = json!({
            "f": 1.5,
            "whole": 2.0,
            "big": 1e21,
            "tiny": 1e-7,
            "neg": -3,
            "flag": false,
            "nothing": null,
            "list": [1, null, "x"],
            "obj": { "k": "v" }
        });
        assert_eq!(
            serialize(&data),
            "f=1.5&whole=2&big=1e+21&tiny=1e-7&neg=-3&flag=false&nothing=null&list=1,,x&obj=[object Object]"
        );
    }

    #[test]
    fn test_serialize_string_counts_utf16_units() {
        assert_eq!(serialize(&json!("a\u{e9}")), "0=a&1=\u{e9}");
        assert_eq!(
            serialize(&json!("a\u{1F600}b")),
            "0=a&1=\u{FFFD}&2=\u{FFFD}&3=b"
        );
    }

    #[test]
    fn test_serialize_rounds_unsafe_integers() {
        let data = json!({
            "safe": 9007199254740992u64,
            "edge": 9007199254740993u64,
            "max": u64::MAX,
            "min": i64::MIN
        });
        assert_eq!(
            serialize(&data),
            "safe=9007199254740992&edge=9007199254740992&max=18446744073709552000&min=-9223372036854776000"
        );
    }

    #[test]
    fn test_serialize_value_from_struct() {
        #[derive(Serialize)]
        struct Params {
            page: u32,
            sort: &'static str,
        }

        let params = Params {
            page: 2,
            sort: "desc",
        };
        assert_eq!(serialize_value(&params).unwrap(), "page=2&sort=desc");
        assert_eq!(serialize_value(&None::<Params>).unwrap(), "");
        assert_eq!(serialize_value(&[4, 5]).unwrap(), "0=4&1=5");
    }

    #[test]
    fn test_serialize_pairs() {
        assert_eq!(serialize_pairs([("a", 1), ("b", 2)]), "a=1&b=2");
        assert_eq!(serialize_pairs(Vec::<(String, String)>::new()), "");
    }
}
