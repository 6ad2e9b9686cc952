//! Text concatenation collectors.

use std::borrow::Cow;
use std::sync::Arc;

use super::Collector;
use crate::core::{Error, Result};

/// Elements that can be joined as text.
///
/// Returning `None` marks an absent element, which joining rejects with
/// [`Error::AbsentElement`].
pub trait Text {
    /// The text to append for this element, or `None` when the element is
    /// absent and joining must fail.
    fn text(&self) -> Option<&str>;
}

impl Text for String {
    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl Text for &str {
    fn text(&self) -> Option<&str> {
        Some(*self)
    }
}

impl Text for Box<str> {
    fn text(&self) -> Option<&str> {
        Some(&**self)
    }
}

impl Text for Cow<'_, str> {
    fn text(&self) -> Option<&str> {
        Some(&**self)
    }
}

impl Text for Arc<str> {
    fn text(&self) -> Option<&str> {
        Some(&**self)
    }
}

impl<S: Text> Text for Option<S> {
    fn text(&self) -> Option<&str> {
        self.as_ref().and_then(Text::text)
    }
}

/// Concatenate elements with nothing in between.
pub fn joining<T: Text + 'static>() -> Collector<T, Option<String>, String> {
    joining_full("", "", "")
}

/// Concatenate elements separated by `delimiter`.
pub fn joining_with<T: Text + 'static>(delimiter: &str) -> Collector<T, Option<String>, String> {
    joining_full(delimiter, "", "")
}

/// Concatenate elements separated by `delimiter`, wrapped in `prefix` and
/// `suffix`.
///
/// ```rust
/// use lazyweld::collectors;
///
/// let braced = collectors::joining_full(",", "{", "}")
///     .collect_iter(["I", "love", "you"])
///     .unwrap();
/// assert_eq!(braced, "{I,love,you}");
/// ```
pub fn joining_full<T: Text + 'static>(
    delimiter: &str,
    prefix: &str,
    suffix: &str,
) -> Collector<T, Option<String>, String> {
    let accumulate_delimiter = delimiter.to_string();
    let combine_delimiter = delimiter.to_string();
    let prefix = prefix.to_string();
    let suffix = suffix.to_string();

    // `None` until the first element, so the delimiter never leads
    Collector::try_of(
        || None,
        move |joined: &mut Option<String>, item: T| {
            let text = item.text().ok_or_else(|| Error::absent("joining"))?;
            match joined {
                Some(buffer) => {
                    buffer.push_str(&accumulate_delimiter);
                    buffer.push_str(text);
                }
                None => *joined = Some(text.to_string()),
            }
            Ok(())
        },
        move |left, right| {
            Ok(match (left, right) {
                (Some(mut left), Some(right)) => {
                    left.push_str(&combine_delimiter);
                    left.push_str(&right);
                    Some(left)
                }
                (left, right) => left.or(right),
            })
        },
    )
    .and_then(move |joined| format!("{}{}{}", prefix, joined.unwrap_or_default(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_marks_absent_elements() {
        assert_eq!(Some("love".to_string()).text(), Some("love"));
        assert_eq!(None::<String>.text(), None);
        assert_eq!(Arc::<str>::from("you").text(), Some("you"));
    }

    #[test]
    fn test_joining_variants() {
        let words = ["I", "love", "you"];
        assert_eq!(joining().collect_iter(words).unwrap(), "Iloveyou");
        assert_eq!(joining_with(" ").collect_iter(words).unwrap(), "I love you");
        assert_eq!(
            joining_full(",", "{", "}").collect_iter(words).unwrap(),
            "{I,love,you}"
        );
    }

    #[test]
    fn test_joining_empty_input_keeps_affixes() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(joining_full(",", "[", "]").collect_iter(empty).unwrap(), "[]");
    }

    #[test]
    fn test_joining_rejects_absent_element() {
        let err = joining_with(",")
            .collect_iter([Some("I"), None, Some("you")])
            .unwrap_err();
        assert!(matches!(err, Error::AbsentElement { operation: "joining" }));
    }

    #[test]
    fn test_joining_combine_inserts_delimiter_once() {
        let collector = joining_with::<&str>(",");
        let mut left = collector.supply();
        collector.accumulate(&mut left, "I").unwrap();
        let empty = collector.supply();
        let mut right = collector.supply();
        collector.accumulate(&mut right, "you").unwrap();

        let merged = collector.combine(left, empty).unwrap();
        let merged = collector.combine(merged, right).unwrap();
        assert_eq!(collector.finish(merged).unwrap(), "I,you");
    }
}
