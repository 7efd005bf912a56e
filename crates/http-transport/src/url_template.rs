//! RFC 6570 URI template expansion (levels 1 to 4).
//!
//! Supports the `+ # . / ; ? &` operators and the `:n` prefix and `*`
//! explode modifiers. Undefined variables (absent or `null`) expand to
//! nothing. Literal text is passed through with reserved-set encoding, and
//! unmatched braces are emitted as-is.

use indexmap::IndexMap;
use percent_encoding::utf8_percent_encode;
use serde_json::Value;

use crate::encoding::{value_text, RESERVED, UNRESERVED};

/// Expands `template` with `context`.
pub fn expand(template: &str, context: &IndexMap<String, Value>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while !rest.is_empty() {
        let Some(open) = rest.find(['{', '}']) else {
            expanded.push_str(&encode_reserved(rest));
            break;
        };
        expanded.push_str(&encode_reserved(&rest[..open]));
        rest = &rest[open..];

        match expression_at(rest) {
            Some(expression) => {
                expanded.push_str(&expand_expression(expression, context));
                rest = &rest[expression.len() + 2..];
            }
            None => {
                // Stray brace.
                expanded.push_str(&rest[..1]);
                rest = &rest[1..];
            }
        }
    }
    expanded
}

/// Returns the body of a `{...}` expression starting at the beginning of
/// `text`, if it is well formed and non-empty.
fn expression_at(text: &str) -> Option<&str> {
    let body = text.strip_prefix('{')?;
    let close = body.find(['{', '}'])?;
    (body.as_bytes()[close] == b'}' && close > 0).then(|| &body[..close])
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Fragment,
    Label,
    PathSegment,
    PathParameter,
    Query,
    QueryContinuation,
}

impl Operator {
    fn parse(expression: &str) -> (Self, &str) {
        let operator = match expression.as_bytes()[0] {
            b'+' => Self::Reserved,
            b'#' => Self::Fragment,
            b'.' => Self::Label,
            b'/' => Self::PathSegment,
            b';' => Self::PathParameter,
            b'?' => Self::Query,
            b'&' => Self::QueryContinuation,
            _ => return (Self::Simple, expression),
        };
        (operator, &expression[1..])
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved => "",
            Self::Fragment => "#",
            Self::Label => ".",
            Self::PathSegment => "/",
            Self::PathParameter => ";",
            Self::Query => "?",
            Self::QueryContinuation => "&",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved | Self::Fragment => ",",
            Self::Query => "&",
            other => other.prefix(),
        }
    }

    /// Operators whose values are emitted as `name=value`.
    fn is_named(self) -> bool {
        matches!(
            self,
            Self::PathParameter | Self::Query | Self::QueryContinuation
        )
    }

    fn allows_reserved(self) -> bool {
        matches!(self, Self::Reserved | Self::Fragment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

fn parse_variable(spec: &str) -> (&str, Modifier) {
    let Some(index) = spec.find([':', '*']) else {
        return (spec, Modifier::None);
    };
    let (name, modifier) = spec.split_at(index);
    if modifier.starts_with('*') {
        return (name, Modifier::Explode);
    }
    let digits: String = modifier[1..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse() {
        Ok(length) => (name, Modifier::Prefix(length)),
        Err(_) => (name, Modifier::None),
    }
}

fn expand_expression(expression: &str, context: &IndexMap<String, Value>) -> String {
    let (operator, variables) = Operator::parse(expression);
    let values: Vec<String> = variables
        .split(',')
        .flat_map(|spec| {
            let (name, modifier) = parse_variable(spec);
            variable_values(context.get(name), operator, name, modifier)
        })
        .collect();

    if values.is_empty() {
        String::new()
    } else {
        format!("{}{}", operator.prefix(), values.join(operator.separator()))
    }
}

fn variable_values(
    value: Option<&Value>,
    operator: Operator,
    name: &str,
    modifier: Modifier,
) -> Vec<String> {
    let named = operator.is_named().then_some(name);
    let mut result = Vec::new();

    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if s.is_empty() => {
            if operator == Operator::PathParameter {
                result.push(encode_unreserved(name));
            } else if operator.is_named() {
                result.push(format!("{}=", encode_unreserved(name)));
            } else {
                result.push(String::new());
            }
        }
        Some(Value::Array(items)) => {
            let defined = items.iter().filter(|item| !item.is_null());
            if modifier == Modifier::Explode {
                result.extend(defined.map(|item| encode_value(operator, &value_text(item), named)));
            } else {
                let parts: Vec<String> = defined
                    .map(|item| encode_value(operator, &value_text(item), None))
                    .collect();
                push_composite(&mut result, operator, name, parts);
            }
        }
        Some(Value::Object(entries)) => {
            let defined = entries.iter().filter(|(_, item)| !item.is_null());
            if modifier == Modifier::Explode {
                result.extend(defined.map(|(key, item)| {
                    encode_value(operator, &value_text(item), Some(key.as_str()))
                }));
            } else {
                let parts: Vec<String> = defined
                    .flat_map(|(key, item)| {
                        [
                            encode_unreserved(key),
                            encode_value(operator, &value_text(item), None),
                        ]
                    })
                    .collect();
                push_composite(&mut result, operator, name, parts);
            }
        }
        Some(scalar) => {
            let mut text = value_text(scalar);
            if let Modifier::Prefix(length) = modifier {
                text = text.chars().take(length).collect();
            }
            result.push(encode_value(operator, &text, named));
        }
    }
    result
}

fn push_composite(result: &mut Vec<String>, operator: Operator, name: &str, parts: Vec<String>) {
    if operator.is_named() {
        result.push(format!("{}={}", encode_unreserved(name), parts.join(",")));
    } else if !parts.is_empty() {
        result.push(parts.join(","));
    }
}

fn encode_value(operator: Operator, value: &str, name: Option<&str>) -> String {
    let encoded = if operator.allows_reserved() {
        encode_reserved(value)
    } else {
        encode_unreserved(value)
    };
    match name {
        Some(name) => format!("{}={encoded}", encode_unreserved(name)),
        None => encoded,
    }
}

fn encode_unreserved(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Reserved-set encoding that leaves existing `%XX` triplets intact.
fn encode_reserved(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut encoded = String::with_capacity(value.len());
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let is_triplet = bytes[index] == b'%'
            && bytes.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(index + 2).is_some_and(u8::is_ascii_hexdigit);
        if is_triplet {
            encoded.extend(utf8_percent_encode(&value[start..index], RESERVED));
            encoded.push_str(&value[index..index + 3]);
            index += 3;
            start = index;
        } else {
            index += 1;
        }
    }
    encoded.extend(utf8_percent_encode(&value[start..], RESERVED));
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> IndexMap<String, Value> {
        let value = json!({
            "var": "value",
            "hello": "Hello World!",
            "path": "/foo/bar",
            "empty": "",
            "undef": null,
            "x": "1024",
            "y": "768",
            "id": 42,
            "list": ["red", "green", "blue"],
            "keys": {"semi": ";", "dot": ".", "comma": ","}
        });
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => unreachable!(),
        }
    }

    fn check(template: &str, expected: &str) {
        assert_eq!(expand(template, &context()), expected, "{template}");
    }

    #[test]
    fn level_one_simple_expansion() {
        check("/users/{id}/", "/users/42/");
        check("{var}", "value");
        check("{hello}", "Hello%20World%21");
        check("/a/{undef}/b", "/a//b");
        check("/a/{missing}", "/a/");
    }

    #[test]
    fn level_two_reserved_and_fragment() {
        check("{+path}/here", "/foo/bar/here");
        check("{+hello}", "Hello%20World!");
        check("X{#var}", "X#value");
        check("X{#hello}", "X#Hello%20World!");
    }

    #[test]
    fn level_three_multiple_variables() {
        check("map?{x,y}", "map?1024,768");
        check("{x,hello,y}", "1024,Hello%20World%21,768");
        check("{.x,y}", ".1024.768");
        check("{/var,x}/here", "/value/1024/here");
        check("{;x,y,empty}", ";x=1024;y=768;empty");
        check("{?x,y,empty}", "?x=1024&y=768&empty=");
        check("?fixed=yes{&x}", "?fixed=yes&x=1024");
        check("{?undef}", "");
    }

    #[test]
    fn level_four_modifiers() {
        check("{var:3}", "val");
        check("{var:30}", "value");
        check("{list}", "red,green,blue");
        check("{list*}", "red,green,blue");
        check("{/list*}", "/red/green/blue");
        check("{?list*}", "?list=red&list=green&list=blue");
        check("{keys}", "semi,%3B,dot,.,comma,%2C");
        check("{keys*}", "semi=%3B,dot=.,comma=%2C");
        check("{?keys*}", "?semi=%3B&dot=.&comma=%2C");
        check("{;list}", ";list=red,green,blue");
    }

    #[test]
    fn literals_keep_existing_escapes_and_stray_braces() {
        check("/a%20b/c d", "/a%20b/c%20d");
        check("/{}/x}", "/{}/x}");
        check("/{open", "/{open");
    }
}
