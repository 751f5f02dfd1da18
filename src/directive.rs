//! Parses and validates the `arg.properties` user-property on a schema node
//! into a typed [`Directives`] record, enforcing the dispatch precedence
//! (`options` / `iteration` / type-default) and the per-directive validation
//! categories.

use serde_json::{Map, Value as Json};

use crate::{
    error::{Error, Result},
    schema::NodeId,
};

/// How an options-from-file directive's backing stream is encoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Avro object container / single-object binary encoding.
    Binary,
    /// Avro JSON encoding.
    Json,
}

/// The `options` directive: either an inline literal list, or a pointer to an
/// external file of records sharing the node's schema.
#[derive(Clone, Debug)]
pub enum OptionsDirective {
    /// A non-empty list of literal JSON values, each to be coerced into the
    /// node's expected runtime value and validated against its schema.
    Inline(Vec<Json>),
    /// A file of pre-encoded records to read exhaustively on first visit.
    File {
        /// Path or resource name of the backing file.
        file: String,
        /// Encoding of the records in the file.
        encoding: Encoding,
    },
}

/// The `range` directive: `{min?, max?}`, defaults depending on the node's
/// numeric type (applied by the caller, since the raw JSON numbers don't
/// know their target width).
#[derive(Clone, Debug, Default)]
pub struct RangeDirective {
    /// Inclusive lower bound, if given.
    pub min: Option<Json>,
    /// Exclusive upper bound, if given.
    pub max: Option<Json>,
}

/// The `iteration` directive: `{start, restart?, step?, initial?}`. Values
/// are kept as raw JSON here; `crate::iterator` coerces them to the node's
/// numeric type and applies its own defaulting rules.
#[derive(Clone, Debug)]
pub struct IterationDirective {
    /// Starting value of the progression (required).
    pub start: Json,
    /// Value at which the progression wraps back to `start`.
    pub restart: Option<Json>,
    /// Increment applied on every `next()`.
    pub step: Option<Json>,
    /// Value to use for the very first (offset-0) element, if different from `start`.
    pub initial: Option<Json>,
}

/// The sub-rules a `keys` directive may carry, applied over an implicit
/// string schema when generating map keys.
#[derive(Clone, Debug, Default)]
pub struct KeysDirective {
    /// Inline or file-backed options for key strings.
    pub options: Option<OptionsDirective>,
    /// Length bounds for randomly generated key strings.
    pub length: Option<crate::length::Length>,
    /// A regex pattern constraining key strings.
    pub regex: Option<String>,
    /// Prefix prepended to every generated key.
    pub prefix: String,
    /// Suffix appended to every generated key.
    pub suffix: String,
}

/// A fully parsed, validated set of directives for one schema node.
#[derive(Clone, Debug, Default)]
pub struct Directives {
    /// `options` directive, if present.
    pub options: Option<OptionsDirective>,
    /// `iteration` directive, if present.
    pub iteration: Option<IterationDirective>,
    /// `length` directive, if present.
    pub length: Option<crate::length::Length>,
    /// `regex` directive, if present.
    pub regex: Option<String>,
    /// `prefix` directive (defaults to empty string).
    pub prefix: String,
    /// `suffix` directive (defaults to empty string).
    pub suffix: String,
    /// `range` directive, if present.
    pub range: Option<RangeDirective>,
    /// `odds` directive (boolean bias), if present.
    pub odds: Option<f64>,
    /// `keys` sub-directive (only meaningful on `map` nodes), if present.
    pub keys: Option<KeysDirective>,
}

fn shape_err(node: NodeId, directive: &'static str, cause: impl Into<String>) -> Error {
    Error::InvalidDirectiveShape {
        directive,
        node,
        cause: cause.into(),
    }
}

fn as_object<'a>(node: NodeId, directive: &'static str, v: &'a Json) -> Result<&'a Map<String, Json>> {
    v.as_object()
        .ok_or_else(|| shape_err(node, directive, format!("expected an object, got {v}")))
}

fn as_str(node: NodeId, directive: &'static str, v: &Json) -> Result<String> {
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| shape_err(node, directive, format!("expected a string, got {v}")))
}

fn parse_length(node: NodeId, v: &Json) -> Result<crate::length::Length> {
    if let Some(exact) = v.as_u64() {
        return Ok(crate::length::Length::exact(exact));
    }
    let obj = as_object(node, "length", v)?;
    let min = match obj.get("min") {
        Some(m) => m
            .as_u64()
            .ok_or_else(|| shape_err(node, "length.min", format!("expected a non-negative integer, got {m}")))?,
        None => 0,
    };
    let max = match obj.get("max") {
        Some(m) => m
            .as_u64()
            .ok_or_else(|| shape_err(node, "length.max", format!("expected a non-negative integer, got {m}")))?,
        None => i32::MAX as u64,
    };
    if max <= min {
        return Err(Error::InvalidRange {
            directive: "length",
            node,
            cause: format!("max ({max}) must be greater than min ({min})"),
        });
    }
    Ok(crate::length::Length::new(min, max))
}

fn parse_range(node: NodeId, v: &Json) -> Result<RangeDirective> {
    let obj = as_object(node, "range", v)?;
    let min = obj.get("min").cloned();
    let max = obj.get("max").cloned();
    if let (Some(min), Some(max)) = (&min, &max) {
        if let (Some(a), Some(b)) = (min.as_f64(), max.as_f64()) {
            if !(a < b) {
                return Err(Error::InvalidRange {
                    directive: "range",
                    node,
                    cause: format!("min ({a}) must be strictly less than max ({b})"),
                });
            }
        }
    }
    Ok(RangeDirective { min, max })
}

fn parse_options(node: NodeId, v: &Json) -> Result<OptionsDirective> {
    if let Some(list) = v.as_array() {
        if list.is_empty() {
            return Err(Error::OptionsSource {
                node,
                cause: "inline options list must not be empty".to_owned(),
            });
        }
        return Ok(OptionsDirective::Inline(list.clone()));
    }
    let obj = as_object(node, "options", v)?;
    let file = obj
        .get("file")
        .ok_or_else(|| shape_err(node, "options", "object form requires a `file` key"))?;
    let file = as_str(node, "options.file", file)?;
    let encoding = obj
        .get("encoding")
        .ok_or_else(|| shape_err(node, "options", "object form requires an `encoding` key"))?;
    let encoding = match as_str(node, "options.encoding", encoding)?.as_str() {
        "binary" => Encoding::Binary,
        "json" => Encoding::Json,
        other => {
            return Err(shape_err(
                node,
                "options.encoding",
                format!("must be \"binary\" or \"json\", got {other:?}"),
            ))
        }
    };
    Ok(OptionsDirective::File { file, encoding })
}

fn parse_iteration(node: NodeId, v: &Json) -> Result<IterationDirective> {
    let obj = as_object(node, "iteration", v)?;
    let start = obj
        .get("start")
        .cloned()
        .ok_or_else(|| shape_err(node, "iteration", "missing required `start` field"))?;
    Ok(IterationDirective {
        start,
        restart: obj.get("restart").cloned(),
        step: obj.get("step").cloned(),
        initial: obj.get("initial").cloned(),
    })
}

fn parse_keys(node: NodeId, v: &Json) -> Result<KeysDirective> {
    let obj = as_object(node, "keys", v)?;
    let options = obj.get("options").map(|o| parse_options(node, o)).transpose()?;
    let length = obj.get("length").map(|l| parse_length(node, l)).transpose()?;
    let regex = obj.get("regex").map(|r| as_str(node, "keys.regex", r)).transpose()?;
    if options.is_some() && (length.is_some() || regex.is_some()) {
        return Err(Error::MutuallyExclusiveDirectives {
            node,
            a: "keys.options",
            b: "keys.length/keys.regex",
        });
    }
    let prefix = obj
        .get("prefix")
        .map(|p| as_str(node, "keys.prefix", p))
        .transpose()?
        .unwrap_or_default();
    let suffix = obj
        .get("suffix")
        .map(|p| as_str(node, "keys.suffix", p))
        .transpose()?
        .unwrap_or_default();
    Ok(KeysDirective {
        options,
        length,
        regex,
        prefix,
        suffix,
    })
}

/// Parses and validates the `arg.properties` value found on a node.
/// `raw` is `None` when the node carried no user-properties at all.
pub fn resolve(node: NodeId, raw: Option<&Json>) -> Result<Directives> {
    let Some(raw) = raw else {
        return Ok(Directives::default());
    };
    let obj = as_object(node, "arg.properties", raw)?;

    let options = obj.get("options").map(|o| parse_options(node, o)).transpose()?;
    let iteration = obj.get("iteration").map(|i| parse_iteration(node, i)).transpose()?;
    let length = obj.get("length").map(|l| parse_length(node, l)).transpose()?;
    let regex = obj.get("regex").map(|r| as_str(node, "regex", r)).transpose()?;
    let range = obj.get("range").map(|r| parse_range(node, r)).transpose()?;
    let odds = match obj.get("odds") {
        Some(o) => Some(
            o.as_f64()
                .ok_or_else(|| shape_err(node, "odds", format!("expected a number, got {o}")))?,
        ),
        None => None,
    };
    let keys = obj.get("keys").map(|k| parse_keys(node, k)).transpose()?;
    let prefix = obj
        .get("prefix")
        .map(|p| as_str(node, "prefix", p))
        .transpose()?
        .unwrap_or_default();
    let suffix = obj
        .get("suffix")
        .map(|p| as_str(node, "suffix", p))
        .transpose()?
        .unwrap_or_default();

    if options.is_some() {
        if length.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "options", b: "length" });
        }
        if regex.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "options", b: "regex" });
        }
        if iteration.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "options", b: "iteration" });
        }
        if range.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "options", b: "range" });
        }
    }
    if iteration.is_some() {
        if length.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "iteration", b: "length" });
        }
        if regex.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "iteration", b: "regex" });
        }
        if range.is_some() {
            return Err(Error::MutuallyExclusiveDirectives { node, a: "iteration", b: "range" });
        }
    }

    Ok(Directives {
        options,
        iteration,
        length,
        regex,
        prefix,
        suffix,
        range,
        odds,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn n() -> NodeId {
        NodeId(0)
    }

    #[test]
    fn test_no_directives_is_all_defaults() {
        let d = resolve(n(), None).unwrap();
        assert!(d.options.is_none());
        assert_eq!(d.prefix, "");
        assert_eq!(d.suffix, "");
    }

    #[test]
    fn test_exact_length_integer_form() {
        let v = json!({"length": 5});
        let d = resolve(n(), Some(&v)).unwrap();
        assert_eq!(d.length, Some(crate::length::Length::exact(5)));
    }

    #[test]
    fn test_length_object_form_defaults() {
        let v = json!({"length": {"min": 3}});
        let d = resolve(n(), Some(&v)).unwrap();
        assert_eq!(d.length, Some(crate::length::Length::new(3, i32::MAX as u64)));
    }

    #[test]
    fn test_options_excludes_length() {
        let v = json!({"options": [1, 2, 3], "length": 4});
        let err = resolve(n(), Some(&v)).unwrap_err();
        assert!(matches!(err, Error::MutuallyExclusiveDirectives { .. }));
    }

    #[test]
    fn test_iteration_excludes_range() {
        let v = json!({"iteration": {"start": 0}, "range": {"min": 0, "max": 10}});
        let err = resolve(n(), Some(&v)).unwrap_err();
        assert!(matches!(err, Error::MutuallyExclusiveDirectives { .. }));
    }

    #[test]
    fn test_empty_inline_options_rejected() {
        let v = json!({"options": []});
        let err = resolve(n(), Some(&v)).unwrap_err();
        assert!(matches!(err, Error::OptionsSource { .. }));
    }

    #[test]
    fn test_range_requires_min_less_than_max() {
        let v = json!({"range": {"min": 10, "max": 10}});
        let err = resolve(n(), Some(&v)).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_prefix_suffix_default_empty() {
        let v = json!({"length": 3});
        let d = resolve(n(), Some(&v)).unwrap();
        assert_eq!(d.prefix, "");
        assert_eq!(d.suffix, "");
    }

    #[test]
    fn test_options_file_form() {
        let v = json!({"options": {"file": "opts.avro", "encoding": "binary"}});
        let d = resolve(n(), Some(&v)).unwrap();
        match d.options.unwrap() {
            OptionsDirective::File { file, encoding } => {
                assert_eq!(file, "opts.avro");
                assert_eq!(encoding, Encoding::Binary);
            }
            OptionsDirective::Inline(_) => panic!("expected file form"),
        }
    }
}
