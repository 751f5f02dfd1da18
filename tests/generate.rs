use std::{collections::HashSet, fs, sync::Arc};

use avrogen::{
    directive::Encoding,
    generator::{Builder, OptionsSource},
    schema::{DecimalMeta, Field, Kind, NodeId, SchemaBuilder},
    Error, Result, Value,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn build(rng_seed: u64, schema: avrogen::Schema, generation_offset: u64) -> avrogen::Generator {
    Builder::new(schema)
        .rng(Box::new(StdRng::seed_from_u64(rng_seed)))
        .generation_offset(generation_offset)
        .build()
}

#[test]
fn test_long_iteration_through_the_generator_wraps_at_restart() {
    let mut b = SchemaBuilder::new();
    let directive = json!({"iteration": {"start": -50, "restart": 0, "step": 47, "initial": -50}});
    let node = b.push(Kind::Long, Some(directive));
    let schema = b.finish(node);

    let mut gen = build(1, schema, 0);
    assert_eq!(gen.generate().unwrap(), Value::Long(-50));
    assert_eq!(gen.generate().unwrap(), Value::Long(-3));
}

#[test]
fn test_boolean_iteration_fast_forward_through_the_generator_matches_stepwise() {
    let mut b = SchemaBuilder::new();
    let directive = json!({"iteration": {"start": true}});
    let node = b.push(Kind::Boolean, Some(directive.clone()));
    let schema = b.finish(node);

    let mut stepwise = build(2, schema, 0);
    for _ in 0..5 {
        stepwise.generate().unwrap();
    }
    let v_after_five = stepwise.generate().unwrap();

    let mut b2 = SchemaBuilder::new();
    let node2 = b2.push(Kind::Boolean, Some(directive));
    let schema2 = b2.finish(node2);
    let mut fast_forwarded = build(2, schema2, 5);
    let v_ff = fast_forwarded.generate().unwrap();

    assert_eq!(v_after_five, v_ff);
}

#[test]
fn test_determinism_same_seed_same_sequence() {
    let make_schema = || {
        let mut b = SchemaBuilder::new();
        let node = b.push(Kind::Int, Some(json!({"range": {"min": 0, "max": 1000}})));
        b.finish(node)
    };

    let mut a = build(42, make_schema(), 0);
    let mut b = build(42, make_schema(), 0);
    for _ in 0..20 {
        assert_eq!(a.generate().unwrap(), b.generate().unwrap());
    }
}

#[test]
fn test_options_containment() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::Int, Some(json!({"options": [1, 2, 3]})));
    let schema = b.finish(node);
    let mut gen = build(7, schema, 0);

    let allowed: HashSet<i32> = [1, 2, 3].into_iter().collect();
    for _ in 0..200 {
        match gen.generate().unwrap() {
            Value::Int(v) => assert!(allowed.contains(&v), "{v} not in options"),
            other => panic!("expected an int, got {other:?}"),
        }
    }
}

#[test]
fn test_range_containment() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::Int, Some(json!({"range": {"min": -5, "max": 5}})));
    let schema = b.finish(node);
    let mut gen = build(9, schema, 0);

    for _ in 0..500 {
        match gen.generate().unwrap() {
            Value::Int(v) => assert!((-5..5).contains(&v), "{v} out of range"),
            other => panic!("expected an int, got {other:?}"),
        }
    }
}

#[test]
fn test_length_containment_for_strings() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::String, Some(json!({"length": {"min": 3, "max": 6}})));
    let schema = b.finish(node);
    let mut gen = build(13, schema, 0);

    for _ in 0..200 {
        match gen.generate().unwrap() {
            Value::String(s) => assert!((3..6).contains(&s.chars().count()), "{s:?} has wrong length"),
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

#[test]
fn test_prefix_and_suffix_are_applied() {
    let mut b = SchemaBuilder::new();
    let node = b.push(
        Kind::String,
        Some(json!({"length": {"min": 2, "max": 4}, "prefix": "pre-", "suffix": "-suf"})),
    );
    let schema = b.finish(node);
    let mut gen = build(21, schema, 0);

    for _ in 0..50 {
        match gen.generate().unwrap() {
            Value::String(s) => {
                assert!(s.starts_with("pre-"), "{s:?} missing prefix");
                assert!(s.ends_with("-suf"), "{s:?} missing suffix");
            }
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

#[test]
fn test_regex_generated_strings_match_the_pattern() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::String, Some(json!({"regex": "[0-9]{4}-[0-9]{2}"})));
    let schema = b.finish(node);
    let mut gen = build(27, schema, 0);

    let checker = regex::Regex::new(r"^[0-9]{4}-[0-9]{2}$").unwrap();
    for _ in 0..200 {
        match gen.generate().unwrap() {
            Value::String(s) => assert!(checker.is_match(&s), "{s:?} did not match"),
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

#[test]
fn test_boolean_odds_bias_the_distribution() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::Boolean, Some(json!({"odds": 0.9})));
    let schema = b.finish(node);
    let mut gen = build(33, schema, 0);

    let trials = 2000;
    let mut true_count = 0;
    for _ in 0..trials {
        if let Value::Boolean(true) = gen.generate().unwrap() {
            true_count += 1;
        }
    }
    let ratio = f64::from(true_count) / f64::from(trials);
    assert!(ratio > 0.75, "ratio {ratio} too low for odds 0.9");
}

#[test]
fn test_two_reused_record_types_iterate_independently_by_node_identity() {
    // Two `int` fields, structurally identical (`Kind::Int`) but carrying
    // different `start` offsets, built as two separate arena nodes. Their
    // cached iterator state must be keyed by node identity, not by kind or
    // directive shape, or one field's progression would clobber the other's.
    let mut b = SchemaBuilder::new();
    let first = b.push(Kind::Int, Some(json!({"iteration": {"start": 0, "restart": 100, "step": 1}})));
    let second = b.push(Kind::Int, Some(json!({"iteration": {"start": 50, "restart": 150, "step": 1}})));
    let record = b.push(
        Kind::Record {
            fields: vec![
                Field { name: "a".to_owned(), schema: first },
                Field { name: "b".to_owned(), schema: second },
            ],
        },
        None,
    );
    let schema = b.finish(record);
    let mut gen = build(40, schema, 0);

    for i in 0..5 {
        match gen.generate().unwrap() {
            Value::Record(fields) => {
                assert_eq!(fields[0].1, Value::Int(i));
                assert_eq!(fields[1].1, Value::Int(50 + i));
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }
}

#[test]
fn test_string_iteration_emits_decimal_representations() {
    let mut b = SchemaBuilder::new();
    let directive = json!({"iteration": {"start": 0, "restart": 3, "step": 1}, "prefix": "id-"});
    let node = b.push(Kind::String, Some(directive));
    let schema = b.finish(node);
    let mut gen = build(90, schema, 0);

    for expected in ["id-0", "id-1", "id-2", "id-0"] {
        match gen.generate().unwrap() {
            Value::String(s) => assert_eq!(s, expected),
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

#[test]
fn test_map_keys_default_to_random_single_char_strings_without_a_keys_directive() {
    let mut b = SchemaBuilder::new();
    let item = b.push(Kind::Int, None);
    let map = b.push(Kind::Map { values: item }, Some(json!({"length": 10})));
    let schema = b.finish(map);
    let mut gen = build(91, schema, 0);

    match gen.generate().unwrap() {
        Value::Map(entries) => {
            assert!(!entries.is_empty());
            for key in entries.keys() {
                assert_eq!(key.chars().count(), 1, "{key:?} is not a single character");
            }
        }
        other => panic!("expected a map, got {other:?}"),
    }
}

#[test]
fn test_array_and_map_length_directives_are_respected() {
    let mut b = SchemaBuilder::new();
    let item = b.push(Kind::Int, None);
    let array = b.push(Kind::Array { items: item }, Some(json!({"length": 5})));
    let schema = b.finish(array);
    let mut gen = build(55, schema, 0);

    match gen.generate().unwrap() {
        Value::Array(items) => assert_eq!(items.len(), 5),
        other => panic!("expected an array, got {other:?}"),
    }
}

#[test]
fn test_decimal_precision_mode_encodes_bytes() {
    let mut b = SchemaBuilder::new();
    let meta = DecimalMeta { precision: 9, scale: 2 };
    let node = b.push(Kind::Bytes(Some(meta)), None);
    let schema = b.finish(node);
    let mut gen = build(61, schema, 0);

    match gen.generate().unwrap() {
        Value::Bytes(bytes) => assert!(!bytes.is_empty()),
        other => panic!("expected bytes, got {other:?}"),
    }
}

#[test]
fn test_fixed_decimal_pads_to_declared_size() {
    let mut b = SchemaBuilder::new();
    let meta = DecimalMeta { precision: 4, scale: 1 };
    let node = b.push(
        Kind::Fixed { size: 8, decimal: Some(meta) },
        None,
    );
    let schema = b.finish(node);
    let mut gen = build(62, schema, 0);

    match gen.generate().unwrap() {
        Value::Fixed(bytes) => assert_eq!(bytes.len(), 8),
        other => panic!("expected fixed bytes, got {other:?}"),
    }
}

/// A minimal [`OptionsSource`] reading newline-separated integers from a
/// plain text file, used only to exercise the file-backed `options` seam.
struct LineOptions;

impl OptionsSource for LineOptions {
    fn load(&self, node: NodeId, file: &str, _encoding: Encoding) -> Result<Vec<Value>> {
        let contents = fs::read_to_string(file).map_err(|e| Error::OptionsSource {
            node,
            cause: e.to_string(),
        })?;
        Ok(contents
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| Value::Int(l.parse().unwrap()))
            .collect())
    }
}

#[test]
fn test_file_backed_options_go_through_the_options_source_seam() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.txt");
    fs::write(&path, "10\n20\n30\n").unwrap();

    let mut b = SchemaBuilder::new();
    let node = b.push(
        Kind::Int,
        Some(json!({"options": {"file": path.to_str().unwrap(), "encoding": "json"}})),
    );
    let schema = b.finish(node);

    let mut gen = Builder::new(schema)
        .rng(Box::new(StdRng::seed_from_u64(70)))
        .options_source(Arc::new(LineOptions))
        .build();

    let allowed: HashSet<i32> = [10, 20, 30].into_iter().collect();
    for _ in 0..30 {
        match gen.generate().unwrap() {
            Value::Int(v) => assert!(allowed.contains(&v)),
            other => panic!("expected an int, got {other:?}"),
        }
    }
}

#[test]
fn test_mutually_exclusive_directives_are_rejected_before_generation() {
    let mut b = SchemaBuilder::new();
    let node = b.push(Kind::Int, Some(json!({"options": [1, 2], "range": {"min": 0, "max": 10}})));
    let schema = b.finish(node);
    let mut gen = build(80, schema, 0);
    let err = gen.generate().unwrap_err();
    assert!(matches!(err, Error::MutuallyExclusiveDirectives { .. }));
}
