//! The value generator: walks a [`Schema`] from its root, resolving each
//! node's directives and producing a [`Value`] tree.
//!
//! Dispatch precedence at every node is `options` first, then `iteration`,
//! then the type's own default strategy — mirroring the mutual exclusion
//! already enforced by `crate::directive::resolve`.

use std::{collections::HashMap, fmt, sync::Arc};

use rand::{Rng, RngCore, SeedableRng as _};

use crate::{
    cache::{Caches, IteratorState},
    decimal,
    directive::{Directives, Encoding, IterationDirective, KeysDirective, OptionsDirective, RangeDirective},
    error::{Error, Result},
    iterator::{BoolIterator, DecimalIterator, IntIterator},
    length::Length,
    regexgen,
    schema::{DecimalMeta, Kind, NodeId, Schema},
    value::Value,
};

/// A pluggable loader for file-backed `options` directives.
///
/// The generation core never touches the filesystem directly; callers supply
/// an implementation that knows how to decode the referenced file (an Avro
/// object container, a JSON array, ...) into a flat list of already-coerced
/// values.
pub trait OptionsSource: Send + Sync {
    /// Loads the full contents of `file`, encoded as `encoding`, as a list of
    /// candidate values for `node`. Must return a non-empty list; an empty
    /// result is turned into `Error::OptionsSource` by the caller.
    fn load(&self, node: NodeId, file: &str, encoding: Encoding) -> Result<Vec<Value>>;
}

/// Builds a [`Generator`].
pub struct Builder {
    schema: Schema,
    rng: Option<Box<dyn RngCore + Send>>,
    generation_offset: u64,
    options_source: Option<Arc<dyn OptionsSource>>,
}

impl Builder {
    /// Starts a builder for the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rng: None,
            generation_offset: 0,
            options_source: None,
        }
    }

    /// Supplies the random source. If omitted, `build()` seeds a
    /// `rand::rngs::StdRng` from OS entropy.
    pub fn rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Sets how many generations to fast-forward every iteration-backed node
    /// by before the first `generate()` call.
    pub fn generation_offset(mut self, generation_offset: u64) -> Self {
        self.generation_offset = generation_offset;
        self
    }

    /// Supplies the loader used for file-backed `options` directives. If a
    /// schema never uses the file form, this may be left unset.
    pub fn options_source(mut self, options_source: Arc<dyn OptionsSource>) -> Self {
        self.options_source = Some(options_source);
        self
    }

    /// Finalizes the builder into a ready-to-use [`Generator`].
    pub fn build(self) -> Generator {
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(rand::rngs::StdRng::from_entropy()));
        Generator {
            schema: self.schema,
            rng,
            generation_offset: self.generation_offset,
            options_source: self.options_source,
            caches: Caches::new(),
            directives: HashMap::new(),
        }
    }
}

/// A single-instance, single-threaded value generator (`!Sync` by
/// convention — `generate()` takes `&mut self`).
pub struct Generator {
    schema: Schema,
    rng: Box<dyn RngCore + Send>,
    generation_offset: u64,
    options_source: Option<Arc<dyn OptionsSource>>,
    caches: Caches,
    directives: HashMap<NodeId, Directives>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("schema", &self.schema)
            .field("rng", &())
            .field("generation_offset", &self.generation_offset)
            .field("caches", &self.caches)
            .finish()
    }
}

impl Generator {
    /// Generates one complete value rooted at the schema's root node.
    pub fn generate(&mut self) -> Result<Value> {
        let root = self.schema.root();
        self.generate_node(root)
    }

    fn directives_for(&mut self, node: NodeId) -> Result<Directives> {
        if let Some(d) = self.directives.get(&node) {
            return Ok(d.clone());
        }
        let raw = self.schema.node(node).directives.clone();
        let d = crate::directive::resolve(node, raw.as_ref())?;
        self.directives.insert(node, d.clone());
        Ok(d)
    }

    fn generate_node(&mut self, node: NodeId) -> Result<Value> {
        let directives = self.directives_for(node)?;
        let kind = self.schema.node(node).kind.clone();

        if let Some(options) = directives.options.clone() {
            return self.generate_from_options(node, &kind, &options);
        }
        if let Some(iteration) = directives.iteration.clone() {
            return self.generate_from_iteration(node, &kind, &iteration, &directives.prefix, &directives.suffix);
        }
        self.generate_default(node, &kind, &directives)
    }

    // ---- options strategy --------------------------------------------

    fn options_for(&mut self, node: NodeId, kind: &Kind, options: &OptionsDirective) -> Result<Vec<Value>> {
        if let Some(list) = self.caches.options.get(&node) {
            return Ok(list.clone());
        }
        let list = match options {
            OptionsDirective::Inline(raw) => raw
                .iter()
                .map(|j| coerce_json_to_value(&self.schema, node, kind, j))
                .collect::<Result<Vec<_>>>()?,
            OptionsDirective::File { file, encoding } => {
                let source = self.options_source.as_ref().ok_or_else(|| Error::OptionsSource {
                    node,
                    cause: "no options source configured for a file-backed `options` directive".to_owned(),
                })?;
                source.load(node, file, *encoding)?
            }
        };
        if list.is_empty() {
            return Err(Error::OptionsSource {
                node,
                cause: "options source resolved to an empty list".to_owned(),
            });
        }
        self.caches.options.insert(node, list.clone());
        Ok(list)
    }

    fn generate_from_options(&mut self, node: NodeId, kind: &Kind, options: &OptionsDirective) -> Result<Value> {
        let list = self.options_for(node, kind, options)?;
        let idx = self.rng.gen_range(0..list.len());
        Ok(list[idx].clone())
    }

    // ---- iteration strategy ------------------------------------------

    fn generate_from_iteration(
        &mut self,
        node: NodeId,
        kind: &Kind,
        iteration: &IterationDirective,
        prefix: &str,
        suffix: &str,
    ) -> Result<Value> {
        let offset = self.generation_offset;
        match kind {
            Kind::Boolean => {
                let state = self.caches.iterators.entry(node).or_insert_with(|| {
                    let start = iteration.start.as_bool().unwrap_or(false);
                    IteratorState::Bool(BoolIterator::new(start, offset))
                });
                match state {
                    IteratorState::Bool(it) => Ok(Value::Boolean(it.next_value())),
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                }
            }
            Kind::Int => {
                if !self.caches.iterators.contains_key(&node) {
                    let it = IntIterator::new(node, iteration, i32::MIN as i128, i32::MAX as i128, offset)?;
                    self.caches.iterators.insert(node, IteratorState::Int(it));
                }
                match self.caches.iterators.get_mut(&node).unwrap() {
                    IteratorState::Int(it) => {
                        use num_traits::ToPrimitive;
                        let v = it.next_value();
                        let v = v.to_i32().ok_or_else(|| Error::NumericOverflow {
                            node,
                            cause: format!("iterated value {v} does not fit in int"),
                        })?;
                        Ok(Value::Int(v))
                    }
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                }
            }
            Kind::Long => {
                if !self.caches.iterators.contains_key(&node) {
                    let it = IntIterator::new(node, iteration, i64::MIN as i128, i64::MAX as i128, offset)?;
                    self.caches.iterators.insert(node, IteratorState::Int(it));
                }
                match self.caches.iterators.get_mut(&node).unwrap() {
                    IteratorState::Int(it) => {
                        use num_traits::ToPrimitive;
                        let v = it.next_value();
                        let v = v.to_i64().ok_or_else(|| Error::NumericOverflow {
                            node,
                            cause: format!("iterated value {v} does not fit in long"),
                        })?;
                        Ok(Value::Long(v))
                    }
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                }
            }
            Kind::Float => {
                if !self.caches.iterators.contains_key(&node) {
                    let it = DecimalIterator::new(node, iteration, f32::MAX as f64, offset)?;
                    self.caches.iterators.insert(node, IteratorState::Decimal(it));
                }
                match self.caches.iterators.get_mut(&node).unwrap() {
                    IteratorState::Decimal(it) => Ok(Value::Float(it.next_value() as f32)),
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                }
            }
            Kind::Double => {
                if !self.caches.iterators.contains_key(&node) {
                    let it = DecimalIterator::new(node, iteration, f64::MAX, offset)?;
                    self.caches.iterators.insert(node, IteratorState::Decimal(it));
                }
                match self.caches.iterators.get_mut(&node).unwrap() {
                    IteratorState::Decimal(it) => Ok(Value::Double(it.next_value())),
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                }
            }
            Kind::String => {
                if !self.caches.iterators.contains_key(&node) {
                    let it = IntIterator::new(node, iteration, i64::MIN as i128, i64::MAX as i128, offset)?;
                    self.caches.iterators.insert(node, IteratorState::Int(it));
                }
                let core = match self.caches.iterators.get_mut(&node).unwrap() {
                    IteratorState::Int(it) => it.next_value().to_string(),
                    _ => unreachable!("iterator kind cached under the wrong variant"),
                };
                Ok(Value::String(format!("{prefix}{core}{suffix}")))
            }
            other => Err(Error::UnsupportedDirective {
                directive: "iteration",
                node,
                kind: other.name(),
            }),
        }
    }

    // ---- type-default strategy ---------------------------------------

    fn generate_default(&mut self, node: NodeId, kind: &Kind, directives: &Directives) -> Result<Value> {
        match kind {
            Kind::Null => Ok(Value::Null),
            Kind::Boolean => {
                let p = directives.odds.unwrap_or(0.5);
                Ok(Value::Boolean(self.rng.gen_bool(p.clamp(0.0, 1.0))))
            }
            Kind::Int => {
                let (lo, hi) = resolve_int_range(node, &directives.range, i32::MIN as i64, i32::MAX as i64)?;
                Ok(Value::Int(self.rng.gen_range(lo..=hi) as i32))
            }
            Kind::Long => {
                let (lo, hi) = resolve_int_range(node, &directives.range, i64::MIN, i64::MAX)?;
                Ok(Value::Long(self.rng.gen_range(lo..=hi)))
            }
            Kind::Float => {
                let (lo, hi) = resolve_float_range(node, &directives.range, (0.0, 1.0), (f32::MIN as f64, f32::MAX as f64))?;
                Ok(Value::Float(self.rng.gen_range(lo..hi) as f32))
            }
            Kind::Double => {
                let (lo, hi) = resolve_float_range(node, &directives.range, (0.0, 1.0), (f64::MIN, f64::MAX))?;
                Ok(Value::Double(self.rng.gen_range(lo..hi)))
            }
            Kind::Bytes(decimal) => match decimal {
                Some(meta) => {
                    let unscaled = self.generate_decimal_unscaled(node, *meta, &directives.range)?;
                    Ok(Value::Bytes(decimal::encode_twos_complement(&unscaled)))
                }
                None => {
                    let length = directives.length.unwrap_or_default();
                    Ok(Value::Bytes(self.random_bytes(length)))
                }
            },
            Kind::String => self.generate_string(node, directives),
            Kind::Fixed { size, decimal } => match decimal {
                Some(meta) => {
                    let unscaled = self.generate_decimal_unscaled(node, *meta, &directives.range)?;
                    let bytes = decimal::encode_twos_complement_fixed(&unscaled, *size)
                        .map_err(|cause| Error::NumericOverflow { node, cause })?;
                    Ok(Value::Fixed(bytes))
                }
                None => {
                    let mut bytes = vec![0u8; *size];
                    self.rng.fill(bytes.as_mut_slice());
                    Ok(Value::Fixed(bytes))
                }
            },
            Kind::Enum { symbols } => {
                let idx = self.rng.gen_range(0..symbols.len() as u32);
                Ok(Value::Enum(idx, symbols[idx as usize].clone()))
            }
            Kind::Array { items } => {
                let items = *items;
                let length = directives.length.unwrap_or_default();
                let n = length.sample(&mut self.rng);
                let mut out = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    out.push(self.generate_node(items)?);
                }
                Ok(Value::Array(out))
            }
            Kind::Map { values } => {
                let values = *values;
                let length = directives.length.unwrap_or_default();
                let n = length.sample(&mut self.rng);
                let mut out = HashMap::with_capacity(n as usize);
                for i in 0..n {
                    let key = self.generate_map_key(node, directives.keys.as_ref(), i)?;
                    let value = self.generate_node(values)?;
                    out.insert(key, value);
                }
                Ok(Value::Map(out))
            }
            Kind::Record { fields } => {
                let fields = fields.clone();
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.generate_node(field.schema)?;
                    out.push((field.name, value));
                }
                Ok(Value::Record(out))
            }
            Kind::Union { members } => {
                let members = members.clone();
                let idx = self.rng.gen_range(0..members.len() as u32);
                let inner = self.generate_node(members[idx as usize])?;
                Ok(Value::Union(idx, Box::new(inner)))
            }
        }
    }

    fn generate_string(&mut self, node: NodeId, directives: &Directives) -> Result<Value> {
        if let Some(pattern) = &directives.regex {
            if !self.caches.regexes.contains_key(&node) {
                let compiled = regexgen::compile(node, pattern)?;
                self.caches.regexes.insert(node, compiled);
            }
            let generator = &self.caches.regexes[&node];
            let core = match directives.length {
                Some(length) => regexgen::sample_bounded(&mut self.rng, generator, &length),
                None => regexgen::sample(&mut self.rng, generator),
            };
            return Ok(Value::String(format!("{}{}{}", directives.prefix, core, directives.suffix)));
        }
        let length = directives.length.unwrap_or_default();
        let core = self.random_string(length);
        Ok(Value::String(format!("{}{}{}", directives.prefix, core, directives.suffix)))
    }

    fn generate_map_key(&mut self, map_node: NodeId, keys: Option<&KeysDirective>, _index: u64) -> Result<String> {
        let Some(keys) = keys else {
            return Ok(self.random_string(Length::exact(1)));
        };
        if let Some(options) = &keys.options {
            if !self.caches.key_options.contains_key(&map_node) {
                let list = match options {
                    OptionsDirective::Inline(raw) => raw
                        .iter()
                        .map(|j| {
                            j.as_str().map(str::to_owned).ok_or_else(|| Error::OptionCoercion {
                                node: map_node,
                                cause: format!("map key option {j} is not a string"),
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                    OptionsDirective::File { file, encoding } => {
                        let source = self.options_source.as_ref().ok_or_else(|| Error::OptionsSource {
                            node: map_node,
                            cause: "no options source configured for a file-backed `keys.options` directive".to_owned(),
                        })?;
                        source
                            .load(map_node, file, *encoding)?
                            .into_iter()
                            .map(|v| match v {
                                Value::String(s) => Ok(s),
                                other => Err(Error::OptionCoercion {
                                    node: map_node,
                                    cause: format!("map key option {other:?} is not a string"),
                                }),
                            })
                            .collect::<Result<Vec<_>>>()?
                    }
                };
                if list.is_empty() {
                    return Err(Error::OptionsSource {
                        node: map_node,
                        cause: "keys.options resolved to an empty list".to_owned(),
                    });
                }
                self.caches.key_options.insert(map_node, list);
            }
            let list = &self.caches.key_options[&map_node];
            let idx = self.rng.gen_range(0..list.len());
            return Ok(list[idx].clone());
        }
        if let Some(pattern) = &keys.regex {
            if !self.caches.regexes.contains_key(&map_node) {
                let compiled = regexgen::compile(map_node, pattern)?;
                self.caches.regexes.insert(map_node, compiled);
            }
            let generator = &self.caches.regexes[&map_node];
            let core = match keys.length {
                Some(length) => regexgen::sample_bounded(&mut self.rng, generator, &length),
                None => regexgen::sample(&mut self.rng, generator),
            };
            return Ok(format!("{}{}{}", keys.prefix, core, keys.suffix));
        }
        let length = keys.length.unwrap_or_default();
        let core = self.random_string(length);
        Ok(format!("{}{}{}", keys.prefix, core, keys.suffix))
    }

    fn generate_decimal_unscaled(
        &mut self,
        node: NodeId,
        meta: DecimalMeta,
        range: &Option<RangeDirective>,
    ) -> Result<num_bigint::BigInt> {
        match range {
            Some(r) => {
                // Range-mode default bounds are ±10^(precision-scale), not the
                // generic [0,1) used for plain float/double nodes.
                let bound = 10f64.powi((meta.precision.saturating_sub(meta.scale)) as i32);
                let (min, max) = resolve_float_range(node, &Some(r.clone()), (-bound, bound), (-bound, bound))?;
                Ok(decimal::generate_range(&mut self.rng, min, max, meta.scale))
            }
            None => Ok(decimal::generate_precision(&mut self.rng, meta)),
        }
    }

    fn random_bytes(&mut self, length: Length) -> Vec<u8> {
        let n = length.sample(&mut self.rng) as usize;
        let mut out = vec![0u8; n];
        self.rng.fill(out.as_mut_slice());
        out
    }

    /// N random ASCII bytes in `[0, 128)`.
    fn random_string(&mut self, length: Length) -> String {
        let n = length.sample(&mut self.rng) as usize;
        (0..n).map(|_| self.rng.gen_range(0u8..128) as char).collect()
    }
}

fn resolve_int_range(node: NodeId, range: &Option<RangeDirective>, type_min: i64, type_max: i64) -> Result<(i64, i64)> {
    let Some(range) = range else {
        return Ok((type_min, type_max));
    };
    let min = match &range.min {
        Some(v) => v.as_i64().ok_or_else(|| Error::InvalidDirectiveShape {
            directive: "range.min",
            node,
            cause: format!("expected an integer, got {v}"),
        })?,
        None => type_min,
    };
    let max = match &range.max {
        Some(v) => v.as_i64().ok_or_else(|| Error::InvalidDirectiveShape {
            directive: "range.max",
            node,
            cause: format!("expected an integer, got {v}"),
        })?,
        None => type_max,
    };
    if max <= min {
        return Err(Error::InvalidRange {
            directive: "range",
            node,
            cause: format!("max ({max}) must be greater than min ({min})"),
        });
    }
    // `range.max` is exclusive; the caller samples an inclusive range.
    Ok((min, max - 1))
}

/// Resolves a float/double `range` directive.
///
/// `no_range_bounds` is used verbatim when the directive is absent
/// altogether. `missing_bound_extremes` is used for whichever of `min`/`max`
/// is absent from a directive that *is* present — the target numeric type's
/// representable extremes, matching how `resolve_int_range` defaults a
/// missing integer bound to the type's min/max.
fn resolve_float_range(
    node: NodeId,
    range: &Option<RangeDirective>,
    no_range_bounds: (f64, f64),
    missing_bound_extremes: (f64, f64),
) -> Result<(f64, f64)> {
    let Some(range) = range else {
        return Ok(no_range_bounds);
    };
    let min = match &range.min {
        Some(v) => v.as_f64().ok_or_else(|| Error::InvalidDirectiveShape {
            directive: "range.min",
            node,
            cause: format!("expected a number, got {v}"),
        })?,
        None => missing_bound_extremes.0,
    };
    let max = match &range.max {
        Some(v) => v.as_f64().ok_or_else(|| Error::InvalidDirectiveShape {
            directive: "range.max",
            node,
            cause: format!("expected a number, got {v}"),
        })?,
        None => missing_bound_extremes.1,
    };
    if !(max > min) {
        return Err(Error::InvalidRange {
            directive: "range",
            node,
            cause: format!("max ({max}) must be greater than min ({min})"),
        });
    }
    Ok((min, max))
}

/// Coerces a literal `options` JSON entry into a [`Value`] matching `kind`.
/// Containers recurse structurally; a mismatch of JSON shape against the
/// schema's kind is reported as `Error::OptionCoercion`.
fn coerce_json_to_value(schema: &Schema, node: NodeId, kind: &Kind, j: &serde_json::Value) -> Result<Value> {
    let fail = |cause: String| Error::OptionCoercion { node, cause };
    match kind {
        Kind::Null => {
            if j.is_null() {
                Ok(Value::Null)
            } else {
                Err(fail(format!("expected null, got {j}")))
            }
        }
        Kind::Boolean => j.as_bool().map(Value::Boolean).ok_or_else(|| fail(format!("expected a boolean, got {j}"))),
        Kind::Int => j
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int)
            .ok_or_else(|| fail(format!("expected an int, got {j}"))),
        Kind::Long => j.as_i64().map(Value::Long).ok_or_else(|| fail(format!("expected a long, got {j}"))),
        Kind::Float => j.as_f64().map(|v| Value::Float(v as f32)).ok_or_else(|| fail(format!("expected a float, got {j}"))),
        Kind::Double => j.as_f64().map(Value::Double).ok_or_else(|| fail(format!("expected a double, got {j}"))),
        Kind::Bytes(_) => bytes_from_json(j).map(Value::Bytes).ok_or_else(|| fail(format!("expected bytes, got {j}"))),
        Kind::String => j.as_str().map(|s| Value::String(s.to_owned())).ok_or_else(|| fail(format!("expected a string, got {j}"))),
        Kind::Fixed { size, .. } => {
            let bytes = bytes_from_json(j).ok_or_else(|| fail(format!("expected bytes, got {j}")))?;
            if bytes.len() != *size {
                return Err(fail(format!("expected {size} bytes, got {}", bytes.len())));
            }
            Ok(Value::Fixed(bytes))
        }
        Kind::Enum { symbols } => {
            let name = j.as_str().ok_or_else(|| fail(format!("expected an enum symbol name, got {j}")))?;
            let idx = symbols
                .iter()
                .position(|s| s == name)
                .ok_or_else(|| fail(format!("{name:?} is not a declared symbol")))?;
            Ok(Value::Enum(idx as u32, name.to_owned()))
        }
        Kind::Array { items } => {
            let arr = j.as_array().ok_or_else(|| fail(format!("expected an array, got {j}")))?;
            let items_kind = schema.node(*items).kind.clone();
            let out = arr
                .iter()
                .map(|e| coerce_json_to_value(schema, *items, &items_kind, e))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(out))
        }
        Kind::Map { values } => {
            let obj = j.as_object().ok_or_else(|| fail(format!("expected an object, got {j}")))?;
            let values_kind = schema.node(*values).kind.clone();
            let mut out = HashMap::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), coerce_json_to_value(schema, *values, &values_kind, v)?);
            }
            Ok(Value::Map(out))
        }
        Kind::Record { fields } => {
            let obj = j.as_object().ok_or_else(|| fail(format!("expected an object, got {j}")))?;
            let mut out = Vec::with_capacity(fields.len());
            for field in fields {
                let v = obj
                    .get(&field.name)
                    .ok_or_else(|| fail(format!("missing field {:?}", field.name)))?;
                let field_kind = schema.node(field.schema).kind.clone();
                out.push((field.name.clone(), coerce_json_to_value(schema, field.schema, &field_kind, v)?));
            }
            Ok(Value::Record(out))
        }
        Kind::Union { members } => {
            for (idx, member) in members.iter().enumerate() {
                let member_kind = schema.node(*member).kind.clone();
                if let Ok(v) = coerce_json_to_value(schema, *member, &member_kind, j) {
                    return Ok(Value::Union(idx as u32, Box::new(v)));
                }
            }
            Err(fail(format!("{j} does not match any union member")))
        }
    }
}

fn bytes_from_json(j: &serde_json::Value) -> Option<Vec<u8>> {
    if let Some(arr) = j.as_array() {
        return arr.iter().map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok())).collect();
    }
    j.as_str().map(|s| s.as_bytes().to_vec())
}
