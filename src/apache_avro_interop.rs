//! Converts a parsed [`apache_avro::Schema`] into this crate's own arena
//! [`Schema`], so a schema authored/loaded through the `apache-avro` crate's
//! parser can drive the generator without this crate hard-depending on
//! `apache_avro::Schema`'s layout by default.
//!
//! Only the variants `apache_avro::Schema` exposes independently of a
//! surrounding `Namespace` registry are handled here; `Ref` resolution goes
//! through `apache_avro::Schema`'s own `.lookup()`.

use std::collections::{BTreeMap, HashMap};

use apache_avro::schema::{DecimalSchema, FixedSchema, RecordSchema};
use apache_avro::Schema as ApacheSchema;
use serde_json::Value as Json;

use crate::schema::{DecimalMeta, Field, Kind, NodeId, Schema, SchemaBuilder, DIRECTIVE_KEY};

/// Converts `apache_schema` (typically obtained from
/// `apache_avro::Schema::parse_str`) into this crate's own [`Schema`].
pub fn from_apache_avro(apache_schema: &ApacheSchema) -> Schema {
    let mut builder = SchemaBuilder::new();
    let mut seen = HashMap::new();
    let root = convert(apache_schema, None, &mut builder, &mut seen);
    builder.finish(root)
}

/// Looks up the reserved `arg.properties` key among a schema node's custom
/// attributes (`apache_avro` preserves unrecognized JSON keys from the
/// schema document verbatim in these maps), so directives authored directly
/// in the Avro schema JSON reach the generator.
fn directives_of(attributes: &BTreeMap<String, Json>) -> Option<Json> {
    attributes.get(DIRECTIVE_KEY).cloned()
}

/// Converts one Avro schema node. `field_directives` carries the directive
/// payload, if any, found on the *enclosing field* (fields are the usual
/// place a schema author attaches `arg.properties`, since the field's own
/// custom attributes sit alongside its `type`); it takes precedence over any
/// attributes found on the referenced type itself.
fn convert(
    schema: &ApacheSchema,
    field_directives: Option<Json>,
    builder: &mut SchemaBuilder,
    seen: &mut HashMap<String, NodeId>,
) -> NodeId {
    match schema {
        ApacheSchema::Null => builder.push(Kind::Null, field_directives),
        ApacheSchema::Boolean => builder.push(Kind::Boolean, field_directives),
        ApacheSchema::Int => builder.push(Kind::Int, field_directives),
        ApacheSchema::Long => builder.push(Kind::Long, field_directives),
        ApacheSchema::Float => builder.push(Kind::Float, field_directives),
        ApacheSchema::Double => builder.push(Kind::Double, field_directives),
        ApacheSchema::Bytes => builder.push(Kind::Bytes(None), field_directives),
        ApacheSchema::String => builder.push(Kind::String, field_directives),
        ApacheSchema::Decimal(DecimalSchema { precision, scale, inner, .. }) => {
            let meta = DecimalMeta {
                precision: *precision as u32,
                scale: *scale as u32,
            };
            match inner.as_ref() {
                ApacheSchema::Fixed(FixedSchema { size, .. }) => builder.push(
                    Kind::Fixed {
                        size: *size,
                        decimal: Some(meta),
                    },
                    field_directives,
                ),
                _ => builder.push(Kind::Bytes(Some(meta)), field_directives),
            }
        }
        ApacheSchema::Fixed(FixedSchema { size, name, attributes, .. }) => {
            let directives = field_directives.or_else(|| directives_of(attributes));
            let node = builder.push(
                Kind::Fixed {
                    size: *size,
                    decimal: None,
                },
                directives,
            );
            seen.insert(name.fullname(None), node);
            node
        }
        ApacheSchema::Enum(e) => {
            let directives = field_directives.or_else(|| directives_of(&e.attributes));
            let node = builder.push(
                Kind::Enum {
                    symbols: e.symbols.clone(),
                },
                directives,
            );
            seen.insert(e.name.fullname(None), node);
            node
        }
        ApacheSchema::Array(inner) => {
            // `items` must be converted before the array node itself, since
            // `SchemaBuilder` requires children to precede their parents.
            let items = convert(&inner.items, None, builder, seen);
            builder.push(Kind::Array { items }, field_directives)
        }
        ApacheSchema::Map(inner) => {
            let values = convert(&inner.types, None, builder, seen);
            builder.push(Kind::Map { values }, field_directives)
        }
        ApacheSchema::Union(union) => {
            let members = union.variants().iter().map(|v| convert(v, None, builder, seen)).collect();
            builder.push(Kind::Union { members }, field_directives)
        }
        ApacheSchema::Record(RecordSchema { fields, name, attributes, .. }) => {
            // A placeholder must be registered before converting field
            // schemas so a self-referential record (a field whose schema is
            // `Schema::Ref` back to this very record) resolves correctly;
            // `apache_avro` parses such references eagerly, so by the time
            // we see a `Ref` the referenced record node already exists.
            let converted_fields: Vec<Field> = fields
                .iter()
                .map(|f| Field {
                    name: f.name.clone(),
                    schema: convert(&f.schema, directives_of(&f.custom_attributes), builder, seen),
                })
                .collect();
            let directives = field_directives.or_else(|| directives_of(attributes));
            let node = builder.push(Kind::Record { fields: converted_fields }, directives);
            seen.insert(name.fullname(None), node);
            node
        }
        ApacheSchema::Ref { name } => *seen
            .get(&name.fullname(None))
            .unwrap_or_else(|| panic!("unresolved schema reference {name}")),
        other => panic!("schema variant {other:?} has no supported conversion"),
    }
}
