//! # Sanitizer: any `Serialize` value into a plain JSON tree.
//!
//! [`sanitize`] converts producer output into a [`serde_json::Value`] that is
//! guaranteed to serialize again without loss or error. It is total: it never fails,
//! and values without a direct JSON form degrade to their string form.
//!
//! ## Conversion rules
//! ```text
//! null / bool / integer / finite float / string  → unchanged
//! sequence / tuple / set / bytes                → array (element-wise)
//! map                                           → object, keys coerced to strings
//! struct                                        → object (field-wise)
//! enum variant                                  → externally tagged ({"Variant": ...})
//! NaN / ±inf                                    → "NaN" / "inf" / "-inf"
//! i128 / u128 outside 64-bit range              → decimal string
//! Serialize impl returning an error             → "<unserializable: msg>" (that element only)
//! nesting deeper than MAX_DEPTH                 → "<max depth exceeded>"
//! ```
//!
//! Map keys: strings are kept verbatim, scalar keys use their display form
//! (`1`, `true`, `null`), compound keys use their compact JSON text.
//!
//! ## Depth cutoff
//! Containers nested deeper than [`MAX_DEPTH`] are replaced by [`DEPTH_MARKER`].
//! This bounds self-referential `Serialize` impls (a value that serializes itself
//! as its own child) and pathological nesting; such input is a data-quality bug in
//! the producer, not a store failure.
//!
//! ## Rules
//! - `sanitize(&sanitize(x)) == sanitize(x)` for every input.
//! - Every fallback is counted in [`Sanitized::fallbacks`].

use std::cell::Cell;
use std::fmt::Display;

use serde::Serialize;
use serde::ser;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum container nesting kept by the sanitizer.
pub const MAX_DEPTH: usize = 64;

/// Replacement for containers nested deeper than [`MAX_DEPTH`].
pub const DEPTH_MARKER: &str = "<max depth exceeded>";

/// Sanitized value plus the number of string fallbacks applied while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// The JSON-safe value tree.
    pub value: Value,
    /// How many sub-values were degraded to their string form.
    pub fallbacks: usize,
}

/// Converts any serializable value into a JSON-safe value tree.
///
/// ```
/// use std::collections::HashMap;
/// use agentvisor::sanitize;
///
/// let mut temps = HashMap::new();
/// temps.insert(1_u8, f64::NAN);
///
/// let v = sanitize(&temps);
/// assert_eq!(v, serde_json::json!({ "1": "NaN" }));
/// assert_eq!(sanitize(&v), v);
/// ```
pub fn sanitize<T: Serialize + ?Sized>(value: &T) -> Value {
    sanitize_report(value).value
}

/// Same as [`sanitize`], but also reports how many fallbacks were applied.
pub fn sanitize_report<T: Serialize + ?Sized>(value: &T) -> Sanitized {
    let fallbacks = Cell::new(0);
    let value = convert(value, 0, &fallbacks);
    Sanitized {
        value,
        fallbacks: fallbacks.get(),
    }
}

fn convert<T: Serialize + ?Sized>(value: &T, depth: usize, fallbacks: &Cell<usize>) -> Value {
    let ser = ValueSerializer { depth, fallbacks };
    match value.serialize(ser) {
        Ok(v) => v,
        Err(e) => ser.fallback(format!("<unserializable: {e}>")),
    }
}

/// Error raised by user `Serialize` impls through [`ser::Error::custom`].
#[derive(Debug, Error)]
#[error("{0}")]
struct SanitizeError(String);

impl ser::Error for SanitizeError {
    fn custom<T: Display>(msg: T) -> Self {
        SanitizeError(msg.to_string())
    }
}

/// Serializer producing a [`Value`] at a given nesting depth.
#[derive(Clone, Copy)]
struct ValueSerializer<'a> {
    depth: usize,
    fallbacks: &'a Cell<usize>,
}

impl<'a> ValueSerializer<'a> {
    fn fallback(self, text: impl Into<String>) -> Value {
        self.fallbacks.set(self.fallbacks.get() + 1);
        Value::String(text.into())
    }

    fn truncated(self) -> bool {
        self.depth >= MAX_DEPTH
    }

    fn child<T: Serialize + ?Sized>(self, value: &T) -> Value {
        convert(value, self.depth + 1, self.fallbacks)
    }

    fn seq(self, len: Option<usize>) -> SeqBuilder<'a> {
        let items = (!self.truncated()).then(|| Vec::with_capacity(len.unwrap_or(0).min(1024)));
        SeqBuilder { ser: self, items }
    }

    fn map(self) -> MapBuilder<'a> {
        let entries = (!self.truncated()).then(Map::new);
        MapBuilder {
            ser: self,
            entries,
            pending_key: None,
        }
    }

    fn nested(self) -> ValueSerializer<'a> {
        ValueSerializer {
            depth: self.depth + 1,
            fallbacks: self.fallbacks,
        }
    }

    fn tagged(self, variant: &'static str, inner: Value) -> Value {
        if self.truncated() {
            return self.fallback(DEPTH_MARKER);
        }
        let mut m = Map::with_capacity(1);
        m.insert(variant.to_owned(), inner);
        Value::Object(m)
    }
}

/// Coerces a sanitized key into its string form.
fn key_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = Value;
    type Error = SanitizeError;

    type SerializeSeq = SeqBuilder<'a>;
    type SerializeTuple = SeqBuilder<'a>;
    type SerializeTupleStruct = SeqBuilder<'a>;
    type SerializeTupleVariant = VariantBuilder<'a, SeqBuilder<'a>>;
    type SerializeMap = MapBuilder<'a>;
    type SerializeStruct = MapBuilder<'a>;
    type SerializeStructVariant = VariantBuilder<'a, MapBuilder<'a>>;

    fn serialize_bool(self, v: bool) -> Result<Value, SanitizeError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, SanitizeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, SanitizeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, SanitizeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, SanitizeError> {
        Ok(Value::Number(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, SanitizeError> {
        Ok(match i64::try_from(v) {
            Ok(n) => Value::Number(n.into()),
            Err(_) => match u64::try_from(v) {
                Ok(n) => Value::Number(n.into()),
                Err(_) => self.fallback(v.to_string()),
            },
        })
    }

    fn serialize_u8(self, v: u8) -> Result<Value, SanitizeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, SanitizeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, SanitizeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, SanitizeError> {
        Ok(Value::Number(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, SanitizeError> {
        Ok(match u64::try_from(v) {
            Ok(n) => Value::Number(n.into()),
            Err(_) => self.fallback(v.to_string()),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Value, SanitizeError> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, SanitizeError> {
        Ok(match Number::from_f64(v) {
            Some(n) => Value::Number(n),
            None => self.fallback(v.to_string()),
        })
    }

    fn serialize_char(self, v: char) -> Result<Value, SanitizeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, SanitizeError> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, SanitizeError> {
        if self.truncated() {
            return Ok(self.fallback(DEPTH_MARKER));
        }
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value, SanitizeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, SanitizeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, SanitizeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, SanitizeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, SanitizeError> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, SanitizeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, SanitizeError> {
        if self.truncated() {
            return Ok(self.fallback(DEPTH_MARKER));
        }
        let inner = self.child(value);
        Ok(self.tagged(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'a>, SanitizeError> {
        Ok(self.seq(len))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'a>, SanitizeError> {
        Ok(self.seq(Some(len)))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'a>, SanitizeError> {
        Ok(self.seq(Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantBuilder<'a, SeqBuilder<'a>>, SanitizeError> {
        Ok(VariantBuilder {
            outer: self,
            variant,
            inner: self.nested().seq(Some(len)),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder<'a>, SanitizeError> {
        Ok(self.map())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<MapBuilder<'a>, SanitizeError> {
        Ok(self.map())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantBuilder<'a, MapBuilder<'a>>, SanitizeError> {
        Ok(VariantBuilder {
            outer: self,
            variant,
            inner: self.nested().map(),
        })
    }
}

/// Array under construction; `items == None` once past the depth cutoff.
struct SeqBuilder<'a> {
    ser: ValueSerializer<'a>,
    items: Option<Vec<Value>>,
}

impl SeqBuilder<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) {
        if let Some(items) = &mut self.items {
            items.push(self.ser.child(value));
        }
    }

    fn finish(self) -> Value {
        match self.items {
            Some(items) => Value::Array(items),
            None => self.ser.fallback(DEPTH_MARKER),
        }
    }
}

impl ser::SerializeSeq for SeqBuilder<'_> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SanitizeError> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder<'_> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SanitizeError> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder<'_> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SanitizeError> {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        Ok(self.finish())
    }
}

/// Object under construction; `entries == None` once past the depth cutoff.
struct MapBuilder<'a> {
    ser: ValueSerializer<'a>,
    entries: Option<Map<String, Value>>,
    pending_key: Option<String>,
}

impl MapBuilder<'_> {
    fn insert<T: Serialize + ?Sized>(&mut self, key: String, value: &T) {
        if let Some(entries) = &mut self.entries {
            entries.insert(key, self.ser.child(value));
        }
    }

    fn finish(self) -> Value {
        match self.entries {
            Some(entries) => Value::Object(entries),
            None => self.ser.fallback(DEPTH_MARKER),
        }
    }
}

impl ser::SerializeMap for MapBuilder<'_> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), SanitizeError> {
        if self.entries.is_some() {
            self.pending_key = Some(key_string(self.ser.child(key)));
        }
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SanitizeError> {
        if self.entries.is_none() {
            return Ok(());
        }
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SanitizeError("map value serialized before its key".to_owned()))?;
        self.insert(key, value);
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapBuilder<'_> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SanitizeError> {
        self.insert(key.to_owned(), value);
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        Ok(self.finish())
    }
}

/// Externally tagged enum variant: `{ variant: inner }`.
struct VariantBuilder<'a, B> {
    outer: ValueSerializer<'a>,
    variant: &'static str,
    inner: B,
}

impl ser::SerializeTupleVariant for VariantBuilder<'_, SeqBuilder<'_>> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SanitizeError> {
        if !self.outer.truncated() {
            self.inner.push(value);
        }
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        if self.outer.truncated() {
            return Ok(self.outer.fallback(DEPTH_MARKER));
        }
        let inner = self.inner.finish();
        Ok(self.outer.tagged(self.variant, inner))
    }
}

impl ser::SerializeStructVariant for VariantBuilder<'_, MapBuilder<'_>> {
    type Ok = Value;
    type Error = SanitizeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SanitizeError> {
        if !self.outer.truncated() {
            self.inner.insert(key.to_owned(), value);
        }
        Ok(())
    }

    fn end(self) -> Result<Value, SanitizeError> {
        if self.outer.truncated() {
            return Ok(self.outer.fallback(DEPTH_MARKER));
        }
        let inner = self.inner.finish();
        Ok(self.outer.tagged(self.variant, inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::SerializeSeq;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    /// Serializes itself as its own only element, forever.
    struct Ouroboros;

    impl Serialize for Ouroboros {
        fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(1))?;
            seq.serialize_element(self)?;
            seq.end()
        }
    }

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: ser::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(ser::Error::custom("boom"))
        }
    }

    #[derive(Serialize)]
    enum Reading {
        Idle,
        Level(f64),
        Pair(u8, u8),
        Bearing { id: String, health: f64 },
    }

    fn depth_of(v: &Value) -> usize {
        match v {
            Value::Array(items) => 1 + items.iter().map(depth_of).max().unwrap_or(0),
            Value::Object(m) => 1 + m.values().map(depth_of).max().unwrap_or(0),
            _ => 0,
        }
    }

    #[test]
    fn primitives_pass_through() {
        assert_eq!(sanitize(&()), Value::Null);
        assert_eq!(sanitize(&true), json!(true));
        assert_eq!(sanitize(&-7_i32), json!(-7));
        assert_eq!(sanitize(&2.5_f64), json!(2.5));
        assert_eq!(sanitize("rail"), json!("rail"));
        assert_eq!(sanitize(&'x'), json!("x"));
        assert_eq!(sanitize(&Option::<u8>::None), Value::Null);
    }

    #[test]
    fn json_values_are_unchanged() {
        let v = json!({
            "frame_rate": 200,
            "cameras": ["front", "side_left"],
            "exposure_ms": 1.25,
            "motion_blur": false,
            "nested": { "a": [1, { "b": null }] }
        });
        let report = sanitize_report(&v);
        assert_eq!(report.value, v);
        assert_eq!(report.fallbacks, 0);
    }

    #[test]
    fn tuples_become_arrays() {
        assert_eq!(sanitize(&(1, "two", 3.0)), json!([1, "two", 3.0]));
    }

    #[test]
    fn non_string_keys_are_coerced() {
        let mut by_int = HashMap::new();
        by_int.insert(7_u32, "seven");
        assert_eq!(sanitize(&by_int), json!({ "7": "seven" }));

        let mut by_tuple = BTreeMap::new();
        by_tuple.insert((1_u8, 2_u8), 3);
        assert_eq!(sanitize(&by_tuple), json!({ "[1,2]": 3 }));

        let mut by_bool = BTreeMap::new();
        by_bool.insert(true, 1);
        assert_eq!(sanitize(&by_bool), json!({ "true": 1 }));
    }

    #[test]
    fn non_finite_floats_fall_back_to_strings() {
        let report = sanitize_report(&vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.0]);
        assert_eq!(report.value, json!(["NaN", "inf", "-inf", 1.0]));
        assert_eq!(report.fallbacks, 3);
    }

    #[test]
    fn wide_integers_fall_back_to_strings() {
        assert_eq!(sanitize(&42_u128), json!(42));
        assert_eq!(sanitize(&-42_i128), json!(-42));
        assert_eq!(sanitize(&u128::MAX), json!(u128::MAX.to_string()));
        assert_eq!(sanitize(&i128::MIN), json!(i128::MIN.to_string()));
    }

    #[test]
    fn enums_are_externally_tagged() {
        let readings = vec![
            Reading::Idle,
            Reading::Level(0.5),
            Reading::Pair(1, 2),
            Reading::Bearing {
                id: "BRG_1".into(),
                health: 99.5,
            },
        ];
        assert_eq!(
            sanitize(&readings),
            json!([
                "Idle",
                { "Level": 0.5 },
                { "Pair": [1, 2] },
                { "Bearing": { "id": "BRG_1", "health": 99.5 } }
            ])
        );
    }

    #[test]
    fn serialize_errors_are_localized() {
        #[derive(Serialize)]
        struct Frame {
            good: u8,
            bad: Broken,
        }

        let report = sanitize_report(&Frame { good: 5, bad: Broken });
        assert_eq!(
            report.value,
            json!({ "good": 5, "bad": "<unserializable: boom>" })
        );
        assert_eq!(report.fallbacks, 1);

        assert_eq!(sanitize(&Broken), json!("<unserializable: boom>"));
    }

    #[test]
    fn cyclic_input_terminates_at_depth_cutoff() {
        let report = sanitize_report(&Ouroboros);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(depth_of(&report.value), MAX_DEPTH);

        let mut cursor = &report.value;
        while let Value::Array(items) = cursor {
            cursor = &items[0];
        }
        assert_eq!(cursor, &json!(DEPTH_MARKER));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut deep = json!(1);
        for _ in 0..(MAX_DEPTH + 10) {
            deep = json!([deep]);
        }

        let inputs = vec![
            sanitize(&Ouroboros),
            sanitize(&deep),
            sanitize(&vec![f64::NAN]),
            sanitize(&Reading::Bearing {
                id: "x".into(),
                health: f64::INFINITY,
            }),
            json!({ "k": [true, null, "s", -1, 1.5] }),
        ];
        for once in inputs {
            let twice = sanitize_report(&once);
            assert_eq!(twice.value, once);
            assert_eq!(twice.fallbacks, 0);
        }
    }

    #[test]
    fn sanitized_output_always_serializes() {
        let v = sanitize(&Ouroboros);
        assert!(serde_json::to_string(&v).is_ok());
    }
}
