// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `serde::Serializer` that turns application data into [`Value`]s.
//!
//! Structs become records so that field lookup stays distinct from map key
//! lookup; everything map-like becomes a [`Value::Map`].

use std::collections::BTreeMap;

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant,
};

use crate::error::Error;
use crate::value::{Record, Value};

impl ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::data(msg.to_string())
    }
}

/// Converts any serializable value into a template [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    value.serialize(ValueSerializer)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = ListSerializer;
    type SerializeTuple = ListSerializer;
    type SerializeTupleStruct = ListSerializer;
    type SerializeTupleVariant = ListSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = RecordSerializer;
    type SerializeStructVariant = RecordSerializer;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        Ok(Value::Int(i64::from(v)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::List(
            v.iter().map(|byte| Value::Int(i64::from(*byte))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Nil)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Nil)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Nil)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ListSerializer, Error> {
        Ok(ListSerializer {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<ListSerializer, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<ListSerializer, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<ListSerializer, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer, Error> {
        Ok(MapSerializer {
            map: BTreeMap::new(),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<RecordSerializer, Error> {
        Ok(RecordSerializer {
            record: Record::new(name),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<RecordSerializer, Error> {
        Ok(RecordSerializer {
            record: Record::new(variant),
        })
    }
}

struct ListSerializer {
    items: Vec<Value>,
}

macro_rules! impl_serialize_list {
    ($trait:ident, $method:ident) => {
        impl $trait for ListSerializer {
            type Ok = Value;
            type Error = Error;

            fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
                self.items.push(value.serialize(ValueSerializer)?);
                Ok(())
            }

            fn end(self) -> Result<Value, Error> {
                Ok(Value::List(self.items))
            }
        }
    };
}

impl_serialize_list!(SerializeSeq, serialize_element);
impl_serialize_list!(SerializeTuple, serialize_element);
impl_serialize_list!(SerializeTupleStruct, serialize_field);
impl_serialize_list!(SerializeTupleVariant, serialize_field);

struct MapSerializer {
    map: BTreeMap<String, Value>,
    key: Option<String>,
}

impl SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Error> {
        let key = match key.serialize(ValueSerializer)? {
            Value::Str(text) => text,
            scalar @ (Value::Bool(_) | Value::Int(_) | Value::Float(_)) => scalar.to_string(),
            other => {
                return Err(Error::data(format!(
                    "map keys must be strings or scalars, got {}",
                    other.type_name()
                )));
            }
        };
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::data("map value serialized before its key"))?;
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Map(self.map))
    }
}

struct RecordSerializer {
    record: Record,
}

macro_rules! impl_serialize_record {
    ($trait:ident) => {
        impl $trait for RecordSerializer {
            type Ok = Value;
            type Error = Error;

            fn serialize_field<T: ?Sized + Serialize>(
                &mut self,
                key: &'static str,
                value: &T,
            ) -> Result<(), Error> {
                self.record.set(key, value.serialize(ValueSerializer)?);
                Ok(())
            }

            fn end(self) -> Result<Value, Error> {
                Ok(Value::Record(self.record))
            }
        }
    };
}

impl_serialize_record!(SerializeStruct);
impl_serialize_record!(SerializeStructVariant);

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Role {
        id: u32,
        label: &'static str,
    }

    #[derive(Serialize)]
    struct User {
        name: String,
        admin: bool,
        nickname: Option<String>,
        roles: Vec<Role>,
    }

    #[derive(Serialize)]
    enum Status {
        Active,
    }

    #[test]
    fn structs_become_records_in_field_order() {
        let user = User {
            name: "ada".into(),
            admin: true,
            nickname: None,
            roles: vec![Role { id: 1, label: "ops" }],
        };
        let value = to_value(&user).unwrap();
        let Value::Record(record) = &value else {
            panic!("expected record, got {value:?}");
        };
        assert_eq!(record.name(), "User");
        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "admin", "nickname", "roles"]);
        assert_eq!(record.get("nickname"), Some(&Value::Nil));

        let roles = record.get("roles").and_then(Value::as_list).unwrap();
        assert_eq!(roles[0].member("label"), Some(&Value::from("ops")));
    }

    #[test]
    fn maps_become_maps_with_stringified_keys() {
        let mut scores = HashMap::new();
        scores.insert(7, "seven");
        let value = to_value(&scores).unwrap();
        assert_eq!(value.member("7"), Some(&Value::from("seven")));
    }

    #[test]
    fn unit_variants_become_their_name() {
        assert_eq!(to_value(&Status::Active).unwrap(), Value::from("Active"));
    }

    #[test]
    fn composite_map_keys_are_rejected() {
        let mut weird = BTreeMap::new();
        weird.insert(vec![1], 1);
        let err = to_value(&weird).unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }
}
