//! Typed `Args`/`Options` values produced by the schema binder (spec §4.F)
//! and handed to command handlers (spec §6).

use indexmap::IndexMap;

use crate::schema::Value;

/// Bound positional arguments, keyed by descriptor name in declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: IndexMap<String, Value>,
}

/// Bound options (including defaults), keyed by long name.
#[derive(Debug, Clone, Default)]
pub struct Options {
    values: IndexMap<String, Value>,
}

macro_rules! typed_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn new() -> Self {
                Self {
                    values: IndexMap::new(),
                }
            }

            pub fn insert(&mut self, name: impl Into<String>, value: Value) {
                self.values.insert(name.into(), value);
            }

            pub fn get(&self, name: &str) -> Option<&Value> {
                self.values.get(name)
            }

            pub fn str(&self, name: &str) -> Option<&str> {
                self.values.get(name).and_then(Value::as_str)
            }

            pub fn boolean(&self, name: &str) -> bool {
                self.values
                    .get(name)
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            }

            pub fn int(&self, name: &str) -> Option<i64> {
                self.values.get(name).and_then(Value::as_int)
            }

            pub fn float(&self, name: &str) -> Option<f64> {
                self.values.get(name).and_then(Value::as_float)
            }

            pub fn array(&self, name: &str) -> &[String] {
                self.values
                    .get(name)
                    .and_then(Value::as_array)
                    .unwrap_or(&[])
            }

            pub fn is_present(&self, name: &str) -> bool {
                self.values.contains_key(name)
            }

            pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
                self.values.iter()
            }
        }
    };
}

typed_accessors!(Args);
typed_accessors!(Options);
