use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::{node::Payload, Arena, Error, NodeId, Number, NESTING_LIMIT};

impl Arena {
    /// Build a detached tree holding the same data as `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the hooks refuse a node and [`Error::DepthLimit`] if
    /// `value` nests deeper than the nesting limit. Nothing is left allocated on failure.
    pub fn from_serde(&mut self, value: &Value) -> Result<NodeId, Error> {
        self.from_serde_impl(value, 0)
    }

    fn from_serde_impl(&mut self, value: &Value, depth: usize) -> Result<NodeId, Error> {
        match value {
            Value::Null => self.create_null(),
            Value::Bool(b) => self.create_bool(*b),
            Value::Number(num) => {
                let number = if let Some(i) = num.as_i64() {
                    Number::from_i64(i)
                } else {
                    Number::from_f64(num.as_f64().unwrap_or_default())
                };
                self.create_number_from(number)
            }
            Value::String(s) => self.create_owned_string(s.clone()),
            Value::Array(items) => {
                let array = self.create_container(depth, Arena::create_array)?;
                for item in items {
                    match self.from_serde_impl(item, depth + 1) {
                        Ok(child) => self.link_last(array, child),
                        Err(error) => {
                            self.free_tree(array);
                            return Err(error);
                        }
                    }
                }
                Ok(array)
            }
            Value::Object(members) => {
                let object = self.create_container(depth, Arena::create_object)?;
                for (key, member) in members {
                    let child = match self.from_serde_impl(member, depth + 1) {
                        Ok(child) => child,
                        Err(error) => {
                            self.free_tree(object);
                            return Err(error);
                        }
                    };
                    if let Err(error) = self.set_key(child, Cow::Owned(key.clone())) {
                        self.free_tree(child);
                        self.free_tree(object);
                        return Err(error);
                    }
                    self.link_last(object, child);
                }
                Ok(object)
            }
        }
    }

    fn create_container(
        &mut self,
        depth: usize,
        create: fn(&mut Arena) -> Result<NodeId, Error>,
    ) -> Result<NodeId, Error> {
        if depth >= NESTING_LIMIT {
            return Err(Error::DepthLimit {
                limit: NESTING_LIMIT,
            });
        }
        create(self)
    }

    /// Convert the tree under `id` into a [`serde_json::Value`].
    ///
    /// Raw nodes are parsed with `serde_json` and references convert as their targets. When an
    /// object has several members with the same key, the first one wins. Returns `None` for
    /// invalid nodes or dangling references, raw text that is not JSON, and trees nested deeper
    /// than the nesting limit.
    #[must_use]
    pub fn to_serde(&self, id: NodeId) -> Option<Value> {
        self.to_serde_impl(id, 0)
    }

    fn to_serde_impl(&self, id: NodeId, depth: usize) -> Option<Value> {
        let value = match &self.resolved(id)?.payload {
            Payload::Null => Value::Null,
            Payload::False => Value::Bool(false),
            Payload::True => Value::Bool(true),
            Payload::Number(number) => match number.as_i64() {
                Some(i) => Value::from(i),
                // Non-finite numbers become 0, as in printed output
                None => Value::Number(
                    serde_json::Number::from_f64(number.as_f64()).unwrap_or_else(|| 0.into()),
                ),
            },
            Payload::String(text) => Value::String(text.to_string()),
            Payload::Raw(text) => serde_json::from_str(text).ok()?,
            Payload::Array => {
                if depth >= NESTING_LIMIT {
                    return None;
                }
                let items = self
                    .items(id)
                    .map(|item| self.to_serde_impl(item, depth + 1))
                    .collect::<Option<Vec<_>>>()?;
                Value::Array(items)
            }
            Payload::Object => {
                if depth >= NESTING_LIMIT {
                    return None;
                }
                let mut members = Map::new();
                for member in self.items(id) {
                    let value = self.to_serde_impl(member, depth + 1)?;
                    let key = self.key(member).unwrap_or_default().to_owned();
                    members.entry(key).or_insert(value);
                }
                Value::Object(members)
            }
            Payload::Reference(_) => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    use crate::Arena;

    #[test_case(json!(null); "null")]
    #[test_case(json!(true); "bool")]
    #[test_case(json!(42); "positive number")]
    #[test_case(json!(-42); "negative number")]
    #[test_case(json!(3.25); "float number")]
    #[test_case(json!("hello"); "string")]
    #[test_case(json!([1, 2, 3]); "array")]
    #[test_case(json!({"a": 1, "b": "test", "c": [true, null]}); "object")]
    fn test_conversion(value: Value) {
        let mut arena = Arena::new();
        let id = arena.from_serde(&value).expect("Allocation succeeds");
        assert_eq!(arena.to_serde(id), Some(value.clone()));
        assert_eq!(arena.print_compact(id).expect("Printable"), value.to_string());
    }

    #[test]
    fn test_raw_is_parsed() {
        let mut arena = Arena::new();
        let raw = arena.create_raw("{\"a\": [1]}").expect("Allocation succeeds");
        assert_eq!(arena.to_serde(raw), Some(json!({"a": [1]})));
        let broken = arena.create_raw("{").expect("Allocation succeeds");
        assert_eq!(arena.to_serde(broken), None);
    }

    #[test]
    fn test_first_duplicate_key_wins() {
        let mut arena = Arena::new();
        let id = arena.parse(r#"{"a":1,"a":2}"#).expect("Valid JSON");
        assert_eq!(arena.to_serde(id), Some(json!({"a": 1})));
    }
}
