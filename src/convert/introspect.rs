//! Runtime introspection of arbitrary `Serialize` values.

use serde::Serialize;
use serde_json::Value;

use super::{camel_case, ToResource};
use crate::document::Resource;
use crate::includes::Includes;

/// Converts any serializable value by inspecting its serialized shape.
///
/// Records (JSON objects) map their `id` key (any casing) to the resource id
/// and every other key to a camelCase attribute. Any other value becomes a
/// single `value` attribute whose rendering doubles as the id.
///
/// Nothing here fails: a value that does not serialize yields a resource with
/// a type and no attributes.
pub struct Introspected<T> {
    value: T,
    resource_type: Option<String>,
    id: Option<String>,
}

impl<T: Serialize> Introspected<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            resource_type: None,
            id: None,
        }
    }

    /// Use `id` instead of scanning the value for an id field.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Override the type name derived from the Rust type.
    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Serialize> ToResource for Introspected<T> {
    fn to_resource(&self, _includes: &mut Includes) -> Resource {
        let resource_type = self
            .resource_type
            .clone()
            .unwrap_or_else(|| short_type_name::<T>());
        let mut resource = Resource::new(self.id.clone().unwrap_or_default(), resource_type);

        let value = match serde_json::to_value(&self.value) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    resource_type = %resource.resource_type,
                    error = %err,
                    "value could not be introspected"
                );
                return resource;
            }
        };

        match value {
            Value::Object(fields) => {
                for (name, field) in fields {
                    if name.eq_ignore_ascii_case("id") {
                        if self.id.is_none() {
                            resource.id = render(&field);
                        }
                        continue;
                    }
                    resource.attributes.insert(camel_case(&name), field);
                }
            }
            other => {
                if self.id.is_none() {
                    resource.id = render(&other);
                }
                resource.attributes.insert("value".to_string(), other);
            }
        }

        resource
    }
}

/// Last path segment of the type name, generics stripped.
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
