//! Convert - the resource conversion protocol.
//!
//! Domain types become JSON:API resources in one of three ways:
//!
//! - implement [`ToResource`] by hand (explicit conversion),
//! - `#[derive(ToResource)]` on a [`Model`](crate::Model) (generated field
//!   introspection: attributes, to-one and to-many relationships),
//! - wrap any `Serialize` value in [`Introspected`] (runtime introspection of
//!   its serialized shape).
//!
//! ## Example
//!
//! ```ignore
//! use jsonapi_driver::{Includes, Model, ToResource};
//!
//! #[derive(Serialize, Deserialize, Model, ToResource)]
//! #[jsonapi(type = "articles")]
//! struct Article {
//!     id: String,
//!     title: String,
//!     author_id: Option<String>,
//!     #[jsonapi(belongs_to, foreign_key = "author_id")]
//!     author: Option<Person>,
//! }
//!
//! let mut includes = Includes::new();
//! let resource = article.to_resource(&mut includes);
//! ```

mod introspect;

use crate::document::Resource;
use crate::includes::Includes;

pub use introspect::Introspected;

/// Capability of converting a value into a JSON:API resource.
///
/// Implementations register related resources into `includes` as a side
/// effect (see [`Resource::set_one_relationship`]).
pub trait ToResource {
    fn to_resource(&self, includes: &mut Includes) -> Resource;
}

impl<T: ToResource + ?Sized> ToResource for &T {
    fn to_resource(&self, includes: &mut Includes) -> Resource {
        (**self).to_resource(includes)
    }
}

impl<T: ToResource + ?Sized> ToResource for Box<T> {
    fn to_resource(&self, includes: &mut Includes) -> Resource {
        (**self).to_resource(includes)
    }
}

/// Id accessor: renders an id field as the resource id string.
///
/// `None` renders as the empty id of an unpersisted resource.
pub trait ResourceId {
    fn resource_id(&self) -> String;
}

impl ResourceId for String {
    fn resource_id(&self) -> String {
        self.clone()
    }
}

impl ResourceId for str {
    fn resource_id(&self) -> String {
        self.to_string()
    }
}

impl ResourceId for uuid::Uuid {
    fn resource_id(&self) -> String {
        self.to_string()
    }
}

impl<T: ResourceId> ResourceId for Option<T> {
    fn resource_id(&self) -> String {
        match self {
            Some(id) => id.resource_id(),
            None => String::new(),
        }
    }
}

macro_rules! integer_resource_id {
    ($($ty:ty),*) => {
        $(
            impl ResourceId for $ty {
                fn resource_id(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_resource_id!(i32, i64, u32, u64, usize);

/// camelCase transform used for attribute keys (`first_name` -> `firstName`).
pub fn camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            upper_next = !result.is_empty();
            continue;
        }
        if upper_next {
            result.extend(ch.to_uppercase());
            upper_next = false;
        } else if result.is_empty() {
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
