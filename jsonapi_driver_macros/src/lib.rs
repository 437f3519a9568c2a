mod model;
mod parse;
mod to_resource;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Model)] derive macro
// ============================================================================

/// Derive macro for the `Model` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Model, ToResource)]
/// #[jsonapi(type = "articles")]
/// struct Article {
///     #[jsonapi(id)]
///     pub id: String,
///     pub title: String,
///     pub author_id: Option<String>,
///     #[jsonapi(belongs_to)]
///     pub author: Option<Person>,
///     #[serde(default)]
///     #[jsonapi(has_many, foreign_key = "article_id")]
///     pub comments: Vec<Comment>,
///     #[serde(default)]
///     #[jsonapi(many_to_many, join_table = "article_tags")]
///     pub tags: Vec<Tag>,
/// }
/// ```
///
/// Struct attributes:
/// - `type = "..."` sets the resource type (also the table name).
///   If omitted, defaults to snake_case struct name + "s".
/// - `parent = "..."` names the column that scopes `find_all` by parent id.
/// - `order = "column"` (or `"column desc"`) sorts `find_all` results.
/// - `meta` makes `find_record` move a `data` attribute into `meta.data` and
///   then call the model's `MetaFiller::add_meta`.
///
/// Field attributes:
/// - `id` marks the id field. If omitted, a field named `id` (any case) is used.
/// - `skip` keeps a field out of storage and out of the resource; so does
///   `#[serde(flatten)]`.
/// - `foreign_key` marks a plain field as a foreign key column (never an attribute).
/// - `belongs_to`, `has_one`, `has_many`, `many_to_many` declare a relationship.
///   `foreign_key = "..."` overrides the key column (defaults: `<field>_id` for
///   `belongs_to`, `<struct>_id` for `has_one`/`has_many`) and
///   `join_table = "..."` overrides the `<type>_<field>` join table.
/// - `rename = "..."` overrides the camelCase attribute or relationship name.
#[proc_macro_derive(Model, attributes(jsonapi))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}

// ============================================================================
// #[derive(ToResource)] derive macro
// ============================================================================

/// Derive macro for the `ToResource` trait, driven by the same `#[jsonapi]`
/// attributes as `Model` (which it requires).
///
/// Plain fields become camelCase attributes; relationship fields are
/// resolved through `set_one_relationship` / `set_many_relationship`, adding
/// their targets to the document's includes.
#[proc_macro_derive(ToResource, attributes(jsonapi))]
pub fn derive_to_resource(input: TokenStream) -> TokenStream {
    to_resource::derive_to_resource(input)
}
