use proc_macro2::{Span, TokenStream, TokenTree};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments, Token, Type,
};

/// A struct annotated for `#[derive(Model)]` / `#[derive(ToResource)]`.
pub(crate) struct ModelDef {
    pub ident: Ident,
    pub resource_type: String,
    pub parent: Option<String>,
    /// `find_all` order: column and whether it is descending.
    pub order: Option<(String, bool)>,
    /// Whether the model implements `MetaFiller`.
    pub meta: bool,
    pub fields: Vec<FieldDef>,
}

pub(crate) struct FieldDef {
    pub ident: Ident,
    /// Attribute or relationship name on the wire.
    pub wire: String,
    pub ty: Type,
    pub role: Role,
}

pub(crate) enum Role {
    Id,
    Attribute,
    ForeignKey,
    Skip,
    Relation(RelationDef),
}

pub(crate) struct RelationDef {
    pub kind: RelationKind,
    pub target: Type,
    pub wrapper: Wrapper,
    pub foreign_key: String,
    pub join_table: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    ManyToMany,
}

impl RelationKind {
    fn from_ident(ident: &Ident) -> Option<Self> {
        match ident.to_string().as_str() {
            "belongs_to" => Some(RelationKind::BelongsTo),
            "has_one" => Some(RelationKind::HasOne),
            "has_many" => Some(RelationKind::HasMany),
            "many_to_many" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }

    pub fn is_to_one(self) -> bool {
        matches!(self, RelationKind::BelongsTo | RelationKind::HasOne)
    }

    pub fn tokens(self) -> TokenStream {
        let variant = match self {
            RelationKind::BelongsTo => format_ident!("BelongsTo"),
            RelationKind::HasOne => format_ident!("HasOne"),
            RelationKind::HasMany => format_ident!("HasMany"),
            RelationKind::ManyToMany => format_ident!("ManyToMany"),
        };
        quote! { ::jsonapi_driver::RelationKind::#variant }
    }
}

/// How a relationship field holds its target(s).
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wrapper {
    Option,
    Vec,
    Plain,
}

#[derive(Default)]
struct FieldOptions {
    id: bool,
    skip: bool,
    foreign_key_flag: bool,
    foreign_key: Option<String>,
    kind: Option<RelationKind>,
    join_table: Option<String>,
    rename: Option<String>,
}

impl ModelDef {
    pub fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let ident = input.ident.clone();
        let mut resource_type = None;
        let mut parent = None;
        let mut order = None;
        let mut has_meta = false;

        for attr in &input.attrs {
            if !attr.path().is_ident("jsonapi") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("type") {
                    let value: LitStr = meta.value()?.parse()?;
                    resource_type = Some(value.value());
                } else if meta.path.is_ident("parent") {
                    let value: LitStr = meta.value()?.parse()?;
                    parent = Some(value.value());
                } else if meta.path.is_ident("order") {
                    let value: LitStr = meta.value()?.parse()?;
                    order = Some(parse_order(&value)?);
                } else if meta.path.is_ident("meta") {
                    has_meta = true;
                } else {
                    return Err(meta.error(
                        "expected `type = \"...\"`, `parent = \"...\"`, `order = \"...\"` or `meta`",
                    ));
                }
                Ok(())
            })?;
        }

        // Default: snake_case struct name + "s"
        let resource_type =
            resource_type.unwrap_or_else(|| format!("{}s", to_snake_case(&ident.to_string())));

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => &fields.named,
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        "jsonapi models must have named fields",
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new(
                    ident.span(),
                    "jsonapi models must be structs",
                ))
            }
        };

        let owner_key = format!("{}_id", to_snake_case(&ident.to_string()));
        let mut fields = Vec::new();
        let mut explicit_id = false;

        for field in named {
            let Some(field_ident) = field.ident.clone() else {
                continue;
            };
            let options = parse_field_options(field)?;
            let name = field_ident.unraw().to_string();
            let wire = options.rename.clone().unwrap_or_else(|| camel_case(&name));

            let role = if options.id {
                explicit_id = true;
                Role::Id
            } else if options.skip {
                Role::Skip
            } else if let Some(kind) = options.kind {
                let (wrapper, target) = relation_target(kind, &field.ty)?;
                let foreign_key = match (kind, options.foreign_key) {
                    (_, Some(key)) => key,
                    (RelationKind::BelongsTo, None) => format!("{}_id", name),
                    (RelationKind::ManyToMany, None) => String::new(),
                    (_, None) => owner_key.clone(),
                };
                Role::Relation(RelationDef {
                    kind,
                    target,
                    wrapper,
                    foreign_key,
                    join_table: options.join_table,
                })
            } else if options.foreign_key_flag {
                Role::ForeignKey
            } else if options.foreign_key.is_some() || options.join_table.is_some() {
                return Err(syn::Error::new(
                    field_ident.span(),
                    "`foreign_key = ...` and `join_table` need a relation kind",
                ));
            } else {
                Role::Attribute
            };

            fields.push(FieldDef {
                ident: field_ident,
                wire,
                ty: field.ty.clone(),
                role,
            });
        }

        // Default: a field named `id`, any case
        if !explicit_id {
            let id_field = fields.iter_mut().find(|f| {
                matches!(f.role, Role::Attribute)
                    && f.ident.unraw().to_string().eq_ignore_ascii_case("id")
            });
            match id_field {
                Some(field) => field.role = Role::Id,
                None => {
                    return Err(syn::Error::new(
                        ident.span(),
                        "no field marked with #[jsonapi(id)] and no field named `id`",
                    ))
                }
            }
        }

        // Foreign keys of belongs_to relations are never attributes.
        let owned_keys: Vec<String> = fields
            .iter()
            .filter_map(|f| match &f.role {
                Role::Relation(r) if r.kind == RelationKind::BelongsTo => {
                    Some(r.foreign_key.clone())
                }
                _ => None,
            })
            .collect();
        for field in &mut fields {
            let name = field.ident.unraw().to_string();
            if matches!(field.role, Role::Attribute) && owned_keys.contains(&name) {
                field.role = Role::ForeignKey;
            }
        }

        Ok(ModelDef {
            ident,
            resource_type,
            parent,
            order,
            meta: has_meta,
            fields,
        })
    }

    pub fn id_field(&self) -> &FieldDef {
        self.fields
            .iter()
            .find(|f| matches!(f.role, Role::Id))
            .unwrap_or_else(|| unreachable!("id field is checked during parsing"))
    }
}

/// `"column"`, `"column asc"` or `"column desc"`.
fn parse_order(value: &LitStr) -> syn::Result<(String, bool)> {
    let text = value.value();
    let mut parts = text.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| syn::Error::new(value.span(), "order needs a column name"))?;
    let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(_) => {
            return Err(syn::Error::new(
                value.span(),
                "order direction must be asc or desc",
            ))
        }
    };
    if parts.next().is_some() {
        return Err(syn::Error::new(value.span(), "order takes one column"));
    }
    Ok((column.to_string(), descending))
}

/// Whether a `#[serde(...)]` list names `flatten` at its top level.
fn serde_flatten(attr: &syn::Attribute) -> bool {
    let syn::Meta::List(list) = &attr.meta else {
        return false;
    };
    list.tokens
        .clone()
        .into_iter()
        .any(|token| matches!(token, TokenTree::Ident(ref ident) if ident == "flatten"))
}

fn parse_field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if attr.path().is_ident("serde") {
            // Embedded (flattened) structs are not stored or exposed.
            if serde_flatten(attr) {
                options.skip = true;
            }
            continue;
        }
        if !attr.path().is_ident("jsonapi") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("unsupported jsonapi attribute"));
            };
            if ident == "id" {
                options.id = true;
            } else if ident == "skip" {
                options.skip = true;
            } else if ident == "foreign_key" {
                if meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    options.foreign_key = Some(value.value());
                } else {
                    options.foreign_key_flag = true;
                }
            } else if ident == "join_table" {
                let value: LitStr = meta.value()?.parse()?;
                options.join_table = Some(value.value());
            } else if ident == "rename" {
                let value: LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if let Some(kind) = RelationKind::from_ident(ident) {
                if options.kind.replace(kind).is_some() {
                    return Err(meta.error("a field can hold only one relation kind"));
                }
            } else {
                return Err(meta.error("unsupported jsonapi attribute"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn relation_target(kind: RelationKind, ty: &Type) -> syn::Result<(Wrapper, Type)> {
    if kind.is_to_one() {
        return Ok(match generic_inner(ty, "Option") {
            Some(inner) => (Wrapper::Option, inner.clone()),
            None => (Wrapper::Plain, ty.clone()),
        });
    }
    match generic_inner(ty, "Vec") {
        Some(inner) => Ok((Wrapper::Vec, inner.clone())),
        None => Err(syn::Error::new(
            Span::call_site(),
            "to-many relations must be declared as Vec<T>",
        )),
    }
}

/// `T` of `Wrapper<T>`, matched on the last path segment.
fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

/// Storage type of a field, read off its syntax.
pub(crate) fn column_type(ty: &Type) -> TokenStream {
    let ty = generic_inner(ty, "Option").unwrap_or(ty);
    let variant = match ty {
        Type::Reference(reference) => return column_type(&reference.elem),
        Type::Path(path) => match path
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .as_deref()
        {
            Some("String" | "str" | "char" | "Uuid") => "Text",
            Some(
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize",
            ) => "Integer",
            Some("f32" | "f64") => "Real",
            Some("bool") => "Boolean",
            _ => "Json",
        },
        _ => "Json",
    };
    let variant = Ident::new(variant, Span::call_site());
    quote! { ::jsonapi_driver::ColumnType::#variant }
}

pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Same transform as `jsonapi_driver::camel_case`, applied at expansion time.
pub(crate) fn camel_case(name: &str) -> String {
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
