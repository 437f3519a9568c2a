use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::DeriveInput;

use crate::parse::{column_type, FieldDef, ModelDef, Role};

pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match ModelDef::parse(&input) {
        Ok(def) => expand(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(def: &ModelDef) -> proc_macro2::TokenStream {
    let name = &def.ident;
    let resource_type = &def.resource_type;
    let id_field = &def.id_field().ident;

    // Id column first, then stored fields in declaration order
    let id_column = column(def.id_field(), quote! { ::jsonapi_driver::ColumnKind::Id });
    let columns = def.fields.iter().filter_map(|field| match field.role {
        Role::Attribute => Some(column(
            field,
            quote! { ::jsonapi_driver::ColumnKind::Attribute },
        )),
        Role::ForeignKey => Some(column(
            field,
            quote! { ::jsonapi_driver::ColumnKind::ForeignKey },
        )),
        _ => None,
    });

    let relations = def.fields.iter().filter_map(|field| {
        let Role::Relation(relation) = &field.role else {
            return None;
        };
        let field_name = field.ident.unraw().to_string();
        let wire = &field.wire;
        let kind = relation.kind.tokens();
        let target = &relation.target;
        let foreign_key = &relation.foreign_key;
        let join_table = match &relation.join_table {
            Some(table) => quote! { ::std::option::Option::Some(#table) },
            None => quote! { ::std::option::Option::None },
        };
        Some(quote! {
            ::jsonapi_driver::Relation {
                field: #field_name,
                name: #wire,
                kind: #kind,
                target: <#target as ::jsonapi_driver::Model>::table(),
                foreign_key: #foreign_key,
                join_table: #join_table,
            }
        })
    });

    let parent_key = def.parent.as_ref().map(|parent| {
        quote! {
            fn parent_key() -> ::std::option::Option<&'static str> {
                ::std::option::Option::Some(#parent)
            }
        }
    });

    let default_order = def.order.as_ref().map(|(column, descending)| {
        let constructor = if *descending {
            quote! { desc }
        } else {
            quote! { asc }
        };
        quote! {
            fn default_order() -> ::std::option::Option<::jsonapi_driver::Order> {
                ::std::option::Option::Some(::jsonapi_driver::Order::#constructor(#column))
            }
        }
    });

    let fill_meta = def.meta.then(|| {
        quote! {
            fn fill_meta(
                driver: &dyn ::jsonapi_driver::Driver,
                doc: &mut ::jsonapi_driver::DocItem,
            ) -> ::std::result::Result<(), ::jsonapi_driver::DriverError> {
                doc.hoist_data_meta();
                <Self as ::jsonapi_driver::MetaFiller>::add_meta(driver, doc)
            }
        }
    });

    quote! {
        impl ::jsonapi_driver::Model for #name {
            const TYPE: &'static str = #resource_type;

            fn id(&self) -> ::std::string::String {
                ::jsonapi_driver::ResourceId::resource_id(&self.#id_field)
            }

            fn columns() -> ::std::vec::Vec<::jsonapi_driver::Column> {
                ::std::vec![#id_column, #(#columns),*]
            }

            fn relations() -> ::std::vec::Vec<::jsonapi_driver::Relation> {
                ::std::vec![#(#relations),*]
            }

            #parent_key

            #default_order

            #fill_meta
        }
    }
}

fn column(field: &FieldDef, kind: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    let name = field.ident.unraw().to_string();
    let attribute = &field.wire;
    let ty = column_type(&field.ty);
    quote! {
        ::jsonapi_driver::Column::new(#name, #attribute, #kind, #ty)
    }
}
