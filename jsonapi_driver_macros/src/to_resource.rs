use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{ModelDef, Role, Wrapper};

pub fn derive_to_resource(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match ModelDef::parse(&input) {
        Ok(def) => expand(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(def: &ModelDef) -> proc_macro2::TokenStream {
    let name = &def.ident;

    let steps = def.fields.iter().filter_map(|field| {
        let ident = &field.ident;
        let wire = &field.wire;
        match &field.role {
            Role::Attribute => Some(quote! {
                resource.set_attribute(#wire, &self.#ident);
            }),
            Role::Relation(relation) => Some(match relation.wrapper {
                Wrapper::Option => quote! {
                    resource.set_one_relationship(
                        #wire,
                        self.#ident
                            .as_ref()
                            .map(|related| related as &dyn ::jsonapi_driver::ToResource),
                        includes,
                    );
                },
                Wrapper::Plain => quote! {
                    resource.set_one_relationship(
                        #wire,
                        ::std::option::Option::Some(&self.#ident as &dyn ::jsonapi_driver::ToResource),
                        includes,
                    );
                },
                Wrapper::Vec => quote! {
                    resource.set_many_relationship(
                        #wire,
                        self.#ident
                            .iter()
                            .map(|related| related as &dyn ::jsonapi_driver::ToResource),
                        includes,
                    );
                },
            }),
            Role::Id | Role::ForeignKey | Role::Skip => None,
        }
    });

    quote! {
        impl ::jsonapi_driver::ToResource for #name {
            #[allow(unused_variables, unused_mut)]
            fn to_resource(
                &self,
                includes: &mut ::jsonapi_driver::Includes,
            ) -> ::jsonapi_driver::Resource {
                let mut resource = ::jsonapi_driver::Resource::new(
                    <Self as ::jsonapi_driver::Model>::id(self),
                    <Self as ::jsonapi_driver::Model>::TYPE,
                );
                #(#steps)*
                resource
            }
        }
    }
}
