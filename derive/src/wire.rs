use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Result};

pub(crate) fn expand_wire(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`Wire` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`Wire` may only be derived on structs with named fields.",
        ))?
    };

    if !input.generics.params.is_empty() {
        Err(Error::new_spanned(
            &input.generics,
            "`Wire` may not be derived on generic structs.",
        ))?
    }

    // Fields travel in declaration order, both ways.
    let names = fields
        .named
        .iter()
        .map(|f| f.ident.clone().unwrap())
        .collect::<Vec<_>>();

    let name = &input.ident;

    let expanded = quote! {
        impl Wire for #name {
            fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
                Ok(Self {
                    #(#names: Wire::decode(s)?,)*
                })
            }

            fn encode(&self, w: &mut Vec<u8>) {
                #(Wire::encode(&self.#names, w);)*
            }
        }
    };

    Ok(expanded.into())
}
