/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Missive Macro Library
//!
//! Attribute macros that derive the boilerplate Missive expects from message
//! payloads and handler types.
//!
//! ```ignore
//! #[missive_message]
//! pub struct NewContact {
//!     pub name: String,
//! }
//!
//! #[missive_handler]
//! pub struct AddressBook {
//!     state: HandlerState,
//!     contacts: parking_lot::Mutex<Vec<String>>,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options accepted by `#[missive_handler(...)]`.
#[derive(Default)]
struct HandlerOptions {
    no_default: bool,
}

impl HandlerOptions {
    fn parse(attr: &TokenStream) -> Self {
        let mut options = Self::default();
        for part in attr.to_string().split(',') {
            if part.trim() == "no_default" {
                options.no_default = true;
            }
        }
        options
    }
}

/// Marks a type as a Missive message payload.
///
/// Every recipient of a sent message receives its own copy of the payload, so
/// payloads must be cloneable and shareable across threads.
///
/// This expands to:
/// - `#[derive(Clone, Debug)]` (only the traits not already present)
/// - A compile-time assertion that the type is `Send + Sync + 'static`
#[proc_macro_attribute]
pub fn missive_message(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut traits = Vec::new();
    if !has_derive(&input, "Clone") {
        traits.push(quote!(Clone));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertMissiveMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Marks a type as a Missive message handler.
///
/// Handlers are shared between the distributor and background delivery
/// threads, so they must be `Send + Sync + 'static`.
///
/// This expands to `#[derive(Default, Debug)]` (only the traits not already
/// present) and a compile-time bounds assertion. Pass `no_default` to skip
/// the `Default` derive when a field has no sensible default.
///
/// ```ignore
/// #[missive_handler(no_default)]
/// struct Mailer {
///     state: HandlerState,
///     outbox: std::path::PathBuf,
/// }
/// ```
#[proc_macro_attribute]
pub fn missive_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = HandlerOptions::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut traits = Vec::new();
    if !options.no_default && !has_derive(&input, "Default") {
        traits.push(quote!(Default));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertMissiveHandler_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
