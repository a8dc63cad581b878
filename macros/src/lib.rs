//! Derive macros for busflow action enums
//!
//! Reducers receive two kinds of actions: commands issued by the user and
//! events fed back by effects. `#[derive(Action)]` lets an enum mark each
//! variant and generates the helpers reducers and logs rely on.
//!
//! # Example
//!
//! ```ignore
//! use busflow_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum BookingAction {
//!     #[command]
//!     ToggleSeat { seat: u8 },
//!
//!     #[event]
//!     CountdownTick { generation: u64 },
//! }
//!
//! assert!(BookingAction::ToggleSeat { seat: 3 }.is_command());
//! assert_eq!(BookingAction::CountdownTick { generation: 1 }.name(), "CountdownTick");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates:
/// - `is_command()` - true for variants marked `#[command]`
/// - `is_event()` - true for variants marked `#[event]`
/// - `name()` - the variant name, for log fields and metric labels
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command
/// - `#[event]` - Mark a variant as an event
///
/// # Panics
///
/// Never panics. Produces a compile error if:
/// - Applied to a non-enum type
/// - A variant has both `#[command]` and `#[event]` attributes
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut is_command_arms = Vec::new();
    let mut is_event_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_event = has_attribute(&variant.attrs, "event");

        if is_command && is_event {
            return syn::Error::new_spanned(variant, "Variant cannot be both #[command] and #[event]")
                .to_compile_error()
                .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);

        if is_command {
            is_command_arms.push(quote! { #pattern => true, });
        }

        if is_event {
            is_event_arms.push(quote! { #pattern => true, });
        }

        let label = variant.ident.to_string();
        name_arms.push(quote! { #pattern => #label, });
    }

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a command
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#is_command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#is_event_arms)*
                    _ => false,
                }
            }

            /// Variant name of this action
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Match pattern ignoring the variant's fields
fn variant_pattern(variant: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#variant { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant(..) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
