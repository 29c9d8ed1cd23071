//! Procedural macros for record-actions

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(ActionSet)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_unit))]
struct ActionSetOpts {
    ident: syn::Ident,
    data: darling::ast::Data<ActionSetVariant, ()>,

    /// Prefix for inferred names, `do` unless set
    #[darling(default)]
    prefix: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionSetVariant {
    ident: syn::Ident,

    /// Explicit button name
    #[darling(default)]
    name: Option<String>,

    /// Explicit title
    #[darling(default)]
    title: Option<String>,

    /// Alternative name the action answers to
    #[darling(default)]
    alias: Option<String>,

    /// Ask async clients to reload after the action
    #[darling(default)]
    refresh: bool,

    /// Render as a primary button
    #[darling(default)]
    primary: bool,

    /// Keep at the end of the action bar
    #[darling(default)]
    trailing: bool,
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Title from a variant name: `ResetPassword` -> `Reset Password`
fn title_from_ident(s: &str) -> String {
    split_pascal_case(s).join(" ")
}

/// Derive macro for the ActionSet trait
///
/// Implements `ActionSet` for a unit-only enum. Each variant becomes one
/// action; names default to `do{Variant}` and titles to the variant name
/// split into words.
///
/// # Attributes
///
/// - `#[action(prefix = "...")]` on the enum: prefix for inferred names
/// - `#[action(name = "...")]`: explicit button name
/// - `#[action(title = "...")]`: explicit title
/// - `#[action(alias = "...")]`: alternative name, used as handler key
/// - `#[action(refresh)]`, `#[action(primary)]`, `#[action(trailing)]`: flags
///
/// # Example
///
/// ```ignore
/// #[derive(ActionSet, Clone, Copy, Debug, PartialEq, Eq)]
/// enum MemberAction {
///     #[action(refresh)]
///     Unlock,
///     #[action(title = "Send password reset")]
///     ResetPassword,
///     #[action(name = "doCustomAction[archive]", alias = "doArchive", trailing)]
///     Archive,
/// }
///
/// assert_eq!(MemberAction::Unlock.name(), "doUnlock");
/// assert_eq!(MemberAction::ResetPassword.title(), "Send password reset");
/// assert_eq!(MemberAction::from_name("doArchive"), Some(MemberAction::Archive));
/// ```
#[proc_macro_derive(ActionSet, attributes(action))]
pub fn derive_action_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionSetOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let prefix = opts.prefix.as_deref().unwrap_or("do");

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "ActionSet can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "ActionSet needs at least one variant")
            .to_compile_error()
            .into();
    }

    // Resolve names up front so duplicates are reported at compile time
    let mut seen: HashMap<String, &syn::Ident> = HashMap::new();
    let mut resolved = Vec::with_capacity(variants.len());
    for v in variants {
        let action_name = v
            .name
            .clone()
            .unwrap_or_else(|| format!("{prefix}{}", v.ident));
        for key in std::iter::once(&action_name).chain(v.alias.as_ref()) {
            if let Some(previous) = seen.insert(key.clone(), &v.ident) {
                let msg = format!("action name `{key}` is already used by `{previous}`");
                return syn::Error::new_spanned(&v.ident, msg)
                    .to_compile_error()
                    .into();
            }
        }
        let title = v
            .title
            .clone()
            .unwrap_or_else(|| title_from_ident(&v.ident.to_string()));
        resolved.push((v, action_name, title));
    }

    let name_arms = resolved.iter().map(|(v, action_name, _)| {
        let variant = &v.ident;
        quote! { #name::#variant => #action_name }
    });

    let title_arms = resolved.iter().map(|(v, _, title)| {
        let variant = &v.ident;
        quote! { #name::#variant => #title }
    });

    let flag_arms = resolved.iter().map(|(v, _, _)| {
        let variant = &v.ident;
        let mut flags = Vec::new();
        if v.refresh {
            flags.push(quote! { record_actions::ActionFlags::REFRESH });
        }
        if v.primary {
            flags.push(quote! { record_actions::ActionFlags::PRIMARY });
        }
        if v.trailing {
            flags.push(quote! { record_actions::ActionFlags::TRAILING });
        }
        if flags.is_empty() {
            quote! { #name::#variant => record_actions::ActionFlags::empty() }
        } else {
            quote! { #name::#variant => #(#flags)|* }
        }
    });

    let alias_arms = resolved.iter().map(|(v, _, _)| {
        let variant = &v.ident;
        match &v.alias {
            Some(alias) => quote! { #name::#variant => ::core::option::Option::Some(#alias) },
            None => quote! { #name::#variant => ::core::option::Option::None },
        }
    });

    let all_variants = resolved.iter().map(|(v, _, _)| {
        let variant = &v.ident;
        quote! { #name::#variant }
    });

    let expanded = quote! {
        impl record_actions::ActionSet for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            fn title(&self) -> &'static str {
                match self {
                    #(#title_arms),*
                }
            }

            fn flags(&self) -> record_actions::ActionFlags {
                match self {
                    #(#flag_arms),*
                }
            }

            fn alias(&self) -> ::core::option::Option<&'static str> {
                match self {
                    #(#alias_arms),*
                }
            }

            fn all() -> &'static [Self] {
                &[#(#all_variants),*]
            }
        }
    };

    TokenStream::from(expanded)
}
