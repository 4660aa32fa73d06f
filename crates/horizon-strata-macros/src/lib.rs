//! Procedural macros for Horizon Strata.
//!
//! This crate provides `#[derive(Identifiable)]`, which implements the
//! identity and content-equality contract for a component struct.
//!
//! # Attributes
//!
//! ## `#[id]`
//!
//! Marks a field as part of the component's identity. One marked field makes
//! that field's type the id; several marked fields produce a tuple id in
//! declaration order.
//!
//! ```ignore
//! #[derive(Clone, PartialEq, Identifiable)]
//! struct Message {
//!     #[id]
//!     thread: u64,
//!     #[id]
//!     seq: u32,
//!     body: String,
//! }
//! // Message::Id == (u64, u32)
//! ```
//!
//! ## `#[content(skip)]`
//!
//! Excludes a field from `should_content_update`. Use it for fields that
//! never affect what is painted (caches, callbacks, bookkeeping):
//!
//! ```ignore
//! #[derive(Clone, Identifiable)]
//! struct Avatar {
//!     #[id]
//!     user: u64,
//!     url: String,
//!     #[content(skip)]
//!     fetched_at: Instant,
//! }
//! ```
//!
//! Every other field is compared with `!=` (the default "structural
//! inequality" rule), so those fields need `PartialEq`. Id fields are not
//! compared: equal ids are the premise of the comparison.
//!
//! ## `#[identifiable(crate = "...")]`
//!
//! Struct-level attribute overriding the path the generated impl refers to.
//! Defaults to `::horizon_strata_core`; use `"horizon_strata"` when only the
//! umbrella crate is a dependency.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Path, Type};

/// Derive `Identifiable` from `#[id]` fields.
///
/// This macro generates:
/// - `type Id` from the `#[id]` field types
/// - `fn id()` cloning those fields
/// - `fn should_content_update()` comparing every other non-skipped field
///
/// # Example
///
/// ```ignore
/// use horizon_strata::Identifiable;
///
/// #[derive(Clone, PartialEq, Identifiable)]
/// #[identifiable(crate = "horizon_strata")]
/// struct Label {
///     #[id]
///     key: String,
///     text: String,
/// }
/// ```
#[proc_macro_derive(Identifiable, attributes(id, content, identifiable))]
pub fn derive_identifiable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_identifiable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed field information.
struct FieldInfo {
    name: Ident,
    ty: Type,
    is_id: bool,
    skip_content: bool,
}

/// Parsed struct-level attributes.
struct IdentifiableAttrs {
    crate_path: Path,
}

fn impl_derive_identifiable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let attrs = parse_identifiable_attrs(&input.attrs)?;
    let krate = &attrs.crate_path;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Identifiable derive only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Identifiable derive only supports structs",
            ))
        }
    };

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        infos.push(parse_field(field)?);
    }

    let id_fields: Vec<&FieldInfo> = infos.iter().filter(|f| f.is_id).collect();
    if id_fields.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Identifiable derive requires at least one field marked #[id]",
        ));
    }

    let (id_type, id_expr) = if let [single] = id_fields.as_slice() {
        let ty = &single.ty;
        let name = &single.name;
        (
            quote! { #ty },
            quote! { ::std::clone::Clone::clone(&self.#name) },
        )
    } else {
        let tys = id_fields.iter().map(|f| &f.ty);
        let names = id_fields.iter().map(|f| &f.name);
        (
            quote! { ( #(#tys,)* ) },
            quote! { ( #(::std::clone::Clone::clone(&self.#names),)* ) },
        )
    };

    let compared = infos.iter().filter(|f| !f.is_id && !f.skip_content).map(|f| {
        let name = &f.name;
        quote! { self.#name != next.#name }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Identifiable for #struct_name #ty_generics #where_clause {
            type Id = #id_type;

            fn id(&self) -> Self::Id {
                #id_expr
            }

            #[allow(unused_variables)]
            fn should_content_update(&self, next: &Self) -> bool {
                false #(|| #compared)*
            }
        }
    })
}

/// Parse struct-level #[identifiable(...)] attributes.
fn parse_identifiable_attrs(attrs: &[Attribute]) -> syn::Result<IdentifiableAttrs> {
    let mut crate_path: Path = syn::parse_quote!(::horizon_strata_core);

    for attr in attrs {
        if !attr.path().is_ident("identifiable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                crate_path = lit.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported identifiable attribute, expected `crate`"))
            }
        })?;
    }

    Ok(IdentifiableAttrs { crate_path })
}

/// Parse the #[id] and #[content(...)] markers of one field.
fn parse_field(field: &syn::Field) -> syn::Result<FieldInfo> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

    let mut is_id = false;
    let mut skip_content = false;

    for attr in &field.attrs {
        if attr.path().is_ident("id") {
            attr.meta.require_path_only()?;
            is_id = true;
        } else if attr.path().is_ident("content") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip_content = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported content attribute, expected `skip`"))
                }
            })?;
        }
    }

    Ok(FieldInfo {
        name,
        ty: field.ty.clone(),
        is_id,
        skip_content,
    })
}
