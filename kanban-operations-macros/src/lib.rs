//! Procedural macros for defining kanban-sync operations
//!
//! `#[operation]` turns a plain struct into an `Operation`: the struct's fields
//! are the operation's inputs, the attribute carries its name.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, DeriveInput, Ident, Lit, LitStr, Token,
};

/// Attribute macro for defining an operation
///
/// # Usage
///
/// ```ignore
/// #[operation(verb = "move", noun = "column", description = "Move a column within its board")]
/// #[derive(Debug, Deserialize, Serialize)]
/// pub struct MoveColumn {
///     pub board_id: EntityId,
///     pub id: EntityId,
///     pub to_index: usize,
/// }
/// ```
///
/// Verbs and nouns must be single lowercase words; they are joined into the
/// canonical op string (`"move column"`) used by the activity log.
#[proc_macro_attribute]
pub fn operation(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as OperationArgs);
    let input = parse_macro_input!(item as DeriveInput);

    match &input.data {
        syn::Data::Struct(data) => {
            if let syn::Fields::Unnamed(fields) = &data.fields {
                return syn::Error::new_spanned(
                    fields,
                    "operation macro does not support tuple structs",
                )
                .to_compile_error()
                .into();
            }
        }
        _ => {
            return syn::Error::new_spanned(&input.ident, "operation macro only supports structs")
                .to_compile_error()
                .into();
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let verb = args.verb.value();
    let noun = args.noun.value();
    let description = args.description.value();
    let op_string = format!("{} {}", verb, noun);

    let expanded = quote! {
        #input

        impl #impl_generics kanban_operations::Operation for #name #ty_generics #where_clause {
            fn verb(&self) -> &'static str {
                #verb
            }

            fn noun(&self) -> &'static str {
                #noun
            }

            fn description(&self) -> &'static str {
                #description
            }

            fn op_string(&self) -> &'static str {
                #op_string
            }
        }
    };

    TokenStream::from(expanded)
}

/// Arguments for the #[operation(...)] attribute
struct OperationArgs {
    verb: LitStr,
    noun: LitStr,
    description: LitStr,
}

impl Parse for OperationArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut verb: Option<LitStr> = None;
        let mut noun: Option<LitStr> = None;
        let mut description: Option<LitStr> = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: Lit = input.parse()?;

            let value = match value {
                Lit::Str(s) => s,
                other => return Err(syn::Error::new_spanned(other, "expected string literal")),
            };

            match ident.to_string().as_str() {
                "verb" => verb = Some(single_word(value)?),
                "noun" => noun = Some(single_word(value)?),
                "description" => description = Some(value),
                other => {
                    return Err(syn::Error::new_spanned(
                        ident,
                        format!("unknown attribute: {}", other),
                    ))
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(OperationArgs {
            verb: verb.ok_or_else(|| input.error("missing 'verb' attribute"))?,
            noun: noun.ok_or_else(|| input.error("missing 'noun' attribute"))?,
            description: description
                .ok_or_else(|| input.error("missing 'description' attribute"))?,
        })
    }
}

/// Reject verbs/nouns that would make the op string ambiguous
fn single_word(lit: LitStr) -> syn::Result<LitStr> {
    let value = lit.value();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_');
    if valid {
        Ok(lit)
    } else {
        Err(syn::Error::new_spanned(
            lit,
            "expected a single lowercase word (a-z and '_')",
        ))
    }
}
