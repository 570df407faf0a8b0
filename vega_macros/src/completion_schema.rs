use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemStruct, LitStr};

use crate::schema_extraction::{
    doc_text, field_docs, field_names, parse_args, require_named_fields, SchemaArgs,
};

pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_args(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let item_struct = parse_macro_input!(item as ItemStruct);

    match expand(args, &item_struct) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: SchemaArgs, item: &ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
    require_named_fields(item)?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "`#[completion_schema]` cannot be applied to generic structs",
        ));
    }

    let ident = &item.ident;
    let type_name = LitStr::new(&ident.to_string(), Span::call_site());
    let schema_name = args.name.unwrap_or_else(|| type_name.clone());

    let description = match args.description {
        Some(explicit) => Some(explicit),
        None => doc_text(&item.attrs).map(|text| LitStr::new(&text, Span::call_site())),
    };
    let description_tokens = match description {
        Some(lit) => quote! { Some(#lit) },
        None => quote! { None },
    };

    let doc_pairs = field_docs(item).into_iter().map(|(field, doc)| {
        let field = LitStr::new(&field, Span::call_site());
        let doc = LitStr::new(&doc, Span::call_site());
        quote! { (#field, #doc) }
    });

    let names = field_names(item)
        .into_iter()
        .map(|name| LitStr::new(&name, Span::call_site()));

    // Generated paths go through `vega_rs`, which the library aliases to itself.
    Ok(quote! {
        #item

        impl vega_rs::schema::CompletionSchema for #ident {
            fn schema() -> &'static vega_rs::schema::SchemaHandle {
                static HANDLE: std::sync::OnceLock<vega_rs::schema::SchemaHandle> =
                    std::sync::OnceLock::new();
                HANDLE.get_or_init(|| {
                    let mut root = schemars::schema_for!(Self);
                    vega_rs::schema::apply_doc_comments(
                        &mut root,
                        #schema_name,
                        #description_tokens,
                        &[#(#doc_pairs),*],
                    );
                    vega_rs::schema::SchemaHandle::from_root_schema::<Self>(
                        #schema_name,
                        #type_name,
                        root,
                    )
                })
            }

            fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }
        }
    })
}
