use syn::{
    parse::Parser, punctuated::Punctuated, Attribute, Expr, ExprLit, Fields, ItemStruct, Lit,
    LitStr, MetaNameValue, Token,
};

/// `name = "..."` / `description = "..."` overrides given to the attribute.
#[derive(Default)]
pub struct SchemaArgs {
    pub name: Option<LitStr>,
    pub description: Option<LitStr>,
}

pub fn parse_args(attr: proc_macro::TokenStream) -> syn::Result<SchemaArgs> {
    let mut args = SchemaArgs::default();
    if attr.is_empty() {
        return Ok(args);
    }

    let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated.parse(attr)?;

    for pair in pairs {
        let key = pair
            .path
            .get_ident()
            .ok_or_else(|| syn::Error::new_spanned(&pair.path, "expected `name` or `description`"))?;

        let Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) = &pair.value
        else {
            return Err(syn::Error::new_spanned(
                &pair.value,
                "expected a string literal",
            ));
        };

        let slot = match key.to_string().as_str() {
            "name" => &mut args.name,
            "description" => &mut args.description,
            other => {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown `completion_schema` argument `{other}`"),
                ));
            }
        };

        if slot.is_some() {
            return Err(syn::Error::new(key.span(), format!("`{key}` given twice")));
        }
        *slot = Some(value.clone());
    }

    Ok(args)
}

pub fn require_named_fields(item: &ItemStruct) -> syn::Result<()> {
    if matches!(item.fields, Fields::Named(_)) {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            item.struct_token,
            "`#[completion_schema]` needs a struct with named fields",
        ))
    }
}

/// Joined `///` lines of an item, or `None` when it has no docs.
pub fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(MetaNameValue {
                value:
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(lit), ..
                    }),
                ..
            }) => Some(lit.value().trim().to_string()),
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

pub fn field_docs(item: &ItemStruct) -> Vec<(String, String)> {
    named_fields(item)
        .filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let doc = doc_text(&field.attrs)?;
            Some((ident.to_string(), doc))
        })
        .collect()
}

pub fn field_names(item: &ItemStruct) -> Vec<String> {
    named_fields(item)
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect()
}

fn named_fields(item: &ItemStruct) -> impl Iterator<Item = &syn::Field> {
    let fields = match &item.fields {
        Fields::Named(named) => Some(named.named.iter()),
        _ => None,
    };
    fields.into_iter().flatten()
}
