use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, ItemStruct, Type};

pub fn derive_db_table(input: TokenStream) -> TokenStream {
    let derive: DeriveInput = match syn::parse2(input.clone()) {
        Ok(derive) => derive,
        Err(err) => return err.to_compile_error(),
    };
    if !matches!(derive.data, Data::Struct(_)) {
        return syn::Error::new_spanned(&derive.ident, "DbTable can only be derived for structs")
            .to_compile_error();
    }

    let item: ItemStruct = match syn::parse2(input) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error(),
    };
    let desc = match dbobj_gen::describe_struct(&item) {
        Ok(Some(desc)) => desc,
        Ok(None) => return quote! {},
        Err(err) => return syn::Error::new_spanned(&item.ident, err).to_compile_error(),
    };

    let Some(key) = &desc.key else {
        return quote! {};
    };
    let Fields::Named(named) = &item.fields else {
        return quote! {};
    };
    match named
        .named
        .iter()
        .find(|field| field.ident.as_ref() == Some(&key.field))
    {
        Some(field) if !is_i64(&field.ty) => syn::Error::new_spanned(
            &field.ty,
            format!("key field `{}` must be i64", key.field_name()),
        )
        .to_compile_error(),
        _ => quote! {},
    }
}

/// `i64`, or `i64` reached through `std`/`core` `primitive`.
fn is_i64(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() {
        return false;
    }
    let segments: Vec<String> = path
        .path
        .segments
        .iter()
        .map(|segment| {
            if segment.arguments.is_empty() {
                segment.ident.to_string()
            } else {
                String::new()
            }
        })
        .collect();
    match segments.as_slice() {
        [only] => only == "i64",
        [root, module, name] => {
            (root == "std" || root == "core") && module == "primitive" && name == "i64"
        }
        _ => false,
    }
}
