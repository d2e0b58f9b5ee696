//! Renders `DbObject` implementations from type descriptors.
//!
//! Each descriptor becomes exactly one `impl <runtime>::DbObject for <Type>`
//! block. Methods are emitted in a fixed order so that output is stable
//! across runs:
//!
//! `new_obj`, `names`, `table_name`, `key_field`, `key_name`,
//! `select_fields`, `insert_fields`, `update_fields`, `key`, `set_id`,
//! `insert_values`, `update_values`, `member_pointers`, `modified_by`.
//!
//! Positional contracts the runtime relies on:
//!
//! - `member_pointers` and `names` follow `select_fields` (key first).
//! - `insert_values` follows `insert_fields` (every non-key column).
//! - `update_values` follows `update_fields`, then carries the key last for
//!   the `WHERE` parameter.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use crate::descriptor::TypeDescriptor;

/// Renders the impl block for one descriptor.
pub fn render(desc: &TypeDescriptor, runtime: &syn::Path) -> TokenStream {
    let ty = type_path(desc);

    let names = desc.member_names();
    let table = &desc.table;
    let key_column = desc.key_column();
    let key_name = desc.key_field_name();
    let select_fields = desc.select_fields();
    let insert_fields = desc.insert_fields();
    let update_fields = desc.update_fields();

    let insert_members: Vec<&Ident> = desc.columns.iter().map(|entry| &entry.field).collect();
    let update_members: Vec<&Ident> = desc
        .update_columns()
        .chain(desc.key.as_ref())
        .map(|entry| &entry.field)
        .collect();
    let pointer_members: Vec<&Ident> = desc
        .key
        .iter()
        .chain(&desc.columns)
        .map(|entry| &entry.field)
        .collect();

    let insert_values = insert_members
        .iter()
        .map(|field| quote!(&self.#field as &dyn #runtime::rusqlite::ToSql));
    let update_values = update_members
        .iter()
        .map(|field| quote!(&self.#field as &dyn #runtime::rusqlite::ToSql));
    let member_pointers = pointer_members
        .iter()
        .map(|field| quote!(&mut self.#field as &mut dyn #runtime::Column));

    let (key_fn, set_id_fn) = match &desc.key {
        Some(key) => {
            let field = &key.field;
            (
                quote! {
                    fn key(&self) -> i64 {
                        self.#field
                    }
                },
                quote! {
                    fn set_id(&mut self, id: i64) {
                        self.#field = id;
                    }
                },
            )
        }
        None => (
            quote! {
                fn key(&self) -> i64 {
                    0
                }
            },
            quote! {
                fn set_id(&mut self, _id: i64) {}
            },
        ),
    };
    let modified_by_fn = render_modified_by(desc, runtime);

    quote! {
        impl #runtime::DbObject for #ty {
            fn new_obj() -> Self {
                <Self as ::core::default::Default>::default()
            }

            fn names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn table_name(&self) -> &'static str {
                #table
            }

            fn key_field(&self) -> &'static str {
                #key_column
            }

            fn key_name(&self) -> &'static str {
                #key_name
            }

            fn select_fields(&self) -> &'static str {
                #select_fields
            }

            fn insert_fields(&self) -> &'static str {
                #insert_fields
            }

            fn update_fields(&self) -> &'static str {
                #update_fields
            }

            #key_fn

            #set_id_fn

            fn insert_values(&self) -> ::std::vec::Vec<&dyn #runtime::rusqlite::ToSql> {
                ::std::vec![#(#insert_values),*]
            }

            fn update_values(&self) -> ::std::vec::Vec<&dyn #runtime::rusqlite::ToSql> {
                ::std::vec![#(#update_values),*]
            }

            fn member_pointers(&mut self) -> ::std::vec::Vec<&mut dyn #runtime::Column> {
                ::std::vec![#(#member_pointers),*]
            }

            #modified_by_fn
        }
    }
}

/// The audit-apply method; its body is empty when no audit field exists.
fn render_modified_by(desc: &TypeDescriptor, runtime: &syn::Path) -> TokenStream {
    let user_param = param_ident("user", desc.user_audit_field.is_some());
    let at_param = param_ident("at", desc.time_audit_field.is_some());

    let assign_user = desc.user_audit_field.as_ref().map(|field| {
        quote! { self.#field = ::core::convert::From::from(#user_param); }
    });
    let assign_time = desc.time_audit_field.as_ref().map(|field| {
        quote! { self.#field = ::core::convert::From::from(#at_param); }
    });

    quote! {
        fn modified_by(
            &mut self,
            #user_param: i64,
            #at_param: #runtime::chrono::DateTime<#runtime::chrono::Utc>,
        ) {
            #assign_user
            #assign_time
        }
    }
}

fn param_ident(name: &str, used: bool) -> Ident {
    if used {
        format_ident!("{}", name)
    } else {
        format_ident!("_{}", name)
    }
}

fn type_path(desc: &TypeDescriptor) -> TokenStream {
    let modules = &desc.module_path;
    let ident = &desc.ident;
    quote!(#(#modules ::)* #ident)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;
    use quote::ToTokens;
    use crate::descriptor::FieldInfo;
    use crate::tag::FieldTag;

    fn descriptor(fields: &[(&str, &str)]) -> TypeDescriptor {
        let infos: Vec<FieldInfo> = fields
            .iter()
            .map(|(name, tag)| FieldInfo::new(Ident::new(name, Span::call_site()), FieldTag::parse(tag)))
            .collect();
        TypeDescriptor::from_fields(&Ident::new("Thing", Span::call_site()), &infos).unwrap().unwrap()
    }

    fn runtime() -> syn::Path {
        syn::parse_quote!(::dbobj)
    }

    fn rendered_impl(desc: &TypeDescriptor) -> syn::ItemImpl {
        syn::parse2(render(desc, &runtime())).expect("rendered impl must parse")
    }

    fn method_names(item: &syn::ItemImpl) -> Vec<String> {
        item.items
            .iter()
            .filter_map(|item| match item {
                syn::ImplItem::Fn(method) => Some(method.sig.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    fn method_body(item: &syn::ItemImpl, name: &str) -> String {
        item.items
            .iter()
            .find_map(|item| match item {
                syn::ImplItem::Fn(method) if method.sig.ident == name => {
                    Some(method.block.to_token_stream().to_string())
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("missing method {name}"))
    }

    #[test]
    fn test_methods_render_in_fixed_order() {
        let desc = descriptor(&[("id", r#"sql:"id" key:"true" table:"t""#), ("name", r#"sql:"name""#)]);
        let item = rendered_impl(&desc);
        assert_eq!(
            method_names(&item),
            [
                "new_obj",
                "names",
                "table_name",
                "key_field",
                "key_name",
                "select_fields",
                "insert_fields",
                "update_fields",
                "key",
                "set_id",
                "insert_values",
                "update_values",
                "member_pointers",
                "modified_by",
            ]
        );
    }

    #[test]
    fn test_accessor_literals() {
        let desc = descriptor(&[("id", r#"sql:"id" key:"true" table:"t""#), ("name", r#"sql:"name""#)]);
        let item = rendered_impl(&desc);
        assert!(method_body(&item, "table_name").contains("\"t\""));
        assert!(method_body(&item, "key_field").contains("\"id\""));
        assert!(method_body(&item, "select_fields").contains("\"id,name\""));
        assert!(method_body(&item, "insert_fields").contains("\"name\""));
        assert!(method_body(&item, "names").contains("\"id\" , \"name\""));
    }

    #[test]
    fn test_value_and_pointer_order() {
        let desc = descriptor(&[
            ("id", r#"sql:"id" key:"true" table:"t""#),
            ("name", r#"sql:"name""#),
            ("created", r#"sql:"created" update:"false""#),
        ]);
        let item = rendered_impl(&desc);

        let insert = method_body(&item, "insert_values");
        assert!(insert.contains("self . name"));
        assert!(insert.contains("self . created"));
        assert!(!insert.contains("self . id"));

        let update = method_body(&item, "update_values");
        assert!(!update.contains("self . created"));
        let name_at = update.find("self . name").unwrap();
        let id_at = update.find("self . id").unwrap();
        assert!(name_at < id_at, "key must come last: {update}");

        let pointers = method_body(&item, "member_pointers");
        let id_at = pointers.find("self . id").unwrap();
        let name_at = pointers.find("self . name").unwrap();
        let created_at = pointers.find("self . created").unwrap();
        assert!(id_at < name_at && name_at < created_at);
    }

    #[test]
    fn test_keyless_type_uses_zero_key() {
        let desc = descriptor(&[("line", r#"sql:"line" table:"log""#)]);
        let item = rendered_impl(&desc);
        assert!(method_body(&item, "key").contains('0'));
        assert_eq!(method_body(&item, "set_id"), "{ }");
        assert!(method_body(&item, "key_field").contains("\"\""));
    }

    #[test]
    fn test_audit_assignments() {
        let desc = descriptor(&[
            ("id", r#"sql:"id" key:"true" table:"t""#),
            ("user_id", r#"sql:"userid" audit:"user""#),
            ("modified", r#"sql:"modified" audit:"time""#),
        ]);
        let body = method_body(&rendered_impl(&desc), "modified_by");
        assert!(body.contains("self . user_id = :: core :: convert :: From :: from (user)"));
        assert!(body.contains("self . modified = :: core :: convert :: From :: from (at)"));
    }

    #[test]
    fn test_audit_method_is_empty_without_audit_fields() {
        let desc = descriptor(&[("id", r#"sql:"id" key:"true" table:"t""#)]);
        let item = rendered_impl(&desc);
        assert_eq!(method_body(&item, "modified_by"), "{ }");
        let rendered = render(&desc, &runtime()).to_string();
        assert!(rendered.contains("_user : i64"));
        assert!(rendered.contains("_at :"));
    }

    #[test]
    fn test_nested_type_path() {
        let desc = descriptor(&[("id", r#"sql:"id" key:"true" table:"t""#)])
            .with_module_path(vec![Ident::new("inner", Span::call_site())]);
        let item = rendered_impl(&desc);
        assert_eq!(item.self_ty.to_token_stream().to_string(), "inner :: Thing");
    }

    #[test]
    fn test_raw_module_segment_keeps_prefix() {
        let desc = descriptor(&[("id", r#"sql:"id" key:"true" table:"t""#)])
            .with_module_path(vec![Ident::new_raw("type", Span::call_site())]);
        let item = rendered_impl(&desc);
        assert_eq!(item.self_ty.to_token_stream().to_string(), "r#type :: Thing");
    }
}
