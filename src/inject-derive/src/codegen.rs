use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error as SynError, Fields, GenericArgument, LitStr, PathArguments, Result as SynResult, Type};

/// How a field's Rust type maps onto a dependency's ownership contract.
/// Detected syntactically from the field's written type, the way a
/// `#[derive(Injectable)]` struct actually declares its dependencies:
/// `Arc<T>` is a shared singleton, `Box<T>` a freshly-built unique value,
/// anything else an owned value.
enum FieldShape<'a> {
    Shared(&'a Type),
    Unique(&'a Type),
    Value(&'a Type),
}

impl<'a> FieldShape<'a> {
    fn classify(ty: &'a Type) -> Self {
        if let Some(inner) = single_generic_arg(ty, "Arc") {
            FieldShape::Shared(inner)
        } else if let Some(inner) = single_generic_arg(ty, "Box") {
            FieldShape::Unique(inner)
        } else {
            FieldShape::Value(ty)
        }
    }

    fn meta_type_tokens(&self) -> TokenStream2 {
        match self {
            FieldShape::Shared(_) => quote! { ::inject::key::MetaType::Shared },
            FieldShape::Unique(_) => quote! { ::inject::key::MetaType::Unique },
            FieldShape::Value(_) => quote! { ::inject::key::MetaType::Value },
        }
    }

    fn key_type_tokens(&self) -> TokenStream2 {
        match self {
            FieldShape::Shared(inner) | FieldShape::Unique(inner) => quote! { #inner },
            FieldShape::Value(ty) => quote! { #ty },
        }
    }

    fn getter_tokens(&self, field: &syn::Ident, name: &str) -> TokenStream2 {
        let key_ty = self.key_type_tokens();
        match self {
            FieldShape::Shared(_) => quote! {
                let #field = ::inject::injector::TypedInjector::get_shared::<#key_ty>(injector, #name)?;
            },
            FieldShape::Unique(_) => quote! {
                let #field = ::inject::injector::TypedInjector::get_unique::<#key_ty>(injector, #name)?;
            },
            FieldShape::Value(_) => quote! {
                let #field = ::inject::injector::TypedInjector::get_value::<#key_ty>(injector, #name)?;
            },
        }
    }

    fn dependency_key_tokens(&self, name: &str) -> TokenStream2 {
        let key_ty = self.key_type_tokens();
        let meta_type = self.meta_type_tokens();
        quote! { ::inject::key::BindingKey::new::<#key_ty>(#meta_type, #name) }
    }
}

fn single_generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn field_name_attr(attrs: &[Attribute]) -> SynResult<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("inject") {
            continue;
        }
        let mut name = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `#[inject(name = \"...\")]`"))
            }
        })?;
        return Ok(name);
    }
    Ok(None)
}

pub fn expand_injectable(input: DeriveInput) -> SynResult<TokenStream2> {
    let ident = &input.ident;

    let Data::Struct(data) = &input.data else {
        return Err(SynError::new_spanned(
            &input,
            "`#[derive(Injectable)]` only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(SynError::new_spanned(
            &input,
            "`#[derive(Injectable)]` requires named fields",
        ));
    };

    let mut field_idents = Vec::new();
    let mut getters = Vec::new();
    let mut dependency_keys = Vec::new();

    for field in &fields.named {
        let field_ident = field.ident.clone().expect("named field");
        let name = field_name_attr(&field.attrs)?.unwrap_or_default();
        let shape = FieldShape::classify(&field.ty);

        getters.push(shape.getter_tokens(&field_ident, &name));
        dependency_keys.push(shape.dependency_key_tokens(&name));
        field_idents.push(field_ident);
    }

    Ok(quote! {
        impl ::inject::injectable::Injectable for #ident {
            fn construct(
                injector: &dyn ::inject::injector::Injector,
                context: &::inject::injectable::CallContext,
            ) -> ::std::result::Result<Self, ::inject::error::InjectError> {
                let _ = context;
                #(#getters)*
                Ok(Self { #(#field_idents),* })
            }

            fn dependencies() -> ::std::vec::Vec<::inject::key::BindingKey> {
                ::std::vec![#(#dependency_keys),*]
            }
        }
    })
}
