use darling::{ast, util::Ignored, FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, DeriveInput, Ident};

#[derive(FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named))]
struct EntityInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<Ignored, EntityField>,
}

#[derive(FromField)]
#[darling(attributes(entity))]
struct EntityField {
    ident: Option<Ident>,
    #[darling(default)]
    column: Option<String>,
    #[darling(default)]
    id: bool,
    #[darling(default)]
    skip: bool,
}

/// Expand `#[derive(Entity)]`.
pub fn expand_entity(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    match expand_entity_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let parsed = match EntityInput::from_derive_input(input) {
        Ok(parsed) => parsed,
        Err(err) => return Ok(err.write_errors()),
    };

    if !parsed.generics.params.is_empty() {
        return Err(syn::Error::new(
            parsed.generics.span(),
            "Entity cannot be derived for generic types",
        ));
    }

    let struct_name = &parsed.ident;
    let entity_name = struct_name.to_string();

    let fields = parsed
        .data
        .take_struct()
        .ok_or_else(|| syn::Error::new(input.span(), "Only structs are supported"))?
        .fields;

    let mut columns = Vec::new();
    let mut id_field: Option<Ident> = None;

    for field in fields {
        if field.skip {
            continue;
        }

        let ident = field
            .ident
            .ok_or_else(|| syn::Error::new(input.span(), "Only named fields are supported"))?;
        let column = field
            .column
            .unwrap_or_else(|| ident.to_string().to_lowercase());
        let is_id = field.id || column == "id";

        if is_id {
            if id_field.is_some() {
                return Err(syn::Error::new(
                    ident.span(),
                    "Only one identifier field is allowed",
                ));
            }
            id_field = Some(ident.clone());
        }

        columns.push(quote! {
            ::strata_core::entity::Column::new(
                #column,
                #is_id,
                |entity: &#struct_name| {
                    ::strata_core::entity::ToSqlValue::to_sql_value(&entity.#ident)
                },
                |entity: &mut #struct_name, value| {
                    entity.#ident = ::strata_core::entity::FromSqlValue::from_sql_value(value)?;
                    ::core::result::Result::Ok(())
                },
            )
        });
    }

    let has_id_impl = id_field.map(|id| {
        quote! {
            impl ::strata_core::entity::HasId for #struct_name {
                fn id(&self) -> i64 {
                    self.#id
                }

                fn set_id(&mut self, id: i64) {
                    self.#id = id;
                }
            }
        }
    });

    Ok(quote! {
        impl ::strata_core::entity::Entity for #struct_name {
            const ENTITY_NAME: &'static str = #entity_name;

            fn descriptor() -> &'static ::strata_core::entity::EntityDescriptor<Self> {
                static DESCRIPTOR: ::std::sync::LazyLock<
                    ::strata_core::entity::EntityDescriptor<#struct_name>,
                > = ::std::sync::LazyLock::new(|| {
                    ::strata_core::entity::EntityDescriptor::new(
                        #entity_name,
                        ::std::vec![#(#columns),*],
                    )
                });
                &DESCRIPTOR
            }
        }

        #has_id_impl
    })
}
