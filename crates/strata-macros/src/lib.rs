use proc_macro::TokenStream;

mod entity;

/// Derives `Entity` (and `HasId` when an identifier field exists) by building the
/// type's column-descriptor table.
///
/// Column names come from `#[entity(column = "...")]`, falling back to the
/// lower-cased field name. The identifier is the field marked `#[entity(id)]` or the
/// one whose column is `id`; it is left out of inserts and filled in afterwards.
/// Fields marked `#[entity(skip)]` are not mapped and keep their default value.
///
/// # Example
/// ```ignore
/// #[derive(Debug, Default, Entity)]
/// pub struct SignedBinary {
///     pub id: i64,
///     pub hash: String,
///     #[entity(column = "created_at")]
///     pub created: i64,
///     #[entity(skip)]
///     pub display_name: String,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(item: TokenStream) -> TokenStream {
    entity::expand_entity(item)
}
