mod catalog;
mod path;

pub use catalog::{
    catalog_items, CatalogEntry, CatalogError, CatalogItem, CatalogItemKind, SessionCache,
    ShaderCatalog, CUSTOM_ID, DESCRIPTOR_EXTENSION, SHADER_SUBDIR, UNSELECTED_ID,
};
pub use path::{CustomPathResolver, PathError, PROJECT_RELATIVE_PREFIX};
