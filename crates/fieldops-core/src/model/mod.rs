// Domain model: the entity catalog and the list query/result/column types.

pub mod catalog;
pub mod columns;
pub mod entity;
pub mod query;
pub mod result;

pub use catalog::{ColumnDef, EntityKind, FilterDef, PIPELINE_STAGES, PageSpec};
pub use columns::ColumnVisibility;
pub use entity::Entity;
pub use query::{DEFAULT_PAGE_SIZE, ListQuery};
pub use result::ListResult;
