pub mod context;
pub mod params;
pub mod query;
pub mod store;

pub use context::{ExplorerSettings, ExplorerState, FilterContext};
pub use params::{FilterTab, QueryParams};
pub use query::TraderQuery;
pub use store::{FilterStateStore, InMemoryFilterStateStore, PgFilterStateStore};
