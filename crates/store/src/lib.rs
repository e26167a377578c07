pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod stats;
pub mod store;
pub mod unit_of_work;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use query::{OrderQuery, Page, PageRequest, SortDirection, SortField};
pub use stats::{ClientOrderCount, DailyOrderStats, OrderTotals};
pub use store::{Fetch, OrderStore, OrderStoreExt};
pub use unit_of_work::{AccessMode, UnitOfWork};
