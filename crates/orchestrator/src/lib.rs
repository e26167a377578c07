//! Order orchestration.
//!
//! Ties the domain model, the order store, and the remote validation gateway
//! together into the use cases exposed by the service.

pub mod enricher;
pub mod error;
pub mod orchestrator;
pub mod view;

pub use enricher::Enricher;
pub use error::{ErrorKind, OrderServiceError, Result};
pub use orchestrator::OrderOrchestrator;
pub use store::{ClientOrderCount, DailyOrderStats, Page, PageRequest, SortDirection, SortField};
pub use view::{ClientStats, GlobalStats, OrderItemView, OrderView};
