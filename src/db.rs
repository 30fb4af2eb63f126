pub mod store;
pub use store::{CompletionOverrides, FulfillmentStore};
pub mod fulfillment_repo;
pub use fulfillment_repo::FulfillmentRepository;
pub mod memory_store;
pub use memory_store::InMemoryFulfillmentStore;
