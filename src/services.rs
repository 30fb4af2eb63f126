pub mod order_normalizer;
pub mod seller_aggregator;
pub mod task_deriver;
pub mod priority_classifier;
pub mod tracker;
pub mod fulfillment_service;
