pub mod api;
pub mod caption;
pub mod contracts;
pub mod counter;
pub mod dispatch;
pub mod metrics;
