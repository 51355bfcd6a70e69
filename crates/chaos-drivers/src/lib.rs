//! Service Action Driver framework (C2, `spec.md §4.1`).

pub mod driver;
pub mod error;
pub mod http_driver;
pub mod registry;
pub mod schema;
pub mod services;

pub use driver::{run_with_deadline, ActionDriver};
pub use error::{ActionFailure, DriverError, InvalidParameter};
pub use http_driver::HttpServiceDriver;
pub use registry::DriverRegistry;
pub use services::{
    audit_driver, custodian_driver, exchange_driver, market_data_driver, risk_driver, trading_driver,
    ServiceEndpoint,
};
