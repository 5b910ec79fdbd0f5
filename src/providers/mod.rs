pub mod openexchangerates;

pub use openexchangerates::{Endpoints, HttpFetcher};
