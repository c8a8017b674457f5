#[cfg(test)]
pub mod relay_endpoint_tests;
#[cfg(test)]
pub mod service_endpoint_tests;
#[cfg(test)]
pub mod utils;
