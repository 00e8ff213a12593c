pub mod chain;
pub mod engine;
pub mod model;
pub mod sim;
pub mod stats;
pub mod store;

#[cfg(test)]
mod test;
