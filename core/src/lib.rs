pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod framebuffer;
pub mod ledger;
pub mod selector;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
