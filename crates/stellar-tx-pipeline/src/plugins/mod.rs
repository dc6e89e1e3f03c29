//! Ready-made stage plugins.
//!
//! - [`FeeBumpPlugin`] - sponsor a signed envelope's fee before it is sent

mod fee_bump;

pub use fee_bump::FeeBumpPlugin;
