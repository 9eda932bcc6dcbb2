//! Operation façade for the Ellora marketplace: one async entry point per
//! domain operation, composing payload construction, wallet signing,
//! submission, and state decoding into a uniform result.

pub mod service;

pub use service::MarketplaceService;
