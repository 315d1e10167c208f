//! Chromium implementation of the session interfaces

pub mod network_idle;
pub mod page;
pub mod pipeline;
pub mod provider;

pub use page::ChromePage;
pub use pipeline::default_pipeline;
pub use provider::ChromeSessionProvider;
