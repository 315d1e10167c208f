//! Page preparation units
//!
//! Everything that must be attached to the tab before navigation: metadata
//! listeners, request rewriting, dialog handling, cookies, response saving
//! and the external media downloaders.

pub mod cookies;
pub mod media;
pub mod metadata;
pub mod modals;
pub mod responses;
pub mod url_rewrite;

pub use cookies::load_auth_cookies;
pub use media::{save_gallery, save_media};
pub use metadata::start_metadata_recording;
pub use modals::setup_modal_auto_closing;
pub use responses::start_response_saving;
pub use url_rewrite::{rewrite_url, setup_url_rewriting, stop_url_rewriting};
