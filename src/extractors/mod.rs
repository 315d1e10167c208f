//! Artifact extraction units
//!
//! Each public `save_*` function writes one artifact into the task's
//! version directory and may fail independently of the others.

pub mod capture;
pub mod content;
pub mod page_info;
pub mod qa;
pub mod scripts;
pub mod single_file;
pub mod traffic;

pub use capture::{save_pdf, save_screenshot};
pub use content::{
    Article, extract_article, inline_shadow_dom, save_accessibility, save_body_text, save_dom,
    save_outlinks, save_readability,
};
pub use page_info::{save_favicon, save_seo, save_ssl, save_title};
pub use qa::{QaProbe, save_qa_score, score_probe};
pub use single_file::save_single_file;
pub use traffic::{save_console, save_headers, save_raw, save_redirects, save_requests};
