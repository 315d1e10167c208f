//! Human-like interaction run between page load and capture

pub mod captcha;
pub mod forms;
pub mod mouse;
pub mod navigation;
pub mod scroll;

pub use captcha::solve_captchas;
pub use forms::submit_form;
pub use mouse::jiggle_mouse;
pub use navigation::block_redirects;
pub use scroll::scroll_down;
