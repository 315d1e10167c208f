//! Artifact file names inside a version directory

pub const SCREENSHOT: &str = "screenshot.png";
pub const PDF: &str = "output.pdf";
pub const SCREENRECORDING: &str = "screenrecording.mp4";
pub const SCREENRECORDING_GIF: &str = "screenrecording.gif";

pub const TITLE: &str = "title.txt";
pub const SEO: &str = "seo.json";
pub const FAVICON: &str = "favicon.ico";
pub const SSL: &str = "ssl.json";

pub const REQUESTS: &str = "requests.json";
pub const REDIRECTS: &str = "redirects.json";
pub const HEADERS: &str = "headers.json";
pub const RAW: &str = "raw.bin";
pub const CONSOLE: &str = "console.json";

pub const DOM: &str = "dom.html";
pub const BODY_TEXT: &str = "body.txt";
pub const READABILITY: &str = "readability.json";
pub const ACCESSIBILITY: &str = "accessibility.json";
pub const OUTLINKS: &str = "outlinks.json";
pub const SINGLEFILE: &str = "singlefile.mhtml";

pub const QA: &str = "qa.json";
pub const METRICS: &str = "metrics.json";

/// Directory of saved response bodies
pub const RESPONSES_DIR: &str = "responses";
/// Directory of yt-dlp output
pub const MEDIA_DIR: &str = "media";
/// Directory of gallery-dl output
pub const GALLERY_DIR: &str = "gallery";

/// Artifacts written by the parallel extraction phase
pub const EXTRACTION: &[&str] = &[
    TITLE,
    SEO,
    FAVICON,
    SSL,
    REQUESTS,
    REDIRECTS,
    HEADERS,
    RAW,
    DOM,
    BODY_TEXT,
    READABILITY,
    ACCESSIBILITY,
    OUTLINKS,
    CONSOLE,
    QA,
];
