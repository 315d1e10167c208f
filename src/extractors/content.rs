//! DOM, text, article and accessibility extraction

use anyhow::{Context, Result, bail};
use chromiumoxide::cdp::browser_protocol::accessibility::GetFullAxTreeParams;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::scripts::{BODY_TEXT_SCRIPT, INLINE_SHADOW_DOM_SCRIPT, OUTLINKS_SCRIPT};
use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::{artifacts, write_json, write_text};

/// Main article of a page, reduced to plain text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub text_content: String,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlink {
    pub href: String,
    pub text: String,
    pub rel: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector {css}: {e}"))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let css = format!(r#"meta[name="{name}"], meta[property="{name}"]"#);
        let sel = Selector::parse(&css).ok()?;
        document
            .select(&sel)
            .find_map(|m| m.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    })
}

/// Pull the main article out of rendered HTML
///
/// The container is the first of `article`, `main`, `[role=main]` or `body`.
/// Paragraph text is preferred; containers without paragraphs fall back to
/// their full text.
pub fn extract_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let container = ["article", "main", "[role=main]", "body"]
        .iter()
        .map(|css| selector(css))
        .collect::<Result<Vec<_>>>()?
        .iter()
        .find_map(|sel| document.select(sel).next());
    let Some(container) = container else {
        bail!("Document has no body");
    };

    let paragraphs = selector("p")?;
    let mut blocks: Vec<String> = container
        .select(&paragraphs)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if blocks.is_empty() {
        blocks.push(element_text(container));
    }
    let text_content = blocks.join("\n\n");

    let h1 = selector("h1")?;
    let title_tag = selector("title")?;
    let title = container
        .select(&h1)
        .next()
        .map(element_text)
        .or_else(|| meta_content(&document, &["og:title"]))
        .or_else(|| document.select(&title_tag).next().map(element_text))
        .filter(|t| !t.is_empty());

    Ok(Article {
        title,
        byline: meta_content(&document, &["author", "article:author"]),
        excerpt: meta_content(&document, &["description", "og:description"])
            .or_else(|| blocks.first().map(|b| crate::utils::truncate_at_word(b, 200).to_string())),
        length: text_content.chars().count(),
        text_content,
    })
}

/// Copy open shadow roots into declarative `<template>` nodes
///
/// Mutates the live DOM, so it runs alone before the extraction batch.
pub async fn inline_shadow_dom(page: &ChromePage, _state: &PageState) -> Result<()> {
    let inlined: u32 = page
        .eval(INLINE_SHADOW_DOM_SCRIPT)
        .await
        .context("Shadow DOM inlining failed")?;
    if inlined > 0 {
        log::debug!("Inlined {inlined} shadow roots");
    }
    Ok(())
}

/// Rendered DOM, including any shadow roots inlined during capture
pub async fn save_dom(page: &ChromePage, state: &PageState) -> Result<()> {
    let html = page
        .inner()
        .content()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get page content: {e}"))?;
    write_text(&state.artifact_path(artifacts::DOM), &html).await
}

pub async fn save_body_text(page: &ChromePage, state: &PageState) -> Result<()> {
    let text: String = page.eval(BODY_TEXT_SCRIPT).await?;
    write_text(&state.artifact_path(artifacts::BODY_TEXT), &text).await
}

pub async fn save_readability(page: &ChromePage, state: &PageState) -> Result<()> {
    let html = page
        .inner()
        .content()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get page content: {e}"))?;
    let article = extract_article(&html)?;
    if article.length == 0 {
        bail!("No readable content found");
    }
    write_json(&state.artifact_path(artifacts::READABILITY), &article).await
}

pub async fn save_accessibility(page: &ChromePage, state: &PageState) -> Result<()> {
    let tree = page
        .inner()
        .execute(GetFullAxTreeParams::default())
        .await
        .context("Failed to read accessibility tree")?;
    write_json(&state.artifact_path(artifacts::ACCESSIBILITY), &tree.nodes).await
}

pub async fn save_outlinks(page: &ChromePage, state: &PageState) -> Result<()> {
    let links: Vec<Outlink> = page.eval(OUTLINKS_SCRIPT).await?;
    log::debug!("Found {} outlinks", links.len());
    write_json(&state.artifact_path(artifacts::OUTLINKS), &links).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_prefers_article_paragraphs() {
        let html = r#"<html><head>
            <title>Site | Story</title>
            <meta name="author" content="A. Writer">
        </head><body>
            <nav><p>Home</p></nav>
            <article><h1>The Story</h1><p>First paragraph.</p><p>Second  one.</p></article>
        </body></html>"#;
        let article = extract_article(html).expect("article");
        assert_eq!(article.title.as_deref(), Some("The Story"));
        assert_eq!(article.byline.as_deref(), Some("A. Writer"));
        assert_eq!(article.text_content, "First paragraph.\n\nSecond  one.");
        assert_eq!(article.excerpt.as_deref(), Some("First paragraph."));
        assert!(!article.text_content.contains("Home"));
    }

    #[test]
    fn body_text_is_the_fallback() {
        let html = "<html><head><title>Bare</title></head><body><div>Just text</div></body></html>";
        let article = extract_article(html).expect("article");
        assert_eq!(article.title.as_deref(), Some("Bare"));
        assert_eq!(article.text_content, "Just text");
        assert_eq!(article.length, 9);
    }
}
