//! JavaScript evaluated in the page by the extractors
//!
//! Every script is an expression returning a JSON-serializable value.

/// Readiness probe polled before screenshots
pub const PAGE_READY_SCRIPT: &str = r#"
    (() => ({
        readyState: document.readyState,
        imagesLoaded: Array.from(document.images).every(img => img.complete),
        bodyExists: document.body !== null
    }))()
"#;

pub const TITLE_SCRIPT: &str = "document.title || ''";

/// Every `<meta>` tag keyed by name or property, plus canonical and language
pub const SEO_SCRIPT: &str = r#"
    (() => {
        const meta = {};
        document.querySelectorAll('meta').forEach(tag => {
            const name = tag.getAttribute('name') || tag.getAttribute('property') || tag.getAttribute('itemprop');
            const content = tag.getAttribute('content');
            if (name && content !== null) {
                meta[name] = content;
            }
        });
        return {
            meta,
            canonical_url: document.querySelector('link[rel="canonical"]')?.href || null,
            language: document.documentElement.lang || null
        };
    })()
"#;

/// Absolute URL of the declared icon, or `/favicon.ico` at the origin
pub const FAVICON_SCRIPT: &str = r#"
    (() => {
        const link = document.querySelector('link[rel~="icon"], link[rel="shortcut icon"], link[rel="apple-touch-icon"]');
        return link?.href || new URL('/favicon.ico', location.origin).href;
    })()
"#;

pub const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// Every link on the page with its anchor text, deduplicated by href
pub const OUTLINKS_SCRIPT: &str = r#"
    (() => {
        const seen = new Set();
        const links = [];
        for (const a of document.querySelectorAll('a[href]')) {
            const href = a.href;
            if (!href || seen.has(href)) continue;
            seen.add(href);
            links.push({ href, text: (a.innerText || '').trim().slice(0, 200), rel: a.rel || null });
        }
        return links;
    })()
"#;

/// Replaces open shadow roots with their rendered markup so DOM dumps keep them
pub const INLINE_SHADOW_DOM_SCRIPT: &str = r#"
    (() => {
        let inlined = 0;
        const walk = root => {
            for (const el of root.querySelectorAll('*')) {
                if (el.shadowRoot) {
                    walk(el.shadowRoot);
                    const template = document.createElement('template');
                    template.setAttribute('shadowrootmode', 'open');
                    template.innerHTML = el.shadowRoot.innerHTML;
                    el.prepend(template);
                    inlined += 1;
                }
            }
        };
        walk(document);
        return inlined;
    })()
"#;

/// Visibility measurements used for the quality score
pub const QA_PROBE_SCRIPT: &str = r#"
    (() => {
        const meta = name => document.querySelector(`meta[name="${name}"], meta[property="${name}"]`)?.content || null;
        const body = document.body;
        const text = body ? body.innerText || '' : '';
        const main = document.querySelector('main, article, [role="main"]') || body;
        const rect = main ? main.getBoundingClientRect() : { width: 0, height: 0 };
        let overlayArea = 0;
        for (const el of document.querySelectorAll('body *')) {
            const style = getComputedStyle(el);
            if ((style.position === 'fixed' || style.position === 'sticky') && style.visibility !== 'hidden' && style.display !== 'none') {
                const r = el.getBoundingClientRect();
                overlayArea += Math.max(0, r.width) * Math.max(0, r.height);
            }
        }
        const h1 = document.querySelector('h1')?.innerText?.trim() || null;
        const time = document.querySelector('time[datetime]')?.getAttribute('datetime') || null;
        return {
            text_length: text.trim().length,
            main_width: rect.width,
            main_height: rect.height,
            viewport_width: window.innerWidth,
            viewport_height: window.innerHeight,
            overlay_area: overlayArea,
            title: h1 || meta('og:title') || document.title || null,
            author: meta('author') || meta('article:author'),
            date: meta('article:published_time') || time,
            description: meta('description') || meta('og:description'),
            error_text: document.querySelector('#cf-error-details, .error-code, #main-frame-error')?.innerText?.trim() || null
        };
    })()
"#;
