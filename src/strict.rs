use kuchiki::traits::TendrilSink as _;

/// Fails when the report would load anything from outside its execution directory.
pub fn assert_offline(html: &str) -> anyhow::Result<()> {
    let doc = kuchiki::parse_html().one(html);

    for selector in ["script[src]", "link[href]", "img[src]", "iframe[src]"] {
        if let Ok(nodes) = doc.select(selector) {
            for node in nodes {
                let attrs = node.attributes.borrow();
                for attr in ["src", "href"] {
                    if let Some(v) = attrs.get(attr) {
                        if is_remote(v) {
                            anyhow::bail!(
                                "offline check failed: <{} {}=\"{}\"> is not local",
                                node.name.local.as_ref(),
                                attr,
                                v
                            );
                        }
                    }
                }
            }
        }
    }

    if let Ok(nodes) = doc.select("[style]") {
        for node in nodes {
            if let Some(style) = node.attributes.borrow().get("style") {
                if has_remote_url(style) {
                    anyhow::bail!("offline check failed: style attribute contains remote url()");
                }
            }
        }
    }
    if let Ok(nodes) = doc.select("style") {
        for node in nodes {
            let text = node.text_contents();
            if has_remote_url(&text) || text.to_ascii_lowercase().contains("@import") {
                anyhow::bail!("offline check failed: <style> references remote resources");
            }
        }
    }

    Ok(())
}

fn is_remote(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//")
}

fn has_remote_url(css: &str) -> bool {
    let re = regex::Regex::new(r#"(?i)url\(\s*["']?\s*(?:https?:)?//"#).expect("remote url regex");
    re.is_match(css)
}
