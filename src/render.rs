use crate::db::DbPool;
use crate::inject::{self, Position};
use crate::models::item::ContentItem;
use crate::models::settings::Setting;

const BASE_CSS: &str = r#"
        :root { --fg: #1a1a1a; --muted: #6b6b6b; --accent: #0b5fff; --bg: #ffffff; }
        * { box-sizing: border-box; }
        body { margin: 0 auto; max-width: 42rem; padding: 0 1.25rem; color: var(--fg); background: var(--bg); font: 17px/1.6 Georgia, serif; }
        a { color: var(--accent); text-decoration: none; }
        a:hover { text-decoration: underline; }
        .site-header { padding: 2.5rem 0 1.5rem; border-bottom: 1px solid #e5e5e5; }
        .site-name { font-size: 1.4rem; font-weight: bold; color: var(--fg); }
        .site-caption { color: var(--muted); margin-top: 0.25rem; }
        main { padding: 1.5rem 0; min-height: 50vh; }
        .post-list { list-style: none; padding: 0; }
        .post-list li { padding: 0.4rem 0; }
        .post-list time { color: var(--muted); font-size: 0.85em; margin-left: 0.5rem; }
        article h1 { margin-top: 0.5rem; }
        .site-footer { padding: 1.5rem 0 2.5rem; border-top: 1px solid #e5e5e5; color: var(--muted); font-size: 0.9em; }
"#;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Full document shell for the public site. The injection fragments land at
/// the end of `<head>` and just before `</body>`; both are empty strings when
/// nothing is configured, so the shell stays byte-identical in that case.
pub fn page_shell(pool: &DbPool, title: &str, body: &str, item: Option<&ContentItem>) -> String {
    let site_name = Setting::get_or(pool, "site_name", "Inlay");
    let head_inject = inject::fragment(pool, Position::Header, item);
    let footer_inject = inject::fragment(pool, Position::Footer, item);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}    </style>
{head_inject}</head>
<body>
    <header class="site-header">
        <a class="site-name" href="/">{site_name}</a>
    </header>
    <main>
{body}    </main>
    <footer class="site-footer">
        <p>&copy; {year} {site_name}</p>
    </footer>
{footer_inject}</body>
</html>"#,
        title = html_escape(title),
        css = BASE_CSS,
        head_inject = head_inject,
        site_name = html_escape(&site_name),
        body = body,
        year = chrono::Utc::now().format("%Y"),
        footer_inject = footer_inject,
    )
}

pub fn home_page(pool: &DbPool, posts: &[ContentItem]) -> String {
    let site_name = Setting::get_or(pool, "site_name", "Inlay");
    let caption = Setting::get_or(pool, "site_caption", "");

    let mut body = String::new();
    if !caption.is_empty() {
        body.push_str(&format!(
            "    <p class=\"site-caption\">{}</p>\n",
            html_escape(&caption)
        ));
    }
    if posts.is_empty() {
        body.push_str("    <p>No posts yet.</p>\n");
    } else {
        body.push_str("    <ul class=\"post-list\">\n");
        for post in posts {
            body.push_str(&format!(
                "        <li><a href=\"/posts/{}\">{}</a><time>{}</time></li>\n",
                post.slug,
                html_escape(&post.title),
                post.created_at.format("%Y-%m-%d"),
            ));
        }
        body.push_str("    </ul>\n");
    }

    page_shell(pool, &site_name, &body, None)
}

pub fn item_page(pool: &DbPool, item: &ContentItem) -> String {
    let body = format!(
        "    <article>\n        <h1>{}</h1>\n{}\n    </article>\n",
        html_escape(&item.title),
        item.body_html,
    );
    page_shell(pool, &item.title, &body, Some(item))
}
