use crate::db::DbPool;
use crate::inject;
use crate::models::item::{ContentItem, ItemType};
use crate::models::item_meta::ItemMeta;
use crate::models::settings::Setting;
use crate::render::html_escape;

const ADMIN_CSS: &str = r#"
        * { box-sizing: border-box; }
        body { margin: 0; font: 15px/1.5 -apple-system, "Segoe UI", sans-serif; color: #1e242b; background: #f2f4f7; }
        a { color: #0b5fff; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .layout { display: flex; min-height: 100vh; }
        .sidebar { width: 200px; flex-shrink: 0; background: #1e242b; color: #c8cfd8; padding: 1rem 0; }
        .sidebar .brand { display: block; color: #fff; font-weight: bold; font-size: 1.1rem; padding: 0.5rem 1.25rem 1rem; }
        .sidebar a.nav-item { display: block; color: #c8cfd8; padding: 0.5rem 1.25rem; }
        .sidebar a.nav-item:hover { background: #2a323c; text-decoration: none; }
        .sidebar a.nav-item.active { background: #2a323c; color: #fff; border-left: 3px solid #0b5fff; padding-left: calc(1.25rem - 3px); }
        .content { flex: 1; padding: 1.5rem 2rem; max-width: 64rem; }
        .notice { padding: 0.6rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
        .notice.success { background: #e6f6ec; border: 1px solid #9fd9b4; }
        .notice.error { background: #fdebea; border: 1px solid #f0b5b1; }
        .box { background: #fff; border: 1px solid #dde2e8; border-radius: 6px; padding: 1.25rem 1.5rem; margin-bottom: 1.5rem; }
        .box h3 { margin-top: 0; }
        label { display: block; font-weight: 600; margin: 0.75rem 0 0.25rem; }
        input[type=text], input[type=password], input[type=number], select, textarea { width: 100%; padding: 0.45rem 0.6rem; border: 1px solid #c3cad3; border-radius: 4px; font: inherit; }
        textarea { min-height: 7rem; }
        textarea.code { font-family: ui-monospace, "SF Mono", Consolas, monospace; font-size: 13px; min-height: 9rem; }
        .checkbox-row { margin: 0.5rem 0; font-weight: normal; }
        .button { display: inline-block; padding: 0.45rem 1rem; border: 1px solid #c3cad3; border-radius: 4px; background: #fff; color: #1e242b; font: inherit; cursor: pointer; }
        .button:hover { background: #f2f4f7; text-decoration: none; }
        .button.primary { background: #0b5fff; border-color: #0b5fff; color: #fff; }
        .button.primary:hover { background: #0a52da; }
        .button.danger { border-color: #c8372d; color: #c8372d; }
        .button:disabled { opacity: 0.6; cursor: wait; }
        table.list { width: 100%; border-collapse: collapse; background: #fff; }
        table.list th, table.list td { text-align: left; padding: 0.5rem 0.75rem; border-bottom: 1px solid #e5e9ee; }
        .muted { color: #6b7580; }
        .warning-line { color: slategray; }
        .stat-cards { display: flex; gap: 1rem; }
        .stat-cards .box { flex: 1; text-align: center; margin-bottom: 0; }
        .stat-cards .num { font-size: 2rem; font-weight: bold; display: block; }
        .tool-section { margin-bottom: 1rem; }
        .tool-results { display: none; margin-top: 0.75rem; padding: 0.75rem 1rem; border-radius: 4px; }
        .tool-results.show { display: block; background: #f7f9fb; border: 1px solid #dde2e8; }
        .tool-results.success { background: #e6f6ec; border-color: #9fd9b4; }
        .tool-results.warning { background: #fff7e0; border-color: #e8d28a; }
        .tool-results.error { background: #fdebea; border-color: #f0b5b1; }
        .tool-results table { width: 100%; border-collapse: collapse; margin: 0.5rem 0; background: #fff; }
        .tool-results th, .tool-results td { text-align: left; padding: 0.35rem 0.6rem; border: 1px solid #e5e9ee; }
        .danger-zone { border: 1px solid #c8372d; border-radius: 4px; padding: 0.75rem 1rem; background: #fdf3f2; }
        .progress-bar { height: 14px; background: #e5e9ee; border-radius: 7px; overflow: hidden; margin: 0.5rem 0; }
        .progress-fill { height: 100%; width: 0; background: #0b5fff; transition: width 0.2s; }
        .login-wrap { max-width: 22rem; margin: 12vh auto 0; }
"#;

fn admin_shell(
    pool: &DbPool,
    admin_slug: &str,
    active: &str,
    notice: Option<(&str, &str)>,
    body: &str,
) -> String {
    let site_name = Setting::get_or(pool, "site_name", "Inlay");
    let nav_item = |slug: &str, path: &str, label: &str| -> String {
        let class = if active == label {
            "nav-item active"
        } else {
            "nav-item"
        };
        format!(
            "            <a class=\"{}\" href=\"/{}{}\">{}</a>\n",
            class, slug, path, label
        )
    };

    let mut nav = String::new();
    nav.push_str(&nav_item(admin_slug, "", "Dashboard"));
    nav.push_str(&nav_item(admin_slug, "/posts", "Posts"));
    nav.push_str(&nav_item(admin_slug, "/pages", "Pages"));
    nav.push_str(&nav_item(admin_slug, "/settings", "Settings"));
    nav.push_str(&nav_item(admin_slug, "/tools", "Tools"));

    let notice_html = match notice {
        Some((kind, msg)) => format!(
            "        <div class=\"notice {}\">{}</div>\n",
            kind,
            html_escape(msg)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} Admin</title>
    <style>{css}    </style>
</head>
<body>
    <div class="layout">
        <nav class="sidebar">
            <a class="brand" href="/{slug}">{title}</a>
{nav}            <a class="nav-item" href="/" target="_blank">View site</a>
            <a class="nav-item" href="/{slug}/logout">Log out</a>
        </nav>
        <div class="content">
{notice}{body}        </div>
    </div>
</body>
</html>"#,
        title = html_escape(&site_name),
        css = ADMIN_CSS,
        slug = admin_slug,
        nav = nav,
        notice = notice_html,
        body = body,
    )
}

pub fn login_page(pool: &DbPool, admin_slug: &str, error: Option<&str>) -> String {
    let site_name = Setting::get_or(pool, "site_name", "Inlay");
    let error_html = match error {
        Some(msg) => format!(
            "            <div class=\"notice error\">{}</div>\n",
            html_escape(msg)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Log in — {title}</title>
    <style>{css}    </style>
</head>
<body>
    <div class="login-wrap">
        <div class="box">
            <h3>{title}</h3>
{error}            <form method="post" action="/{slug}/login">
                <label for="password">Password</label>
                <input type="password" id="password" name="password" autofocus required>
                <p><button type="submit" class="button primary">Log in</button></p>
            </form>
        </div>
    </div>
</body>
</html>"#,
        title = html_escape(&site_name),
        css = ADMIN_CSS,
        error = error_html,
        slug = admin_slug,
    )
}

pub fn dashboard(pool: &DbPool, admin_slug: &str) -> String {
    let posts = ContentItem::count(pool, Some("post"));
    let pages = ContentItem::count(pool, Some("page"));
    let injected = ItemMeta::count_with_keys(
        pool,
        "post",
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
    ) + ItemMeta::count_with_keys(
        pool,
        "page",
        inject::ITEM_HEADER_CODE,
        inject::ITEM_FOOTER_CODE,
    );

    let body = format!(
        r#"        <h2>Dashboard</h2>
        <div class="stat-cards">
            <div class="box"><span class="num">{posts}</span> <a href="/{slug}/posts">Posts</a></div>
            <div class="box"><span class="num">{pages}</span> <a href="/{slug}/pages">Pages</a></div>
            <div class="box"><span class="num">{injected}</span> <a href="/{slug}/tools">Items with injected code</a></div>
        </div>
"#,
        posts = posts,
        pages = pages,
        injected = injected,
        slug = admin_slug,
    );

    admin_shell(pool, admin_slug, "Dashboard", None, &body)
}

pub fn items_list(
    pool: &DbPool,
    admin_slug: &str,
    item_type: ItemType,
    items: &[ContentItem],
    notice: Option<(&str, &str)>,
) -> String {
    let type_name = item_type.as_str();
    let label = match item_type {
        ItemType::Post => "Posts",
        ItemType::Page => "Pages",
    };

    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            r#"            <tr>
                <td><a href="/{slug}/items/{id}/edit">{title}</a></td>
                <td class="muted">{item_slug}</td>
                <td>{status}</td>
                <td class="muted">{updated}</td>
                <td>
                    <form method="post" action="/{slug}/items/{id}/delete" onsubmit="return confirm('Delete this {type_name}? This cannot be undone.');">
                        <button type="submit" class="button danger">Delete</button>
                    </form>
                </td>
            </tr>
"#,
            slug = admin_slug,
            id = item.id,
            title = html_escape(&item.title),
            item_slug = html_escape(&item.slug),
            status = item.status,
            updated = item.updated_at.format("%Y-%m-%d %H:%M"),
            type_name = type_name,
        ));
    }
    if items.is_empty() {
        rows.push_str("            <tr><td colspan=\"5\" class=\"muted\">Nothing here yet.</td></tr>\n");
    }

    let body = format!(
        r#"        <h2>{label} <a class="button primary" href="/{slug}/items/new?item_type={type_name}" style="float:right">New {singular}</a></h2>
        <table class="list">
            <thead><tr><th>Title</th><th>Slug</th><th>Status</th><th>Updated</th><th></th></tr></thead>
            <tbody>
{rows}            </tbody>
        </table>
"#,
        label = label,
        slug = admin_slug,
        type_name = type_name,
        singular = match item_type {
            ItemType::Post => "post",
            ItemType::Page => "page",
        },
        rows = rows,
    );

    admin_shell(pool, admin_slug, label, notice, &body)
}

pub fn item_form(
    pool: &DbPool,
    admin_slug: &str,
    item_type: ItemType,
    item: Option<&ContentItem>,
    notice: Option<(&str, &str)>,
) -> String {
    let type_name = item_type.as_str();
    let (heading, action) = match item {
        Some(item) => (
            format!("Edit {}", type_name),
            format!("/{}/items/{}", admin_slug, item.id),
        ),
        None => (
            format!("New {}", type_name),
            format!("/{}/items", admin_slug),
        ),
    };

    let title = item.map(|i| i.title.as_str()).unwrap_or("");
    let slug_val = item.map(|i| i.slug.as_str()).unwrap_or("");
    let body_html = item.map(|i| i.body_html.as_str()).unwrap_or("");
    let status = item.map(|i| i.status.as_str()).unwrap_or("draft");
    let sel = |s: &str| if status == s { " selected" } else { "" };

    // The code fields only render while injection is enabled for this type.
    // Absent fields are left untouched on save, so disabling the switch
    // hides the code without deleting it.
    let code_box = if inject::enabled_for(pool, type_name) {
        let header_code = item
            .and_then(|i| ItemMeta::get(pool, i.id, inject::ITEM_HEADER_CODE))
            .unwrap_or_default();
        let footer_code = item
            .and_then(|i| ItemMeta::get(pool, i.id, inject::ITEM_FOOTER_CODE))
            .unwrap_or_default();
        format!(
            r#"        <div class="box">
            <h3>Code injection</h3>
            <p class="warning-line">🔥 Important: All code will be included as-is. The user is responsible for validating the code and ensuring its safety.</p>
            <label for="header_code">Add to HTML <code>&lt;head&gt;</code>:</label>
            <textarea class="code" id="header_code" name="header_code">{header}</textarea>
            <label for="footer_code">Add just before closing <code>&lt;/body&gt;</code> tag:</label>
            <textarea class="code" id="footer_code" name="footer_code">{footer}</textarea>
        </div>
"#,
            header = html_escape(&header_code),
            footer = html_escape(&footer_code),
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"        <h2>{heading}</h2>
        <form method="post" action="{action}">
        <input type="hidden" name="item_type" value="{type_name}">
        <div class="box">
            <label for="title">Title</label>
            <input type="text" id="title" name="title" value="{title}" required>
            <label for="slug">Slug <span class="muted">(leave blank to derive from the title)</span></label>
            <input type="text" id="slug" name="slug" value="{slug_val}">
            <label for="status">Status</label>
            <select id="status" name="status">
                <option value="draft"{sel_draft}>Draft</option>
                <option value="published"{sel_published}>Published</option>
            </select>
            <label for="body_html">Body (HTML)</label>
            <textarea class="code" id="body_html" name="body_html">{body_html}</textarea>
        </div>
{code_box}        <p><button type="submit" class="button primary">Save</button></p>
        </form>
"#,
        heading = heading,
        action = action,
        type_name = type_name,
        title = html_escape(title),
        slug_val = html_escape(slug_val),
        sel_draft = sel("draft"),
        sel_published = sel("published"),
        body_html = html_escape(body_html),
        code_box = code_box,
    );

    let active = match item_type {
        ItemType::Post => "Posts",
        ItemType::Page => "Pages",
    };
    admin_shell(pool, admin_slug, active, notice, &body)
}

pub fn settings_page(pool: &DbPool, admin_slug: &str, notice: Option<(&str, &str)>) -> String {
    let get = |key: &str, def: &str| html_escape(&Setting::get_or(pool, key, def));
    let checked = |key: &str| {
        if Setting::get_bool(pool, key) {
            " checked"
        } else {
            ""
        }
    };

    let body = format!(
        r#"        <h2>Settings</h2>
        <form method="post" action="/{slug}/settings">
        <div class="box">
            <h3>Site</h3>
            <label for="site_name">Site name</label>
            <input type="text" id="site_name" name="site_name" value="{site_name}" required>
            <label for="site_caption">Caption</label>
            <input type="text" id="site_caption" name="site_caption" value="{site_caption}">
            <label for="site_url">Site URL</label>
            <input type="text" id="site_url" name="site_url" value="{site_url}">
            <label for="posts_per_page">Posts per page</label>
            <input type="number" id="posts_per_page" name="posts_per_page" value="{posts_per_page}" min="1">
            <label for="admin_slug">Admin slug <span class="muted">(takes effect after restart)</span></label>
            <input type="text" id="admin_slug" name="admin_slug" value="{admin_slug_val}">
        </div>
        <div class="box">
            <h3>Code injection</h3>
            <p>Control whether per-item code injection is enabled for posts and pages. Disabling hides the code fields on edit screens and prevents output; the stored data is not deleted.</p>
            <label class="checkbox-row"><input type="checkbox" name="inject_enable_for_posts" value="true"{posts_checked}> Enable for posts</label>
            <label class="checkbox-row"><input type="checkbox" name="inject_enable_for_pages" value="true"{pages_checked}> Enable for pages</label>
        </div>
        <div class="box">
            <h3>Global scripts and code</h3>
            <p>Code entered into the fields below will be added to the HTML <code>&lt;head&gt;</code> and the end of the page just before the closing <code>&lt;/body&gt;</code> tag, respectively.</p>
            <p class="warning-line">🔥 Important: All code will be included as-is. The user is responsible for validating the code and ensuring its safety.</p>
            <label for="{header_key}">Header code</label>
            <textarea class="code" id="{header_key}" name="{header_key}">{header_code}</textarea>
            <label for="{footer_key}">Footer code</label>
            <textarea class="code" id="{footer_key}" name="{footer_key}">{footer_code}</textarea>
        </div>
        <p><button type="submit" class="button primary">Save Settings</button></p>
        </form>
        <form method="post" action="/{slug}/settings/password">
        <div class="box">
            <h3>Change password</h3>
            <label for="new_password">New password <span class="muted">(at least 8 characters)</span></label>
            <input type="password" id="new_password" name="new_password" required>
            <label for="confirm_password">Confirm password</label>
            <input type="password" id="confirm_password" name="confirm_password" required>
            <p><button type="submit" class="button">Change Password</button></p>
        </div>
        </form>
"#,
        slug = admin_slug,
        site_name = get("site_name", "Inlay"),
        site_caption = get("site_caption", ""),
        site_url = get("site_url", "http://localhost:8000"),
        posts_per_page = get("posts_per_page", "10"),
        admin_slug_val = get("admin_slug", "admin"),
        posts_checked = checked(inject::ENABLE_FOR_POSTS),
        pages_checked = checked(inject::ENABLE_FOR_PAGES),
        header_key = inject::GLOBAL_HEADER_CODE,
        header_code = get(inject::GLOBAL_HEADER_CODE, ""),
        footer_key = inject::GLOBAL_FOOTER_CODE,
        footer_code = get(inject::GLOBAL_FOOTER_CODE, ""),
    );

    admin_shell(pool, admin_slug, "Settings", notice, &body)
}

const TOOLS_JS: &str = r#"
function esc(s) {
    return String(s).replace(/&/g, '&amp;').replace(/</g, '&lt;').replace(/>/g, '&gt;').replace(/"/g, '&quot;');
}

async function call(action, body) {
    const res = await fetch(API + '/' + action, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body)
    });
    return res.json();
}

function show(el, kind, html) {
    el.className = 'tool-results show' + (kind ? ' ' + kind : '');
    el.innerHTML = html;
}

function showError(el, message) {
    show(el, 'error', '<p><strong>Error:</strong> ' + esc(message) + '</p>');
}

// ── Legacy migration ──

async function detectLegacy(type, button) {
    const results = document.getElementById('detect-' + type + '-results');
    button.disabled = true;
    results.className = 'tool-results';
    results.innerHTML = '';
    try {
        const response = await call('detect-legacy', { type: type, nonce: MIGRATION_NONCE });
        if (response.success) {
            displayDetectResults(response.data, type, results);
        } else {
            showError(results, response.message || 'An error occurred');
        }
    } catch (e) {
        showError(results, 'Failed to communicate with server');
    }
    button.disabled = false;
}

function displayDetectResults(data, type, results) {
    if (data.found === 0) {
        show(results, 'success', '<p><strong>No legacy data found.</strong> All data is using the new field names.</p>');
        return;
    }

    let html = '<p><strong>Found ' + data.found + ' item(s) with legacy data:</strong></p>';

    if (type === 'global') {
        html += '<ul>';
        if (data.items.header) {
            html += '<li>Global Header Code (attr_global_header_code)</li>';
        }
        if (data.items.footer) {
            html += '<li>Global Footer Code (attr_global_footer_code)</li>';
        }
        html += '</ul>';
        html += '<button type="button" class="button primary" onclick="migrateLegacy(\'global\', this)">Migrate Global Data</button>';
    } else {
        html += '<table><thead><tr><th>ID</th><th>Title</th><th>Legacy Fields</th></tr></thead><tbody>';
        data.items.forEach(function(item) {
            html += '<tr><td>' + item.id + '</td><td>' + esc(item.title) + '</td><td>' + item.fields.join(', ') + '</td></tr>';
        });
        html += '</tbody></table>';
        html += '<button type="button" class="button primary" onclick="migrateLegacy(\'' + type + '\', this)">Migrate All ' + data.found + ' Item(s)</button>';
    }

    show(results, 'warning', html);
}

async function migrateLegacy(type, button) {
    if (!confirm('Are you sure you want to migrate this data? This will copy the legacy data to the new fields and delete the old fields.')) {
        return;
    }
    const results = document.getElementById('detect-' + type + '-results');
    button.disabled = true;
    try {
        const response = await call('migrate-legacy', { type: type, nonce: MIGRATION_NONCE });
        if (response.success) {
            show(results, 'success', '<p><strong>Success!</strong> ' + esc(response.data.message) + '</p>');
        } else {
            showError(results, response.message || 'Migration failed');
        }
    } catch (e) {
        showError(results, 'Failed to communicate with server');
    }
}

// ── Usage report ──

async function usageReport(type, button) {
    const results = document.getElementById('usage-' + type + '-results');
    button.disabled = true;
    results.className = 'tool-results';
    results.innerHTML = '';
    try {
        const response = await call('usage-report', { type: type, nonce: DATA_NONCE });
        if (response.success) {
            displayUsageReport(response.data, type, results);
        } else {
            showError(results, response.message || 'An error occurred');
        }
    } catch (e) {
        showError(results, 'Failed to communicate with server');
    }
    button.disabled = false;
}

function displayUsageReport(data, type, results) {
    if (data.found === 0) {
        show(results, 'success', '<p><strong>No ' + type + 's found with code injection data.</strong></p>');
        return;
    }

    let html = '<p><strong>Found ' + data.found + ' ' + type + '(s) with code:</strong></p>';
    html += '<p>' + data.header_count + ' with header only, ' + data.footer_count + ' with footer only, ' + data.both_count + ' with both</p>';
    html += '<table><thead><tr><th>ID</th><th>Title</th><th>Fields</th><th>Actions</th></tr></thead><tbody>';
    data.items.forEach(function(item) {
        html += '<tr><td>' + item.id + '</td><td>' + esc(item.title) + '</td><td>' + item.fields.join(', ') + '</td>';
        html += '<td><a href="' + item.edit_url + '" target="_blank">Edit</a></td></tr>';
    });
    html += '</tbody></table>';

    show(results, 'warning', html);
}

// ── Bulk deletion ──

async function checkCount(type, button) {
    const results = document.getElementById('delete-' + type + '-results');
    button.disabled = true;
    results.className = 'tool-results';
    results.innerHTML = '';
    try {
        const response = await call('delete-count', { type: type, nonce: DATA_NONCE });
        if (response.success) {
            displayCount(response.data.count, type, results);
        } else {
            showError(results, response.message || 'An error occurred');
        }
    } catch (e) {
        showError(results, 'Failed to communicate with server');
    }
    button.disabled = false;
}

function displayCount(count, type, results) {
    if (count === 0) {
        show(results, 'success', '<p><strong>No ' + type + 's found with code injection data.</strong></p>');
        return;
    }

    let html = '<div class="danger-zone">';
    html += '<p><strong>⚠️ Warning: Destructive Action</strong></p>';
    html += '<p>Found <strong>' + count + ' ' + type + '(s)</strong> with code injection data.</p>';
    html += '<p>This action will permanently delete all code injection data from these ' + type + 's. This cannot be undone!</p>';
    html += '<button type="button" class="button primary" onclick="deleteAll(\'' + type + '\', ' + count + ', this)">Delete All ' + count + ' Item(s)</button>';
    html += '</div>';

    show(results, 'warning', html);
}

async function deleteAll(type, totalCount, button) {
    const confirmation = prompt(
        '⚠️ PERMANENT DELETION WARNING\n\n' +
        'You are about to delete code injection data from ' + totalCount + ' ' + type + '(s).\n\n' +
        'This action CANNOT be undone!\n\n' +
        'Type "DELETE" (in capital letters) to confirm:'
    );

    if (confirmation !== 'DELETE') {
        alert('Deletion cancelled. The text you entered did not match "DELETE".');
        return;
    }

    const results = document.getElementById('delete-' + type + '-results');
    let html = '<div class="progress-container"><p><strong>Deleting...</strong></p>';
    html += '<div class="progress-bar"><div class="progress-fill" style="width: 0%"></div></div>';
    html += '<p class="progress-text">0 / ' + totalCount + ' (0%)</p></div>';
    show(results, '', html);

    const batchSize = 50;
    let processed = 0;
    let hasError = false;

    while (processed < totalCount && !hasError) {
        try {
            // Each batch re-queries the live set, so the offset stays at zero.
            const response = await call('delete-batch', { type: type, offset: 0, limit: batchSize, nonce: DATA_NONCE });

            if (!response.success) {
                hasError = true;
                showError(results, response.message || 'Batch deletion failed');
                break;
            }

            processed += response.data.deleted;

            const percentage = Math.round((processed / totalCount) * 100);
            results.querySelector('.progress-fill').style.width = percentage + '%';
            results.querySelector('.progress-text').textContent = processed + ' / ' + totalCount + ' (' + percentage + '%)';

            // Nothing deleted means the live set is exhausted
            if (response.data.deleted === 0) {
                break;
            }
        } catch (e) {
            hasError = true;
            showError(results, 'Failed to communicate with server');
            break;
        }
    }

    if (!hasError) {
        show(results, 'success', '<p><strong>Success!</strong> Deleted code injection data from ' + processed + ' ' + type + '(s).</p>');
    }
}

async function deleteGlobal(button) {
    if (!confirm('Are you sure you want to delete all global code? This action cannot be undone!')) {
        return;
    }
    const results = document.getElementById('delete-global-results');
    button.disabled = true;
    try {
        const response = await call('delete-global', { nonce: DATA_NONCE });
        if (response.success) {
            show(results, 'success', '<p><strong>Success!</strong> ' + esc(response.data.message) + '</p>');
        } else {
            showError(results, response.message || 'Deletion failed');
        }
    } catch (e) {
        showError(results, 'Failed to communicate with server');
    }
    button.disabled = false;
}
"#;

pub fn tools_page(
    pool: &DbPool,
    admin_slug: &str,
    migration_nonce: &str,
    data_tools_nonce: &str,
) -> String {
    let body = format!(
        r#"        <h2>Tools</h2>

        <div class="box">
            <h3>Legacy Data Migration</h3>
            <p>This tool helps you migrate data from the old field names (attr_*) to the current ones.</p>
            <p>Click each button below to detect legacy data that needs migration:</p>

            <div class="tool-section">
                <h4>Global Settings</h4>
                <p class="muted">Check for legacy global header and footer code options.</p>
                <button type="button" class="button" onclick="detectLegacy('global', this)">Detect Global Legacy Data</button>
                <div class="tool-results" id="detect-global-results"></div>
            </div>

            <div class="tool-section">
                <h4>Posts</h4>
                <p class="muted">Check all posts for legacy fields.</p>
                <button type="button" class="button" onclick="detectLegacy('post', this)">Detect Post Legacy Data</button>
                <div class="tool-results" id="detect-post-results"></div>
            </div>

            <div class="tool-section">
                <h4>Pages</h4>
                <p class="muted">Check all pages for legacy fields.</p>
                <button type="button" class="button" onclick="detectLegacy('page', this)">Detect Page Legacy Data</button>
                <div class="tool-results" id="detect-page-results"></div>
            </div>
        </div>

        <div class="box">
            <h3>Usage Report</h3>
            <p>View which posts and pages currently have code injection data.</p>

            <div class="tool-section">
                <button type="button" class="button" onclick="usageReport('post', this)">Check Posts Usage</button>
                <div class="tool-results" id="usage-post-results"></div>
            </div>

            <div class="tool-section">
                <button type="button" class="button" onclick="usageReport('page', this)">Check Pages Usage</button>
                <div class="tool-results" id="usage-page-results"></div>
            </div>
        </div>

        <div class="box">
            <h3>Bulk Data Deletion</h3>
            <p>Permanently delete all code injection data. These actions cannot be undone!</p>

            <div class="tool-section">
                <h4>Global Settings</h4>
                <div class="danger-zone">
                    <p><strong>⚠️ Warning: This will delete global code that appears on all pages!</strong></p>
                    <button type="button" class="button danger" onclick="deleteGlobal(this)">Delete Global Code</button>
                </div>
                <div class="tool-results" id="delete-global-results"></div>
            </div>

            <div class="tool-section">
                <h4>Post Metadata</h4>
                <p class="muted">Delete code injection data from all posts.</p>
                <button type="button" class="button" onclick="checkCount('post', this)">Check Posts</button>
                <div class="tool-results" id="delete-post-results"></div>
            </div>

            <div class="tool-section">
                <h4>Page Metadata</h4>
                <p class="muted">Delete code injection data from all pages.</p>
                <button type="button" class="button" onclick="checkCount('page', this)">Check Pages</button>
                <div class="tool-results" id="delete-page-results"></div>
            </div>
        </div>

        <script>
        const API = '/{slug}/api/inject';
        const MIGRATION_NONCE = '{migration_nonce}';
        const DATA_NONCE = '{data_nonce}';
        {tools_js}
        </script>
"#,
        slug = admin_slug,
        migration_nonce = migration_nonce,
        data_nonce = data_tools_nonce,
        tools_js = TOOLS_JS,
    );

    admin_shell(pool, admin_slug, "Tools", None, &body)
}
