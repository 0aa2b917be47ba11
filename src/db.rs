use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file("site/db/inlay.db");
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Content items (posts and pages share one table)
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            item_type TEXT NOT NULL DEFAULT 'post',
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            body_html TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'draft',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Per-item metadata (key-value, one value per item per key)
        CREATE TABLE IF NOT EXISTS item_meta (
            id INTEGER PRIMARY KEY,
            item_id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL DEFAULT '',
            UNIQUE(item_id, key),
            FOREIGN KEY (item_id) REFERENCES items(id)
        );

        CREATE INDEX IF NOT EXISTS idx_item_meta_key ON item_meta(key);

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "Inlay"),
        ("site_caption", ""),
        ("site_url", "http://localhost:8000"),
        ("admin_slug", "admin"),
        ("posts_per_page", "10"),
        // Security
        ("session_expiry_hours", "24"),
        ("login_rate_limit", "5"),
        // Code injection
        ("inject_enable_for_posts", "false"),
        ("inject_enable_for_pages", "true"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed the anti-forgery token secret if not set
    let secret_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'nonce_secret'",
        [],
        |row| row.get(0),
    )?;

    if secret_exists == 0 {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('nonce_secret', ?1)",
            params![hex::encode(bytes)],
        )?;
    }

    // Seed admin password if not set
    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        // Default password: "admin" — changeable from the settings page
        let hash = bcrypt::hash("admin", bcrypt::DEFAULT_COST)
            .map_err(|e| format!("Failed to hash default password: {}", e))?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
    }

    Ok(())
}
