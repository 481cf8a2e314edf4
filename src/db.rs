use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const DEFAULT_DB_PATH: &str = "website/db/qurra.db";

/// Database path from `QURRA_DB_PATH`, falling back to the bundled location.
pub fn db_path() -> String {
    std::env::var("QURRA_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

pub fn init_pool_at(path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    // foreign_keys is per-connection, so it has to run for every pooled connection
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"));
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Accounts and their role
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            avatar_url TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Login sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
        );

        -- Reciters
        CREATE TABLE IF NOT EXISTS readers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            image TEXT,
            district TEXT NOT NULL,
            sample_link TEXT NOT NULL,
            mosque_link TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_readers_created ON readers(created_at);

        -- Favorites: one row per (user, reciter)
        CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            reader_id INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, reader_id),
            FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE,
            FOREIGN KEY (reader_id) REFERENCES readers(id) ON DELETE CASCADE
        );

        -- Visitor submissions awaiting approval
        CREATE TABLE IF NOT EXISTS requests (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            sample_link TEXT NOT NULL,
            district TEXT NOT NULL,
            mosque_link TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Comment wall
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            user_id INTEGER,
            author_name TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE SET NULL
        );

        -- One-time signup codes
        CREATE TABLE IF NOT EXISTS email_otps (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL,
            otp TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            used INTEGER NOT NULL DEFAULT 0,
            expires_at DATETIME NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_otps_email ON email_otps(email);

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "قرّاء"),
        ("site_url", "http://localhost:8000"),
        // Accounts
        ("session_expiry_hours", "168"),
        ("signup_require_otp", "false"),
        ("otp_expiry_minutes", "10"),
        // Images
        ("image_domains", "lh3.googleusercontent.com,avatar.iran.liara.run"),
        ("default_reciter_image", "https://avatar.iran.liara.run/public/50"),
        ("avatar_max_upload_mb", "2"),
        ("avatar_size", "256"),
        // Email
        ("email_smtp_host", ""),
        ("email_smtp_port", "587"),
        ("email_smtp_username", ""),
        ("email_smtp_password", ""),
        ("email_from_address", ""),
        // Background tasks (minutes)
        ("task_session_cleanup_interval", "30"),
        ("task_otp_cleanup_interval", "60"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    Ok(())
}
