pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- stories table
CREATE TABLE IF NOT EXISTS stories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    remote_id INTEGER NOT NULL UNIQUE,
    title TEXT NOT NULL,
    translated_title TEXT,
    url TEXT NOT NULL,
    body_text TEXT,
    translated_body TEXT,
    abstract TEXT,
    -- which enrichment step produced `abstract`
    abstract_source TEXT,
    score INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    author TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    fetched_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stories_fetched_at ON stories(fetched_at DESC);
CREATE INDEX IF NOT EXISTS idx_stories_comment_count ON stories(comment_count DESC);

-- comments table
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id),
    remote_comment_id INTEGER NOT NULL UNIQUE,
    parent_id INTEGER,
    author TEXT NOT NULL,
    body_text TEXT NOT NULL,
    translated_body TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_story_id ON comments(story_id);
"#;
