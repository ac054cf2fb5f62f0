//! Database schema and migrations for ByteBucket.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. The schema_version table tracks which migrations have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - folders, files, tags, file_tags, file_metadata
    r#"
-- Folder tree; root folders have a NULL parent
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (name <> ''),
    parent_id   INTEGER REFERENCES folders(id) ON DELETE CASCADE,
    UNIQUE (name, parent_id)
);

-- UNIQUE (name, parent_id) treats NULL parents as distinct
CREATE UNIQUE INDEX idx_folders_root_name ON folders(name) WHERE parent_id IS NULL;
CREATE INDEX idx_folders_parent_id ON folders(parent_id);

CREATE TABLE files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL CHECK (name <> ''),
    folder_id     INTEGER NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at    TEXT NOT NULL DEFAULT (datetime('now')),
    size          INTEGER NOT NULL DEFAULT 0,
    content_type  TEXT NOT NULL DEFAULT 'application/octet-stream',
    storage_id    TEXT NOT NULL UNIQUE
);

CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_name ON files(name);

CREATE TABLE tags (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE CHECK (name <> '')
);

CREATE TABLE file_tags (
    file_id  INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    tag_id   INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, tag_id)
);

CREATE INDEX idx_file_tags_tag_id ON file_tags(tag_id);

CREATE TABLE file_metadata (
    file_id  INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    key      TEXT NOT NULL CHECK (key <> ''),
    value    TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (file_id, key)
);
"#,
];
