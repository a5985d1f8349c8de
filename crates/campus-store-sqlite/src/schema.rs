//! SQL schema for the College Connect SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS topics (
    topic_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes   >= 0),
    downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    question_id         TEXT PRIMARY KEY,
    topic_id            TEXT NOT NULL REFERENCES topics(topic_id),
    title               TEXT NOT NULL,
    problem_description TEXT NOT NULL,
    attempted_solutions TEXT NOT NULL,
    failure_point       TEXT NOT NULL,
    solution_needed     TEXT NOT NULL,
    additional_details  TEXT NOT NULL DEFAULT '',
    author_id           TEXT NOT NULL,
    upvotes             INTEGER NOT NULL DEFAULT 0 CHECK (upvotes   >= 0),
    downvotes           INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS answers (
    answer_id   TEXT PRIMARY KEY,
    question_id TEXT NOT NULL REFERENCES questions(question_id),
    content     TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes   >= 0),
    downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
    created_at  TEXT NOT NULL
);

-- One active vote per user per target per type. target_id is polymorphic
-- over the three content tables, so there is no foreign key.
CREATE TABLE IF NOT EXISTS votes (
    vote_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    target_type TEXT NOT NULL,     -- 'Topic' | 'Question' | 'Answer'
    target_id   TEXT NOT NULL,
    direction   INTEGER NOT NULL CHECK (direction IN (1, -1)),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (user_id, target_id, target_type)
);

CREATE INDEX IF NOT EXISTS questions_topic_idx   ON questions(topic_id, created_at);
CREATE INDEX IF NOT EXISTS answers_question_idx  ON answers(question_id, created_at);
CREATE INDEX IF NOT EXISTS votes_user_type_idx   ON votes(user_id, target_type);

PRAGMA user_version = 1;
";
