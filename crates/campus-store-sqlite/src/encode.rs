//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings,
//! directions the integers `1` / `-1`, counters non-negative integers.

use campus_core::{
  content::{Answer, Question, Topic},
  vote::{Direction, TargetRef, TargetType, VoteCounts, VoteRecord},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Vote enums ───────────────────────────────────────────────────────────────

pub fn decode_target_type(s: &str) -> Result<TargetType> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown target type: {s:?}")))
}

pub fn encode_direction(d: Direction) -> i64 { i8::from(d) as i64 }

pub fn decode_direction(v: i64) -> Result<Direction> {
  Direction::try_from(v).map_err(|_| Error::Decode(format!("unknown direction: {v}")))
}

/// Table and primary-key column holding each kind of target.
pub fn target_table(t: TargetType) -> (&'static str, &'static str) {
  match t {
    TargetType::Topic => ("topics", "topic_id"),
    TargetType::Question => ("questions", "question_id"),
    TargetType::Answer => ("answers", "answer_id"),
  }
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `%`, `_` and `\` so `s` matches literally under `ESCAPE '\'`.
pub fn like_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

pub fn contains_pattern(s: &str) -> String { format!("%{}%", like_escape(s)) }

pub fn prefix_pattern(s: &str) -> String { format!("{}%", like_escape(s)) }

// ─── Counters ─────────────────────────────────────────────────────────────────

pub fn decode_counts(upvotes: i64, downvotes: i64) -> Result<VoteCounts> {
  let up = u64::try_from(upvotes)
    .map_err(|_| Error::Decode(format!("negative upvote counter: {upvotes}")))?;
  let down = u64::try_from(downvotes)
    .map_err(|_| Error::Decode(format!("negative downvote counter: {downvotes}")))?;
  Ok(VoteCounts::new(up, down))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:     String,
  pub user_id:     String,
  pub target_type: String,
  pub target_id:   String,
  pub direction:   i64,
  pub created_at:  String,
  pub updated_at:  String,
}

pub const VOTE_COLUMNS: &str =
  "vote_id, user_id, target_type, target_id, direction, created_at, updated_at";

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:     row.get(0)?,
      user_id:     row.get(1)?,
      target_type: row.get(2)?,
      target_id:   row.get(3)?,
      direction:   row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<VoteRecord> {
    Ok(VoteRecord {
      vote_id:    decode_uuid(&self.vote_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      target:     TargetRef::new(
        decode_target_type(&self.target_type)?,
        decode_uuid(&self.target_id)?,
      ),
      direction:  decode_direction(self.direction)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `topics` row.
pub struct RawTopic {
  pub topic_id:    String,
  pub name:        String,
  pub description: String,
  pub created_by:  String,
  pub upvotes:     i64,
  pub downvotes:   i64,
  pub created_at:  String,
}

pub const TOPIC_COLUMNS: &str =
  "topic_id, name, description, created_by, upvotes, downvotes, created_at";

impl RawTopic {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      topic_id:    row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      created_by:  row.get(3)?,
      upvotes:     row.get(4)?,
      downvotes:   row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      topic_id:    decode_uuid(&self.topic_id)?,
      name:        self.name,
      description: self.description,
      created_by:  decode_uuid(&self.created_by)?,
      counts:      decode_counts(self.upvotes, self.downvotes)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `questions` row.
pub struct RawQuestion {
  pub question_id:         String,
  pub topic_id:            String,
  pub title:               String,
  pub problem_description: String,
  pub attempted_solutions: String,
  pub failure_point:       String,
  pub solution_needed:     String,
  pub additional_details:  String,
  pub author_id:           String,
  pub upvotes:             i64,
  pub downvotes:           i64,
  pub created_at:          String,
}

pub const QUESTION_COLUMNS: &str = "question_id, topic_id, title, problem_description, \
   attempted_solutions, failure_point, solution_needed, additional_details, \
   author_id, upvotes, downvotes, created_at";

impl RawQuestion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:         row.get(0)?,
      topic_id:            row.get(1)?,
      title:               row.get(2)?,
      problem_description: row.get(3)?,
      attempted_solutions: row.get(4)?,
      failure_point:       row.get(5)?,
      solution_needed:     row.get(6)?,
      additional_details:  row.get(7)?,
      author_id:           row.get(8)?,
      upvotes:             row.get(9)?,
      downvotes:           row.get(10)?,
      created_at:          row.get(11)?,
    })
  }

  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      question_id:         decode_uuid(&self.question_id)?,
      topic_id:            decode_uuid(&self.topic_id)?,
      title:               self.title,
      problem_description: self.problem_description,
      attempted_solutions: self.attempted_solutions,
      failure_point:       self.failure_point,
      solution_needed:     self.solution_needed,
      additional_details:  self.additional_details,
      author_id:           decode_uuid(&self.author_id)?,
      counts:              decode_counts(self.upvotes, self.downvotes)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `answers` row.
pub struct RawAnswer {
  pub answer_id:   String,
  pub question_id: String,
  pub content:     String,
  pub author_id:   String,
  pub upvotes:     i64,
  pub downvotes:   i64,
  pub created_at:  String,
}

pub const ANSWER_COLUMNS: &str =
  "answer_id, question_id, content, author_id, upvotes, downvotes, created_at";

impl RawAnswer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      answer_id:   row.get(0)?,
      question_id: row.get(1)?,
      content:     row.get(2)?,
      author_id:   row.get(3)?,
      upvotes:     row.get(4)?,
      downvotes:   row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_answer(self) -> Result<Answer> {
    Ok(Answer {
      answer_id:   decode_uuid(&self.answer_id)?,
      question_id: decode_uuid(&self.question_id)?,
      content:     self.content,
      author_id:   decode_uuid(&self.author_id)?,
      counts:      decode_counts(self.upvotes, self.downvotes)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
