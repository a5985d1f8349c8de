//! [`SqliteStore`]: the SQLite implementation of [`VoteStore`] and
//! [`ContentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use campus_core::{
  content::{Answer, NewAnswer, NewQuestion, NewTopic, Question, Topic},
  search::{SearchMatches, Suggestion, SuggestionKind},
  store::{ContentStore, InsertOutcome, VoteStore},
  vote::{
    CounterDelta, Direction, TargetRef, TargetType, VoteCounts, VoteKey, VoteRecord,
  },
};

use crate::{
  Error, Result,
  encode::{
    ANSWER_COLUMNS, QUESTION_COLUMNS, RawAnswer, RawQuestion, RawTopic, RawVote,
    TOPIC_COLUMNS, VOTE_COLUMNS, contains_pattern, decode_counts, encode_direction,
    encode_dt, encode_uuid, prefix_pattern, target_table,
  },
  schema::SCHEMA,
};

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A College Connect store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Whether `target` exists in its content table.
  async fn exists(&self, target: TargetRef) -> Result<bool> {
    Ok(self.find_counts(target).await?.is_some())
  }
}

// ─── VoteStore impl ──────────────────────────────────────────────────────────

impl VoteStore for SqliteStore {
  type Error = Error;

  async fn find_counts(&self, target: TargetRef) -> Result<Option<VoteCounts>> {
    let (table, id_col) = target_table(target.target_type);
    let id_str = encode_uuid(target.target_id);

    let raw: Option<(i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT upvotes, downvotes FROM {table} WHERE {id_col} = ?1"),
            rusqlite::params![id_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw.map(|(up, down)| decode_counts(up, down)).transpose()
  }

  async fn find_vote(&self, key: VoteKey) -> Result<Option<VoteRecord>> {
    let user_str   = encode_uuid(key.user_id);
    let target_str = encode_uuid(key.target.target_id);
    let type_str   = key.target.target_type.as_str();

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {VOTE_COLUMNS} FROM votes
               WHERE user_id = ?1 AND target_id = ?2 AND target_type = ?3"
            ),
            rusqlite::params![user_str, target_str, type_str],
            RawVote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_record).transpose()
  }

  async fn find_votes(
    &self,
    user_id:     Uuid,
    target_type: TargetType,
    target_ids:  &[Uuid],
  ) -> Result<Vec<VoteRecord>> {
    if target_ids.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = vec!["?"; target_ids.len()].join(", ");
    let sql = format!(
      "SELECT {VOTE_COLUMNS} FROM votes
       WHERE user_id = ? AND target_type = ? AND target_id IN ({placeholders})"
    );

    let mut params: Vec<String> = Vec::with_capacity(target_ids.len() + 2);
    params.push(encode_uuid(user_id));
    params.push(target_type.as_str().to_owned());
    params.extend(target_ids.iter().copied().map(encode_uuid));

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_record).collect()
  }

  async fn insert_vote(&self, record: &VoteRecord) -> Result<InsertOutcome> {
    let vote_id_str = encode_uuid(record.vote_id);
    let user_str    = encode_uuid(record.user_id);
    let type_str    = record.target.target_type.as_str();
    let target_str  = encode_uuid(record.target.target_id);
    let direction   = encode_direction(record.direction);
    let created_str = encode_dt(record.created_at);
    let updated_str = encode_dt(record.updated_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO votes (
             vote_id, user_id, target_type, target_id, direction,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            vote_id_str,
            user_str,
            type_str,
            target_str,
            direction,
            created_str,
            updated_str,
          ],
        );
        match inserted {
          Ok(_) => Ok(InsertOutcome::Inserted),
          Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(outcome)
  }

  async fn update_vote_direction(
    &self,
    key:  VoteKey,
    from: Direction,
    to:   Direction,
  ) -> Result<bool> {
    let user_str   = encode_uuid(key.user_id);
    let target_str = encode_uuid(key.target.target_id);
    let type_str   = key.target.target_type.as_str();
    let from_val   = encode_direction(from);
    let to_val     = encode_direction(to);
    let at_str     = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE votes SET direction = ?1, updated_at = ?2
           WHERE user_id = ?3 AND target_id = ?4 AND target_type = ?5
             AND direction = ?6",
          rusqlite::params![to_val, at_str, user_str, target_str, type_str, from_val],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn delete_vote(&self, key: VoteKey, direction: Direction) -> Result<bool> {
    let user_str   = encode_uuid(key.user_id);
    let target_str = encode_uuid(key.target.target_id);
    let type_str   = key.target.target_type.as_str();
    let dir_val    = encode_direction(direction);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM votes
           WHERE user_id = ?1 AND target_id = ?2 AND target_type = ?3
             AND direction = ?4",
          rusqlite::params![user_str, target_str, type_str, dir_val],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn apply_delta(
    &self,
    target: TargetRef,
    delta:  CounterDelta,
  ) -> Result<Option<VoteCounts>> {
    let (table, id_col) = target_table(target.target_type);
    let id_str = encode_uuid(target.target_id);

    // One statement: the floor and the write happen inside SQLite, so
    // concurrent deltas from different users never lose an update.
    let raw: Option<(i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE {table}
               SET upvotes   = MAX(0, upvotes   + ?1),
                   downvotes = MAX(0, downvotes + ?2)
               WHERE {id_col} = ?3
               RETURNING upvotes, downvotes"
            ),
            rusqlite::params![delta.up, delta.down, id_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw.map(|(up, down)| decode_counts(up, down)).transpose()
  }
}

// ─── ContentStore impl ───────────────────────────────────────────────────────

impl ContentStore for SqliteStore {
  type Error = Error;

  // ── Topics ────────────────────────────────────────────────────────────────

  async fn create_topic(&self, input: NewTopic) -> Result<Topic> {
    let input = input.normalize()?;
    let topic = Topic {
      topic_id:    Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      created_by:  input.created_by,
      counts:      VoteCounts::default(),
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(topic.topic_id);
    let name        = topic.name.clone();
    let description = topic.description.clone();
    let by_str      = encode_uuid(topic.created_by);
    let at_str      = encode_dt(topic.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO topics (topic_id, name, description, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, description, by_str, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::Conflict(format!("topic {:?} already exists", topic.name)));
    }
    Ok(topic)
  }

  async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTopic> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE topic_id = ?1"),
            rusqlite::params![id_str],
            RawTopic::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTopic::into_topic).transpose()
  }

  async fn list_topics(&self) -> Result<Vec<Topic>> {
    let raws: Vec<RawTopic> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOPIC_COLUMNS} FROM topics ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], RawTopic::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTopic::into_topic).collect()
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn create_question(&self, input: NewQuestion) -> Result<Question> {
    let input = input.normalize()?;
    let parent = TargetRef::topic(input.topic_id);
    if !self.exists(parent).await? {
      return Err(Error::NotFound(parent));
    }

    let question = Question {
      question_id:         Uuid::new_v4(),
      topic_id:            input.topic_id,
      title:               input.title,
      problem_description: input.problem_description,
      attempted_solutions: input.attempted_solutions,
      failure_point:       input.failure_point,
      solution_needed:     input.solution_needed,
      additional_details:  input.additional_details.unwrap_or_default(),
      author_id:           input.author_id,
      counts:              VoteCounts::default(),
      created_at:          Utc::now(),
    };

    let q = question.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO questions (
             question_id, topic_id, title, problem_description,
             attempted_solutions, failure_point, solution_needed,
             additional_details, author_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            encode_uuid(q.question_id),
            encode_uuid(q.topic_id),
            q.title,
            q.problem_description,
            q.attempted_solutions,
            q.failure_point,
            q.solution_needed,
            q.additional_details,
            encode_uuid(q.author_id),
            encode_dt(q.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawQuestion> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE question_id = ?1"),
            rusqlite::params![id_str],
            RawQuestion::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawQuestion::into_question).transpose()
  }

  async fn list_questions(&self, topic_id: Uuid) -> Result<Vec<Question>> {
    let id_str = encode_uuid(topic_id);

    let raws: Vec<RawQuestion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_COLUMNS} FROM questions
           WHERE topic_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawQuestion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn create_answer(&self, input: NewAnswer) -> Result<Answer> {
    let input = input.normalize()?;
    let parent = TargetRef::question(input.question_id);
    if !self.exists(parent).await? {
      return Err(Error::NotFound(parent));
    }

    let answer = Answer {
      answer_id:   Uuid::new_v4(),
      question_id: input.question_id,
      content:     input.content,
      author_id:   input.author_id,
      counts:      VoteCounts::default(),
      created_at:  Utc::now(),
    };

    let a = answer.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO answers (answer_id, question_id, content, author_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(a.answer_id),
            encode_uuid(a.question_id),
            a.content,
            encode_uuid(a.author_id),
            encode_dt(a.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(answer)
  }

  async fn get_answer(&self, id: Uuid) -> Result<Option<Answer>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAnswer> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE answer_id = ?1"),
            rusqlite::params![id_str],
            RawAnswer::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAnswer::into_answer).transpose()
  }

  async fn list_answers(&self, question_id: Uuid) -> Result<Vec<Answer>> {
    let id_str = encode_uuid(question_id);

    let raws: Vec<RawAnswer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANSWER_COLUMNS} FROM answers
           WHERE question_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnswer::into_answer).collect()
  }

  async fn list_topic_answers(&self, topic_id: Uuid) -> Result<Vec<Answer>> {
    let id_str = encode_uuid(topic_id);

    let raws: Vec<RawAnswer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANSWER_COLUMNS} FROM answers
           WHERE question_id IN (SELECT question_id FROM questions WHERE topic_id = ?1)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnswer::into_answer).collect()
  }

  // ── Search ────────────────────────────────────────────────────────────────

  async fn search(&self, query: String) -> Result<SearchMatches> {
    let pattern = contains_pattern(&query);

    let (topics, questions, answers) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOPIC_COLUMNS} FROM topics
           WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
           ORDER BY created_at DESC"
        ))?;
        let topics = stmt
          .query_map(rusqlite::params![pattern], RawTopic::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_COLUMNS} FROM questions
           WHERE title LIKE ?1 ESCAPE '\\' OR problem_description LIKE ?1 ESCAPE '\\'
           ORDER BY created_at DESC"
        ))?;
        let questions = stmt
          .query_map(rusqlite::params![pattern], RawQuestion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {ANSWER_COLUMNS} FROM answers
           WHERE content LIKE ?1 ESCAPE '\\'
           ORDER BY created_at DESC"
        ))?;
        let answers = stmt
          .query_map(rusqlite::params![pattern], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((topics, questions, answers))
      })
      .await?;

    Ok(SearchMatches {
      topics:    topics.into_iter().map(RawTopic::into_topic).collect::<Result<_>>()?,
      questions: questions
        .into_iter()
        .map(RawQuestion::into_question)
        .collect::<Result<_>>()?,
      answers:   answers.into_iter().map(RawAnswer::into_answer).collect::<Result<_>>()?,
    })
  }

  async fn suggest(&self, prefix: String, per_kind: usize) -> Result<Vec<Suggestion>> {
    let pattern = prefix_pattern(&prefix);
    let limit = i64::try_from(per_kind).unwrap_or(i64::MAX);

    let (names, titles) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM topics WHERE name LIKE ?1 ESCAPE '\\'
           ORDER BY name LIMIT ?2",
        )?;
        let names = stmt
          .query_map(rusqlite::params![pattern, limit], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT title FROM questions WHERE title LIKE ?1 ESCAPE '\\'
           ORDER BY title LIMIT ?2",
        )?;
        let titles = stmt
          .query_map(rusqlite::params![pattern, limit], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((names, titles))
      })
      .await?;

    let topics = names
      .into_iter()
      .map(|text| Suggestion { text, kind: SuggestionKind::Topic });
    let questions = titles
      .into_iter()
      .map(|text| Suggestion { text, kind: SuggestionKind::Question });
    Ok(topics.chain(questions).collect())
  }
}
