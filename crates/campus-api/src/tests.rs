use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use campus_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

async fn make_router() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store), ApiOptions::default())
}

async fn send(
  router: &Router,
  method: &str,
  uri: &str,
  user: Option<Uuid>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(identity::DEFAULT_IDENTITY_HEADER, user.to_string());
  }
  let req = match body {
    Some(json) => builder
      .header("content-type", "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_topic(router: &Router, user: Uuid, name: &str) -> String {
  let (status, body) = send(
    router,
    "POST",
    "/topics",
    Some(user),
    Some(json!({ "name": name, "description": "about it" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["topicId"].as_str().unwrap().to_owned()
}

async fn vote(
  router: &Router,
  user: Uuid,
  target_type: &str,
  target_id: &str,
  vote_type: i64,
) -> (StatusCode, Value) {
  send(
    router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({
      "targetId": target_id,
      "targetType": target_type,
      "voteType": vote_type,
    })),
  )
  .await
}

// ── Votes ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_create_toggle_and_switch() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  let topic = create_topic(&router, user, "Rust").await;

  let (status, body) = vote(&router, user, "Topic", &topic, 1).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["upvotes"], 1);
  assert_eq!(body["downvotes"], 0);
  assert_eq!(body["score"], 1);
  assert_eq!(body["userVote"], 1);

  let (_, body) = vote(&router, user, "Topic", &topic, -1).await;
  assert_eq!(body["upvotes"], 0);
  assert_eq!(body["downvotes"], 1);
  assert_eq!(body["score"], -1);
  assert_eq!(body["userVote"], -1);

  let (_, body) = vote(&router, user, "Topic", &topic, -1).await;
  assert_eq!(body["upvotes"], 0);
  assert_eq!(body["downvotes"], 0);
  assert_eq!(body["userVote"], Value::Null);
}

#[tokio::test]
async fn vote_response_carries_the_entity() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  let topic = create_topic(&router, user, "Databases").await;

  let (_, body) = vote(&router, user, "Topic", &topic, 1).await;
  assert_eq!(body["topicId"], topic.as_str());
  assert_eq!(body["name"], "Databases");
}

#[tokio::test]
async fn vote_requires_identity() {
  let router = make_router().await;
  let body = json!({
    "targetId": Uuid::new_v4().to_string(),
    "targetType": "Topic",
    "voteType": 1,
  });
  let (status, body) = send(&router, "POST", "/votes", None, Some(body)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn vote_rejects_malformed_input() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  let topic = create_topic(&router, user, "Networks").await;

  let (status, _) = vote(&router, user, "Comment", &topic, 1).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = vote(&router, user, "Topic", &topic, 2).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid vote type: 2");

  let (status, _) = vote(&router, user, "Topic", "not-a-uuid", 1).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": topic, "targetType": "Topic" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "missing required fields");

  // Nothing above may have touched the counters.
  let (_, body) = send(&router, "GET", &format!("/topics/{topic}"), None, None).await;
  assert_eq!(body["upvotes"], 0);
  assert_eq!(body["downvotes"], 0);
}

#[tokio::test]
async fn vote_on_missing_target_is_404() {
  let router = make_router().await;
  let missing = Uuid::new_v4().to_string();
  let (status, body) = vote(&router, Uuid::new_v4(), "Answer", &missing, 1).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("Answer {missing} not found"));
}

#[tokio::test]
async fn vote_fields_of_the_wrong_json_type_are_400() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  let topic = create_topic(&router, user, "Operating systems").await;

  let (status, body) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": topic, "targetType": "Topic", "voteType": "1" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], r#"invalid vote type: "1""#);

  let (status, body) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": topic, "targetType": 5, "voteType": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid target type: 5");

  let (status, body) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": 42, "targetType": "Topic", "voteType": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid target id: 42");

  let (_, body) = send(&router, "GET", &format!("/topics/{topic}"), None, None).await;
  assert_eq!(body["upvotes"], 0);
}

#[tokio::test]
async fn unparseable_vote_body_is_a_json_400() {
  let router = make_router().await;
  let req = Request::builder()
    .method("POST")
    .uri("/votes")
    .header(identity::DEFAULT_IDENTITY_HEADER, Uuid::new_v4().to_string())
    .header("content-type", "application/json")
    .body(Body::from(r#"{"targetId": "#))
    .unwrap();

  let resp = router.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn whole_float_vote_type_is_accepted() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  let topic = create_topic(&router, user, "Graphics").await;

  let (status, body) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": topic, "targetType": "Topic", "voteType": 1.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["userVote"], 1);
  assert_eq!(body["upvotes"], 1);

  let (status, _) = send(
    &router,
    "POST",
    "/votes",
    Some(user),
    Some(json!({ "targetId": topic, "targetType": "Topic", "voteType": 0.5 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Listings ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn topics_are_ranked_by_score() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();
  let low = create_topic(&router, alice, "Low").await;
  let high = create_topic(&router, alice, "High").await;
  let mid = create_topic(&router, alice, "Mid").await;

  vote(&router, alice, "Topic", &high, 1).await;
  vote(&router, bob, "Topic", &high, 1).await;
  vote(&router, alice, "Topic", &mid, 1).await;
  vote(&router, bob, "Topic", &low, -1).await;

  let (status, body) = send(&router, "GET", "/topics", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let ids: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["topicId"].as_str().unwrap())
    .collect();
  assert_eq!(ids, vec![high.as_str(), mid.as_str(), low.as_str()]);
}

#[tokio::test]
async fn listing_includes_user_vote_only_when_identified() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let voted = create_topic(&router, alice, "Voted").await;
  let _untouched = create_topic(&router, alice, "Untouched").await;
  vote(&router, alice, "Topic", &voted, -1).await;

  let (_, anonymous) = send(&router, "GET", "/topics", None, None).await;
  for topic in anonymous.as_array().unwrap() {
    assert!(topic.get("userVote").is_none(), "{topic}");
  }

  let (_, identified) = send(&router, "GET", "/topics", Some(alice), None).await;
  for topic in identified.as_array().unwrap() {
    let expected = if topic["topicId"] == voted.as_str() { json!(-1) } else { Value::Null };
    assert_eq!(topic["userVote"], expected, "{topic}");
  }
}

#[tokio::test]
async fn answers_carry_each_users_own_vote() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();
  let topic = create_topic(&router, alice, "Compilers").await;

  let (status, question) = send(
    &router,
    "POST",
    "/questions",
    Some(alice),
    Some(json!({
      "topicId": topic,
      "title": "Borrow checker",
      "problemDescription": "It rejects my code",
      "attemptedSolutions": "Cloning everything",
      "failurePoint": "Lifetimes",
      "solutionNeeded": "An explanation",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{question}");
  let question_id = question["questionId"].as_str().unwrap().to_owned();

  let (status, answer) = send(
    &router,
    "POST",
    "/answers",
    Some(bob),
    Some(json!({ "questionId": question_id, "content": "Use references" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let answer_id = answer["answerId"].as_str().unwrap().to_owned();

  vote(&router, alice, "Answer", &answer_id, 1).await;

  let uri = format!("/answers/question/{question_id}");
  let (_, for_alice) = send(&router, "GET", &uri, Some(alice), None).await;
  let (_, for_bob) = send(&router, "GET", &uri, Some(bob), None).await;
  assert_eq!(for_alice[0]["userVote"], 1);
  assert_eq!(for_alice[0]["score"], 1);
  assert_eq!(for_bob[0]["userVote"], Value::Null);

  let (_, single) =
    send(&router, "GET", &format!("/questions/{question_id}"), Some(alice), None).await;
  assert_eq!(single["title"], "Borrow checker");
  assert_eq!(single["userVote"], Value::Null);
}

// ── Content ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_topic_is_409() {
  let router = make_router().await;
  let user = Uuid::new_v4();
  create_topic(&router, user, "Algorithms").await;

  let (status, _) = send(
    &router,
    "POST",
    "/topics",
    Some(user),
    Some(json!({ "name": "Algorithms", "description": "again" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_topic_name_is_400() {
  let router = make_router().await;
  let (status, body) = send(
    &router,
    "POST",
    "/topics",
    Some(Uuid::new_v4()),
    Some(json!({ "name": "   ", "description": "blank" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn question_under_missing_topic_is_404() {
  let router = make_router().await;
  let (status, _) = send(
    &router,
    "POST",
    "/questions",
    Some(Uuid::new_v4()),
    Some(json!({
      "topicId": Uuid::new_v4(),
      "title": "t",
      "problemDescription": "p",
      "attemptedSolutions": "a",
      "failurePoint": "f",
      "solutionNeeded": "s",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_topic_is_404() {
  let router = make_router().await;
  let (status, _) =
    send(&router, "GET", &format!("/topics/{}", Uuid::new_v4()), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Search ────────────────────────────────────────────────────────────────────

async fn create_question(router: &Router, user: Uuid, topic: &str, title: &str) -> String {
  let (status, body) = send(
    router,
    "POST",
    "/questions",
    Some(user),
    Some(json!({
      "topicId": topic,
      "title": title,
      "problemDescription": "stuck",
      "attemptedSolutions": "reading",
      "failurePoint": "compiling",
      "solutionNeeded": "a hint",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["questionId"].as_str().unwrap().to_owned()
}

async fn create_answer(router: &Router, user: Uuid, question: &str, content: &str) -> String {
  let (status, body) = send(
    router,
    "POST",
    "/answers",
    Some(user),
    Some(json!({ "questionId": question, "content": content })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["answerId"].as_str().unwrap().to_owned()
}

fn ids<'a>(list: &'a Value, key: &str) -> Vec<&'a str> {
  list
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v[key].as_str().unwrap())
    .collect()
}

#[tokio::test]
async fn search_requires_a_query() {
  let router = make_router().await;
  let (status, body) = send(&router, "GET", "/search?q=%20%20", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "search query is required");

  let (status, _) = send(&router, "GET", "/search", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_ranks_each_kind() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();
  let ownership = create_topic(&router, alice, "Rust ownership").await;
  let learning = create_topic(&router, alice, "Learning Rust").await;
  create_topic(&router, alice, "Calculus").await;

  let why = create_question(&router, alice, &ownership, "Why learn rust").await;
  let traits = create_question(&router, alice, &ownership, "Rust traits").await;
  let good = create_answer(&router, bob, &why, "Rust is fast").await;
  let better = create_answer(&router, bob, &why, "rust is safe").await;
  create_answer(&router, bob, &traits, "Use generics").await;

  vote(&router, alice, "Topic", &learning, 1).await;
  vote(&router, alice, "Answer", &better, 1).await;
  vote(&router, bob, "Answer", &better, 1).await;
  vote(&router, alice, "Answer", &good, 1).await;

  let (status, body) = send(&router, "GET", "/search?q=rust", Some(alice), None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["query"], "rust");
  let results = &body["results"];

  // Score wins over relevance for topics.
  assert_eq!(ids(&results["topics"], "topicId"), vec![learning.as_str(), ownership.as_str()]);
  assert_eq!(results["topics"][0]["userVote"], 1);
  assert_eq!(results["topics"][0]["relevanceScore"], 50);
  assert_eq!(results["topics"][1]["userVote"], Value::Null);
  assert_eq!(results["topics"][1]["relevanceScore"], 75);
  assert_eq!(results["topics"][1]["commentCount"], 3);
  assert_eq!(results["topics"][1]["avgRating"], 1.0);

  assert_eq!(ids(&results["questions"], "questionId"), vec![traits.as_str(), why.as_str()]);
  assert_eq!(results["questions"][1]["commentCount"], 2);
  assert_eq!(results["questions"][1]["avgRating"], 1.5);
  assert!(results["questions"][0].get("userVote").is_none());

  assert_eq!(ids(&results["answers"], "answerId"), vec![better.as_str(), good.as_str()]);
  assert_eq!(body["totalResults"], 6);
}

#[tokio::test]
async fn top_comments_respect_the_limit() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let topic = create_topic(&router, alice, "Networking").await;
  let first = create_question(&router, alice, &topic, "Sockets").await;
  let second = create_question(&router, alice, &topic, "Routing").await;

  let mut answers = Vec::new();
  for (question, text) in [(&first, "a"), (&first, "b"), (&second, "c"), (&second, "d")] {
    answers.push(create_answer(&router, alice, question, text).await);
  }
  vote(&router, alice, "Answer", &answers[2], 1).await;
  vote(&router, Uuid::new_v4(), "Answer", &answers[2], 1).await;
  vote(&router, alice, "Answer", &answers[0], 1).await;
  vote(&router, alice, "Answer", &answers[3], -1).await;

  let uri = format!("/search/top-comments/{topic}?limit=2");
  let (status, body) = send(&router, "GET", &uri, Some(alice), None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["totalComments"], 4);
  assert_eq!(
    ids(&body["topComments"], "answerId"),
    vec![answers[2].as_str(), answers[0].as_str()]
  );
  assert_eq!(body["topComments"][0]["userVote"], 1);
  assert_eq!(body["allComments"].as_array().unwrap().len(), 4);
  assert_eq!(body["allComments"][3]["answerId"], answers[3].as_str());

  for uri in [
    format!("/search/top-comments/{topic}"),
    format!("/search/top-comments/{topic}?limit=lots"),
  ] {
    let (_, body) = send(&router, "GET", &uri, None, None).await;
    assert_eq!(body["topComments"].as_array().unwrap().len(), 3, "{uri}");
  }

  let uri = format!("/search/top-comments/{}", Uuid::new_v4());
  let (status, body) = send(&router, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["totalComments"], 0);
}

#[tokio::test]
async fn suggestions_are_capped() {
  let router = make_router().await;
  let alice = Uuid::new_v4();
  let mut topics = Vec::new();
  for n in 1..=6 {
    topics.push(create_topic(&router, alice, &format!("Rust {n}")).await);
  }
  for n in 1..=5 {
    create_question(&router, alice, &topics[0], &format!("Rust question {n}")).await;
  }

  let (status, body) = send(&router, "GET", "/search/suggestions?q=r", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["suggestions"], json!([]));

  let (_, body) = send(&router, "GET", "/search/suggestions?q=ru", None, None).await;
  let suggestions = body["suggestions"].as_array().unwrap();
  assert_eq!(suggestions.len(), 8);
  assert_eq!(suggestions[0], json!({ "text": "Rust 1", "type": "topic" }));
  assert_eq!(suggestions[4]["text"], "Rust 5");
  assert_eq!(suggestions[5], json!({ "text": "Rust question 1", "type": "question" }));
  assert_eq!(suggestions[7]["text"], "Rust question 3");
}
