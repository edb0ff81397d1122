use crate::http::{Request, RequestUri, Response, Result};
use crate::method;
use crate::store::{Snapshot, TournamentId};
use crate::{Error, StatusCodeError};

use brackets_core::{
    match_list, render_layout, validate, Bracket, CompetitorId, Competitors, MatchId,
    RenderOptions,
};
use hyper::header::{HeaderValue, ETAG, IF_MATCH};
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};

pub async fn route(req: Request, mut uri: RequestUri<'_>) -> Result {
    match uri.take() {
        None => method!(req, {
            Method::GET => list(req).await,
            Method::POST => create(req).await,
        }),
        Some(part) => {
            let id = part.parse()?;

            match uri.take_str() {
                None => method!(req, {
                    Method::GET => get(req, id).await,
                    Method::PUT => replace(req, id).await,
                    Method::DELETE => delete(req, id).await,
                }),
                Some("advance") => method!(req, {
                    Method::POST => advance(req, id).await,
                }),
                Some("clear") => method!(req, {
                    Method::POST => clear(req, id).await,
                }),
                Some("render") => method!(req, {
                    Method::GET => render(req, id).await,
                }),
                Some("matches") => method!(req, {
                    Method::GET => matches(req, id).await,
                }),
                Some(_) => Err(StatusCodeError::not_found().into()),
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct CreateTournament {
    competitors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Created<'a> {
    id: TournamentId,
    bracket: &'a Bracket,
}

#[derive(Copy, Clone, Debug, Deserialize)]
struct AdvanceMatch {
    match_id: MatchId,
    winner_id: CompetitorId,
}

#[derive(Copy, Clone, Debug, Deserialize)]
struct ClearMatch {
    match_id: MatchId,
}

async fn list(req: Request) -> Result {
    let tournaments = req.state().store.list();

    Response::ok().json(&tournaments)
}

async fn create(mut req: Request) -> Result {
    let body: CreateTournament = req.json().await?;
    let config = req.state().config.brackets;

    if config.allow_byes {
        validate::unique_names(&body.competitors)?;
    } else {
        validate::validate(&body.competitors)?;
    }

    let bracket = Bracket::new_with_options(
        Competitors::from_names(body.competitors),
        config.build_options(),
    )?;

    let id = req.state().store.insert(bracket.clone());
    log::info!(
        "Created tournament {} with {} competitors",
        id,
        bracket.competitors().len()
    );

    Ok(Response::created()
        .json(&Created {
            id,
            bracket: &bracket,
        })?
        .header(ETAG, HeaderValue::from(0_u64)))
}

async fn get(req: Request, id: TournamentId) -> Result {
    let snapshot = snapshot(&req, id)?;

    snapshot_response(&snapshot)
}

/// Replaces the bracket with a snapshot from the client, e.g. one edited offline. The snapshot is
/// validated and only stored if the "If-Match" revision is still current.
async fn replace(mut req: Request, id: TournamentId) -> Result {
    let revision = if_match(&req)?.ok_or_else(|| {
        StatusCodeError::new(
            StatusCode::PRECONDITION_REQUIRED,
            "Missing \"If-Match\" header",
        )
    })?;

    let bracket: Bracket = req.json().await?;

    let snapshot = req
        .state()
        .store
        .compare_and_swap(id, revision, bracket)?;

    log::info!("Replaced bracket of tournament {}", id);

    snapshot_response(&snapshot)
}

async fn delete(req: Request, id: TournamentId) -> Result {
    match req.state().store.remove(id) {
        Some(_) => {
            log::info!("Deleted tournament {}", id);
            Ok(Response::no_content())
        }
        None => Err(not_found()),
    }
}

async fn advance(mut req: Request, id: TournamentId) -> Result {
    let revision = if_match(&req)?;
    let body: AdvanceMatch = req.json().await?;
    let policy = req.state().config.brackets.advance_policy;

    let snapshot = req.state().store.update(id, revision, |bracket| {
        bracket.advance_with_policy(body.match_id, body.winner_id, policy)
    })?;

    log::info!(
        "Advanced competitor {} in match {} of tournament {}",
        body.winner_id,
        body.match_id,
        id
    );

    snapshot_response(&snapshot)
}

async fn clear(mut req: Request, id: TournamentId) -> Result {
    let revision = if_match(&req)?;
    let body: ClearMatch = req.json().await?;

    let snapshot = req
        .state()
        .store
        .update(id, revision, |bracket| bracket.clear(body.match_id))?;

    log::info!("Cleared match {} of tournament {}", body.match_id, id);

    snapshot_response(&snapshot)
}

async fn render(req: Request, id: TournamentId) -> Result {
    let snapshot = snapshot(&req, id)?;

    let options = RenderOptions {
        can_edit: query_flag(&req, "can_edit")?.unwrap_or(false),
        show_byes: query_flag(&req, "show_byes")?.unwrap_or(true),
        policy: req.state().config.brackets.advance_policy,
    };

    Response::ok().json(&render_layout(&snapshot.bracket, &options))
}

async fn matches(req: Request, id: TournamentId) -> Result {
    let snapshot = snapshot(&req, id)?;

    Response::ok().json(&match_list(&snapshot.bracket))
}

fn not_found() -> Error {
    StatusCodeError::not_found()
        .message("Invalid tournament id")
        .into()
}

fn snapshot(req: &Request, id: TournamentId) -> std::result::Result<Snapshot, Error> {
    req.state().store.get(id).ok_or_else(not_found)
}

fn snapshot_response(snapshot: &Snapshot) -> Result {
    Ok(Response::ok()
        .json(&snapshot.bracket)?
        .header(ETAG, HeaderValue::from(snapshot.revision)))
}

/// Returns the revision from the "If-Match" header.
fn if_match(req: &Request) -> std::result::Result<Option<u64>, Error> {
    let value = match req.headers().get(IF_MATCH) {
        Some(value) => value,
        None => return Ok(None),
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().trim_matches('"').parse().ok())
        .map(Some)
        .ok_or_else(|| {
            StatusCodeError::bad_request()
                .message("Invalid \"If-Match\" header")
                .into()
        })
}

fn query_flag(req: &Request, key: &str) -> std::result::Result<Option<bool>, Error> {
    match req.query(key) {
        None => Ok(None),
        Some("" | "true" | "1") => Ok(Some(true)),
        Some("false" | "0") => Ok(Some(false)),
        Some(value) => Err(StatusCodeError::bad_request()
            .message(format!("Invalid value for {}: {}", key, value))
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Brackets;
    use crate::http::service_root;
    use crate::{Config, State};

    use brackets_core::AdvancePolicy;
    use hyper::header::{CONTENT_LENGTH, ETAG, IF_MATCH};
    use hyper::{Body, Method, Request, StatusCode};
    use serde_json::{json, Value};

    async fn send(
        state: &State,
        method: Method,
        uri: &str,
        body: Option<Value>,
        revision: Option<u64>,
    ) -> (StatusCode, Value) {
        let body = body.map(|body| body.to_string()).unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_LENGTH, body.len());
        if let Some(revision) = revision {
            req = req.header(IF_MATCH, revision);
        }

        let resp = service_root(req.body(Body::from(body)).unwrap(), state.clone())
            .await
            .unwrap();

        let status = resp.status();
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn create(state: &State, competitors: Value) -> (StatusCode, Value) {
        send(
            state,
            Method::POST,
            "/v1/tournaments",
            Some(json!({ "competitors": competitors })),
            None,
        )
        .await
    }

    #[tokio::test]
    async fn test_tournament_lifecycle() {
        let state = State::new(Config::default());

        let (status, body) = create(&state, json!(["A", "B", "C", "D"])).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].clone();
        assert!(id.is_u64());
        let base = format!("/v1/tournaments/{}", id);
        assert_eq!(body["bracket"]["rounds"], 2);
        assert_eq!(body["bracket"]["matches"].as_array().unwrap().len(), 3);

        let (status, body) = send(&state, Method::GET, "/v1/tournaments", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([id]));

        let (status, body) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": 0, "winner_id": 0 })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"][2]["one_id"], 0);
        assert_eq!(body["matches"][0]["status"], "decided");

        for (match_id, winner_id) in [(1, 3), (2, 3)] {
            let (status, _) = send(
                &state,
                Method::POST,
                &format!("{}/advance", base),
                Some(json!({ "match_id": match_id, "winner_id": winner_id })),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&state, Method::GET, &base, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["champion"], 3);

        // The championship match cannot be cleared.
        let (status, body) = send(
            &state,
            Method::POST,
            &format!("{}/clear", base),
            Some(json!({ "match_id": 2 })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);

        let (status, body) =
            send(&state, Method::GET, &format!("{}/render", base), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"], 1.0);
        assert_eq!(body["labels"], json!(["round1", "finals", "winner"]));
        assert_eq!(body["winner"]["champion"]["name"], "D");
        assert_eq!(body["rounds"][1]["slots"][0]["connector"], "no-bye");

        let (status, body) =
            send(&state, Method::GET, &format!("{}/matches", base), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["narration"]["kind"], "defeated");
        assert_eq!(body[1]["narration"]["kind"], "lost_to");
        assert_eq!(body[2]["narration"]["kind"], "lost_to");
        assert_eq!(body[2]["narration"]["winner"]["name"], "D");

        let (status, _) = send(&state, Method::DELETE, &base, None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, Method::GET, &base, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let state = State::new(Config::default());

        let (status, _) = create(&state, json!(["A", "B", "C"])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = create(&state, json!(["A", "B", "A", "C"])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains('A'));

        let (status, _) = send(
            &state,
            Method::POST,
            "/v1/tournaments",
            Some(json!({ "names": [] })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, Method::PUT, "/v1/tournaments", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&state, Method::GET, "/v1/tournaments/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_byes() {
        let mut config = Config::default();
        config.brackets = Brackets {
            allow_byes: true,
            advance_policy: AdvancePolicy::Reject,
        };
        let state = State::new(config);

        let (status, body) = create(&state, json!(["A", "B", "C"])).await;
        assert_eq!(status, StatusCode::CREATED);
        let base = format!("/v1/tournaments/{}", body["id"]);
        assert_eq!(body["bracket"]["matches"][1]["status"], "bye");
        assert_eq!(body["bracket"]["matches"][2]["two_id"], 2);

        let (status, body) =
            send(&state, Method::GET, &format!("{}/render", base), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rounds"][0]["slots"][1]["bye"], true);
        assert_eq!(body["rounds"][1]["slots"][0]["connector"], "lower-bye");
    }

    #[tokio::test]
    async fn test_advance_errors() {
        let state = State::new(Config::default());
        let (_, created) = create(&state, json!(["A", "B", "C", "D"])).await;
        let base = format!("/v1/tournaments/{}", created["id"]);

        let advance = |match_id: u64, winner_id: u64| {
            Some(json!({ "match_id": match_id, "winner_id": winner_id }))
        };

        let (status, _) = send(
            &state,
            Method::POST,
            "/v1/tournaments/7/advance",
            advance(0, 0),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            advance(9, 0),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            advance(0, 2),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            advance(0, 1),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            advance(0, 0),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": "zero" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_advance_if_match() {
        let state = State::new(Config::default());
        let (_, created) = create(&state, json!(["A", "B", "C", "D"])).await;
        let base = format!("/v1/tournaments/{}", created["id"]);

        let req = Request::builder()
            .uri(base.as_str())
            .body(Body::empty())
            .unwrap();
        let resp = service_root(req, state.clone()).await.unwrap();
        assert_eq!(resp.headers()[ETAG], "0");

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": 0, "winner_id": 0 })),
            Some(0),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The bracket moved on to revision 1.
        let (status, body) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": 1, "winner_id": 2 })),
            Some(0),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": 1, "winner_id": 2 })),
            Some(1),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_render_options() {
        let mut config = Config::default();
        config.brackets.advance_policy = AdvancePolicy::Replace;
        let state = State::new(config);
        let (_, created) = create(&state, json!(["A", "B", "C", "D"])).await;
        let base = format!("/v1/tournaments/{}", created["id"]);

        send(
            &state,
            Method::POST,
            &format!("{}/advance", base),
            Some(json!({ "match_id": 0, "winner_id": 0 })),
            None,
        )
        .await;

        let (status, body) = send(
            &state,
            Method::GET,
            &format!("{}/render?can_edit=true", base),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["rounds"][0]["slots"][0]["actions"],
            json!({ "advance": [0, 1], "clear": false })
        );

        let (status, body) =
            send(&state, Method::GET, &format!("{}/render", base), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rounds"][0]["slots"][0]["actions"], Value::Null);

        let (status, _) = send(
            &state,
            Method::GET,
            &format!("{}/render?can_edit=maybe", base),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_replace() {
        let state = State::new(Config::default());
        let (_, body) = create(&state, json!(["A", "B", "C", "D"])).await;
        let base = format!("/v1/tournaments/{}", body["id"]);

        let mut bracket = body["bracket"].clone();
        bracket["matches"][0]["status"] = json!("decided");
        bracket["matches"][2]["one_id"] = json!(1);

        let (status, _) = send(
            &state,
            Method::PUT,
            &base,
            Some(bracket.clone()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

        let (status, body) = send(
            &state,
            Method::PUT,
            &base,
            Some(bracket.clone()),
            Some(0),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"][2]["one_id"], 1);

        // The bracket is at revision 1 now.
        let (status, _) = send(
            &state,
            Method::PUT,
            &base,
            Some(bracket.clone()),
            Some(0),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Snapshots are validated.
        bracket["matches"][2]["two_id"] = json!(9);
        let (status, _) = send(
            &state,
            Method::PUT,
            &base,
            Some(bracket),
            Some(1),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
