//! Song library HTTP routes.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use super::state::{GuardedSongService, ServerState};
use crate::song_service::{NewSongRequest, ServiceError, SongUpdate};
use crate::song_store::{Pagination, SongFilter, SongId};

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, format!("bad request: {}", reason)).into_response()
            }
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            ServiceError::EnrichmentFailed(_) | ServiceError::StoreFailed(_) => {
                error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

fn parse_song_id(raw: &str) -> Result<SongId, ServiceError> {
    match raw.parse::<SongId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::BadRequest(format!("invalid song id {:?}", raw))),
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected body: {}", rejection.body_text());
        ServiceError::BadRequest("malformed JSON body".to_string())
    })
}

#[derive(Deserialize, Debug)]
struct InfoQuery {
    group: Option<String>,
    song: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ListSongsQuery {
    group: Option<String>,
    song: Option<String>,
    release_date: Option<String>,
    text: Option<String>,
    link: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

/// GET /info?group=&song= - detail of a song, created on first lookup
async fn get_info(
    State(service): State<GuardedSongService>,
    Query(query): Query<InfoQuery>,
) -> Response {
    let group = query.group.unwrap_or_default();
    let song = query.song.unwrap_or_default();
    match service.get_or_create_detail(&group, &song).await {
        Ok(detail) => Json(detail).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_songs(
    State(service): State<GuardedSongService>,
    Query(query): Query<ListSongsQuery>,
) -> Response {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let filter = SongFilter {
        group: query.group,
        title: query.song,
        release_date: query.release_date,
        text: query.text,
        link: query.link,
    };
    match service.list_songs(&filter, pagination) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_song(State(service): State<GuardedSongService>, Path(id): Path<String>) -> Response {
    match parse_song_id(&id).and_then(|id| service.get_song(id)) {
        Ok(song) => Json(song).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_song_text(
    State(service): State<GuardedSongService>,
    Path(id): Path<String>,
) -> Response {
    match parse_song_id(&id).and_then(|id| service.get_song_text(id)) {
        Ok(text) => Json(text).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_song_verses(
    State(service): State<GuardedSongService>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    match parse_song_id(&id).and_then(|id| service.list_verses(id, pagination)) {
        Ok(page) => Json(page).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn post_song(
    State(service): State<GuardedSongService>,
    body: Result<Json<NewSongRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    match service.create_song(request).await {
        Ok(song) => Json(song).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn put_song(
    State(service): State<GuardedSongService>,
    Path(id): Path<String>,
    body: Result<Json<SongUpdate>, JsonRejection>,
) -> Response {
    let result = parse_song_id(&id)
        .and_then(|id| json_body(body).map(|update| (id, update)))
        .and_then(|(id, update)| service.update_song(id, update));
    match result {
        Ok(song) => Json(song).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_song(
    State(service): State<GuardedSongService>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_song_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match service.delete_song(id) {
        Ok(()) => {
            let mut ack = serde_json::Map::new();
            ack.insert(format!("id #{}", id), "deleted".into());
            Json(ack).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub fn make_song_routes(state: ServerState) -> Router {
    Router::new()
        .route("/info", get(get_info))
        .route("/songs", get(list_songs).post(post_song))
        .route(
            "/songs/{id}",
            get(get_song).put(put_song).delete(delete_song),
        )
        .route("/songs/{id}/text", get(get_song_text))
        .route("/songs/{id}/verses", get(get_song_verses))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_ids_must_be_positive_integers() {
        assert_eq!(parse_song_id("42").unwrap(), 42);
        for raw in ["0", "-3", "abc", "4.2", ""] {
            assert!(matches!(
                parse_song_id(raw),
                Err(ServiceError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (
                ServiceError::BadRequest("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                ServiceError::EnrichmentFailed("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::StoreFailed("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
