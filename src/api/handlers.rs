// Record CRUD handlers module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::query;
use super::response::{bad_request, json_response, no_content, not_found, storage_unavailable};
use crate::config::AppState;
use crate::logger;
use crate::store::{Fields, StoreError, ID_KEY};

/// GET /records — full collection, optionally narrowed by query filter
pub fn handle_list(state: &AppState, raw_query: Option<&str>) -> Response<Full<Bytes>> {
    let filter = query::parse_filter(raw_query);
    match state.store.list() {
        Ok(records) => {
            let selected: Vec<_> = records
                .into_iter()
                .filter(|record| record.matches(&filter))
                .collect();
            json_response(StatusCode::OK, &selected)
        }
        Err(e) => store_error(&e),
    }
}

/// GET /records/{id}
pub fn handle_get(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.store.get(id) {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => store_error(&e),
    }
}

/// POST /records — body holds the fields, id is assigned by the store
pub fn handle_create(state: &AppState, body: &Bytes) -> Response<Full<Bytes>> {
    let fields = match parse_fields(body) {
        Ok(fields) => fields,
        Err(message) => return bad_request(&message),
    };

    match state.store.create(fields) {
        Ok(record) => json_response(StatusCode::CREATED, &record),
        Err(e) => store_error(&e),
    }
}

/// PUT /records/{id} — body shape is validated before the id lookup
pub fn handle_update(state: &AppState, id: &str, body: &Bytes) -> Response<Full<Bytes>> {
    let fields = match parse_fields(body) {
        Ok(fields) => fields,
        Err(message) => return bad_request(&message),
    };

    match state.store.update(id, fields) {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => store_error(&e),
    }
}

/// DELETE /records/{id}
pub fn handle_delete(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.store.delete(id) {
        Ok(()) => no_content(),
        Err(e) => store_error(&e),
    }
}

/// Convert a store failure into its response
fn store_error(err: &StoreError) -> Response<Full<Bytes>> {
    if err.is_not_found() {
        return not_found(&err.to_string());
    }

    logger::log_storage_error(&err.to_string());
    storage_unavailable(&err.to_string())
}

/// Validate a request body as a flat string-keyed mapping.
///
/// Rejects anything that is not a JSON object, any member whose value is
/// not a string, and the reserved `id` member (the store assigns ids and
/// the persisted form flattens fields next to `id`).
fn parse_fields(body: &Bytes) -> Result<Fields, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {e}"))?;

    let serde_json::Value::Object(members) = value else {
        return Err("request body must be a JSON object".to_string());
    };

    let mut fields = Fields::new();
    for (key, value) in members {
        if key == ID_KEY {
            return Err("\"id\" is assigned by the server and cannot appear in the body".to_string());
        }
        let serde_json::Value::String(text) = value else {
            return Err(format!("field \"{key}\" must be a string"));
        };
        fields.insert(key, text);
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> AppState {
        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.storage.data_file = dir
            .path()
            .join("records.json")
            .to_string_lossy()
            .into_owned();
        AppState::new(&config)
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_fields_accepts_flat_string_map() {
        let fields = parse_fields(&Bytes::from(r#"{"name":"Alice","city":"Pune"}"#)).unwrap();
        assert_eq!(fields.get("name").map(String::as_str), Some("Alice"));
        assert_eq!(fields.get("city").map(String::as_str), Some("Pune"));
    }

    #[test]
    fn test_parse_fields_rejects_malformed_bodies() {
        assert!(parse_fields(&Bytes::from("not json")).is_err());
        assert!(parse_fields(&Bytes::from("[1,2]")).is_err());
        assert!(parse_fields(&Bytes::from(r#""just a string""#)).is_err());
        assert!(parse_fields(&Bytes::from(r#"{"age":30}"#)).is_err());
        assert!(parse_fields(&Bytes::from(r#"{"tags":["a"]}"#)).is_err());
    }

    #[test]
    fn test_parse_fields_rejects_reserved_id_member() {
        let err = parse_fields(&Bytes::from(r#"{"id":"7","name":"Alice"}"#)).unwrap_err();
        assert!(err.contains("id"));
    }

    #[tokio::test]
    async fn test_create_get_delete_scenario() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let created = handle_create(&state, &Bytes::from(r#"{"name":"Alice"}"#));
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(created).await,
            serde_json::json!({"id": "1", "name": "Alice"})
        );

        let fetched = handle_get(&state, "1");
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(
            body_json(fetched).await,
            serde_json::json!({"id": "1", "name": "Alice"})
        );

        let deleted = handle_delete(&state, "1");
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = handle_get(&state, "1");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(missing).await["error"], "not_found");
    }

    #[tokio::test]
    async fn test_update_returns_updated_record() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        handle_create(&state, &Bytes::from(r#"{"name":"Alice"}"#));
        let updated = handle_update(&state, "1", &Bytes::from(r#"{"name":"Alicia"}"#));
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(
            body_json(updated).await,
            serde_json::json!({"id": "1", "name": "Alicia"})
        );
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = handle_update(&state, "9", &Bytes::from(r#"{"name":"Ghost"}"#));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_malformed_body_beats_unknown_id() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = handle_update(&state, "9", &Bytes::from("not json"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_list_applies_query_filter() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        handle_create(&state, &Bytes::from(r#"{"name":"Alice","city":"Pune"}"#));
        handle_create(&state, &Bytes::from(r#"{"name":"Bob","city":"Delhi"}"#));

        let all = body_json(handle_list(&state, None)).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let filtered = body_json(handle_list(&state, Some("city=Pune"))).await;
        assert_eq!(
            filtered,
            serde_json::json!([{"id": "1", "name": "Alice", "city": "Pune"}])
        );

        let none = body_json(handle_list(&state, Some("city=Berlin"))).await;
        assert_eq!(none, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_rejects_id_in_body() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let response = handle_create(&state, &Bytes::from(r#"{"id":"99","name":"Eve"}"#));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.store.list().unwrap().is_empty());
    }
}
