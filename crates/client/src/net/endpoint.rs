use url::Url;

use super::error::SessionError;

/// Socket URL of a room: `http(s)` bases become `ws(s)` and the room name is
/// appended as `/rooms/<name>`.
pub fn room_url(endpoint: &str, room_name: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(endpoint.trim())?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(SessionError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| SessionError::UnsupportedScheme(scheme.to_string()))?;
    }

    url.path_segments_mut()
        .map_err(|_| SessionError::UnsupportedScheme(scheme.to_string()))?
        .pop_if_empty()
        .extend(["rooms", room_name]);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_becomes_ws() {
        let url = room_url("http://localhost:2567", "my_room").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:2567/rooms/my_room");
    }

    #[test]
    fn test_https_base_path_is_kept() {
        let url = room_url("https://example.com/game/", "lobby").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/game/rooms/lobby");
    }

    #[test]
    fn test_room_name_is_encoded() {
        let url = room_url("ws://127.0.0.1:9000", "a b/c").unwrap();
        assert_eq!(url.path(), "/rooms/a%20b%2Fc");
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(matches!(
            room_url("not a url", "x"),
            Err(SessionError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            room_url("ftp://host", "x"),
            Err(SessionError::UnsupportedScheme(_))
        ));
    }
}
