use std::{sync::mpsc::Sender, thread};

use tracing::{debug, info, warn};

use crate::app::Message;
use crate::error::{PlayerError, Result};

// Audio files can be large; ureq's default body limit is 10 MB.
const MAX_DOWNLOAD: u64 = 512 * 1024 * 1024;

fn url_encode(s: &str) -> String {
    let mut out = String::new();
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// HTTP client for the song server.
#[derive(Clone)]
pub struct Remote {
    base: String,
    agent: ureq::Agent,
}

impl Remote {
    pub fn new(base: &str) -> Self {
        Remote {
            base: base.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// Resolve a server path such as `/audio/My Song.mp3` to a full URL,
    /// percent-encoding each path segment.
    pub fn url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(url_encode)
            .collect();
        format!("{}/{}", self.base, encoded.join("/"))
    }

    pub fn songs(&self) -> Result<Vec<String>> {
        let url = self.url("/songs");
        let body = self
            .agent
            .get(&url)
            .call()
            .and_then(|mut res| res.body_mut().read_to_string())
            .map_err(|e| PlayerError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        parse_song_list(&body)
    }

    pub fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!(%url, "fetching");
        self.agent
            .get(&url)
            .call()
            .and_then(|mut res| res.body_mut().with_config().limit(MAX_DOWNLOAD).read_to_vec())
            .map_err(|e| PlayerError::Http {
                url,
                reason: e.to_string(),
            })
    }
}

pub fn parse_song_list(body: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(body)?)
}

/// Fetch the song list off the UI thread. Failure is logged and otherwise
/// ignored, leaving the playlist empty.
pub fn spawn_song_fetch(remote: Remote, tx: Sender<Message>) {
    thread::spawn(move || match remote.songs() {
        Ok(songs) => {
            info!(count = songs.len(), "song list loaded");
            let _ = tx.send(Message::SongsLoaded(songs));
        }
        Err(e) => warn!("song list unavailable: {e}"),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_each_segment() {
        let remote = Remote::new("http://localhost:5000/");
        assert_eq!(remote.url("/songs"), "http://localhost:5000/songs");
        assert_eq!(
            remote.url("/audio/My Song (live).mp3"),
            "http://localhost:5000/audio/My%20Song%20%28live%29.mp3"
        );
        assert_eq!(
            remote.url("/static/images/café.jpg"),
            "http://localhost:5000/static/images/caf%C3%A9.jpg"
        );
    }

    #[test]
    fn song_list_parses_json_array() {
        let songs = parse_song_list(r#"["a.mp3", "b.wav"]"#).unwrap();
        assert_eq!(songs, vec!["a.mp3".to_string(), "b.wav".to_string()]);
        assert!(parse_song_list("[]").unwrap().is_empty());
    }

    #[test]
    fn song_list_rejects_non_array() {
        assert!(matches!(
            parse_song_list(r#"{"songs": []}"#),
            Err(PlayerError::Json(_))
        ));
        assert!(parse_song_list("[1, 2]").is_err());
    }
}
