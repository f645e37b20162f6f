use rand::Rng;

pub const AUDIO_DIR: &str = "/audio";

/// Paths and title derived from one playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTrack {
    pub index: usize,
    pub title: String,
    pub audio_path: String,
    pub cover_path: String,
}

/// What to do when the current track finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndedAction {
    Restart,
    Play(usize),
}

/// Strip the last extension: `song.live.mp3` -> `song.live`. A name without a
/// dot has no basename.
pub fn cover_basename(song: &str) -> &str {
    song.rsplit_once('.').map(|(base, _)| base).unwrap_or("")
}

pub fn audio_path(song: &str) -> String {
    format!("{AUDIO_DIR}/{song}")
}

pub fn cover_path(images_dir: &str, song: &str) -> String {
    format!("{images_dir}/{}.jpg", cover_basename(song))
}

/// Playlist contents plus transport flags. Owned by the app and mutated only
/// from message handlers.
#[derive(Debug)]
pub struct PlayerState {
    songs: Vec<String>,
    current: usize,
    pub shuffle: bool,
    pub repeat: bool,
    pub muted: bool,
    volume: f32,
    images_dir: String,
}

impl PlayerState {
    pub fn new(images_dir: &str) -> Self {
        PlayerState {
            songs: Vec::new(),
            current: 0,
            shuffle: false,
            repeat: false,
            muted: false,
            volume: 1.0,
            images_dir: images_dir.to_string(),
        }
    }

    pub fn songs(&self) -> &[String] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_song(&self) -> Option<&str> {
        self.songs.get(self.current).map(String::as_str)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.volume
    }

    pub fn replace_songs(&mut self, songs: Vec<String>) {
        self.songs = songs;
        self.current = 0;
    }

    /// Make `index` current and derive its source paths. Out-of-range
    /// indices leave the state untouched.
    pub fn load_track(&mut self, index: usize) -> Option<LoadedTrack> {
        let song = self.songs.get(index)?;
        let track = LoadedTrack {
            index,
            title: song.clone(),
            audio_path: audio_path(song),
            cover_path: cover_path(&self.images_dir, song),
        };
        self.current = index;
        Some(track)
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }
        Some((self.current + 1) % self.songs.len())
    }

    pub fn prev_index(&self) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }
        let len = self.songs.len();
        Some((self.current + len - 1) % len)
    }

    /// Repeat wins over shuffle; shuffle may pick the current track again.
    pub fn on_ended<R: Rng>(&self, rng: &mut R) -> Option<EndedAction> {
        if self.songs.is_empty() {
            return None;
        }
        if self.repeat {
            Some(EndedAction::Restart)
        } else if self.shuffle {
            Some(EndedAction::Play(rng.random_range(0..self.songs.len())))
        } else {
            self.next_index().map(EndedAction::Play)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn next(s: &mut PlayerState) -> Option<LoadedTrack> {
        let index = s.next_index()?;
        s.load_track(index)
    }

    fn prev(s: &mut PlayerState) -> Option<LoadedTrack> {
        let index = s.prev_index()?;
        s.load_track(index)
    }

    fn state(songs: &[&str]) -> PlayerState {
        let mut state = PlayerState::new("/static/images");
        state.replace_songs(songs.iter().map(|s| s.to_string()).collect());
        state
    }

    #[test]
    fn load_track_derives_paths() {
        let mut s = state(&["a.mp3", "b side.wav"]);
        let track = s.load_track(1).unwrap();
        assert_eq!(track.title, "b side.wav");
        assert_eq!(track.audio_path, "/audio/b side.wav");
        assert_eq!(track.cover_path, "/static/images/b side.jpg");
        assert_eq!(s.current(), 1);
    }

    #[test]
    fn load_track_matches_every_index() {
        let mut s = state(&["a.mp3", "b.mp3", "c.mp3", "d.wav"]);
        for i in 0..s.len() {
            let track = s.load_track(i).unwrap();
            assert_eq!(track.audio_path, format!("/audio/{}", s.songs()[i]));
            assert_eq!(track.title, s.songs()[i]);
        }
    }

    #[test]
    fn load_track_out_of_range_is_ignored() {
        let mut s = state(&["a.mp3"]);
        assert!(s.load_track(3).is_none());
        assert_eq!(s.current(), 0);
    }

    #[test]
    fn cover_basename_strips_only_last_extension() {
        assert_eq!(cover_basename("song.live.mp3"), "song.live");
        assert_eq!(cover_basename("track.wav"), "track");
        assert_eq!(cover_basename("noext"), "");
    }

    #[test]
    fn next_wraps_to_start() {
        let mut s = state(&["a.mp3", "b.mp3", "c.mp3"]);
        s.load_track(2);
        let track = next(&mut s).unwrap();
        assert_eq!(s.current(), 0);
        assert_eq!(track.audio_path, "/audio/a.mp3");
    }

    #[test]
    fn prev_wraps_to_end() {
        let mut s = state(&["a.mp3", "b.mp3", "c.mp3"]);
        let track = prev(&mut s).unwrap();
        assert_eq!(track.index, 2);
        assert_eq!(track.audio_path, "/audio/c.mp3");
    }

    #[test]
    fn next_then_prev_is_identity() {
        for len in 1..6 {
            let songs: Vec<String> = (0..len).map(|i| format!("{i}.mp3")).collect();
            let mut s = PlayerState::new("/img");
            s.replace_songs(songs);
            for start in 0..len {
                s.load_track(start);
                next(&mut s);
                prev(&mut s);
                assert_eq!(s.current(), start, "len {len}");
                prev(&mut s);
                next(&mut s);
                assert_eq!(s.current(), start, "len {len}");
            }
        }
    }

    #[test]
    fn empty_playlist_navigation_is_noop() {
        let mut s = state(&[]);
        assert!(next(&mut s).is_none());
        assert!(prev(&mut s).is_none());
        assert_eq!(s.current(), 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(s.on_ended(&mut rng).is_none());
    }

    #[test]
    fn ended_with_repeat_restarts() {
        let mut s = state(&["a.mp3", "b.mp3"]);
        s.repeat = true;
        s.shuffle = true;
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(s.on_ended(&mut rng), Some(EndedAction::Restart));
    }

    #[test]
    fn ended_with_shuffle_stays_in_bounds() {
        let mut s = state(&["a.mp3", "b.mp3", "c.mp3"]);
        s.shuffle = true;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            match s.on_ended(&mut rng) {
                Some(EndedAction::Play(i)) => assert!(i < 3),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn ended_sequential_advances() {
        let mut s = state(&["a.mp3", "b.mp3"]);
        s.load_track(1);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(s.on_ended(&mut rng), Some(EndedAction::Play(0)));
    }

    #[test]
    fn volume_is_clamped() {
        let mut s = state(&[]);
        assert_eq!(s.set_volume(1.5), 1.0);
        assert_eq!(s.set_volume(-0.2), 0.0);
        assert_eq!(s.set_volume(0.35), 0.35);
        assert_eq!(s.set_volume(f32::NAN), 0.0);
    }
}
