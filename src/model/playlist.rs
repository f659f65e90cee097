use rand::{rng, seq::SliceRandom};

use crate::model::track::{MalformedDuration, Track};

/// An ordered, navigable collection of tracks with a current-position
/// cursor. Navigation wraps in both directions; a single entry is not
/// navigable.
#[derive(Debug, Clone)]
pub struct Playlist {
    title: String,
    entries: Vec<Track>,
    position: usize,
    shuffle_enabled: bool,
}

impl Playlist {
    pub fn new(title: impl Into<String>, entries: Vec<Track>) -> Self {
        Self {
            title: title.into(),
            entries,
            position: 0,
            shuffle_enabled: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[Track] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn has_prev(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn next(&mut self) -> Option<&Track> {
        if !self.has_next() {
            return None;
        }
        self.position = (self.position + 1) % self.entries.len();
        self.entries.get(self.position)
    }

    pub fn prev(&mut self) -> Option<&Track> {
        if !self.has_prev() {
            return None;
        }
        self.position = (self.position + self.entries.len() - 1) % self.entries.len();
        self.entries.get(self.position)
    }

    pub fn set_position(&mut self, position: usize) {
        if position < self.entries.len() {
            self.position = position;
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&Track> {
        self.entries.get(self.position)
    }

    pub fn is_shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    /// Enabling permutes the entries randomly; disabling restores ascending
    /// order by title. The cursor follows the track that was current before
    /// the toggle.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if let Some(current) = self.current().cloned() {
            if enabled {
                self.entries.shuffle(&mut rng());
            } else {
                self.entries.sort_by(|a, b| a.title().cmp(b.title()));
            }
            if let Some(index) = self.entries.iter().position(|t| *t == current) {
                self.position = index;
            }
        }
        self.shuffle_enabled = enabled;
    }

    pub fn total_duration(&self) -> Result<String, MalformedDuration> {
        let mut total = 0;
        for entry in &self.entries {
            total += entry.duration_in_seconds()?;
        }
        Ok(Track::format_seconds(total, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, title: &str, duration: &str) -> Track {
        Track::new(
            id,
            title,
            "",
            "",
            format!("https://audio.example/{id}"),
            duration,
        )
    }

    fn playlist_of(n: usize) -> Playlist {
        let entries = (0..n)
            .map(|i| track(&format!("id{i}"), &format!("title{i}"), "PT1M"))
            .collect();
        Playlist::new("mix", entries)
    }

    #[test]
    fn next_wraps_back_to_start() {
        let mut playlist = playlist_of(4);
        let first = playlist.current().cloned().unwrap();
        for _ in 0..4 {
            assert!(playlist.next().is_some());
        }
        assert_eq!(playlist.current(), Some(&first));
    }

    #[test]
    fn prev_wraps_to_end() {
        let mut playlist = playlist_of(4);
        let first = playlist.current().cloned().unwrap();
        assert_eq!(playlist.prev().unwrap().id(), "id3");
        for _ in 0..3 {
            assert!(playlist.prev().is_some());
        }
        assert_eq!(playlist.current(), Some(&first));
    }

    #[test]
    fn single_entry_is_not_navigable() {
        let mut playlist = playlist_of(1);
        assert!(!playlist.has_next());
        assert!(!playlist.has_prev());
        assert!(playlist.next().is_none());
        assert!(playlist.prev().is_none());
        assert_eq!(playlist.position(), 0);
    }

    #[test]
    fn empty_playlist_has_no_current() {
        let mut playlist = playlist_of(0);
        assert!(playlist.current().is_none());
        assert!(playlist.next().is_none());
        playlist.set_shuffle(true);
        assert!(playlist.is_shuffle_enabled());
        assert!(playlist.current().is_none());
    }

    #[test]
    fn set_position_ignores_out_of_bounds() {
        let mut playlist = playlist_of(3);
        playlist.set_position(2);
        assert_eq!(playlist.position(), 2);
        playlist.set_position(3);
        assert_eq!(playlist.position(), 2);
    }

    #[test]
    fn shuffle_keeps_current_track() {
        let mut playlist = playlist_of(16);
        playlist.set_position(5);
        let current = playlist.current().cloned().unwrap();

        playlist.set_shuffle(true);
        assert!(playlist.is_shuffle_enabled());
        assert_eq!(playlist.current(), Some(&current));

        playlist.set_shuffle(false);
        assert!(!playlist.is_shuffle_enabled());
        assert_eq!(playlist.current(), Some(&current));
    }

    #[test]
    fn disabling_shuffle_restores_title_order() {
        let mut playlist = playlist_of(8);
        let original: Vec<String> = playlist.entries().iter().map(|t| t.id().to_string()).collect();

        playlist.set_shuffle(true);
        playlist.set_shuffle(false);

        let restored: Vec<String> = playlist.entries().iter().map(|t| t.id().to_string()).collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn total_duration_formats_aggregate() {
        let playlist = Playlist::new(
            "mix",
            vec![
                track("a", "a", "PT4M1S"),
                track("b", "b", "PT8M2S"),
                track("c", "c", "PT0S"),
            ],
        );
        assert_eq!(playlist.total_duration(), Ok("12:03".to_string()));
    }

    #[test]
    fn total_duration_propagates_parse_errors() {
        let playlist = Playlist::new("mix", vec![track("a", "a", "4 minutes")]);
        assert!(playlist.total_duration().is_err());
    }
}
