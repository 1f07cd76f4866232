//! Input validation run before any store access.
//!
//! Every violated field is reported in one pass.

use crate::error::{CoreError, CoreResult, FieldViolation};
use crate::model::album::AlbumSpec;
use crate::model::dj_set::{DjSetPatch, DjSetSpec};
use crate::model::song::{NewSong, SongSpec};

#[derive(Debug, Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn require_text(&mut self, field: impl Into<String>, value: &str) {
        if value.trim().is_empty() {
            self.0.push(FieldViolation::new(field, "is required"));
        }
    }

    fn require_non_empty<T>(&mut self, field: impl Into<String>, values: &[T], what: &str) {
        if values.is_empty() {
            self.0
                .push(FieldViolation::new(field, format!("must contain at least one {what}")));
        }
    }

    fn require_artists(&mut self, field: String, artists: &[String]) {
        self.require_non_empty(field.clone(), artists, "artist");
        for (index, artist) in artists.iter().enumerate() {
            self.require_text(format!("{field}[{index}]"), artist);
        }
    }

    fn finish(self) -> CoreResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationFailure(self.0))
        }
    }
}

pub fn validate_album_spec(spec: &AlbumSpec) -> CoreResult<()> {
    let mut violations = Violations::default();
    check_album(&mut violations, spec);
    violations.finish()
}

/// Album plus its initial songs; the song list may not be empty.
pub fn validate_album_with_songs(spec: &AlbumSpec, songs: &[NewSong]) -> CoreResult<()> {
    let mut violations = Violations::default();
    check_album(&mut violations, spec);
    violations.require_non_empty("songs", songs, "song");
    for (index, song) in songs.iter().enumerate() {
        check_song(&mut violations, index, &song.title, &song.artists);
    }
    violations.finish()
}

pub fn validate_song_batch(batch: &[SongSpec]) -> CoreResult<()> {
    let mut violations = Violations::default();
    violations.require_non_empty("songs", batch, "song");
    for (index, song) in batch.iter().enumerate() {
        check_song(&mut violations, index, &song.title, &song.artists);
        violations.require_text(format!("songs[{index}].album_id"), song.album_id.as_str());
    }
    violations.finish()
}

pub fn validate_set_spec(spec: &DjSetSpec) -> CoreResult<()> {
    let mut violations = Violations::default();
    violations.require_text("title", &spec.title);
    violations.require_text("creator", &spec.creator);
    violations.require_non_empty("songs", &spec.songs, "song");
    violations.finish()
}

pub fn validate_set_patch(patch: &DjSetPatch) -> CoreResult<()> {
    let mut violations = Violations::default();
    if let Some(title) = &patch.title {
        violations.require_text("title", title);
    }
    if let Some(creator) = &patch.creator {
        violations.require_text("creator", creator);
    }
    if let Some(songs) = &patch.songs {
        violations.require_non_empty("songs", songs, "song");
    }
    violations.finish()
}

fn check_album(violations: &mut Violations, spec: &AlbumSpec) {
    violations.require_text("album.title", &spec.title);
    violations.require_text("album.record_label", &spec.record_label);
    violations.require_text("album.label_number", &spec.label_number);
    violations.require_artists("album.artists".to_string(), &spec.artists);
}

fn check_song(violations: &mut Violations, index: usize, title: &str, artists: &[String]) {
    violations.require_text(format!("songs[{index}].title"), title);
    violations.require_artists(format!("songs[{index}].artists"), artists);
}

#[cfg(test)]
mod tests {
    use super::{validate_album_with_songs, validate_set_patch, validate_song_batch};
    use crate::error::CoreError;
    use crate::model::album::AlbumSpec;
    use crate::model::dj_set::DjSetPatch;
    use crate::model::song::NewSong;

    #[test]
    fn album_with_songs_reports_every_violation() {
        let spec = AlbumSpec::new(" ", "Label", "", vec![]);
        let err = validate_album_with_songs(&spec, &[NewSong::new("", vec!["A".into()])])
            .unwrap_err();
        let CoreError::ValidationFailure(violations) = err else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "album.title",
                "album.label_number",
                "album.artists",
                "songs[0].title"
            ]
        );
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            validate_song_batch(&[]),
            Err(CoreError::ValidationFailure(_))
        ));
    }

    #[test]
    fn empty_patch_is_valid() {
        validate_set_patch(&DjSetPatch::default()).unwrap();
    }

    #[test]
    fn patch_with_blank_title_is_rejected() {
        let patch = DjSetPatch {
            title: Some("  ".to_string()),
            ..DjSetPatch::default()
        };
        assert!(validate_set_patch(&patch).is_err());
    }
}
