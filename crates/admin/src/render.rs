//! Plain-text cards for catalog entities.

use musicly_client::notice::Notice;
use musicly_core::album::Album;
use musicly_core::audio::Audio;
use musicly_core::category::Category;
use musicly_core::resource::Resource;

/// A multi-line summary of an entity.
pub trait Card: Resource {
    fn details(&self) -> Vec<String>;

    fn card(&self) -> String {
        let mut lines = vec![
            format!("{} / {}", self.title().en(), self.title().ar()),
            format!("  id: {}  slug: {}", self.id(), self.slug()),
        ];
        lines.extend(self.details().into_iter().map(|line| format!("  {line}")));
        lines.push(format!("  thumbnail: {}", self.thumbnail().unwrap_or("-")));
        lines.join("\n")
    }
}

impl Card for Category {
    fn details(&self) -> Vec<String> {
        vec![format!("albums: {}", self.album_count())]
    }
}

impl Card for Album {
    fn details(&self) -> Vec<String> {
        vec![
            format!("category: {}", self.category_id().unwrap_or("-")),
            format!("tracks: {}", self.audios.len()),
        ]
    }
}

impl Card for Audio {
    fn details(&self) -> Vec<String> {
        vec![
            format!(
                "free: {}  published: {}",
                yes_no(self.is_free),
                yes_no(self.published)
            ),
            format!("audio: {}", self.audio.as_deref().unwrap_or("-")),
        ]
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn list<R: Card>(items: &[R]) -> String {
    if items.is_empty() {
        return format!("No {} found", R::COLLECTION);
    }
    items.iter().map(Card::card).collect::<Vec<_>>().join("\n\n")
}

pub fn notice(notice: &Notice) -> String {
    let mark = if notice.is_success() { '✓' } else { '✗' };
    format!("{mark} {}", notice.message)
}
