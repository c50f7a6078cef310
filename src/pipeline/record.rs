//! Record assembly and persona selection

use crate::config::PersonaConfig;
use crate::types::{
    Article, BlogRecord, GenerationRequest, RecordStatus, Rendition, UploadedImage,
};
use crate::utils::{primary_keyword, slugify};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Author presentation attached to a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    /// Display author
    pub author: String,
    /// Avatar URL
    pub avatar: String,
    /// Accent colour
    pub color: String,
}

type Chooser = Box<dyn Fn(usize) -> usize + Send + Sync>;

/// Picks an author and accent colour for each record
///
/// Uses `rand` by default; [`PersonaPicker::with_chooser`] makes the choice
/// deterministic.
pub struct PersonaPicker {
    config: PersonaConfig,
    choose: Chooser,
}

impl std::fmt::Debug for PersonaPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonaPicker")
            .field("config", &self.config)
            .field("choose", &"<fn>")
            .finish()
    }
}

impl PersonaPicker {
    /// Random selection from the configured lists
    pub fn random(config: PersonaConfig) -> Self {
        Self::with_chooser(config, |len| rand::thread_rng().gen_range(0..len))
    }

    /// Selection through `choose`, which maps a list length to an index
    ///
    /// Out-of-range indices wrap around.
    pub fn with_chooser<F>(config: PersonaConfig, choose: F) -> Self
    where
        F: Fn(usize) -> usize + Send + Sync + 'static,
    {
        Self {
            config,
            choose: Box::new(choose),
        }
    }

    /// Pick a persona
    pub fn pick(&self) -> Persona {
        let author = self.choose_from(&self.config.authors);
        let color = self.choose_from(&self.config.colors);
        let avatar = if author.is_empty() {
            String::new()
        } else {
            self.config.avatar_url_template.replace("{author}", &author)
        };
        Persona {
            author,
            avatar,
            color,
        }
    }

    fn choose_from(&self, items: &[String]) -> String {
        if items.is_empty() {
            return String::new();
        }
        let index = (self.choose)(items.len()) % items.len();
        items[index].clone()
    }
}

/// Build the record for a run from its article and the uploads that succeeded
///
/// `image_urls` is ordered by asset index. The record is `complete` only when
/// at least `requested` images were uploaded. Each rendition field takes the
/// URL from the lowest-index image that has that rendition.
pub fn assemble_record(
    request: &GenerationRequest,
    article: &Article,
    uploaded: &[UploadedImage],
    persona: Persona,
    now: DateTime<Utc>,
) -> BlogRecord {
    let mut images: Vec<&UploadedImage> = uploaded.iter().collect();
    images.sort_by_key(|u| u.index);

    let status = if images.len() as u64 >= u64::from(request.image_count.max(1)) {
        RecordStatus::Complete
    } else {
        RecordStatus::Partial
    };

    let rendition = |r: Rendition| {
        images
            .iter()
            .find_map(|u| u.renditions.get(&r))
            .cloned()
            .unwrap_or_default()
    };
    let (org, card, cover) = (
        rendition(Rendition::Org),
        rendition(Rendition::Card),
        rendition(Rendition::Cover),
    );

    let slug = match slugify(&article.title) {
        s if s.is_empty() => request.run_id.to_string(),
        s => s,
    };

    BlogRecord {
        id: request.run_id.to_string(),
        slug,
        title: article.title.clone(),
        body: article.body.clone(),
        description: article.description.clone().unwrap_or_default(),
        keyword: primary_keyword(&article.keywords),
        keywords: article.keywords.clone(),
        tags: article.tags.iter().cloned().collect(),
        image_urls: images.into_iter().map(|u| u.url.clone()).collect(),
        author: persona.author,
        avatar: persona.avatar,
        color: persona.color,
        org,
        card,
        cover,
        status,
        published: true,
        created_at: now,
        updated_at: now,
    }
}
