use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The fixed set of languages every blog is authored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Es,
    Fr,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Ru, Language::En, Language::Es, Language::Fr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            other => Err(StoreError::InvalidLanguage(other.to_string())),
        }
    }
}

/// Editorial category of a blog post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogType {
    Interview,
    Article,
    Fact,
}

impl BlogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogType::Interview => "interview",
            BlogType::Article => "article",
            BlogType::Fact => "fact",
        }
    }
}

impl fmt::Display for BlogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlogType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interview" => Ok(BlogType::Interview),
            "article" => Ok(BlogType::Article),
            "fact" => Ok(BlogType::Fact),
            other => Err(StoreError::Validation(format!("invalid blog type: {other}"))),
        }
    }
}

/// One unit of a translation body. The set is closed: a block carries
/// exactly one tag, and unknown tags fail deserialization instead of
/// passing through as untyped data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Title {
        text: String,
    },
    Quote {
        text: String,
    },
    List {
        items: Vec<String>,
    },
    Image {
        image: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

/// Language-specific payload of one blog post. The same shape is used for
/// writes and reads; `date` is display-formatted by the client and stored
/// as opaque text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub content: Vec<ContentBlock>,
}

/// Admin view of a blog: the root row plus every stored translation,
/// keyed by language. Languages without a translation row are absent.
#[derive(Clone, Debug, Serialize)]
pub struct Blog {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: BlogType,
    pub created_at: String,
    pub updated_at: String,
    pub translations: BTreeMap<Language, Translation>,
}

/// Public, single-language projection of a blog. A missing translation
/// leaves the text fields empty rather than failing the read.
#[derive(Clone, Debug, Serialize)]
pub struct PublicBlog {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: BlogType,
    pub title: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub content: Option<Vec<ContentBlock>>,
    pub created_at: String,
    pub updated_at: String,
    pub images: Vec<String>,
}

/// Payload for creating a blog. Creation requires a translation for every
/// supported language; images are optional ordered lists per language.
/// The wire field for translations is `blogs`, as the admin client sends it.
#[derive(Clone, Debug, Deserialize)]
pub struct NewBlog {
    #[serde(rename = "type")]
    pub kind: BlogType,
    #[serde(rename = "blogs")]
    pub translations: BTreeMap<Language, Translation>,
    #[serde(default)]
    pub images: BTreeMap<Language, Vec<String>>,
}

/// Payload for updating a blog. Absent fields leave stored state
/// untouched; a present `images` map replaces the stored image lists of
/// every language in full.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateBlog {
    #[serde(rename = "type", default)]
    pub kind: Option<BlogType>,
    #[serde(rename = "blogs", default)]
    pub translations: BTreeMap<Language, Translation>,
    #[serde(default)]
    pub images: Option<BTreeMap<Language, Vec<String>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_only_the_fixed_set() {
        assert_eq!("ru".parse::<Language>().unwrap(), Language::Ru);
        assert_eq!("fr".parse::<Language>().unwrap(), Language::Fr);
        assert!(matches!(
            "de".parse::<Language>(),
            Err(StoreError::InvalidLanguage(l)) if l == "de"
        ));
        assert!("EN".parse::<Language>().is_err());
    }

    #[test]
    fn blog_type_parses_only_the_fixed_set() {
        assert_eq!("article".parse::<BlogType>().unwrap(), BlogType::Article);
        assert!(matches!(
            "essay".parse::<BlogType>(),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn content_blocks_are_a_closed_set() -> anyhow::Result<()> {
        let body = serde_json::json!([
            { "type": "title", "text": "Cotton report" },
            { "type": "text", "text": "The harvest was early this year." },
            { "type": "quote", "text": "Best season in a decade." },
            { "type": "list", "items": ["yield", "quality"] },
            { "type": "image", "image": "/uploads/a.png", "caption": "The field" },
            { "type": "image", "image": "/uploads/b.png" }
        ]);
        let blocks: Vec<ContentBlock> = serde_json::from_value(body)?;
        assert_eq!(blocks.len(), 6);
        assert_eq!(
            blocks[4],
            ContentBlock::Image {
                image: "/uploads/a.png".to_string(),
                caption: Some("The field".to_string()),
            }
        );

        // A block tagged outside the set must not deserialize.
        let bad = serde_json::json!([{ "type": "video", "url": "x" }]);
        assert!(serde_json::from_value::<Vec<ContentBlock>>(bad).is_err());
        Ok(())
    }

    #[test]
    fn caption_is_omitted_when_absent() -> anyhow::Result<()> {
        let block = ContentBlock::Image {
            image: "/uploads/c.webp".to_string(),
            caption: None,
        };
        let json = serde_json::to_value(&block)?;
        assert_eq!(
            json,
            serde_json::json!({ "type": "image", "image": "/uploads/c.webp" })
        );
        Ok(())
    }

    #[test]
    fn new_blog_reads_the_admin_client_shape() -> anyhow::Result<()> {
        let body = serde_json::json!({
            "type": "interview",
            "blogs": {
                "en": {
                    "title": "An interview",
                    "date": "May 3, 2025",
                    "content": [{ "type": "text", "text": "Q and A." }]
                }
            },
            "images": { "en": ["/uploads/x.jpg"] }
        });
        let new: NewBlog = serde_json::from_value(body)?;
        assert_eq!(new.kind, BlogType::Interview);
        assert_eq!(new.translations[&Language::En].title, "An interview");
        assert_eq!(new.images[&Language::En], vec!["/uploads/x.jpg"]);
        Ok(())
    }
}
