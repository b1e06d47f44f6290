use std::collections::BTreeMap;

use polyblog::db::Db;
use polyblog::error::StoreError;
use polyblog::model::{BlogType, ContentBlock, Language, NewBlog, Translation, UpdateBlog};
use polyblog::store::BlogStore;

fn translation(title: &str) -> Translation {
    Translation {
        title: title.to_string(),
        date: "June 1, 2025".to_string(),
        source: Some("Field report".to_string()),
        content: vec![
            ContentBlock::Title {
                text: "Season overview".to_string(),
            },
            ContentBlock::Text {
                text: "The first paragraph.".to_string(),
            },
            ContentBlock::Quote {
                text: "A quotable line.".to_string(),
            },
            ContentBlock::Image {
                image: "/uploads/inline.jpg".to_string(),
                caption: Some("Inline shot".to_string()),
            },
        ],
    }
}

fn complete_blog() -> NewBlog {
    NewBlog {
        kind: BlogType::Interview,
        translations: Language::ALL
            .iter()
            .map(|lang| (*lang, translation(&format!("Interview {lang}"))))
            .collect(),
        images: BTreeMap::from([(
            Language::En,
            vec![
                "/uploads/cover.jpg".to_string(),
                "/uploads/second.jpg".to_string(),
            ],
        )]),
    }
}

#[test]
fn aggregate_lifecycle() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = BlogStore::new(Db::open_memory()?);
    store.migrate()?;

    // Create: one transaction produces the root row, four translations
    // and the ordered English image list.
    let id = store.create(&complete_blog())?;

    let admin = store.get_all_for_admin()?;
    assert_eq!(admin.len(), 1);
    assert_eq!(admin[0].translations.len(), 4);
    assert_eq!(
        admin[0].translations[&Language::Es].title,
        "Interview es"
    );

    let public = store.get_public_by_id(Language::En, id)?;
    assert_eq!(public.title.as_deref(), Some("Interview en"));
    assert_eq!(
        public.images,
        vec!["/uploads/cover.jpg", "/uploads/second.jpg"]
    );
    assert_eq!(
        public.content.as_ref().map(|c| c.len()),
        Some(translation("x").content.len())
    );

    // Update: retitle French only, swap the type, and replace the image
    // list with a reordered subset.
    let mut retitled = translation("Interview fr, revised");
    retitled.source = None;
    store.update(
        id,
        &UpdateBlog {
            kind: Some(BlogType::Article),
            translations: BTreeMap::from([(Language::Fr, retitled.clone())]),
            images: Some(BTreeMap::from([(
                Language::En,
                vec!["/uploads/second.jpg".to_string()],
            )])),
        },
    )?;

    let admin = store.get_all_for_admin()?;
    assert_eq!(admin[0].kind, BlogType::Article);
    assert_eq!(admin[0].translations[&Language::Fr], retitled);
    // English text is untouched; its image list was fully replaced.
    assert_eq!(
        admin[0].translations[&Language::En].title,
        "Interview en"
    );
    assert_eq!(
        store.get_public_by_id(Language::En, id)?.images,
        vec!["/uploads/second.jpg"]
    );

    // Delete: the aggregate disappears for every language at once.
    store.delete(id)?;
    for lang in Language::ALL {
        assert!(matches!(
            store.get_public_by_id(lang, id),
            Err(StoreError::NotFound)
        ));
    }
    assert!(store.get_all_for_admin()?.is_empty());

    Ok(())
}

#[test]
fn failed_create_leaves_no_rows() -> anyhow::Result<()> {
    let store = BlogStore::new(Db::open_memory()?);
    store.migrate()?;

    let mut incomplete = complete_blog();
    incomplete.translations.remove(&Language::Ru);
    assert!(matches!(
        store.create(&incomplete),
        Err(StoreError::Validation(_))
    ));

    assert!(store.get_all_for_admin()?.is_empty());
    assert!(store.get_public(Language::En)?.is_empty());
    Ok(())
}
