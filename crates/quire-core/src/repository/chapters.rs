//! Chapters of a chaptered document
//!
//! The document manifest holds the ordered chapter references; each chapter
//! folder holds a `chapter.json` with the chapter's own block list.

use tracing::{debug, info, warn};

use super::documents::DocumentRepository;
use super::{next_sequential_id, slugify};
use crate::models::{Chapter, ChapterReference, Document};
use crate::position::{insert_at_position, Position};
use crate::storage::layout::{self, Layout, BLOCKS_DIR};
use crate::storage::persistence;
use crate::storage::{StoreError, StoreResult};

const CHAPTER_PREFIX: &str = "ch";

/// Longest title slug used in a chapter folder name
const MAX_SLUG_LEN: usize = 30;

#[derive(Debug, Clone)]
pub struct ChapterRepository {
    layout: Layout,
    documents: DocumentRepository,
}

impl ChapterRepository {
    pub fn new(layout: Layout, documents: DocumentRepository) -> Self {
        Self { layout, documents }
    }

    /// Add a chapter and return its ID
    pub fn add(&self, doc_id: &str, title: &str, position: &Position) -> StoreResult<String> {
        let mut doc = self.documents.get(doc_id)?;
        if !doc.has_chapters {
            return Err(StoreError::ChaptersNotSupported {
                document: doc_id.to_string(),
            });
        }

        let chapter_id =
            next_sequential_id(CHAPTER_PREFIX, doc.chapters.iter().map(|c| c.id.as_str()));
        let folder = layout::chapter_folder(&chapter_id, &slugify(title, MAX_SLUG_LEN));
        let chapter_dir = self.layout.resolve(doc_id, &folder);

        let reference = ChapterReference {
            id: chapter_id.clone(),
            title: title.to_string(),
            folder,
        };

        let result = persistence::create_dir_all(&chapter_dir.join(BLOCKS_DIR))
            .and_then(|_| self.write(doc_id, &reference, &Chapter::new(&chapter_id, title)))
            .and_then(|_| {
                insert_at_position(&mut doc.chapters, reference.clone(), position);
                self.documents.save(&mut doc)
            });

        if let Err(e) = result {
            if let Err(cleanup) = persistence::remove_dir_all(&chapter_dir) {
                warn!("Failed to clean up chapter folder: {}", cleanup);
            }
            return Err(e);
        }

        info!("Added chapter '{}' to '{}'", chapter_id, doc_id);
        Ok(chapter_id)
    }

    /// Load one chapter
    ///
    /// A flat document has no chapters, so every ID is not found there.
    pub fn get(&self, doc_id: &str, chapter_id: &str) -> StoreResult<Chapter> {
        let doc = self.documents.get(doc_id)?;
        self.load(&doc, chapter_id)
    }

    /// Load one chapter of an already loaded document
    pub fn load(&self, doc: &Document, chapter_id: &str) -> StoreResult<Chapter> {
        let reference = find_reference(doc, chapter_id)?;
        self.read(&doc.id, reference)
    }

    /// Load the chapter file a reference points at
    pub fn read(&self, doc_id: &str, reference: &ChapterReference) -> StoreResult<Chapter> {
        let path = self.layout.chapter_file(doc_id, &reference.folder);
        persistence::read_json(&path)
    }

    /// All chapters in manifest order
    pub fn list(&self, doc_id: &str) -> StoreResult<Vec<Chapter>> {
        let doc = self.documents.get(doc_id)?;
        doc.chapters
            .iter()
            .map(|reference| self.read(doc_id, reference))
            .collect()
    }

    /// Overwrite a chapter file
    pub fn save(&self, doc_id: &str, chapter_id: &str, chapter: &Chapter) -> StoreResult<()> {
        let doc = self.documents.get(doc_id)?;
        let reference = find_reference(&doc, chapter_id)?;
        self.write(doc_id, reference, chapter)
    }

    pub(crate) fn write(
        &self,
        doc_id: &str,
        reference: &ChapterReference,
        chapter: &Chapter,
    ) -> StoreResult<()> {
        let path = self.layout.chapter_file(doc_id, &reference.folder);
        debug!("Saving chapter {:?}", path);
        persistence::write_json(&path, chapter)
    }

    /// Rename a chapter in both the manifest and the chapter file
    ///
    /// The folder keeps its original slug.
    pub fn update_title(&self, doc_id: &str, chapter_id: &str, title: &str) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let reference = find_reference(&doc, chapter_id)?.clone();

        let mut chapter = self.read(doc_id, &reference)?;
        chapter.title = title.to_string();
        self.write(doc_id, &reference, &chapter)?;

        if let Some(entry) = doc.chapters.iter_mut().find(|c| c.id == chapter_id) {
            entry.title = title.to_string();
        }
        self.documents.save(&mut doc)
    }

    /// Remove a chapter and its folder, including all of its blocks
    pub fn delete(&self, doc_id: &str, chapter_id: &str) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let reference = find_reference(&doc, chapter_id)?.clone();

        doc.chapters.retain(|c| c.id != chapter_id);
        self.documents.save(&mut doc)?;

        let chapter_dir = self.layout.resolve(doc_id, &reference.folder);
        if chapter_dir.exists() {
            persistence::remove_dir_all(&chapter_dir)?;
        }
        info!("Deleted chapter '{}' from '{}'", chapter_id, doc_id);
        Ok(())
    }

    /// Move a chapter within the document's chapter list
    ///
    /// `After` the chapter's own ID appends, since the chapter is removed
    /// before its new place is resolved.
    pub fn move_to(&self, doc_id: &str, chapter_id: &str, position: &Position) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let index = doc
            .chapters
            .iter()
            .position(|c| c.id == chapter_id)
            .filter(|_| doc.has_chapters)
            .ok_or_else(|| chapter_not_found(doc_id, chapter_id))?;

        let reference = doc.chapters.remove(index);
        insert_at_position(&mut doc.chapters, reference, position);
        self.documents.save(&mut doc)
    }
}

fn find_reference<'a>(doc: &'a Document, chapter_id: &str) -> StoreResult<&'a ChapterReference> {
    if !doc.has_chapters {
        return Err(chapter_not_found(&doc.id, chapter_id));
    }
    doc.chapter(chapter_id)
        .ok_or_else(|| chapter_not_found(&doc.id, chapter_id))
}

fn chapter_not_found(doc_id: &str, chapter_id: &str) -> StoreError {
    StoreError::ChapterNotFound {
        document: doc_id.to_string(),
        chapter: chapter_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ErrorKind;
    use tempfile::TempDir;

    fn repos(temp_dir: &TempDir) -> (DocumentRepository, ChapterRepository) {
        let layout = Layout::new(temp_dir.path().join("documents"));
        let documents = DocumentRepository::new(layout.clone());
        (documents.clone(), ChapterRepository::new(layout, documents))
    }

    fn chapter_ids(documents: &DocumentRepository, doc_id: &str) -> Vec<String> {
        documents
            .get(doc_id)
            .unwrap()
            .chapters
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn test_add_chapter() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();

        let id = chapters.add(&doc_id, "Getting Started", &Position::End).unwrap();
        assert_eq!(id, "ch-001");

        let doc = documents.get(&doc_id).unwrap();
        assert_eq!(doc.chapters[0].folder, "chapters/ch-001-getting-started");

        let chapter_dir = temp_dir
            .path()
            .join("documents")
            .join(&doc_id)
            .join("chapters")
            .join("ch-001-getting-started");
        assert!(chapter_dir.join("chapter.json").is_file());
        assert!(chapter_dir.join("blocks").is_dir());

        let chapter = chapters.get(&doc_id, &id).unwrap();
        assert_eq!(chapter.title, "Getting Started");
        assert!(chapter.blocks.is_empty());
    }

    #[test]
    fn test_add_to_flat_document_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Flat", false, "").unwrap();

        let err = chapters.add(&doc_id, "Nope", &Position::End).unwrap_err();
        assert!(matches!(err, StoreError::ChaptersNotSupported { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!temp_dir
            .path()
            .join("documents")
            .join(&doc_id)
            .join("chapters")
            .exists());
    }

    #[test]
    fn test_get_on_flat_document_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Flat", false, "").unwrap();

        let err = chapters.get(&doc_id, "ch-001").unwrap_err();
        assert!(matches!(err, StoreError::ChapterNotFound { .. }));
    }

    #[test]
    fn test_positions_and_ids() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();

        chapters.add(&doc_id, "One", &Position::End).unwrap();
        chapters.add(&doc_id, "Zero", &Position::Start).unwrap();
        chapters
            .add(&doc_id, "Half", &Position::after("ch-002"))
            .unwrap();

        assert_eq!(
            chapter_ids(&documents, &doc_id),
            vec!["ch-002", "ch-003", "ch-001"]
        );
    }

    #[test]
    fn test_deleted_ids_not_reused() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();

        chapters.add(&doc_id, "A", &Position::End).unwrap();
        chapters.add(&doc_id, "B", &Position::End).unwrap();
        chapters.delete(&doc_id, "ch-001").unwrap();

        let id = chapters.add(&doc_id, "C", &Position::End).unwrap();
        assert_eq!(id, "ch-003");
    }

    #[test]
    fn test_empty_title_slug() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();

        chapters.add(&doc_id, "!!!", &Position::End).unwrap();
        let doc = documents.get(&doc_id).unwrap();
        assert_eq!(doc.chapters[0].folder, "chapters/ch-001");
    }

    #[test]
    fn test_update_title() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();
        let id = chapters.add(&doc_id, "Draft", &Position::End).unwrap();

        chapters.update_title(&doc_id, &id, "Final").unwrap();

        let doc = documents.get(&doc_id).unwrap();
        assert_eq!(doc.chapters[0].title, "Final");
        assert_eq!(doc.chapters[0].folder, "chapters/ch-001-draft");
        assert_eq!(chapters.get(&doc_id, &id).unwrap().title, "Final");
    }

    #[test]
    fn test_delete_removes_folder() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();
        let id = chapters.add(&doc_id, "Intro", &Position::End).unwrap();

        let folder = temp_dir
            .path()
            .join("documents")
            .join(&doc_id)
            .join("chapters")
            .join("ch-001-intro");
        assert!(folder.exists());

        chapters.delete(&doc_id, &id).unwrap();
        assert!(!folder.exists());
        assert!(documents.get(&doc_id).unwrap().chapters.is_empty());

        assert!(chapters.delete(&doc_id, &id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_move_chapter() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();
        for title in ["A", "B", "C"] {
            chapters.add(&doc_id, title, &Position::End).unwrap();
        }

        chapters.move_to(&doc_id, "ch-003", &Position::Start).unwrap();
        assert_eq!(
            chapter_ids(&documents, &doc_id),
            vec!["ch-003", "ch-001", "ch-002"]
        );

        chapters
            .move_to(&doc_id, "ch-003", &Position::after("ch-002"))
            .unwrap();
        assert_eq!(
            chapter_ids(&documents, &doc_id),
            vec!["ch-001", "ch-002", "ch-003"]
        );

        chapters
            .move_to(&doc_id, "ch-001", &Position::after("ch-001"))
            .unwrap();
        assert_eq!(
            chapter_ids(&documents, &doc_id),
            vec!["ch-002", "ch-003", "ch-001"]
        );

        assert!(chapters
            .move_to(&doc_id, "ch-009", &Position::End)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let (documents, chapters) = repos(&temp_dir);
        let doc_id = documents.create("Book", true, "").unwrap();
        chapters.add(&doc_id, "Second", &Position::End).unwrap();
        chapters.add(&doc_id, "First", &Position::Start).unwrap();

        let titles: Vec<_> = chapters
            .list(&doc_id)
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
