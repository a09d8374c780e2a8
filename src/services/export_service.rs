use tracing::{debug, info, warn};

use crate::errors::{ErrorInfo, TransferError};
use crate::formats::{self, ExportFile, Row};
use crate::store::TaxonomyStore;
use crate::taxonomy::{TaxonomyKind, COLOR_META_KEY};
use crate::term::{Term, TermId};

/// Result of an export. Failures are reported here rather than as errors so
/// callers have a single handling path.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub success: bool,
    pub file: Option<ExportFile>,
    pub rows_exported: usize,
    /// Requested ids that no longer resolve to a term
    pub skipped_ids: Vec<TermId>,
    pub error: Option<ErrorInfo>,
}

impl ExportResult {
    fn failed(err: &TransferError) -> Self {
        Self {
            success: false,
            file: None,
            rows_exported: 0,
            skipped_ids: Vec::new(),
            error: Some(ErrorInfo::from(err)),
        }
    }
}

/// Builds export rows for one taxonomy and hands them to a format writer
pub struct ExportService<'a, S: TaxonomyStore + ?Sized> {
    store: &'a S,
    taxonomy: TaxonomyKind,
}

impl<'a, S: TaxonomyStore + ?Sized> ExportService<'a, S> {
    pub fn new(store: &'a S, taxonomy: TaxonomyKind) -> Self {
        Self { store, taxonomy }
    }

    /// Export the given terms as `format` ("csv" or "json")
    pub fn export(&self, term_ids: &[TermId], format: &str) -> ExportResult {
        info!(
            "Exporting {} {} terms as {}",
            term_ids.len(),
            self.taxonomy,
            format
        );

        let writer = match formats::writer_for(format) {
            Ok(writer) => writer,
            Err(e) => {
                warn!("Export rejected: {}", e);
                return ExportResult::failed(&e);
            }
        };

        let (rows, skipped_ids) = self.build_rows(term_ids);
        let columns = self.taxonomy.columns();

        match formats::export_file(
            writer.as_ref(),
            &rows,
            columns,
            self.taxonomy.file_base_name(),
        ) {
            Ok(file) => {
                info!(
                    "Export completed: {} rows to {} ({} skipped)",
                    rows.len(),
                    file.file_name,
                    skipped_ids.len()
                );
                ExportResult {
                    success: true,
                    file: Some(file),
                    rows_exported: rows.len(),
                    skipped_ids,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                ExportResult {
                    skipped_ids,
                    ..ExportResult::failed(&e)
                }
            }
        }
    }

    /// Export every term of the taxonomy in id order
    pub fn export_all(&self, format: &str) -> ExportResult {
        let ids: Vec<TermId> = self
            .store
            .terms(self.taxonomy)
            .iter()
            .map(|t| t.id)
            .collect();
        self.export(&ids, format)
    }

    /// One row per resolvable id, in request order. Unresolvable ids are
    /// returned separately.
    pub fn build_rows(&self, term_ids: &[TermId]) -> (Vec<Row>, Vec<TermId>) {
        let mut rows = Vec::with_capacity(term_ids.len());
        let mut skipped = Vec::new();

        for &id in term_ids {
            match self.store.find_by_id(self.taxonomy, id) {
                Some(term) => rows.push(self.build_row(&term)),
                None => {
                    debug!("Skipping unknown {} term {}", self.taxonomy, id);
                    skipped.push(id);
                }
            }
        }

        (rows, skipped)
    }

    fn build_row(&self, term: &Term) -> Row {
        self.taxonomy
            .columns()
            .iter()
            .map(|column| (column.key.to_string(), self.cell(term, column.key)))
            .collect()
    }

    fn cell(&self, term: &Term, key: &str) -> String {
        match key {
            "id" => term.id.to_string(),
            "name" => term.name.clone(),
            "slug" => term.slug.clone(),
            "description" => term.description.clone(),
            "parent" => term.parent.to_string(),
            "parent_name" => self.parent_name(term),
            "color" => self
                .store
                .get_meta(self.taxonomy, term.id, COLOR_META_KEY)
                .unwrap_or_default(),
            "count" => term.count.to_string(),
            _ => String::new(),
        }
    }

    fn parent_name(&self, term: &Term) -> String {
        if term.is_root() {
            return String::new();
        }
        self.store
            .find_by_id(self.taxonomy, term.parent)
            .map(|parent| parent.name)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::term::NewTerm;

    const CAT: TaxonomyKind = TaxonomyKind::Category;

    fn sample_store() -> (InMemoryStore, TermId, TermId) {
        let mut store = InMemoryStore::new();
        let outdoor = store
            .create(CAT, NewTerm::new("Outdoor").with_description("Fresh air"))
            .unwrap();
        let hiking = store
            .create(CAT, NewTerm::new("Hiking").with_parent(outdoor))
            .unwrap();
        store.set_meta(CAT, outdoor, COLOR_META_KEY, "#00aa00").unwrap();
        store.set_count(CAT, hiking, 4).unwrap();
        (store, outdoor, hiking)
    }

    #[test]
    fn category_rows_follow_declared_columns() {
        let (store, outdoor, hiking) = sample_store();
        let service = ExportService::new(&store, CAT);
        let (rows, skipped) = service.build_rows(&[hiking, outdoor]);
        assert!(skipped.is_empty());

        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["id", "name", "slug", "description", "parent", "parent_name", "color", "count"]
        );
        assert_eq!(rows[0]["name"], "Hiking");
        assert_eq!(rows[0]["parent"], outdoor.to_string());
        assert_eq!(rows[0]["parent_name"], "Outdoor");
        assert_eq!(rows[0]["color"], "");
        assert_eq!(rows[0]["count"], "4");
        assert_eq!(rows[1]["parent"], "0");
        assert_eq!(rows[1]["parent_name"], "");
        assert_eq!(rows[1]["color"], "#00aa00");
    }

    #[test]
    fn tag_rows_have_no_category_extras() {
        let mut store = InMemoryStore::new();
        let id = store.create(TaxonomyKind::Tag, NewTerm::new("Family")).unwrap();
        let service = ExportService::new(&store, TaxonomyKind::Tag);
        let (rows, _) = service.build_rows(&[id]);
        assert!(!rows[0].contains_key("parent_name"));
        assert!(!rows[0].contains_key("color"));
        assert_eq!(rows[0]["slug"], "family");
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let (store, outdoor, _) = sample_store();
        let service = ExportService::new(&store, CAT);
        let result = service.export(&[outdoor, 404], "csv");
        assert!(result.success);
        assert_eq!(result.rows_exported, 1);
        assert_eq!(result.skipped_ids, vec![404]);
    }

    #[test]
    fn export_names_file_by_taxonomy() {
        let (store, outdoor, hiking) = sample_store();
        let result = ExportService::new(&store, CAT).export(&[outdoor, hiking], "json");
        let file = result.file.unwrap();
        assert_eq!(file.file_name, "category-data.json");
        assert_eq!(file.mime_type, "application/json");

        let tag_store = InMemoryStore::new();
        let result = ExportService::new(&tag_store, TaxonomyKind::Tag).export(&[], "csv");
        let file = result.file.unwrap();
        assert_eq!(file.file_name, "event-tag-data.csv");
        assert_eq!(
            String::from_utf8(file.bytes).unwrap(),
            "ID,Name,Slug,Description,Parent,Count\n"
        );
    }

    #[test]
    fn unsupported_format_is_a_structured_error() {
        let (store, outdoor, _) = sample_store();
        let result = ExportService::new(&store, CAT).export(&[outdoor], "xlsx");
        assert!(!result.success);
        assert!(result.file.is_none());
        let error = result.error.unwrap();
        assert_eq!(error.code, "unsupported_format");
        assert_eq!(error.status, 400);
    }

    #[test]
    fn export_all_uses_id_order() {
        let (store, outdoor, hiking) = sample_store();
        let service = ExportService::new(&store, CAT);
        let result = service.export_all("csv");
        assert_eq!(result.rows_exported, 2);
        let text = String::from_utf8(result.file.unwrap().bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with(&format!("{},Outdoor", outdoor)));
        assert!(lines[2].starts_with(&format!("{},Hiking", hiking)));
    }
}
