//! Two-pass taxonomy import
//!
//! Pass one creates or updates every term in the file and records which
//! destination id each source id became. Pass two assigns parent links,
//! translating source parent ids through that table. Splitting the work this
//! way makes the result independent of row order: a child may appear before
//! its parent.
//!
//! Every row is best-effort. A bad row is recorded in the [`ImportReport`]
//! and the batch carries on; nothing is rolled back.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{StoreError, TransferError, TransferResult};
use crate::formats::{self, detect, Row, TransferFormat};
use crate::sanitize;
use crate::store::TaxonomyStore;
use crate::taxonomy::{LookupKey, TaxonomyKind, COLOR_META_KEY};
use crate::term::{parse_term_id, NewTerm, Term, TermId, TermUpdate};

/// Source id to destination id table for one import run
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    entries: HashMap<TermId, TermId>,
}

impl IdMap {
    pub fn record(&mut self, old_id: TermId, new_id: TermId) {
        self.entries.insert(old_id, new_id);
    }

    pub fn get(&self, old_id: TermId) -> Option<TermId> {
        self.entries.get(&old_id).copied()
    }

    /// Mapped id, or the raw value when the id was not part of the batch
    pub fn translate(&self, old_id: TermId) -> TermId {
        self.get(old_id).unwrap_or(old_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_sorted(&self) -> BTreeMap<TermId, TermId> {
        self.entries.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

/// Why a row, or a row's parent link, was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueReason {
    /// Name empty after sanitizing
    MissingName,
    /// The store refused the create or update
    StoreRejected { code: String, message: String },
    /// No term with the translated parent id exists
    ParentNotFound { parent: TermId },
    /// Parent id translated to the term itself
    SelfParent,
}

impl From<StoreError> for IssueReason {
    fn from(err: StoreError) -> Self {
        IssueReason::StoreRejected {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueReason::MissingName => write!(f, "name is empty"),
            IssueReason::StoreRejected { message, .. } => write!(f, "{}", message),
            IssueReason::ParentNotFound { parent } => write!(f, "parent {} not found", parent),
            IssueReason::SelfParent => write!(f, "term cannot be its own parent"),
        }
    }
}

/// One problem with one row. `row` counts data rows from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub name: String,
    pub reason: IssueReason,
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub created: usize,
    pub updated: usize,
    pub parents_linked: usize,
    /// Rows that did not produce a term
    pub skipped: Vec<RowIssue>,
    /// Rows whose term was imported but whose parent link was not
    pub dropped_parents: Vec<RowIssue>,
    /// Source id to destination id
    pub id_map: BTreeMap<TermId, TermId>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.dropped_parents.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} created, {} updated, {} skipped, {} parent links, {} parents dropped",
            self.rows_read,
            self.created,
            self.updated,
            self.skipped.len(),
            self.parents_linked,
            self.dropped_parents.len()
        )
    }
}

/// A file row after sanitizing
#[derive(Debug, Clone)]
struct ImportRow {
    row: usize,
    source_id: TermId,
    name: String,
    slug: String,
    description: String,
    color: Option<String>,
    parent: TermId,
}

impl ImportRow {
    fn from_row(index: usize, row: &Row, taxonomy: TaxonomyKind) -> Self {
        fn field<'r>(row: &'r Row, key: &str) -> &'r str {
            row.get(key).map(String::as_str).unwrap_or("")
        }

        Self {
            row: index + 1,
            source_id: parse_term_id(field(row, "id")),
            name: sanitize::text_field(field(row, "name")),
            slug: sanitize::slug(field(row, "slug")),
            description: sanitize::textarea_field(field(row, "description")),
            color: if taxonomy.has_color() {
                sanitize::hex_color(field(row, "color"))
            } else {
                None
            },
            parent: parse_term_id(field(row, "parent")),
        }
    }

    fn issue(&self, reason: IssueReason) -> RowIssue {
        RowIssue {
            row: self.row,
            name: self.name.clone(),
            reason,
        }
    }
}

/// Imports transfer files into one taxonomy of a store
pub struct ImportService<'a, S: TaxonomyStore + ?Sized> {
    store: &'a mut S,
    taxonomy: TaxonomyKind,
}

impl<'a, S: TaxonomyStore + ?Sized> ImportService<'a, S> {
    pub fn new(store: &'a mut S, taxonomy: TaxonomyKind) -> Self {
        Self { store, taxonomy }
    }

    /// Import a file. The format comes from `format`, else the file
    /// extension, else the content.
    pub fn import_file(
        &mut self,
        file_path: &Path,
        format: Option<TransferFormat>,
    ) -> TransferResult<ImportReport> {
        info!("Importing {} terms from: {}", self.taxonomy, file_path.display());
        if !file_path.exists() {
            return Err(TransferError::FileNotFound(file_path.display().to_string()));
        }

        let content = fs::read(file_path)?;
        let format = format
            .or_else(|| detect::detect_format(file_path, &content))
            .ok_or_else(|| TransferError::UnsupportedFormat(file_path.display().to_string()))?;
        self.import_bytes(&content, format)
    }

    /// Parse `content` as `format` and import the rows
    pub fn import_bytes(
        &mut self,
        content: &[u8],
        format: TransferFormat,
    ) -> TransferResult<ImportReport> {
        let reader = formats::reader(format);
        let rows = reader.read_rows(&mut &content[..], self.taxonomy.columns())?;
        debug!("Parsed {} rows as {}", rows.len(), format);
        Ok(self.import_rows(&rows))
    }

    /// Run both passes over already-parsed rows
    pub fn import_rows(&mut self, rows: &[Row]) -> ImportReport {
        let rows: Vec<ImportRow> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| ImportRow::from_row(index, row, self.taxonomy))
            .collect();

        let mut report = ImportReport {
            rows_read: rows.len(),
            ..Default::default()
        };

        let (id_map, destinations) = self.materialize_terms(&rows, &mut report);
        self.resolve_parents(&rows, &destinations, &id_map, &mut report);
        report.id_map = id_map.to_sorted();

        info!("Import completed: {}", report.summary());
        report
    }

    /// Pass one. Returns the id table and, per row, the destination id the
    /// row ended up on.
    fn materialize_terms(
        &mut self,
        rows: &[ImportRow],
        report: &mut ImportReport,
    ) -> (IdMap, Vec<Option<TermId>>) {
        let mut id_map = IdMap::default();
        let mut destinations = Vec::with_capacity(rows.len());

        for row in rows {
            if row.name.is_empty() {
                warn!("Row {}: skipped, name is empty", row.row);
                report.skipped.push(row.issue(IssueReason::MissingName));
                destinations.push(None);
                continue;
            }

            let outcome = match self.lookup(row) {
                Some(existing) => self.update_existing(&existing, row).map(|_| (existing.id, false)),
                None => self.create_new(row).map(|id| (id, true)),
            };

            let (term_id, created) = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Row {} ({}): skipped, {}", row.row, row.name, e);
                    report.skipped.push(row.issue(e.into()));
                    destinations.push(None);
                    continue;
                }
            };

            if created {
                report.created += 1;
            } else {
                report.updated += 1;
            }

            if let Some(color) = &row.color {
                if let Err(e) = self
                    .store
                    .set_meta(self.taxonomy, term_id, COLOR_META_KEY, color)
                {
                    warn!("Row {} ({}): color not saved, {}", row.row, row.name, e);
                }
            }

            if row.source_id != 0 {
                id_map.record(row.source_id, term_id);
            }
            destinations.push(Some(term_id));
        }

        (id_map, destinations)
    }

    /// Pass two
    fn resolve_parents(
        &mut self,
        rows: &[ImportRow],
        destinations: &[Option<TermId>],
        id_map: &IdMap,
        report: &mut ImportReport,
    ) {
        for (row, destination) in rows.iter().zip(destinations) {
            if row.name.is_empty() || row.parent == 0 {
                continue;
            }

            let term_id = match (*destination).or_else(|| self.lookup(row).map(|t| t.id)) {
                Some(id) => id,
                None => {
                    debug!("Row {} ({}): no term to attach a parent to", row.row, row.name);
                    continue;
                }
            };

            let parent = id_map.translate(row.parent);
            let reason = if parent == term_id {
                Some(IssueReason::SelfParent)
            } else if self.store.find_by_id(self.taxonomy, parent).is_none() {
                Some(IssueReason::ParentNotFound { parent })
            } else {
                self.store
                    .update(self.taxonomy, term_id, TermUpdate::parent(parent))
                    .err()
                    .map(IssueReason::from)
            };

            match reason {
                None => {
                    debug!("Row {} ({}): parent set to {}", row.row, row.name, parent);
                    report.parents_linked += 1;
                }
                Some(reason) => {
                    warn!("Row {} ({}): parent dropped, {}", row.row, row.name, reason);
                    report.dropped_parents.push(row.issue(reason));
                }
            }
        }
    }

    fn lookup(&self, row: &ImportRow) -> Option<Term> {
        match self.taxonomy.lookup_key() {
            LookupKey::Name => self.store.find_by_name(self.taxonomy, &row.name),
            LookupKey::Slug => {
                let slug = if row.slug.is_empty() {
                    sanitize::slug(&row.name)
                } else {
                    row.slug.clone()
                };
                self.store.find_by_slug(self.taxonomy, &slug)
            }
        }
    }

    fn update_existing(&mut self, existing: &Term, row: &ImportRow) -> Result<(), StoreError> {
        debug!("Row {}: updating {} term {}", row.row, self.taxonomy, existing.id);
        let changes = TermUpdate {
            slug: (!row.slug.is_empty()).then(|| row.slug.clone()),
            description: Some(row.description.clone()),
            ..Default::default()
        };
        self.store.update(self.taxonomy, existing.id, changes)
    }

    fn create_new(&mut self, row: &ImportRow) -> Result<TermId, StoreError> {
        debug!("Row {}: creating {} term {}", row.row, self.taxonomy, row.name);
        let term = NewTerm::new(row.name.clone())
            .with_slug(row.slug.clone())
            .with_description(row.description.clone());
        self.store.create(self.taxonomy, term)
    }
}
