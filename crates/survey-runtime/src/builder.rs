//! Admin-side survey builder: a pool of question versions referenced by
//! per-page ordered id lists.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use survey_spec::{
    BuilderQuestion, ConditionalQuestion, PackageMeta, PackageMetaPatch, Page, Question,
    QuestionId, QuestionPatch, QuestionSeed, QuestionStatus, QuestionType, SurveyDocument,
    spec::question::QuestionIssue,
};
use tracing::{debug, warn};

/// Title/description update for one page; `index` defaults to the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetaPatch {
    pub index: Option<usize>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Structural problem found by [`SurveyBuilder::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    DanglingReference {
        page_id: String,
        question_id: QuestionId,
    },
    DuplicateReference {
        page_id: String,
        question_id: QuestionId,
    },
    OrderMismatch {
        question_id: QuestionId,
        expected: usize,
        found: usize,
    },
    MissingParent {
        question_id: QuestionId,
        parent_id: QuestionId,
    },
    Question(QuestionIssue),
}

/// Single-writer builder state. Every mutation either applies fully or not at
/// all; mutations that change something mark the builder dirty.
#[derive(Debug, Clone)]
pub struct SurveyBuilder {
    arena: BTreeMap<QuestionId, BuilderQuestion>,
    pool: Vec<QuestionId>,
    pages: Vec<Page>,
    current_page_index: usize,
    active_question_id: Option<QuestionId>,
    is_dirty: bool,
    package_meta: PackageMeta,
}

impl Default for SurveyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyBuilder {
    /// One empty page, empty pool.
    pub fn new() -> Self {
        Self {
            arena: BTreeMap::new(),
            pool: Vec::new(),
            pages: vec![Page::numbered(1)],
            current_page_index: 0,
            active_question_id: None,
            is_dirty: false,
            package_meta: PackageMeta::default(),
        }
    }

    pub fn from_document(document: SurveyDocument) -> Self {
        let mut builder = Self::new();
        builder.load_document(document);
        builder
    }

    /// Questions in pool order.
    pub fn questions(&self) -> impl Iterator<Item = &BuilderQuestion> + '_ {
        self.pool.iter().filter_map(|id| self.arena.get(id))
    }

    pub fn question(&self, id: &str) -> Option<&BuilderQuestion> {
        self.arena.get(id)
    }

    pub fn question_count(&self) -> usize {
        self.pool.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current_page_index)
    }

    pub fn current_page_questions(&self) -> Vec<&BuilderQuestion> {
        self.current_page()
            .map(|page| {
                page.question_ids
                    .iter()
                    .filter_map(|id| self.arena.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn active_question_id(&self) -> Option<&str> {
        self.active_question_id.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn package_meta(&self) -> &PackageMeta {
        &self.package_meta
    }

    /// Adds a factory question to the pool and the current page and makes it active.
    pub fn add_question(&mut self, question_type: QuestionType) -> QuestionId {
        let mut question = Question::default_for(question_type);
        question.id = self.unused_id(question.id);
        let position = self
            .current_page()
            .map_or(0, |page| page.question_ids.len());

        let mut entry = BuilderQuestion::new(question);
        entry.question_code = Some(format!("Q{}", position + 1));
        let id = self.push_to_pool(entry);
        self.attach_to_current_page(&id);
        self.active_question_id = Some(id.clone());
        self.is_dirty = true;
        debug!(question_id = %id, %question_type, "question added");
        id
    }

    /// Adds an alternate version of a logical question to the pool only.
    pub fn create_question_version(
        &mut self,
        question: Question,
        question_code: Option<String>,
        version: Option<String>,
    ) -> QuestionId {
        let mut question = question;
        question.id = self.unused_id(question.id);
        let mut entry = BuilderQuestion::new(question);
        entry.question_code = question_code;
        entry.version = version;
        let id = self.push_to_pool(entry);
        self.is_dirty = true;
        debug!(question_id = %id, "question version created");
        id
    }

    /// Moves forward, appending an empty page when already on the last one.
    pub fn next_page(&mut self) {
        if self.current_page_index + 1 < self.pages.len() {
            self.current_page_index += 1;
            return;
        }
        self.pages.push(Page::numbered(self.pages.len() + 1));
        self.current_page_index = self.pages.len() - 1;
        self.is_dirty = true;
    }

    pub fn prev_page(&mut self) {
        self.current_page_index = self.current_page_index.saturating_sub(1);
    }

    pub fn set_page_meta(&mut self, patch: PageMetaPatch) -> bool {
        let index = patch.index.unwrap_or(self.current_page_index);
        let Some(page) = self.pages.get_mut(index) else {
            return false;
        };
        let mut changed = false;
        if let Some(title) = patch.title
            && page.title.as_deref() != Some(title.as_str())
        {
            page.title = Some(title);
            changed = true;
        }
        if let Some(description) = patch.description
            && page.description.as_deref() != Some(description.as_str())
        {
            page.description = Some(description);
            changed = true;
        }
        self.is_dirty |= changed;
        changed
    }

    /// Cursor only; unknown ids are ignored.
    pub fn set_active_question(&mut self, id: Option<&str>) {
        match id {
            None => self.active_question_id = None,
            Some(id) if self.arena.contains_key(id) => {
                self.active_question_id = Some(id.to_string());
            }
            Some(_) => {}
        }
    }

    pub fn update_question(&mut self, id: &str, patch: QuestionPatch) -> bool {
        let Some(entry) = self.arena.get_mut(id) else {
            return false;
        };
        entry.apply_patch(patch);
        self.is_dirty = true;
        true
    }

    /// Deletes from the pool and from every page.
    pub fn remove_question(&mut self, id: &str) -> bool {
        if self.arena.remove(id).is_none() {
            return false;
        }
        self.pool.retain(|pooled| pooled != id);
        for page in &mut self.pages {
            page.question_ids.retain(|referenced| referenced != id);
        }
        if self.active_question_id.as_deref() == Some(id) {
            self.active_question_id = None;
        }
        self.renumber();
        self.is_dirty = true;
        debug!(question_id = id, "question removed");
        true
    }

    /// Version-aware delete. When the removed question is active and another
    /// version shares its code, the current page points at that sibling instead.
    pub fn remove_question_version(&mut self, id: &str) -> bool {
        let Some(removed) = self.arena.get(id) else {
            return false;
        };
        let sibling = self
            .questions()
            .find(|candidate| candidate.id() != id && candidate.same_code(removed))
            .map(|candidate| candidate.id().to_string());

        let is_active = self.active_question_id.as_deref() == Some(id);
        let Some(sibling) = sibling.filter(|_| is_active) else {
            return self.remove_question(id);
        };

        if let Some(page) = self.pages.get_mut(self.current_page_index)
            && let Some(position) = page.question_ids.iter().position(|referenced| referenced == id)
        {
            if page.contains(&sibling) {
                page.question_ids.remove(position);
            } else {
                page.question_ids[position] = sibling.clone();
            }
        }
        self.remove_question(id);
        self.active_question_id = Some(sibling);
        true
    }

    /// Moves an entry within the current page; out-of-range indices are ignored.
    pub fn reorder_current_page_questions(&mut self, from: usize, to: usize) -> bool {
        let Some(page) = self.pages.get_mut(self.current_page_index) else {
            return false;
        };
        let len = page.question_ids.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let moved = page.question_ids.remove(from);
        page.question_ids.insert(to, moved);
        self.is_dirty = true;
        true
    }

    /// Swaps `old_id` for `new_id` at the same position on the current page.
    pub fn replace_question_in_current_page(&mut self, old_id: &str, new_id: &str) -> bool {
        if old_id == new_id || !self.arena.contains_key(new_id) {
            return false;
        }
        let Some(page) = self.pages.get_mut(self.current_page_index) else {
            return false;
        };
        let Some(position) = page.question_ids.iter().position(|id| id == old_id) else {
            return false;
        };
        if page.contains(new_id) {
            page.question_ids.remove(position);
        } else {
            page.question_ids[position] = new_id.to_string();
        }
        if self.active_question_id.as_deref() == Some(old_id) {
            self.active_question_id = Some(new_id.to_string());
        }
        self.is_dirty = true;
        true
    }

    /// Moves an entry within the global pool order.
    pub fn reorder_questions(&mut self, from: usize, to: usize) -> bool {
        let len = self.pool.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let moved = self.pool.remove(from);
        self.pool.insert(to, moved);
        self.renumber();
        self.is_dirty = true;
        true
    }

    pub fn set_package_meta(&mut self, patch: PackageMetaPatch) {
        self.package_meta.merge(patch);
        self.is_dirty = true;
    }

    /// Adds a follow-up question under `parent_id` on the current page.
    /// Returns `None` when the parent does not exist.
    pub fn add_child_question(
        &mut self,
        parent_id: &str,
        question_type: QuestionType,
        seed: QuestionSeed,
    ) -> Option<QuestionId> {
        let parent = self.arena.get(parent_id)?;
        let inherited_code = parent.question_code.clone();
        let inherited_version = parent.version.clone();

        let QuestionSeed {
            id,
            label,
            required,
            kind,
            question_code,
            version,
            group_question_id,
            trigger_option_value,
        } = seed;

        let mut question = Question::default_for(question_type);
        if let Some(id) = id {
            question.id = id;
        }
        question.id = self.unused_id(question.id);
        if let Some(label) = label {
            question.label = label;
        }
        if let Some(required) = required {
            question.required = required;
        }
        if let Some(kind) = kind {
            question.kind = kind;
        }

        let mut entry = BuilderQuestion::new(question);
        entry.question_code = question_code.or(inherited_code);
        entry.version = version.or(inherited_version);
        entry.parent_id = Some(parent_id.to_string());
        entry.group_question_id = group_question_id.or_else(|| Some(parent_id.to_string()));
        entry.trigger_option_value = trigger_option_value;

        let id = self.push_to_pool(entry);
        self.attach_to_current_page(&id);
        self.active_question_id = Some(id.clone());
        self.is_dirty = true;
        debug!(question_id = %id, parent_id, "child question added");
        Some(id)
    }

    /// Save acknowledgement: everything becomes `saved`.
    pub fn mark_saved(&mut self) {
        for entry in self.arena.values_mut() {
            entry.status = QuestionStatus::Saved;
        }
        self.is_dirty = false;
    }

    pub fn reset_builder(&mut self) {
        *self = Self::new();
    }

    /// Hydrates from backend data. Page references to unknown ids are
    /// dropped; without pages every top-level question lands on one page.
    pub fn load_questions_from_api(&mut self, questions: Vec<BuilderQuestion>, pages: Vec<Page>) {
        self.arena.clear();
        self.pool.clear();
        for entry in questions {
            let id = entry.id().to_string();
            if self.arena.contains_key(&id) {
                warn!(question_id = %id, "duplicate question id dropped during hydration");
                continue;
            }
            self.pool.push(id.clone());
            self.arena.insert(id, entry);
        }
        self.renumber();

        self.pages = if pages.is_empty() {
            vec![Page::implicit(self.questions())]
        } else {
            pages
                .into_iter()
                .map(|mut page| {
                    page.question_ids.retain(|id| {
                        let known = self.arena.contains_key(id);
                        if !known {
                            warn!(page_id = %page.id, question_id = %id, "dropping reference to unknown question");
                        }
                        known
                    });
                    page
                })
                .collect()
        };

        self.current_page_index = 0;
        self.active_question_id = self.pool.first().cloned();
        self.is_dirty = false;
        debug!(
            questions = self.pool.len(),
            pages = self.pages.len(),
            "builder hydrated"
        );
    }

    /// Hydrates from a fetched package, carrying its identity into the meta.
    pub fn load_document(&mut self, document: SurveyDocument) {
        let SurveyDocument {
            id,
            title,
            description,
            questions,
            pages,
            conditionals,
        } = document;
        if !conditionals.is_empty() {
            debug!(
                count = conditionals.len(),
                "standalone conditionals are not editable in the builder"
            );
        }
        self.package_meta.merge(PackageMetaPatch {
            id,
            name: title,
            description,
            ..PackageMetaPatch::default()
        });
        self.load_questions_from_api(questions, pages);
    }

    /// Child questions that carry both a parent and a trigger value, as
    /// respondent-side conditionals.
    pub fn conditional_questions(&self) -> Vec<ConditionalQuestion> {
        self.questions()
            .filter_map(|entry| {
                let parent = entry.parent_id.as_ref()?;
                let trigger = entry.trigger_option_value.as_ref()?;
                Some(ConditionalQuestion {
                    id: entry.id().to_string(),
                    trigger_question_id: parent.clone(),
                    trigger_option_value: trigger.clone(),
                    question: entry.question.clone(),
                })
            })
            .collect()
    }

    pub fn check_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for page in &self.pages {
            let mut seen = BTreeSet::new();
            for id in &page.question_ids {
                if !self.arena.contains_key(id) {
                    issues.push(IntegrityIssue::DanglingReference {
                        page_id: page.id.clone(),
                        question_id: id.clone(),
                    });
                } else if !seen.insert(id.as_str()) {
                    issues.push(IntegrityIssue::DuplicateReference {
                        page_id: page.id.clone(),
                        question_id: id.clone(),
                    });
                }
            }
        }

        for (expected, entry) in self.questions().enumerate() {
            if entry.order != expected {
                issues.push(IntegrityIssue::OrderMismatch {
                    question_id: entry.id().to_string(),
                    expected,
                    found: entry.order,
                });
            }
            if let Some(parent_id) = &entry.parent_id
                && !self.arena.contains_key(parent_id)
            {
                issues.push(IntegrityIssue::MissingParent {
                    question_id: entry.id().to_string(),
                    parent_id: parent_id.clone(),
                });
            }
            issues.extend(entry.question.check().into_iter().map(IntegrityIssue::Question));
        }

        issues
    }

    /// Package as saved to the backend.
    pub fn to_document(&self) -> SurveyDocument {
        SurveyDocument {
            id: self.package_meta.id.clone(),
            title: self.package_meta.name.clone(),
            description: self.package_meta.description.clone(),
            questions: self.questions().cloned().collect(),
            pages: self.pages.clone(),
            conditionals: Vec::new(),
        }
    }

    fn push_to_pool(&mut self, mut entry: BuilderQuestion) -> QuestionId {
        let id = entry.id().to_string();
        entry.order = self.pool.len();
        self.pool.push(id.clone());
        self.arena.insert(id.clone(), entry);
        id
    }

    fn attach_to_current_page(&mut self, id: &str) {
        if self.pages.is_empty() {
            self.pages.push(Page::numbered(1));
            self.current_page_index = 0;
        }
        let index = self.current_page_index.min(self.pages.len() - 1);
        self.pages[index].question_ids.push(id.to_string());
    }

    fn unused_id(&self, candidate: QuestionId) -> QuestionId {
        if !self.arena.contains_key(&candidate) {
            return candidate;
        }
        let mut fresh = survey_spec::spec::new_question_id();
        while self.arena.contains_key(&fresh) {
            fresh = survey_spec::spec::new_question_id();
        }
        fresh
    }

    fn renumber(&mut self) {
        for (order, id) in self.pool.iter().enumerate() {
            if let Some(entry) = self.arena.get_mut(id) {
                entry.order = order;
            }
        }
    }
}
