use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{ContactGroup, FileStatus, Form, Handler, ManagedFile, NewFile, Submission};

use super::{FormInput, GroupInput, HandlerInput, Store};

/// Process-local store. Backs the test suite and database-less runs.
#[derive(Default)]
pub struct MemoryStore {
    forms: DashMap<String, Form>,
    handlers: DashMap<Uuid, Handler>,
    groups: DashMap<String, ContactGroup>,
    files: DashMap<i64, ManagedFile>,
    submissions: DashMap<Uuid, Submission>,
    next_fid: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(kind: &str, id: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("duplicate {kind} id {id}"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_forms(&self) -> Result<Vec<Form>, sqlx::Error> {
        let mut forms: Vec<Form> = self.forms.iter().map(|f| f.value().clone()).collect();
        forms.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(forms)
    }

    async fn find_form(&self, id: &str) -> Result<Option<Form>, sqlx::Error> {
        Ok(self.forms.get(id).map(|f| f.value().clone()))
    }

    async fn create_form(&self, input: &FormInput) -> Result<Form, sqlx::Error> {
        if self.forms.contains_key(&input.id) {
            return Err(duplicate("form", &input.id));
        }
        let now = Utc::now();
        let form = Form {
            id: input.id.clone(),
            title: input.title.clone(),
            category: input.category.clone(),
            elements: input.elements.clone(),
            settings: input.settings.clone(),
            created_at: now,
            updated_at: now,
        };
        self.forms.insert(form.id.clone(), form.clone());
        Ok(form)
    }

    async fn update_form(&self, input: &FormInput) -> Result<Option<Form>, sqlx::Error> {
        Ok(self.forms.get_mut(&input.id).map(|mut form| {
            form.title = input.title.clone();
            form.category = input.category.clone();
            form.elements = input.elements.clone();
            form.settings = input.settings.clone();
            form.updated_at = Utc::now();
            form.clone()
        }))
    }

    async fn delete_form(&self, id: &str) -> Result<bool, sqlx::Error> {
        let removed = self.forms.remove(id).is_some();
        if removed {
            self.handlers.retain(|_, h| h.form_id != id);
            self.submissions.retain(|_, s| s.form_id != id);
        }
        Ok(removed)
    }

    async fn list_handlers(&self, form_id: &str) -> Result<Vec<Handler>, sqlx::Error> {
        let mut handlers: Vec<Handler> = self
            .handlers
            .iter()
            .filter(|h| h.form_id == form_id)
            .map(|h| h.value().clone())
            .collect();
        handlers.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(handlers)
    }

    async fn create_handler(
        &self,
        form_id: &str,
        input: &HandlerInput,
    ) -> Result<Handler, sqlx::Error> {
        let handler = Handler {
            id: Uuid::now_v7(),
            form_id: form_id.to_string(),
            handler_type: input.handler_type.clone(),
            label: input.label.clone(),
            config: input.config.clone(),
            position: input.position,
            enabled: input.enabled,
            created_at: Utc::now(),
        };
        self.handlers.insert(handler.id, handler.clone());
        Ok(handler)
    }

    async fn delete_handler(&self, form_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self
            .handlers
            .remove_if(&id, |_, h| h.form_id == form_id)
            .is_some())
    }

    async fn list_groups(&self) -> Result<Vec<ContactGroup>, sqlx::Error> {
        let mut groups: Vec<ContactGroup> =
            self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(groups)
    }

    async fn find_group(&self, id: &str) -> Result<Option<ContactGroup>, sqlx::Error> {
        Ok(self.groups.get(id).map(|g| g.value().clone()))
    }

    async fn create_group(&self, input: &GroupInput) -> Result<ContactGroup, sqlx::Error> {
        if self.groups.contains_key(&input.id) {
            return Err(duplicate("group", &input.id));
        }
        let now = Utc::now();
        let group = ContactGroup {
            id: input.id.clone(),
            label: input.label.clone(),
            post_url: input.post_url.clone(),
            auth_header: input.auth_header.clone(),
            created_at: now,
            updated_at: now,
        };
        self.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn update_group(&self, input: &GroupInput) -> Result<Option<ContactGroup>, sqlx::Error> {
        Ok(self.groups.get_mut(&input.id).map(|mut group| {
            group.label = input.label.clone();
            group.post_url = input.post_url.clone();
            group.auth_header = input.auth_header.clone();
            group.updated_at = Utc::now();
            group.clone()
        }))
    }

    async fn delete_group(&self, id: &str) -> Result<bool, sqlx::Error> {
        Ok(self.groups.remove(id).is_some())
    }

    async fn find_file(&self, fid: i64) -> Result<Option<ManagedFile>, sqlx::Error> {
        Ok(self.files.get(&fid).map(|f| f.value().clone()))
    }

    async fn find_file_by_uri(&self, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.uri == uri)
            .max_by_key(|f| f.fid)
            .map(|f| f.value().clone()))
    }

    async fn create_file(&self, file: &NewFile) -> Result<ManagedFile, sqlx::Error> {
        let fid = self.next_fid.fetch_add(1, Ordering::SeqCst) + 1;
        let record = ManagedFile {
            fid,
            owner: file.owner,
            filename: file.filename.clone(),
            uri: file.uri.clone(),
            filemime: file.filemime.clone(),
            status: file.status,
            created_at: Utc::now(),
        };
        self.files.insert(fid, record.clone());
        Ok(record)
    }

    async fn relocate_file(&self, fid: i64, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        Ok(self.files.get_mut(&fid).map(|mut file| {
            file.uri = uri.to_string();
            file.status = FileStatus::Permanent;
            file.clone()
        }))
    }

    async fn create_submission(&self, submission: &Submission) -> Result<Submission, sqlx::Error> {
        self.submissions.insert(submission.id, submission.clone());
        Ok(submission.clone())
    }

    async fn list_submissions(&self, form_id: &str) -> Result<Vec<Submission>, sqlx::Error> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.form_id == form_id)
            .map(|s| s.value().clone())
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(submissions)
    }
}
