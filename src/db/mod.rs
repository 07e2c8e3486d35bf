pub mod files;
pub mod forms;
pub mod groups;
pub mod handlers;
pub mod memory;
pub mod submissions;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ContactGroup, Form, FormSettings, Handler, ManagedFile, NewFile, Submission};
use crate::submission::schema::FormSchema;

pub use memory::MemoryStore;

#[derive(Debug, Clone, Deserialize)]
pub struct FormInput {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub elements: FormSchema,
    #[serde(default)]
    pub settings: FormSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerInput {
    pub handler_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupInput {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub post_url: String,
    #[serde(default)]
    pub auth_header: String,
}

/// Everything the service persists.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_forms(&self) -> Result<Vec<Form>, sqlx::Error>;
    async fn find_form(&self, id: &str) -> Result<Option<Form>, sqlx::Error>;
    async fn create_form(&self, input: &FormInput) -> Result<Form, sqlx::Error>;
    async fn update_form(&self, input: &FormInput) -> Result<Option<Form>, sqlx::Error>;
    async fn delete_form(&self, id: &str) -> Result<bool, sqlx::Error>;

    /// Handlers of a form in run order.
    async fn list_handlers(&self, form_id: &str) -> Result<Vec<Handler>, sqlx::Error>;
    async fn create_handler(
        &self,
        form_id: &str,
        input: &HandlerInput,
    ) -> Result<Handler, sqlx::Error>;
    async fn delete_handler(&self, form_id: &str, id: Uuid) -> Result<bool, sqlx::Error>;

    async fn list_groups(&self) -> Result<Vec<ContactGroup>, sqlx::Error>;
    async fn find_group(&self, id: &str) -> Result<Option<ContactGroup>, sqlx::Error>;
    async fn create_group(&self, input: &GroupInput) -> Result<ContactGroup, sqlx::Error>;
    async fn update_group(&self, input: &GroupInput) -> Result<Option<ContactGroup>, sqlx::Error>;
    async fn delete_group(&self, id: &str) -> Result<bool, sqlx::Error>;

    async fn find_file(&self, fid: i64) -> Result<Option<ManagedFile>, sqlx::Error>;
    async fn find_file_by_uri(&self, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error>;
    async fn create_file(&self, file: &NewFile) -> Result<ManagedFile, sqlx::Error>;
    /// Points a record at the place its file was moved to and makes it
    /// permanent.
    async fn relocate_file(&self, fid: i64, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error>;

    async fn create_submission(&self, submission: &Submission) -> Result<Submission, sqlx::Error>;
    async fn list_submissions(&self, form_id: &str) -> Result<Vec<Submission>, sqlx::Error>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_forms(&self) -> Result<Vec<Form>, sqlx::Error> {
        forms::list(&self.pool).await
    }

    async fn find_form(&self, id: &str) -> Result<Option<Form>, sqlx::Error> {
        forms::find_by_id(&self.pool, id).await
    }

    async fn create_form(&self, input: &FormInput) -> Result<Form, sqlx::Error> {
        forms::create(&self.pool, input).await
    }

    async fn update_form(&self, input: &FormInput) -> Result<Option<Form>, sqlx::Error> {
        forms::update(&self.pool, input).await
    }

    async fn delete_form(&self, id: &str) -> Result<bool, sqlx::Error> {
        forms::delete(&self.pool, id).await
    }

    async fn list_handlers(&self, form_id: &str) -> Result<Vec<Handler>, sqlx::Error> {
        handlers::list_by_form(&self.pool, form_id).await
    }

    async fn create_handler(
        &self,
        form_id: &str,
        input: &HandlerInput,
    ) -> Result<Handler, sqlx::Error> {
        handlers::create(&self.pool, form_id, input).await
    }

    async fn delete_handler(&self, form_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        handlers::delete(&self.pool, form_id, id).await
    }

    async fn list_groups(&self) -> Result<Vec<ContactGroup>, sqlx::Error> {
        groups::list(&self.pool).await
    }

    async fn find_group(&self, id: &str) -> Result<Option<ContactGroup>, sqlx::Error> {
        groups::find_by_id(&self.pool, id).await
    }

    async fn create_group(&self, input: &GroupInput) -> Result<ContactGroup, sqlx::Error> {
        groups::create(&self.pool, input).await
    }

    async fn update_group(&self, input: &GroupInput) -> Result<Option<ContactGroup>, sqlx::Error> {
        groups::update(&self.pool, input).await
    }

    async fn delete_group(&self, id: &str) -> Result<bool, sqlx::Error> {
        groups::delete(&self.pool, id).await
    }

    async fn find_file(&self, fid: i64) -> Result<Option<ManagedFile>, sqlx::Error> {
        files::find_by_id(&self.pool, fid).await
    }

    async fn find_file_by_uri(&self, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        files::find_by_uri(&self.pool, uri).await
    }

    async fn create_file(&self, file: &NewFile) -> Result<ManagedFile, sqlx::Error> {
        files::create(&self.pool, file).await
    }

    async fn relocate_file(&self, fid: i64, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        files::relocate(&self.pool, fid, uri).await
    }

    async fn create_submission(&self, submission: &Submission) -> Result<Submission, sqlx::Error> {
        submissions::create(&self.pool, submission).await
    }

    async fn list_submissions(&self, form_id: &str) -> Result<Vec<Submission>, sqlx::Error> {
        submissions::list_by_form(&self.pool, form_id).await
    }
}
