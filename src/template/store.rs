//! Template storage with CRUD operations

use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::types::{TemplateError, TemplateItem, TemplateResult, UpdateTemplateRequest};

/// In-memory template storage
pub struct TemplateStore {
    templates: DashMap<String, TemplateItem>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Create a new template
    pub fn create(&self, template: TemplateItem) -> TemplateResult<TemplateItem> {
        template.validate()?;

        match self.templates.entry(template.id.clone()) {
            Entry::Occupied(_) => Err(TemplateError::AlreadyExists(template.id)),
            Entry::Vacant(slot) => {
                tracing::info!(template_id = %template.id, "Template created");
                slot.insert(template.clone());
                Ok(template)
            }
        }
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> TemplateResult<TemplateItem> {
        self.templates
            .get(id)
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// List all templates, ordered by ID
    pub fn list(&self) -> Vec<TemplateItem> {
        let mut templates: Vec<TemplateItem> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    /// Update an existing template.
    ///
    /// The entry stays locked for the whole update; a rejected update leaves
    /// the stored template untouched.
    pub fn update(&self, id: &str, updates: UpdateTemplateRequest) -> TemplateResult<TemplateItem> {
        let mut entry = self
            .templates
            .get_mut(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
        let mut template = entry.clone();

        if let Some(name) = updates.name {
            template.name = name;
        }
        if let Some(channel) = updates.channel {
            template.channel = Some(channel);
        }
        if let Some(subject) = updates.subject {
            template.legacy.subject = Some(subject);
        }
        if let Some(email_subject) = updates.email_subject {
            template.current.email_subject = Some(email_subject);
        }
        if let Some(content_html) = updates.content_html {
            template.legacy.content_html = Some(content_html);
        }
        if let Some(email_content_html) = updates.email_content_html {
            template.current.email_content_html = Some(email_content_html);
        }
        if let Some(content_text) = updates.content_text {
            template.legacy.content_text = Some(content_text);
        }
        if let Some(sms_content) = updates.sms_content {
            template.current.sms_content = Some(sms_content);
        }
        if let Some(is_active) = updates.is_active {
            template.is_active = is_active;
        }
        if let Some(preview_data) = updates.preview_data {
            template.preview_data = preview_data;
        }

        template.updated_at = Utc::now();
        template.validate()?;

        *entry = template.clone();
        drop(entry);
        tracing::info!(template_id = %id, "Template updated");

        Ok(template)
    }

    /// Delete a template by ID
    pub fn delete(&self, id: &str) -> TemplateResult<()> {
        match self.templates.remove(id) {
            Some(_) => {
                tracing::info!(template_id = %id, "Template deleted");
                Ok(())
            }
            None => Err(TemplateError::NotFound(id.to_string())),
        }
    }

    pub fn exists(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

/// Create an Arc-wrapped template store
pub fn create_template_store() -> Arc<TemplateStore> {
    Arc::new(TemplateStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Channel;
    use serde_json::json;

    fn template(id: &str) -> TemplateItem {
        serde_json::from_value(json!({
            "id": id,
            "name": "Lead notification",
            "channel": "EMAIL",
            "subject": "New lead: {{customer.name}}",
            "contentHtml": "<p>{{project.message}}</p>"
        }))
        .unwrap()
    }

    #[test]
    fn test_store_create_and_get() {
        let store = TemplateStore::new();

        let created = store.create(template("lead-email")).unwrap();
        assert_eq!(created.id, "lead-email");

        let retrieved = store.get("lead-email").unwrap();
        assert_eq!(retrieved.name, "Lead notification");
        assert_eq!(retrieved.fields().subject, "New lead: {{customer.name}}");
    }

    #[test]
    fn test_store_create_duplicate() {
        let store = TemplateStore::new();

        store.create(template("duplicate")).unwrap();
        assert!(matches!(
            store.create(template("duplicate")),
            Err(TemplateError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_store_create_invalid() {
        let store = TemplateStore::new();
        assert!(matches!(
            store.create(template("has space")),
            Err(TemplateError::InvalidId(_))
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_store_update() {
        let store = TemplateStore::new();
        store.create(template("update-test")).unwrap();

        let updates = UpdateTemplateRequest {
            name: Some("Updated".to_string()),
            channel: Some(Channel::Sms),
            sms_content: Some("Lead {{submission.id}}".to_string()),
            preview_data: Some(Some(r#"{"submission":{"id":"S-1"}}"#.to_string())),
            ..Default::default()
        };

        let updated = store.update("update-test", updates).unwrap();
        assert_eq!(updated.name, "Updated");
        assert_eq!(updated.fields().channel, Channel::Sms);
        assert_eq!(updated.fields().text_body, "Lead {{submission.id}}");
        assert!(updated.preview_data.is_some());

        let cleared = store
            .update(
                "update-test",
                UpdateTemplateRequest {
                    preview_data: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.preview_data.is_none());
    }

    #[test]
    fn test_store_update_rejects_blank_name() {
        let store = TemplateStore::new();
        store.create(template("blank-name")).unwrap();

        let result = store.update(
            "blank-name",
            UpdateTemplateRequest {
                name: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TemplateError::InvalidTemplate(_))));
        assert_eq!(store.get("blank-name").unwrap().name, "Lead notification");
    }

    #[test]
    fn test_store_update_after_delete_is_not_found() {
        let store = TemplateStore::new();
        store.create(template("gone")).unwrap();
        store.delete("gone").unwrap();

        let result = store.update(
            "gone",
            UpdateTemplateRequest {
                name: Some("Back".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
        assert!(!store.exists("gone"));
    }

    #[test]
    fn test_store_concurrent_updates_keep_every_field() {
        let store = Arc::new(TemplateStore::new());
        store.create(template("shared")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let updates = if i % 2 == 0 {
                            UpdateTemplateRequest {
                                email_subject: Some("Subject {{customer.name}}".to_string()),
                                ..Default::default()
                            }
                        } else {
                            UpdateTemplateRequest {
                                sms_content: Some("Text {{submission.id}}".to_string()),
                                ..Default::default()
                            }
                        };
                        store.update("shared", updates).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.get("shared").unwrap();
        assert_eq!(
            stored.current.email_subject.as_deref(),
            Some("Subject {{customer.name}}")
        );
        assert_eq!(
            stored.current.sms_content.as_deref(),
            Some("Text {{submission.id}}")
        );
    }

    #[test]
    fn test_store_delete() {
        let store = TemplateStore::new();
        store.create(template("delete-test")).unwrap();
        assert!(store.exists("delete-test"));

        store.delete("delete-test").unwrap();
        assert!(!store.exists("delete-test"));
        assert!(matches!(
            store.delete("delete-test"),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_list() {
        let store = TemplateStore::new();
        for i in [2, 0, 1] {
            store.create(template(&format!("template-{}", i))).unwrap();
        }

        let ids: Vec<String> = store.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["template-0", "template-1", "template-2"]);
    }
}
