//! Tag maintenance use-case service.
//!
//! # Invariants
//! - Renamed tags are normalized exactly like tags set on items.

use crate::model::tag::{normalize_tag, Tag, TagUsage};
use crate::repo::tag_repo::TagRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TagServiceError {
    InvalidTag(String),
    TagNotFound(String),
    TagNameTaken(String),
    Repo(RepoError),
}

impl Display for TagServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::TagNotFound(name) => write!(f, "tag not found: `{name}`"),
            Self::TagNameTaken(name) => write!(f, "tag name already in use: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TagServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TagServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TagNotFound(name) => Self::TagNotFound(name),
            RepoError::TagNameTaken(name) => Self::TagNameTaken(name),
            other => Self::Repo(other),
        }
    }
}

pub struct TagService<R: TagRepository> {
    repo: R,
}

impl<R: TagRepository> TagService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_tags(&self) -> Result<Vec<TagUsage>, TagServiceError> {
        self.repo.list_tags().map_err(Into::into)
    }

    /// Tags whose name contains `text`; blank text lists every tag.
    pub fn search_tags(&self, text: &str) -> Result<Vec<TagUsage>, TagServiceError> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return self.list_tags();
        }
        self.repo.search_tags(&text).map_err(Into::into)
    }

    /// Looks a tag up by name after normalization.
    pub fn get_tag(&self, name: &str) -> Result<Option<Tag>, TagServiceError> {
        let normalized =
            normalize_tag(name).ok_or_else(|| TagServiceError::InvalidTag(name.to_string()))?;
        self.repo.get_tag_by_name(&normalized).map_err(Into::into)
    }

    pub fn rename_tag(&self, from: &str, to: &str) -> Result<Tag, TagServiceError> {
        let from =
            normalize_tag(from).ok_or_else(|| TagServiceError::InvalidTag(from.to_string()))?;
        let to = normalize_tag(to).ok_or_else(|| TagServiceError::InvalidTag(to.to_string()))?;
        let renamed = self.repo.rename_tag(&from, &to)?;
        info!("event=tag_rename module=tag status=ok tag_id={}", renamed.id);
        Ok(renamed)
    }

    pub fn delete_tag(&self, name: &str) -> Result<(), TagServiceError> {
        let normalized =
            normalize_tag(name).ok_or_else(|| TagServiceError::InvalidTag(name.to_string()))?;
        self.repo.delete_tag(&normalized)?;
        info!("event=tag_delete module=tag status=ok");
        Ok(())
    }

    /// Removes tags that no item carries anymore.
    pub fn prune_unused_tags(&self) -> Result<u32, TagServiceError> {
        let removed = self.repo.prune_unused_tags()?;
        info!("event=tag_prune module=tag status=ok removed={removed}");
        Ok(removed)
    }
}
