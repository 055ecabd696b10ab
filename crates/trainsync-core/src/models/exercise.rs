// ABOUTME: Payload for creating a user-defined exercise with an optional image
// ABOUTME: Sent to the backend as a multipart form; the image stays a local path until replay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::CategoryId;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A new exercise as entered in the exercise form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExercise {
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Category identifier
    pub category: CategoryId,
    /// Whether other users can see the exercise
    #[serde(default)]
    pub public: bool,
    /// Local image file uploaded with the form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl NewExercise {
    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_input("exercise name must not be empty"));
        }
        Ok(())
    }

    /// File name sent for the image part
    #[must_use]
    pub fn image_file_name(&self) -> Option<String> {
        self.image_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// MIME type of the image part, derived from the file extension
    #[must_use]
    pub fn image_mime_type(&self) -> Option<String> {
        let path = self.image_path.as_deref()?;
        Some(
            path.extension()
                .map_or_else(|| "image".to_owned(), |ext| {
                    format!("image/{}", ext.to_string_lossy().to_lowercase())
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(image: Option<&str>) -> NewExercise {
        NewExercise {
            name: "Bulgarian split squat".to_owned(),
            description: String::new(),
            category: 2,
            public: true,
            image_path: image.map(PathBuf::from),
        }
    }

    #[test]
    fn test_image_metadata_from_extension() {
        let ex = exercise(Some("/photos/squat.JPG"));
        assert_eq!(ex.image_file_name().as_deref(), Some("squat.JPG"));
        assert_eq!(ex.image_mime_type().as_deref(), Some("image/jpg"));
    }

    #[test]
    fn test_image_without_extension_uses_generic_type() {
        let ex = exercise(Some("/photos/squat"));
        assert_eq!(ex.image_mime_type().as_deref(), Some("image"));
        assert!(exercise(None).image_mime_type().is_none());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut ex = exercise(None);
        ex.name = "   ".to_owned();
        assert!(ex.validate().is_err());
    }
}
