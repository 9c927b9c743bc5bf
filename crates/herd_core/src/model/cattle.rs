use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cattle {
    pub id: String,
    pub name: String,
    pub breed: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Cached summary, refreshed from the cattle's recurring injections.
    #[serde(default, with = "crate::model::iso_date::option")]
    pub next_injection: Option<Date>,
}

impl Cattle {
    pub fn apply(&mut self, patch: &CattlePatch) {
        if let Some(name) = patch.name.as_ref() {
            self.name = name.clone();
        }
        if let Some(breed) = patch.breed.as_ref() {
            self.breed = breed.clone();
        }
        if let Some(image) = patch.image.as_ref() {
            self.image = image.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCattle {
    pub name: String,
    pub breed: String,
    pub image: Option<String>,
}

impl NewCattle {
    pub fn into_cattle(self, id: String, now: OffsetDateTime) -> Result<Cattle, AppError> {
        let name = required("name", &self.name)?;
        let breed = required("breed", &self.breed)?;
        let image = self
            .image
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Cattle {
            id,
            name,
            breed,
            image,
            created_at: now,
            next_injection: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CattlePatch {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub image: Option<Option<String>>,
}

impl CattlePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.breed.is_none() && self.image.is_none()
    }

    /// Trim fields and reject blanks for the required ones.
    pub fn normalized(self) -> Result<Self, AppError> {
        let name = self
            .name
            .map(|value| required("name", &value))
            .transpose()?;
        let breed = self
            .breed
            .map(|value| required("breed", &value))
            .transpose()?;
        let image = self.image.map(|value| {
            value
                .map(|image| image.trim().to_string())
                .filter(|image| !image.is_empty())
        });

        Ok(Self { name, breed, image })
    }
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
