//! Project models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portfolio category. The set is fixed; the site renders one filter tab per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Villas,
    Palaces,
    Restaurants,
    Hotels,
    Commercial,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Villas,
        Category::Palaces,
        Category::Restaurants,
        Category::Hotels,
        Category::Commercial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Villas => "Villas",
            Category::Palaces => "Palaces",
            Category::Restaurants => "Restaurants",
            Category::Hotels => "Hotels",
            Category::Commercial => "Commercial",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Category selector for list views; `All` passes every project through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: Category,
    /// Image URLs in display order; the first one is the cover
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-disk layout of the projects document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Highest id ever issued; never decreases
    #[serde(default)]
    pub last_id: u64,
}

impl ProjectsDocument {
    /// Next id to issue. Also stays above ids present in a hand-edited document.
    /// `None` once the id space is used up.
    pub fn next_id(&self) -> Option<u64> {
        let max_present = self.projects.iter().map(|p| p.id).max().unwrap_or(0);
        self.last_id.max(max_present).checked_add(1)
    }
}

/// Fields of a project to be created
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub images: Vec<String>,
    pub featured: bool,
    pub order: i64,
}

impl NewProject {
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            images: Vec::new(),
            featured: false,
            order: 0,
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}

impl ProjectPatch {
    pub(crate) fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(category) = self.category {
            project.category = category;
        }
        if let Some(images) = self.images {
            project.images = images;
        }
        if let Some(featured) = self.featured {
            project.featured = featured;
        }
        if let Some(order) = self.order {
            project.order = order;
        }
    }
}

/// Request body for creating a project.
///
/// Fields are optional so missing values surface as validation errors
/// instead of body rejections.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}
