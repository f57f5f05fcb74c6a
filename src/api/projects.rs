//! Portfolio project endpoints. Reads are public; writes need an admin session.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::store::{
    views, Category, CategoryFilter, CreateProjectRequest, NewProject, Project, ProjectPatch,
    UpdateProjectRequest,
};
use crate::AppState;

use super::auth::{AdminSession, StatusResponse};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{parse_project_id, validate_image_urls, validate_required_text};

#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    /// Category name or `All`
    pub category: Option<String>,
    /// Only featured projects when true
    pub featured: Option<bool>,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>().map_err(|_| {
        let allowed: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("Category must be one of: {}", allowed.join(", "))
    })
}

/// Validate a CreateProjectRequest and turn it into store input
fn validate_create_request(req: CreateProjectRequest) -> Result<NewProject, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required_text(req.title.as_deref(), "Title") {
        errors.add("title", e);
    }
    if let Err(e) = validate_required_text(req.description.as_deref(), "Description") {
        errors.add("description", e);
    }

    let category = match req.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => match parse_category(raw.trim()) {
            Ok(c) => Some(c),
            Err(e) => {
                errors.add("category", e);
                None
            }
        },
        _ => {
            errors.add("category", "Category is required");
            None
        }
    };

    let images = req.images.unwrap_or_default();
    if let Err(e) = validate_image_urls(&images) {
        errors.add("images", e);
    }

    errors.finish()?;

    let (Some(title), Some(description), Some(category)) = (req.title, req.description, category)
    else {
        return Err(ApiError::bad_request(
            "Title, description, and category are required",
        ));
    };

    Ok(NewProject::new(title, description, category)
        .with_images(images)
        .with_featured(req.featured.unwrap_or(false))
        .with_order(req.order.unwrap_or(0)))
}

/// Validate an UpdateProjectRequest; absent fields are left unchanged
fn validate_update_request(req: UpdateProjectRequest) -> Result<ProjectPatch, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if req.title.is_some() {
        if let Err(e) = validate_required_text(req.title.as_deref(), "Title") {
            errors.add("title", e);
        }
    }
    if req.description.is_some() {
        if let Err(e) = validate_required_text(req.description.as_deref(), "Description") {
            errors.add("description", e);
        }
    }

    let category = match req.category.as_deref() {
        Some(raw) => match parse_category(raw.trim()) {
            Ok(c) => Some(c),
            Err(e) => {
                errors.add("category", e);
                None
            }
        },
        None => None,
    };

    if let Some(ref images) = req.images {
        if let Err(e) = validate_image_urls(images) {
            errors.add("images", e);
        }
    }

    errors.finish()?;

    Ok(ProjectPatch {
        title: req.title,
        description: req.description,
        category,
        images: req.images,
        featured: req.featured,
        order: req.order,
    })
}

/// List projects sorted by display order
///
/// GET /api/projects?category=Villas&featured=true
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let filter = match query.category.as_deref() {
        Some(raw) => raw
            .parse::<CategoryFilter>()
            .map_err(|e| ApiError::validation_field("category", e.to_string()))?,
        None => CategoryFilter::All,
    };

    let projects = if query.featured == Some(true) {
        state.projects.featured().await
    } else {
        state.projects.list().await
    };

    Ok(Json(views::filter_by_category(projects, filter)))
}

/// Distinct categories currently in use
///
/// GET /api/projects/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<Category>> {
    Json(state.projects.categories().await)
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let id = parse_project_id(&id)?;

    state
        .projects
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let new = validate_create_request(req)?;
    let project = state.projects.create(new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let id = parse_project_id(&id)?;
    let patch = validate_update_request(req)?;

    state
        .projects
        .update(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_project_id(&id)?;

    if !state.projects.delete(id).await? {
        return Err(ApiError::not_found("Project not found"));
    }

    Ok(Json(StatusResponse::ok("Project deleted")))
}
