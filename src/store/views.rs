//! Read-only views over a project listing.

use super::models::{Category, CategoryFilter, Project};

/// Sort by display order, ascending. Stable, so ties keep document order.
pub fn sort_by_order(projects: &mut [Project]) {
    projects.sort_by_key(|p| p.order);
}

pub fn filter_by_category(projects: Vec<Project>, filter: CategoryFilter) -> Vec<Project> {
    match filter {
        CategoryFilter::All => projects,
        CategoryFilter::Only(category) => projects
            .into_iter()
            .filter(|p| p.category == category)
            .collect(),
    }
}

pub fn featured(projects: Vec<Project>) -> Vec<Project> {
    let mut featured: Vec<Project> = projects.into_iter().filter(|p| p.featured).collect();
    sort_by_order(&mut featured);
    featured
}

/// Distinct categories in use, sorted by name
pub fn categories(projects: &[Project]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for project in projects {
        if !categories.contains(&project.category) {
            categories.push(project.category);
        }
    }
    categories.sort_by_key(|c| c.as_str());
    categories
}
