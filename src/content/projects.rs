//! Project list and the carousel that browses it.

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::SiteError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub github_url: String,
    #[serde(default)]
    pub live_url: Option<String>,
}

impl Project {
    fn validate(&self) -> Result<(), SiteError> {
        Url::parse(&self.github_url).map_err(|source| SiteError::InvalidUrl {
            field: "githubUrl",
            value: self.github_url.clone(),
            source,
        })?;
        if let Some(live) = &self.live_url {
            Url::parse(live).map_err(|source| SiteError::InvalidUrl {
                field: "liveUrl",
                value: live.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

pub fn load_projects(path: impl AsRef<Path>) -> Result<Vec<Project>, SiteError> {
    let raw = std::fs::read_to_string(path)?;
    projects_from_json(&raw)
}

/// Parse and validate a JSON array of projects. Ids must be unique.
pub fn projects_from_json(raw: &str) -> Result<Vec<Project>, SiteError> {
    let projects: Vec<Project> = serde_json::from_str(raw)?;
    for (i, project) in projects.iter().enumerate() {
        project.validate()?;
        if projects[..i].iter().any(|p| p.id == project.id) {
            return Err(SiteError::Validation(format!(
                "duplicate project id {}",
                project.id
            )));
        }
    }
    log::debug!("Loaded {} projects", projects.len());
    Ok(projects)
}

/// Cards shown at once when the list is longer than this
const VISIBLE_CARDS: usize = 3;

/// Wrap-around carousel over a read-only project list, plus the
/// project opened in the detail modal.
pub struct Carousel {
    projects: Vec<Project>,
    current: usize,
    selected: Option<u32>,
}

impl Carousel {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            current: 0,
            selected: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Arrows are only useful when not everything fits.
    pub fn has_controls(&self) -> bool {
        self.projects.len() > VISIBLE_CARDS
    }

    pub fn next(&mut self) {
        if !self.projects.is_empty() {
            self.current = (self.current + 1) % self.projects.len();
        }
    }

    pub fn prev(&mut self) {
        let n = self.projects.len();
        if n > 0 {
            self.current = (self.current + n - 1) % n;
        }
    }

    /// Previous, current and next card; or every project if they all fit.
    pub fn visible(&self) -> Vec<&Project> {
        let n = self.projects.len();
        if n <= VISIBLE_CARDS {
            return self.projects.iter().collect();
        }
        let prev = (self.current + n - 1) % n;
        let next = (self.current + 1) % n;
        [prev, self.current, next]
            .into_iter()
            .map(|i| &self.projects[i])
            .collect()
    }

    /// Open the modal for `id`. Unknown ids leave it closed.
    pub fn select(&mut self, id: u32) {
        self.selected = self.projects.iter().any(|p| p.id == id).then_some(id);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Project> {
        let id = self.selected?;
        self.projects.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: u32) -> Project {
        Project {
            id,
            title: format!("Project {id}"),
            description: String::new(),
            tech_stack: vec!["Rust".into()],
            github_url: format!("https://github.com/example/p{id}"),
            live_url: None,
        }
    }

    fn ids(c: &Carousel) -> Vec<u32> {
        c.visible().iter().map(|p| p.id).collect()
    }

    #[test]
    fn parses_camel_case_json() {
        let raw = r#"[{
            "id": 1, "title": "Arm", "description": "6-DOF arm",
            "techStack": ["ROS", "C++"],
            "githubUrl": "https://github.com/example/arm",
            "liveUrl": "https://example.com/arm"
        }, {
            "id": 2, "title": "Rover", "description": "", "techStack": [],
            "githubUrl": "https://github.com/example/rover"
        }]"#;
        let projects = projects_from_json(raw).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].tech_stack, vec!["ROS", "C++"]);
        assert_eq!(projects[1].live_url, None);
    }

    #[test]
    fn bundled_projects_are_valid() {
        let projects = projects_from_json(include_str!("../../site/projects.json")).unwrap();
        assert_eq!(projects.len(), 4);
        assert!(Carousel::new(projects).has_controls());
    }

    #[test]
    fn rejects_bad_urls_and_duplicates() {
        let bad = r#"[{"id": 1, "title": "x", "description": "", "techStack": [],
            "githubUrl": "not a url"}]"#;
        match projects_from_json(bad) {
            Err(SiteError::InvalidUrl { field, .. }) => assert_eq!(field, "githubUrl"),
            other => panic!("unexpected {:?}", other),
        }

        let dup = r#"[
            {"id": 1, "title": "a", "description": "", "techStack": [], "githubUrl": "https://a.dev"},
            {"id": 1, "title": "b", "description": "", "techStack": [], "githubUrl": "https://b.dev"}
        ]"#;
        assert!(matches!(projects_from_json(dup), Err(SiteError::Validation(_))));
    }

    #[test]
    fn carousel_wraps_both_ways() {
        let mut c = Carousel::new((1..=5).map(project).collect());
        assert!(c.has_controls());
        assert_eq!(ids(&c), vec![5, 1, 2]);

        c.prev();
        assert_eq!(c.current_index(), 4);
        assert_eq!(ids(&c), vec![4, 5, 1]);

        c.next();
        c.next();
        assert_eq!(ids(&c), vec![1, 2, 3]);
    }

    #[test]
    fn short_lists_show_everything() {
        let mut c = Carousel::new((1..=3).map(project).collect());
        assert!(!c.has_controls());
        c.next();
        assert_eq!(ids(&c), vec![1, 2, 3]);

        let mut empty = Carousel::new(Vec::new());
        empty.next();
        empty.prev();
        assert!(empty.visible().is_empty());
    }

    #[test]
    fn modal_selection() {
        let mut c = Carousel::new((1..=4).map(project).collect());
        c.select(3);
        assert_eq!(c.selected().map(|p| p.id), Some(3));
        c.select(42);
        assert!(c.selected().is_none());
        c.select(2);
        c.close();
        assert!(c.selected().is_none());
    }
}
