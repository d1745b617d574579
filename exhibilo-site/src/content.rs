/// Site content: services, projects and testimonials, with built-in fallbacks
use std::fmt;

use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Category slug that matches every project
pub const ALL_CATEGORIES: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Project ids arrive as numbers or strings depending on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image: String,
    /// Model the viewer opens on the project page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub author: String,
    #[serde(default)]
    pub company: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Services {
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projects {
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonials {
    pub testimonials: Vec<Testimonial>,
}

fn service(title: &str, description: &str, icon: &str) -> Service {
    Service {
        title: title.to_owned(),
        description: description.to_owned(),
        icon: icon.to_owned(),
    }
}

fn project(id: i64, title: &str, description: &str, category: &str) -> Project {
    Project {
        id: ProjectId::Number(id),
        title: title.to_owned(),
        description: description.to_owned(),
        category: category.to_owned(),
        image: format!("/img/proj{id}.jpg"),
        model: None,
    }
}

fn testimonial(author: &str, company: &str, quote: &str) -> Testimonial {
    Testimonial {
        author: author.to_owned(),
        company: company.to_owned(),
        quote: quote.to_owned(),
    }
}

pub fn fallback_services() -> Services {
    Services {
        services: vec![
            service("Diseño 3D", "Exhibidores a medida", "Palette"),
            service("Producción", "Cartón, madera, metal, acrílico", "Factory"),
            service("Implementación", "Logística e instalación", "Truck"),
        ],
    }
}

pub fn fallback_projects() -> Projects {
    Projects {
        projects: vec![
            project(1, "Display Cosmética", "Línea premium", "Cosmética"),
            project(2, "Isla Bebidas", "Impacto en góndola", "Bebidas"),
            project(3, "Exhibidor Alimentos", "Alta rotación", "Alimentos"),
        ],
    }
}

pub fn fallback_testimonials() -> Testimonials {
    Testimonials {
        testimonials: vec![
            testimonial("María G.", "Retail SA", "Excelente calidad y tiempos."),
            testimonial("J. Pérez", "Bebidas XYZ", "Diseños que venden."),
            testimonial("Lucía R.", "Cosmética Pro", "Equipo muy profesional."),
        ],
    }
}

/// Reads site content from the backend, degrading to the built-in payloads
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    base_url: Option<String>,
    enabled: bool,
}

impl ContentClient {
    pub fn new(base_url: Option<String>, enabled: bool) -> Self {
        Self::with_client(Client::new(), base_url, enabled)
    }

    pub fn with_client(http: Client, base_url: Option<String>, enabled: bool) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty());
        Self {
            http,
            base_url,
            enabled,
        }
    }

    /// Never touches the network
    pub fn offline() -> Self {
        Self::new(None, false)
    }

    pub fn is_online(&self) -> bool {
        self.enabled && self.base_url.is_some()
    }

    /// GET `path` from the backend and decode it, or return `fallback` when
    /// the backend is off, unreachable, answers with an error status or
    /// sends something `decode` rejects.
    pub async fn fetch_with_fallback<T, E, F>(&self, path: &str, fallback: T, decode: F) -> T
    where
        F: FnOnce(Bytes) -> Result<T, E>,
        E: fmt::Display,
    {
        let Some(base) = self.base_url.as_deref().filter(|_| self.enabled) else {
            debug!(path, "backend disabled, using built-in content");
            return fallback;
        };
        let url = format!("{base}{path}");

        let response = match self.http.get(&url).header(ACCEPT, "application/json").send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "content fallback");
                return fallback;
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "content fallback");
            return fallback;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%url, error = %err, "content fallback");
                return fallback;
            }
        };
        match decode(body) {
            Ok(value) => value,
            Err(err) => {
                warn!(%url, error = %err, "content fallback");
                fallback
            }
        }
    }

    async fn section<T: DeserializeOwned>(&self, path: &str, fallback: T) -> T {
        self.fetch_with_fallback(path, fallback, |body| serde_json::from_slice::<T>(&body))
            .await
    }

    pub async fn services(&self) -> Vec<Service> {
        self.section("/services", fallback_services()).await.services
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.section("/projects", fallback_projects()).await.projects
    }

    pub async fn testimonials(&self) -> Vec<Testimonial> {
        self.section("/testimonials", fallback_testimonials())
            .await
            .testimonials
    }
}

/// URL slug of a category: lowercase, accents dropped, every run of other
/// characters collapsed into a single dash.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    let folded = text
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{300}'..='\u{36f}').contains(c))
        .collect::<String>();
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Projects whose category slug is `slug`, or all of them for [`ALL_CATEGORIES`]
pub fn projects_in_category<'a>(projects: &'a [Project], slug: &str) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|project| slug == ALL_CATEGORIES || slugify(&project.category) == slug)
        .collect()
}

/// Heading for a category page
pub fn category_title(projects: &[Project], slug: &str) -> String {
    if slug == ALL_CATEGORIES {
        return "Todos".to_owned();
    }
    projects_in_category(projects, slug)
        .first()
        .map(|project| project.category.clone())
        .unwrap_or_else(|| slug.replace('-', " "))
}

/// Path of a project's page. A project with a model carries it as `?model=`
/// so the viewer on that page loads it.
pub fn project_link(project: &Project) -> String {
    let path = format!("/proyecto/{}", project.id);
    match project.model.as_deref().filter(|model| !model.is_empty()) {
        Some(model) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("model", model)
                .finish();
            format!("{path}?{query}")
        }
        None => path,
    }
}

/// Look a project up by id, comparing string forms so `3` matches `"3"`
pub fn find_project<'a>(projects: &'a [Project], id: &str) -> Option<&'a Project> {
    projects.iter().find(|project| project.id.to_string() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Cosmética"), "cosmetica");
        assert_eq!(slugify("Bebidas & Snacks!"), "bebidas-snacks");
        assert_eq!(slugify("  Punto de Venta  "), "punto-de-venta");
        assert_eq!(slugify("Diseño 3D"), "diseno-3d");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_projects_in_category() {
        let projects = fallback_projects().projects;
        let cosmetics = projects_in_category(&projects, "cosmetica");
        assert_eq!(cosmetics.len(), 1);
        assert_eq!(cosmetics[0].title, "Display Cosmética");

        assert_eq!(projects_in_category(&projects, ALL_CATEGORIES).len(), 3);
        assert!(projects_in_category(&projects, "muebles").is_empty());
    }

    #[test]
    fn test_category_title() {
        let projects = fallback_projects().projects;
        assert_eq!(category_title(&projects, "todos"), "Todos");
        assert_eq!(category_title(&projects, "cosmetica"), "Cosmética");
        assert_eq!(category_title(&projects, "punto-de-venta"), "punto de venta");
    }

    #[test]
    fn test_find_project_by_string_form() {
        let mut projects = fallback_projects().projects;
        projects.push(Project {
            id: ProjectId::Text("stand-77".into()),
            ..projects[0].clone()
        });

        assert_eq!(find_project(&projects, "2").map(|p| p.title.as_str()), Some("Isla Bebidas"));
        assert!(find_project(&projects, "stand-77").is_some());
        assert!(find_project(&projects, "9").is_none());
    }

    #[test]
    fn test_project_link_carries_model() {
        let mut project = fallback_projects().projects[1].clone();
        assert_eq!(project_link(&project), "/proyecto/2");

        project.model = Some(String::new());
        assert_eq!(project_link(&project), "/proyecto/2");

        project.model = Some("https://cdn.exhibilo.com.ar/models/isla bebidas.glb".into());
        let link = project_link(&project);
        assert_eq!(
            link,
            "/proyecto/2?model=https%3A%2F%2Fcdn.exhibilo.com.ar%2Fmodels%2Fisla+bebidas.glb"
        );

        let page = url::Url::parse("https://exhibilo.com.ar/").unwrap().join(&link).unwrap();
        let model = page
            .query_pairs()
            .find(|(key, _)| key == "model")
            .map(|(_, value)| value.into_owned());
        assert_eq!(model.as_deref(), project.model.as_deref());
    }

    #[test]
    fn test_project_model_is_optional() {
        let projects: Projects = serde_json::from_str(
            r#"{"projects":[
                {"id":4,"title":"Isla","category":"Bebidas","model":"/models/isla.glb"},
                {"id":5,"title":"Góndola","category":"Bebidas"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(projects.projects[0].model.as_deref(), Some("/models/isla.glb"));
        assert_eq!(projects.projects[1].model, None);

        let json = serde_json::to_value(&projects.projects[1]).unwrap();
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_ids_decode_from_numbers_and_strings() {
        let projects: Projects = serde_json::from_str(
            r#"{"projects":[
                {"id":7,"title":"A","category":"Bebidas"},
                {"id":"x-1","title":"B","category":"Alimentos","image":"/b.jpg"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(projects.projects[0].id, ProjectId::Number(7));
        assert_eq!(projects.projects[1].id.to_string(), "x-1");
    }

    #[tokio::test]
    async fn test_offline_client_returns_fallbacks() {
        let client = ContentClient::offline();
        assert!(!client.is_online());
        assert_eq!(client.services().await, fallback_services().services);
        assert_eq!(client.testimonials().await.len(), 3);

        // a base URL alone does not enable the backend
        let disabled = ContentClient::new(Some("http://127.0.0.1:9".into()), false);
        assert!(!disabled.is_online());
        assert_eq!(disabled.projects().await, fallback_projects().projects);
    }
}
