//! Bundled project dataset served while the store is unreachable.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};

use crate::projects::{ClickCounters, Project, ProjectQuery, ProjectStatus};

/// Message attached to responses served from the bundled dataset.
pub const FALLBACK_MESSAGE: &str = "Using fallback project data (database unavailable)";

fn bundled_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[allow(clippy::too_many_arguments)]
fn bundled(
    id: &str,
    title: &str,
    description: &str,
    technologies: &[&str],
    github_url: &str,
    live_url: &str,
    image_url: &str,
    featured: bool,
    order: i32,
) -> Project {
    let at = bundled_at(order.unsigned_abs() + 1);
    Project {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        technologies: technologies.iter().map(|t| t.to_string()).collect(),
        github_url: github_url.to_string(),
        live_url: live_url.to_string(),
        image_url: image_url.to_string(),
        featured,
        order,
        status: ProjectStatus::Published,
        views: 0,
        clicks: ClickCounters::default(),
        created_at: at,
        updated_at: at,
    }
}

static FALLBACK_PROJECTS: LazyLock<Vec<Project>> = LazyLock::new(|| {
    vec![
        bundled(
            "default-1",
            "E-Commerce Platform",
            "A full-stack e-commerce solution with user authentication, product management, and payment integration. Features include shopping cart, order tracking, and admin dashboard.",
            &["React", "Node.js", "MongoDB", "Stripe API"],
            "https://github.com/username/ecommerce-platform",
            "https://ecommerce-demo.com",
            "https://images.pexels.com/photos/230544/pexels-photo-230544.jpeg?auto=compress&cs=tinysrgb&w=800",
            true,
            1,
        ),
        bundled(
            "default-2",
            "Task Management App",
            "A collaborative project management tool with real-time updates, drag-and-drop functionality, and team collaboration features. Built with modern web technologies.",
            &["React", "TypeScript", "Firebase", "Tailwind CSS"],
            "https://github.com/username/task-manager",
            "https://taskmanager-demo.com",
            "https://images.pexels.com/photos/3184360/pexels-photo-3184360.jpeg?auto=compress&cs=tinysrgb&w=800",
            true,
            2,
        ),
        bundled(
            "default-3",
            "Weather Analytics Dashboard",
            "An interactive dashboard that displays weather data with beautiful visualizations and forecasting. Includes location-based weather tracking and historical data analysis.",
            &["Python", "Django", "Chart.js", "Weather API"],
            "https://github.com/username/weather-dashboard",
            "https://weather-analytics.com",
            "https://images.pexels.com/photos/1118873/pexels-photo-1118873.jpeg?auto=compress&cs=tinysrgb&w=800",
            false,
            3,
        ),
        bundled(
            "default-4",
            "AI-Powered Chat Bot",
            "An intelligent chatbot using natural language processing to provide customer support. Features include sentiment analysis, automated responses, and learning capabilities.",
            &["Python", "TensorFlow", "Flask", "Natural Language Processing"],
            "https://github.com/username/ai-chatbot",
            "https://chatbot-demo.com",
            "https://images.pexels.com/photos/8439093/pexels-photo-8439093.jpeg?auto=compress&cs=tinysrgb&w=800",
            false,
            4,
        ),
    ]
});

/// The full bundled dataset, in declaration order.
pub fn fallback_projects() -> &'static [Project] {
    &FALLBACK_PROJECTS
}

/// Bundled projects selected with the same rules as the live listing.
pub fn list_fallback(query: &ProjectQuery) -> Vec<Project> {
    query.apply(fallback_projects().iter().cloned())
}

/// Looks up a bundled project by id.
pub fn find_fallback(id: &str) -> Option<Project> {
    fallback_projects().iter().find(|p| p.id == id).cloned()
}
