use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors. These only come from collaborators: repository access, cloning, document output.
/// Classification and ordering degrade instead of failing.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Repository root not found or not a directory: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("Failed to launch git: {0}")]
    GitLaunch(std::io::Error),

    #[error("git clone of {repo_url} failed: {message}")]
    Clone { repo_url: String, message: String },

    #[error("git checkout of {reference} failed: {message}")]
    Checkout { reference: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Template render error: {0}")]
    TemplateRender(#[from] handlebars::RenderError),
}
