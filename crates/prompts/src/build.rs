//! Companion compiler invocation

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::{PromptsError, Result};

/// Extension the compiler gives its output
pub const ARTIFACT_EXT: &str = "prompts.js";

/// How to run the compiler
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Compiler executable, looked up on `PATH` when not absolute
    pub exec: String,
    /// Directory the artifact is written to
    pub work_dir: PathBuf,
}

impl BuildOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            exec: "kottoc".to_string(),
            work_dir: work_dir.into(),
        }
    }

    pub fn with_exec(mut self, exec: impl Into<String>) -> Self {
        self.exec = exec.into();
        self
    }
}

/// Where the compiler puts the artifact for `source` (a path or URL)
pub fn artifact_path(source: &str, work_dir: &Path) -> PathBuf {
    let file_name = source.rsplit('/').next().unwrap_or(source);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    work_dir.join(format!("{}.{}", stem, ARTIFACT_EXT))
}

/// `source` as the compiler expects it: URLs pass through, file paths
/// become absolute `file://` URLs
pub fn source_url(source: &str) -> Result<Url> {
    // Single-letter schemes are Windows drive letters
    if let Ok(url) = Url::parse(source) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(source);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&path).map_err(|_| PromptsError::InvalidSource(source.to_string()))
}

/// Compile `source` into a declaration artifact and return its path
pub async fn build(source: &str, opts: &BuildOptions) -> Result<PathBuf> {
    let url = source_url(source)?;
    debug!("running {} for {}", opts.exec, url);

    tokio::fs::create_dir_all(&opts.work_dir).await?;

    let status = Command::new(&opts.exec)
        .arg(format!("-o={}", opts.work_dir.display()))
        .arg(url.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status()
        .await?;

    if !status.success() {
        return Err(PromptsError::Compiler {
            source_path: source.to_string(),
            status: status.to_string(),
        });
    }

    let output = artifact_path(source, &opts.work_dir);
    info!("declarations generated for {}, output: {:?}", source, output);
    Ok(output)
}
