use anyhow::{bail, Context, Result};
use replay_core::{SamplingConfig, SkillBracket};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Corpus {
    pub name: String,
    #[serde(default)]
    pub sampling: SamplingConfig,
    pub matches: Vec<MatchEntry>,
}

/// One decoded replay in the corpus. Either `bracket` or `rating` must be
/// given; an explicit bracket wins.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub bracket: Option<SkillBracket>,
    #[serde(default)]
    pub rating: Option<u32>,
}

impl MatchEntry {
    pub fn bracket(&self) -> Option<SkillBracket> {
        self.bracket
            .or_else(|| self.rating.map(SkillBracket::from_rating))
    }

    /// Directory-safe label: the replay's file stem.
    pub fn label(&self) -> String {
        self.path
            .file_stem()
            .map_or_else(|| "match".to_string(), |stem| stem.to_string_lossy().into_owned())
    }
}

/// Load and validate a corpus manifest. Relative match paths are resolved
/// against the manifest's directory.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading corpus file: {}", path.display()))?;
    let mut corpus: Corpus = serde_json::from_str(&json)
        .with_context(|| format!("parsing corpus file: {}", path.display()))?;
    if corpus.name.is_empty() {
        bail!("corpus 'name' must not be empty");
    }
    if corpus.matches.is_empty() {
        bail!("corpus 'matches' must list at least one replay");
    }
    corpus
        .sampling
        .validate()
        .context("corpus 'sampling' is invalid")?;
    if let Some(entry) = corpus.matches.iter().find(|m| m.bracket().is_none()) {
        bail!(
            "match '{}' needs either 'bracket' or 'rating'",
            entry.path.display()
        );
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for entry in &mut corpus.matches {
        if entry.path.is_relative() {
            entry.path = base.join(&entry.path);
        }
    }
    Ok(corpus)
}
