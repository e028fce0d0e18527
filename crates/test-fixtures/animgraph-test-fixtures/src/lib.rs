//! Shared JSON fixtures for the animgraph test suites, indexed by
//! `fixtures/manifest.json`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static INDEX: Lazy<Index> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../../fixtures/manifest.json"))
        .expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Index {
    transitions: BTreeMap<String, DocumentFixture>,
    #[serde(rename = "clip-catalogs")]
    clip_catalogs: BTreeMap<String, CatalogFixture>,
}

#[derive(Debug, Deserialize)]
struct DocumentFixture {
    file: String,
    /// Diagnostics the validator is expected to report; 0 for clean documents.
    #[serde(default)]
    diagnostics: usize,
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    file: String,
    /// Location prefix the catalog's project clips live under.
    scope: String,
}

/// One clip of a catalog fixture.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ClipEntry {
    pub name: String,
    pub location: String,
}

fn entry<'a, T>(section: &'a BTreeMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    section
        .get(name)
        .with_context(|| format!("no {kind} fixture named '{name}' in the manifest"))
}

fn read(file: &str) -> Result<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(file);
    std::fs::read_to_string(&path).with_context(|| format!("reading fixture {}", path.display()))
}

/// Transition documents as a host tool would export them (mixed key casing).
pub mod transitions {
    use super::*;

    fn fixture(name: &str) -> Result<&'static DocumentFixture> {
        entry(&INDEX.transitions, "transition", name)
    }

    /// Every document, sorted by name.
    pub fn keys() -> Vec<String> {
        INDEX.transitions.keys().cloned().collect()
    }

    /// Documents the validator accepts without diagnostics.
    pub fn clean_keys() -> Vec<String> {
        INDEX
            .transitions
            .iter()
            .filter(|(_, doc)| doc.diagnostics == 0)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn expected_diagnostics(name: &str) -> Result<usize> {
        Ok(fixture(name)?.diagnostics)
    }

    pub fn json(name: &str) -> Result<String> {
        read(&fixture(name)?.file)
    }
}

/// Clip listings used to seed in-memory resolvers.
pub mod clip_catalogs {
    use super::*;

    fn fixture(name: &str) -> Result<&'static CatalogFixture> {
        entry(&INDEX.clip_catalogs, "clip catalog", name)
    }

    pub fn load(name: &str) -> Result<Vec<ClipEntry>> {
        let file = &fixture(name)?.file;
        serde_json::from_str(&read(file)?).with_context(|| format!("parsing clip catalog {file}"))
    }

    /// Search scope covering the catalog's project clips.
    pub fn scope(name: &str) -> Result<&'static str> {
        Ok(fixture(name)?.scope.as_str())
    }
}
