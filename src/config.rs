//! Pipeline configuration and language profiles.
//!
//! A [`LangProfile`] fixes the instance namespaces and the language tag of a
//! wordnet graph; every engine receives one explicitly. [`Config`] carries the
//! run policy (vote thresholds, senior users, word identity, pointers to
//! compare) and is persisted as TOML.

use std::collections::BTreeMap;
use std::path::Path;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::vocab;

/// Namespaces and language tag of one wordnet graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangProfile {
    /// Language tag carried by every lexical literal (`pt`, `en`).
    pub lang: String,
    /// IRI prefix of word nodes.
    pub word_ns: String,
    /// IRI prefix of synset nodes.
    pub synset_ns: String,
    /// IRI prefix of word sense nodes.
    pub sense_ns: String,
}

impl LangProfile {
    /// OpenWordNet-PT instances.
    pub fn portuguese() -> Self {
        Self {
            lang: "pt".into(),
            word_ns: "https://w3id.org/own-pt/wn30-pt/instances/word-".into(),
            synset_ns: "https://w3id.org/own-pt/wn30-pt/instances/synset-".into(),
            sense_ns: "https://w3id.org/own-pt/wn30-pt/instances/wordsense-".into(),
        }
    }

    /// Princeton WordNet 3.0 instances published alongside OpenWordNet-PT.
    pub fn english() -> Self {
        Self {
            lang: "en".into(),
            word_ns: "https://w3id.org/own-pt/wn30-en/instances/word-".into(),
            synset_ns: "https://w3id.org/own-pt/wn30-en/instances/synset-".into(),
            sense_ns: "https://w3id.org/own-pt/wn30-en/instances/wordsense-".into(),
        }
    }

    /// Look up a profile by language tag.
    pub fn for_lang(lang: &str) -> ConfigResult<Self> {
        match lang {
            "pt" => Ok(Self::portuguese()),
            "en" => Ok(Self::english()),
            other => Err(ConfigError::UnknownLanguage { lang: other.into() }),
        }
    }
}

impl Default for LangProfile {
    fn default() -> Self {
        Self::portuguese()
    }
}

/// How Word nodes are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordIdentity {
    /// One word per lexical form.
    #[default]
    Flat,
    /// One word per (lexical form, part of speech).
    PartOfSpeech,
}

/// Run configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language profile tag.
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Users whose suggestions pass with the senior threshold.
    #[serde(default)]
    pub senior_users: Vec<String>,
    /// Minimum vote score for suggestions by senior users.
    #[serde(default = "default_senior_threshold")]
    pub senior_threshold: i64,
    /// Minimum vote score for suggestions by anyone.
    #[serde(default = "default_junior_threshold")]
    pub junior_threshold: i64,
    /// Word identity policy shared by lookup, creation and deduplication.
    #[serde(default)]
    pub word_identity: WordIdentity,
    /// Renumber sense nodes to contiguous ordinals after repair.
    #[serde(default)]
    pub renumber_senses: bool,
    /// Dump pointer field name → predicate IRI, for every pointer compared.
    #[serde(default = "default_pointers")]
    pub pointers: BTreeMap<String, String>,
}

fn default_lang() -> String {
    "pt".into()
}
fn default_senior_threshold() -> i64 {
    1
}
fn default_junior_threshold() -> i64 {
    2
}
fn default_pointers() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "wn30_pt_antonymOf".to_string(),
        vocab::ANTONYM_OF.as_str().to_string(),
    )])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            senior_users: Vec::new(),
            senior_threshold: default_senior_threshold(),
            junior_threshold: default_junior_threshold(),
            word_identity: WordIdentity::default(),
            renumber_senses: false,
            pointers: default_pointers(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a config from TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// The language profile named by `lang`.
    pub fn profile(&self) -> ConfigResult<LangProfile> {
        LangProfile::for_lang(&self.lang)
    }

    /// Resolve the pointer table into predicate nodes.
    pub fn pointer_predicates(&self) -> ConfigResult<BTreeMap<String, NamedNode>> {
        self.pointers
            .iter()
            .map(|(name, iri)| {
                NamedNode::new(iri.as_str())
                    .map(|node| (name.clone(), node))
                    .map_err(|_| ConfigError::InvalidPredicate {
                        name: name.clone(),
                        iri: iri.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_vote_policy() {
        let config = Config::default();
        assert_eq!(config.senior_threshold, 1);
        assert_eq!(config.junior_threshold, 2);
        assert_eq!(config.word_identity, WordIdentity::Flat);
        assert!(config.pointers.contains_key("wn30_pt_antonymOf"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            lang = "en"
            senior_users = ["alice"]
            word_identity = "part-of-speech"
            "#,
        )
        .unwrap();
        assert_eq!(config.lang, "en");
        assert_eq!(config.senior_users, vec!["alice".to_string()]);
        assert_eq!(config.word_identity, WordIdentity::PartOfSpeech);
        assert_eq!(config.junior_threshold, 2);
        assert_eq!(config.profile().unwrap(), LangProfile::english());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = Config::default();
        config.renumber_senses = true;
        let parsed = Config::from_toml(&config.to_toml()).unwrap();
        assert!(parsed.renumber_senses);
        assert_eq!(parsed.pointers, config.pointers);
    }

    #[test]
    fn unknown_language_rejected() {
        let config = Config {
            lang: "fr".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.profile(),
            Err(ConfigError::UnknownLanguage { .. })
        ));
    }

    #[test]
    fn invalid_pointer_iri_rejected() {
        let mut config = Config::default();
        config.pointers.insert("broken".into(), "not an iri".into());
        assert!(matches!(
            config.pointer_predicates(),
            Err(ConfigError::InvalidPredicate { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ownpt.toml");
        std::fs::write(&path, "junior_threshold = 5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.junior_threshold, 5);

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
