//! Node factory: lookup and creation of synsets, words and senses.
//!
//! The factory is the only place that mints node identifiers. Word IRIs are
//! derived from the lexical form (escaped into XML name characters); sense
//! IRIs are `{sense_ns}{synset key}-{n}` with `n` the lowest ordinal the
//! synset does not already use.

use std::sync::LazyLock;

use oxigraph::model::{Literal, NamedNode, NamedOrBlankNode, NamedOrBlankNodeRef, Term};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::{LangProfile, WordIdentity};
use crate::error::GraphResult;
use crate::graph::{Query, WordnetGraph, term_literal, var};
use crate::vocab;

static RE_SYNSET_POS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-([nvasr])$").unwrap());
static RE_ORDINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-(\d+)$").unwrap());

/// Normalize a lexical string: Unicode NFC, whitespace runs collapsed, trimmed.
pub fn format_lexical(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape a string into XML name characters for use in a node identifier.
///
/// Name characters pass through; others become `-{entity}-` when an HTML
/// entity name exists and `-{utf8 hex}-` otherwise.
pub fn escape_identifier(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if is_name_char(c) {
            escaped.push(c);
        } else if let Some(name) = entity_name(c) {
            escaped.push('-');
            escaped.push_str(name);
            escaped.push('-');
        } else {
            let mut buf = [0u8; 4];
            escaped.push('-');
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("{byte:02x}"));
            }
            escaped.push('-');
        }
    }
    escaped
}

/// XML 1.0 (fifth edition) `NameChar`.
fn is_name_char(c: char) -> bool {
    matches!(c,
        ':' | '_' | '-' | '.' | 'A'..='Z' | 'a'..='z' | '0'..='9'
        | '\u{B7}'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{203F}'..='\u{2040}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// HTML entity names for the characters that show up in lexical forms.
fn entity_name(c: char) -> Option<&'static str> {
    Some(match c {
        '!' => "excl",
        '"' => "quot",
        '#' => "num",
        '$' => "dollar",
        '%' => "percnt",
        '&' => "amp",
        '\'' => "apos",
        '(' => "lpar",
        ')' => "rpar",
        '*' => "ast",
        '+' => "plus",
        ',' => "comma",
        '/' => "sol",
        ';' => "semi",
        '<' => "lt",
        '=' => "equals",
        '>' => "gt",
        '?' => "quest",
        '@' => "commat",
        '[' => "lsqb",
        '\\' => "bsol",
        ']' => "rsqb",
        '^' => "Hat",
        '`' => "grave",
        '{' => "lcub",
        '|' => "verbar",
        '}' => "rcub",
        '\u{A0}' => "nbsp",
        '¡' => "iexcl",
        '¢' => "cent",
        '£' => "pound",
        '¤' => "curren",
        '¥' => "yen",
        '¦' => "brvbar",
        '§' => "sect",
        '¨' => "uml",
        '©' => "copy",
        'ª' => "ordf",
        '«' => "laquo",
        '¬' => "not",
        '\u{AD}' => "shy",
        '®' => "reg",
        '¯' => "macr",
        '°' => "deg",
        '±' => "plusmn",
        '²' => "sup2",
        '³' => "sup3",
        '´' => "acute",
        'µ' => "micro",
        '¶' => "para",
        '¸' => "cedil",
        '¹' => "sup1",
        'º' => "ordm",
        '»' => "raquo",
        '¼' => "frac14",
        '½' => "frac12",
        '¾' => "frac34",
        '¿' => "iquest",
        '×' => "times",
        '÷' => "divide",
        '–' => "ndash",
        '—' => "mdash",
        '‘' => "lsquo",
        '’' => "rsquo",
        '‚' => "sbquo",
        '“' => "ldquo",
        '”' => "rdquo",
        '„' => "bdquo",
        '†' => "dagger",
        '‡' => "Dagger",
        '•' => "bull",
        '…' => "hellip",
        '‰' => "permil",
        '′' => "prime",
        '″' => "Prime",
        '‹' => "lsaquo",
        '›' => "rsaquo",
        _ => return None,
    })
}

/// Trailing `-{n}` ordinal of a sense identifier.
pub fn sense_ordinal(sense: NamedOrBlankNodeRef<'_>) -> Option<u32> {
    match sense {
        NamedOrBlankNodeRef::NamedNode(node) => RE_ORDINAL
            .captures(node.as_str())
            .and_then(|caps| caps[1].parse().ok()),
        NamedOrBlankNodeRef::BlankNode(_) => None,
    }
}

/// Creates and resolves wordnet nodes in one graph under one language profile.
#[derive(Debug, Clone, Copy)]
pub struct NodeFactory<'g> {
    graph: &'g WordnetGraph,
    profile: &'g LangProfile,
    identity: WordIdentity,
}

impl<'g> NodeFactory<'g> {
    pub fn new(graph: &'g WordnetGraph, profile: &'g LangProfile, identity: WordIdentity) -> Self {
        Self {
            graph,
            profile,
            identity,
        }
    }

    pub fn graph(&self) -> &'g WordnetGraph {
        self.graph
    }

    pub fn profile(&self) -> &'g LangProfile {
        self.profile
    }

    pub fn identity(&self) -> WordIdentity {
        self.identity
    }

    /// A normalized lexical literal tagged with the graph's language.
    pub fn lexical_literal(&self, text: &str) -> Literal {
        Literal::new_language_tagged_literal_unchecked(format_lexical(text), self.profile.lang.as_str())
    }

    /// Whether `literal` is already in the canonical lexical shape.
    pub fn is_canonical_lexical(&self, literal: &Literal) -> bool {
        literal.language() == Some(self.profile.lang.as_str())
            && literal.value() == format_lexical(literal.value())
    }

    // -----------------------------------------------------------------------
    // Synsets
    // -----------------------------------------------------------------------

    /// Resolve a synset by its dump identifier (e.g. `00001740-n`).
    ///
    /// Adjective identifiers fall back to the satellite form (`-a` → `-s`).
    pub fn synset_by_id(&self, synset_id: &str) -> GraphResult<Option<NamedOrBlankNode>> {
        if let Some(synset) = self.lookup_synset(synset_id)? {
            return Ok(Some(synset));
        }
        if let Some(stem) = synset_id.strip_suffix("-a") {
            return self.lookup_synset(&format!("{stem}-s"));
        }
        Ok(None)
    }

    fn lookup_synset(&self, synset_id: &str) -> GraphResult<Option<NamedOrBlankNode>> {
        if let Ok(node) = NamedNode::new(format!("{}{synset_id}", self.profile.synset_ns)) {
            if self.graph.has_node(node.as_ref().into())? {
                return Ok(Some(NamedOrBlankNode::NamedNode(node)));
            }
        }
        let id = Literal::new_simple_literal(synset_id);
        let mut candidates = self.graph.subjects(vocab::SYNSET_ID, &id)?;
        candidates.sort_by_key(|node| node.to_string());
        Ok(candidates.into_iter().next())
    }

    /// Dump identifier of a synset node, when it lives in the synset namespace.
    pub fn synset_id(&self, synset: NamedOrBlankNodeRef<'_>) -> Option<String> {
        match synset {
            NamedOrBlankNodeRef::NamedNode(node) => node
                .as_str()
                .strip_prefix(self.profile.synset_ns.as_str())
                .map(str::to_string),
            NamedOrBlankNodeRef::BlankNode(_) => None,
        }
    }

    /// Key used to mint sense identifiers for a synset.
    fn synset_key(synset: NamedOrBlankNodeRef<'_>) -> String {
        match synset {
            NamedOrBlankNodeRef::NamedNode(node) => {
                let local = node.as_str().rsplit('/').next().unwrap_or_default();
                match local.find('-') {
                    Some(i) => local[i + 1..].to_string(),
                    None => local.to_string(),
                }
            }
            NamedOrBlankNodeRef::BlankNode(node) => node.as_str().to_string(),
        }
    }

    /// Part of speech of a synset, from its identifier suffix (`s` reads as `a`).
    pub fn synset_pos(&self, synset: NamedOrBlankNodeRef<'_>) -> Option<String> {
        let key = Self::synset_key(synset);
        RE_SYNSET_POS.captures(&key).map(|caps| match &caps[1] {
            "s" => "a".to_string(),
            pos => pos.to_string(),
        })
    }

    /// Part of speech of the synset containing `sense`.
    pub fn sense_pos(&self, sense: NamedOrBlankNodeRef<'_>) -> GraphResult<Option<String>> {
        let synsets = self.graph.subjects(vocab::CONTAINS_WORD_SENSE, sense)?;
        Ok(synsets
            .iter()
            .find_map(|synset| self.synset_pos(synset.as_ref())))
    }

    // -----------------------------------------------------------------------
    // Words
    // -----------------------------------------------------------------------

    /// Canonical identifier of the word for a lexical form.
    pub fn word_iri(&self, lexical: &str, pos: Option<&str>) -> NamedNode {
        let mut local = format_lexical(lexical).replace(' ', "_");
        if let (WordIdentity::PartOfSpeech, Some(pos)) = (self.identity, pos) {
            local.push('-');
            local.push_str(pos);
        }
        NamedNode::new_unchecked(format!("{}{}", self.profile.word_ns, escape_identifier(&local)))
    }

    /// Find the word for a lexical form, creating it when `create` is set.
    ///
    /// Under part-of-speech identity only words carrying the same `pos` match.
    pub fn word_for(
        &self,
        lexical: &str,
        create: bool,
        pos: Option<&str>,
    ) -> GraphResult<Option<NamedOrBlankNode>> {
        let literal = self.lexical_literal(lexical);
        let mut candidates = Vec::new();
        let mut untagged = Vec::new();
        for word in self.graph.subjects(vocab::LEXICAL_FORM, &literal)? {
            if self.identity == WordIdentity::PartOfSpeech {
                match self.graph.literal_value(&word, vocab::POS)? {
                    Some(word_pos) if Some(word_pos.value()) == pos => {}
                    Some(_) => continue,
                    None => {
                        untagged.push(word);
                        continue;
                    }
                }
            }
            candidates.push(word);
        }
        candidates.sort_by_key(|node| node.to_string());
        untagged.sort_by_key(|node| node.to_string());
        // Legacy words without a part of speech stand in for any.
        if let Some(word) = candidates.into_iter().chain(untagged).next() {
            return Ok(Some(word));
        }
        if !create {
            return Ok(None);
        }

        let word = self.word_iri(lexical, pos);
        self.graph.add(&word, vocab::HAS_TYPE, vocab::TYPE_WORD, "new_word")?;
        self.graph.add(&word, vocab::LEXICAL_FORM, &literal, "new_word")?;
        if let (WordIdentity::PartOfSpeech, Some(pos)) = (self.identity, pos) {
            self.graph
                .add(&word, vocab::POS, &Literal::new_simple_literal(pos), "new_word")?;
        }
        Ok(Some(NamedOrBlankNode::NamedNode(word)))
    }

    // -----------------------------------------------------------------------
    // Senses
    // -----------------------------------------------------------------------

    /// Mint a sense identifier for `synset` using its lowest free ordinal.
    ///
    /// With `materialize` the sense is typed, linked from the synset and given
    /// its `wordNumber`; otherwise only the identifier is returned.
    pub fn new_sense(&self, synset: NamedOrBlankNodeRef<'_>, materialize: bool) -> GraphResult<NamedNode> {
        let mut ordinal = 1u32;
        let sense = loop {
            let candidate = self.sense_iri(synset, ordinal);
            let taken = self
                .graph
                .contains(synset, vocab::CONTAINS_WORD_SENSE, &candidate)?
                || self.graph.has_node(candidate.as_ref().into())?;
            if !taken {
                break candidate;
            }
            ordinal += 1;
        };

        if materialize {
            self.graph
                .add(&sense, vocab::HAS_TYPE, vocab::TYPE_WORD_SENSE, "new_sense")?;
            self.graph
                .add(synset, vocab::CONTAINS_WORD_SENSE, &sense, "new_sense")?;
            self.graph.add(
                &sense,
                vocab::WORD_NUMBER,
                &Literal::new_simple_literal(ordinal.to_string()),
                "new_sense",
            )?;
        }
        Ok(sense)
    }

    /// Identifier of the `ordinal`-th sense of `synset`.
    pub fn sense_iri(&self, synset: NamedOrBlankNodeRef<'_>, ordinal: u32) -> NamedNode {
        NamedNode::new_unchecked(format!(
            "{}{}-{ordinal}",
            self.profile.sense_ns,
            Self::synset_key(synset)
        ))
    }

    /// The sense of `synset` whose word has the lexical form `lexical`,
    /// compared after normalization.
    pub fn get_sense(
        &self,
        synset: NamedOrBlankNodeRef<'_>,
        lexical: &str,
    ) -> GraphResult<Option<NamedOrBlankNode>> {
        let wanted = format_lexical(lexical);
        if wanted.is_empty() {
            return Ok(None);
        }
        let solutions = Query::new()
            .pattern(&synset.into_owned(), vocab::CONTAINS_WORD_SENSE, var("sense"))
            .pattern(var("sense"), vocab::WORD, var("word"))
            .pattern(var("word"), vocab::LEXICAL_FORM, var("lexical"))
            .filter(move |b| b.literal("lexical").is_some_and(|l| format_lexical(l.value()) == wanted))
            .select_nodes(self.graph, "sense")?;
        Ok(solutions.into_iter().min_by_key(|sense| sense.to_string()))
    }

    /// The gloss literal of `synset` matching `text`.
    pub fn get_gloss(&self, synset: NamedOrBlankNodeRef<'_>, text: &str) -> GraphResult<Option<Term>> {
        self.find_lexical(synset, vocab::GLOSS, text)
    }

    /// The example literal of `synset` matching `text`.
    pub fn get_example(&self, synset: NamedOrBlankNodeRef<'_>, text: &str) -> GraphResult<Option<Term>> {
        self.find_lexical(synset, vocab::EXAMPLE, text)
    }

    fn find_lexical(
        &self,
        synset: NamedOrBlankNodeRef<'_>,
        predicate: oxigraph::model::NamedNodeRef<'_>,
        text: &str,
    ) -> GraphResult<Option<Term>> {
        let wanted = format_lexical(text);
        Ok(self
            .graph
            .objects(synset, predicate)?
            .into_iter()
            .find(|term| term_literal(term).is_some_and(|l| format_lexical(l.value()) == wanted)))
    }
}
