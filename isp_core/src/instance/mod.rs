//! The instance data model: interpreters, languages, sessions and blocks
//!
//! An [`Instance`] is immutable once constructed and is the only input the
//! model builder reads. All cross references are resolved to dense indices at
//! construction time, so a validated instance can never produce a dangling
//! lookup during model generation; every malformed relation is reported here,
//! before any decision variable exists.
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Index of an interpreter within an [`Instance`]
pub type InterpreterIdx = usize;
/// Index of a language within an [`Instance`]
pub type LanguageIdx = usize;
/// Index of a session within an [`Instance`]
pub type SessionIdx = usize;
/// Index of a block within an [`Instance`]
pub type BlockIdx = usize;

/// A fully validated, read-only ISP instance
#[derive(Debug, Clone)]
pub struct Instance {
    /// Interpreter identifiers, in input order
    interpreters: Vec<String>,
    /// Language identifiers, in input order
    languages: Vec<String>,
    /// Session identifiers, in input order
    sessions: Vec<String>,
    /// Block identifiers, in input order; this order defines block adjacency
    /// for the consecutive-workload rule
    blocks: Vec<String>,
    /// Per interpreter, the set of known languages
    known_languages: Vec<IndexSet<LanguageIdx>>,
    /// Per session, the required languages in input order, deduplicated
    required_languages: Vec<Vec<LanguageIdx>>,
    /// Per block, the sessions scheduled in it
    block_sessions: Vec<Vec<SessionIdx>>,
    /// Per session, the block owning it
    session_block: Vec<BlockIdx>,
}

impl Instance {
    /// Build an instance from raw identifier lists and relations
    ///
    /// # Parameters
    /// - `interpreters`, `languages`, `sessions`, `blocks`: element identifiers
    /// - `interpreter_languages`: interpreter id → known language ids
    /// - `session_languages`: session id → required language ids
    /// - `block_sessions`: block id → session ids scheduled in that block
    ///
    /// # Errors
    /// Any reference to an unknown identifier, a session missing from every
    /// block, or a session present in more than one block is a [`LoadError`].
    pub fn new(
        interpreters: Vec<String>,
        languages: Vec<String>,
        sessions: Vec<String>,
        blocks: Vec<String>,
        interpreter_languages: &IndexMap<String, Vec<String>>,
        session_languages: &IndexMap<String, Vec<String>>,
        block_sessions: &IndexMap<String, Vec<String>>,
    ) -> Result<Self, LoadError> {
        let language_idx = index_of(&languages);
        let session_idx = index_of(&sessions);

        let mut known = Vec::with_capacity(interpreters.len());
        for interpreter in &interpreters {
            let langs = interpreter_languages
                .get(interpreter)
                .ok_or_else(|| LoadError::MissingRelation {
                    relation: "interpreter languages",
                    element: interpreter.clone(),
                })?;
            let mut set = IndexSet::new();
            for lang in langs {
                set.insert(lookup(&language_idx, lang, "language")?);
            }
            known.push(set);
        }

        let mut required = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let langs = session_languages
                .get(session)
                .ok_or_else(|| LoadError::MissingRelation {
                    relation: "session languages",
                    element: session.clone(),
                })?;
            let mut seen = IndexSet::new();
            for lang in langs {
                seen.insert(lookup(&language_idx, lang, "language")?);
            }
            required.push(seen.into_iter().collect::<Vec<_>>());
        }

        let mut per_block = vec![Vec::new(); blocks.len()];
        let mut owner: Vec<Option<BlockIdx>> = vec![None; sessions.len()];
        for (b, block) in blocks.iter().enumerate() {
            let members = block_sessions
                .get(block)
                .ok_or_else(|| LoadError::MissingRelation {
                    relation: "block sessions",
                    element: block.clone(),
                })?;
            for session in members {
                let s = lookup(&session_idx, session, "session")?;
                if let Some(previous) = owner[s] {
                    return Err(LoadError::SessionInMultipleBlocks {
                        session: session.clone(),
                        first: blocks[previous].clone(),
                        second: block.clone(),
                    });
                }
                owner[s] = Some(b);
                per_block[b].push(s);
            }
        }
        let session_block = owner
            .into_iter()
            .enumerate()
            .map(|(s, block)| {
                block.ok_or_else(|| LoadError::SessionWithoutBlock {
                    session: sessions[s].clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Instance {
            interpreters,
            languages,
            sessions,
            blocks,
            known_languages: known,
            required_languages: required,
            block_sessions: per_block,
            session_block,
        })
    }

    // region Accessors
    /// Interpreter identifiers
    pub fn interpreters(&self) -> &[String] {
        &self.interpreters
    }

    /// Language identifiers
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Session identifiers
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    /// Block identifiers, in schedule order
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Number of interpreters
    pub fn num_interpreters(&self) -> usize {
        self.interpreters.len()
    }

    /// Number of sessions
    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Languages known by an interpreter
    pub fn known_languages(&self, i: InterpreterIdx) -> &IndexSet<LanguageIdx> {
        &self.known_languages[i]
    }

    /// Whether an interpreter knows a language
    pub fn knows(&self, i: InterpreterIdx, l: LanguageIdx) -> bool {
        self.known_languages[i].contains(&l)
    }

    /// Languages required by a session, deduplicated, in input order
    pub fn required_languages(&self, s: SessionIdx) -> &[LanguageIdx] {
        &self.required_languages[s]
    }

    /// Sessions scheduled in a block
    pub fn block_sessions(&self, b: BlockIdx) -> &[SessionIdx] {
        &self.block_sessions[b]
    }

    /// The block a session belongs to
    pub fn session_block(&self, s: SessionIdx) -> BlockIdx {
        self.session_block[s]
    }

    /// Name of an interpreter
    pub fn interpreter_name(&self, i: InterpreterIdx) -> &str {
        &self.interpreters[i]
    }

    /// Name of a language
    pub fn language_name(&self, l: LanguageIdx) -> &str {
        &self.languages[l]
    }

    /// Name of a session
    pub fn session_name(&self, s: SessionIdx) -> &str {
        &self.sessions[s]
    }

    /// Name of a block
    pub fn block_name(&self, b: BlockIdx) -> &str {
        &self.blocks[b]
    }
    // endregion Accessors
}

fn index_of(names: &[String]) -> IndexMap<&str, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i))
        .collect()
}

fn lookup(
    index: &IndexMap<&str, usize>,
    name: &str,
    kind: &'static str,
) -> Result<usize, LoadError> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| LoadError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

/// Fatal instance loading errors
///
/// Loading either yields a fully consistent [`Instance`] or one of these;
/// nothing downstream of loading ever sees a partially valid instance.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The instance file could not be read
    #[error("could not read instance file: {0}")]
    Io(#[from] std::io::Error),
    /// The instance file is not valid JSON or misses a required key
    #[error("could not parse instance file: {0}")]
    Parse(#[from] serde_json::Error),
    /// A relation map has no entry for a declared element
    #[error("no {relation} entry for {element}")]
    MissingRelation {
        /// Which relation map is incomplete
        relation: &'static str,
        /// The element without an entry
        element: String,
    },
    /// A relation references an identifier that was never declared
    #[error("reference to unknown {kind} {name}")]
    UnknownReference {
        /// Kind of the referenced element
        kind: &'static str,
        /// The undeclared identifier
        name: String,
    },
    /// A session is listed in more than one block
    #[error("session {session} appears in blocks {first} and {second}")]
    SessionInMultipleBlocks {
        /// The doubly scheduled session
        session: String,
        /// First block listing the session
        first: String,
        /// Second block listing the session
        second: String,
    },
    /// A session is listed in no block at all
    #[error("session {session} does not appear in any block")]
    SessionWithoutBlock {
        /// The unscheduled session
        session: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(entries: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn small_instance() -> Result<Instance, LoadError> {
        Instance::new(
            names(&["i1", "i2"]),
            names(&["en", "fr", "de"]),
            names(&["s1", "s2"]),
            names(&["b1", "b2"]),
            &relation(&[("i1", &["en", "fr"]), ("i2", &["de"])]),
            &relation(&[("s1", &["en", "fr"]), ("s2", &["en", "de"])]),
            &relation(&[("b1", &["s1"]), ("b2", &["s2"])]),
        )
    }

    #[test]
    fn build_valid_instance() {
        let instance = small_instance().unwrap();
        assert_eq!(instance.num_interpreters(), 2);
        assert_eq!(instance.num_sessions(), 2);
        assert!(instance.knows(0, 0));
        assert!(!instance.knows(1, 0));
        assert_eq!(instance.required_languages(1), &[0, 2]);
        assert_eq!(instance.session_block(0), 0);
        assert_eq!(instance.block_sessions(1), &[1]);
    }

    #[test]
    fn duplicate_required_language_is_collapsed() {
        let instance = Instance::new(
            names(&["i1"]),
            names(&["en", "fr"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("i1", &["en"])]),
            &relation(&[("s1", &["en", "fr", "en"])]),
            &relation(&[("b1", &["s1"])]),
        )
        .unwrap();
        assert_eq!(instance.required_languages(0), &[0, 1]);
    }

    #[test]
    fn unknown_language_is_fatal() {
        let result = Instance::new(
            names(&["i1"]),
            names(&["en"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("i1", &["xx"])]),
            &relation(&[("s1", &["en"])]),
            &relation(&[("b1", &["s1"])]),
        );
        match result {
            Err(LoadError::UnknownReference { kind, name }) => {
                assert_eq!(kind, "language");
                assert_eq!(name, "xx");
            }
            _ => panic!("unknown language not caught"),
        }
    }

    #[test]
    fn session_in_two_blocks_is_fatal() {
        let result = Instance::new(
            names(&["i1"]),
            names(&["en"]),
            names(&["s1"]),
            names(&["b1", "b2"]),
            &relation(&[("i1", &["en"])]),
            &relation(&[("s1", &["en"])]),
            &relation(&[("b1", &["s1"]), ("b2", &["s1"])]),
        );
        assert!(matches!(
            result,
            Err(LoadError::SessionInMultipleBlocks { .. })
        ));
    }

    #[test]
    fn session_without_block_is_fatal() {
        let result = Instance::new(
            names(&["i1"]),
            names(&["en"]),
            names(&["s1", "s2"]),
            names(&["b1"]),
            &relation(&[("i1", &["en"])]),
            &relation(&[("s1", &["en"]), ("s2", &["en"])]),
            &relation(&[("b1", &["s1"])]),
        );
        assert!(matches!(result, Err(LoadError::SessionWithoutBlock { .. })));
    }

    #[test]
    fn missing_relation_entry_is_fatal() {
        let result = Instance::new(
            names(&["i1", "i2"]),
            names(&["en"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("i1", &["en"])]),
            &relation(&[("s1", &["en"])]),
            &relation(&[("b1", &["s1"])]),
        );
        assert!(matches!(result, Err(LoadError::MissingRelation { .. })));
    }
}
