//! Player <-> news linking.
//!
//! Articles mention players by name, so linking is a fuzzy-match against a
//! normalized corpus: every player name is folded into a canonical ASCII
//! form and indexed in a hash multi-map, then each unlinked article's text
//! is folded the same way and scanned with a sliding token window.
//!
//! Ambiguity policy: a normalized name shared by several players (two
//! Silvas) links the article to all of them. The linker has no context to
//! pick one, and dropping links is worse for the scouting workflow than
//! an extra association.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::db::Database;
use crate::TARGET_LINKER;

/// Strip diacritics by NFKD-decomposing and dropping non-ASCII marks.
/// "Rüdiger" and "Rudiger" fold to the same string.
pub fn fold_ascii(text: &str) -> String {
    text.nfkd().filter(|c| c.is_ascii()).collect()
}

/// Canonical matching form: diacritics stripped, case folded, punctuation
/// replaced with spaces, whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    fold_ascii(name)
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hash index from normalized player name to every player carrying it.
pub struct NameIndex {
    names: HashMap<String, Vec<i64>>,
    /// Longest indexed name, in tokens; bounds the scan window.
    max_tokens: usize,
}

impl NameIndex {
    pub fn build(players: &[(i64, String)]) -> Self {
        let mut names: HashMap<String, Vec<i64>> = HashMap::new();
        let mut max_tokens = 1;

        for (id, name) in players {
            let normalized = normalize_name(name);
            if normalized.is_empty() {
                continue;
            }
            max_tokens = max_tokens.max(normalized.split_whitespace().count());
            names.entry(normalized).or_default().push(*id);
        }

        debug!(
            target: TARGET_LINKER,
            "Built name index: {} distinct names, window up to {} tokens",
            names.len(),
            max_tokens
        );

        Self { names, max_tokens }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every player whose name occurs in `text` on a token boundary.
    pub fn scan(&self, text: &str) -> HashSet<i64> {
        let mut hits = HashSet::new();
        if self.names.is_empty() {
            return hits;
        }

        let normalized = normalize_name(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        for start in 0..tokens.len() {
            let end_max = (start + self.max_tokens).min(tokens.len());
            for end in (start + 1)..=end_max {
                let candidate = tokens[start..end].join(" ");
                if let Some(ids) = self.names.get(&candidate) {
                    hits.extend(ids.iter().copied());
                }
            }
        }
        hits
    }
}

/// Link every not-yet-linked article to the players it mentions.
///
/// Incremental: articles that already have at least one bridge row are
/// skipped, so repeated runs only pay for new ingestion.
pub async fn link_unlinked(db: &Database) -> anyhow::Result<usize> {
    let players = db.all_player_names().await?;
    if players.is_empty() {
        info!(target: TARGET_LINKER, "No players to link, skipping");
        return Ok(0);
    }
    let index = NameIndex::build(&players);

    let articles = db.unlinked_articles().await?;
    if articles.is_empty() {
        info!(target: TARGET_LINKER, "No new articles to link");
        return Ok(0);
    }

    let mut inserted = 0usize;
    for (news_id, text) in &articles {
        for player_id in index.scan(text) {
            if db.link_player_news(player_id, *news_id).await? {
                inserted += 1;
            }
        }
    }

    info!(
        target: TARGET_LINKER,
        "Linked {} player/article pairs across {} articles",
        inserted,
        articles.len()
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_diacritic_insensitive() {
        assert_eq!(normalize_name("Rüdiger"), normalize_name("Rudiger"));
        assert_eq!(normalize_name("Ñíguez"), "niguez");
        assert_eq!(normalize_name("  Saúl   Ñíguez "), "saul niguez");
        assert_eq!(normalize_name("O'Brien"), "o brien");
    }

    #[test]
    fn scan_matches_on_token_boundaries() {
        let index = NameIndex::build(&[(1, "Antonio Rüdiger".to_string())]);

        let hits = index.scan("Antonio Rudiger scored last night.");
        assert_eq!(hits, HashSet::from([1]));

        // Substring inside another word must not match.
        let hits = index.scan("The Rudigers of this world.");
        assert!(hits.is_empty());
    }

    #[test]
    fn shared_surname_links_every_carrier() {
        let index = NameIndex::build(&[
            (1, "Silva".to_string()),
            (2, "Silva".to_string()),
            (3, "Bruno Fernandes".to_string()),
        ]);

        let hits = index.scan("Great performance by Silva in the derby.");
        assert_eq!(hits, HashSet::from([1, 2]));
    }

    #[test]
    fn multi_token_names_match_whole() {
        let index = NameIndex::build(&[
            (7, "Bruno Fernandes".to_string()),
            (8, "Bruno Guimarães".to_string()),
        ]);

        let hits = index.scan("bruno fernandes and bruno guimaraes started");
        assert_eq!(hits, HashSet::from([7, 8]));

        // A lone "bruno" is not an indexed name.
        assert!(index.scan("bruno warmed the bench").is_empty());
    }

    #[test]
    fn empty_index_matches_nothing() {
        let index = NameIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.scan("anything at all").is_empty());
    }
}
