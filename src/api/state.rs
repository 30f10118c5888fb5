use std::sync::Arc;

use tracing::info;

use crate::calculate::{
    suggest_adds_cuts, AnalyzeOptions, ArchetypeRules, CompareOptions, MatchupTable, MetaAnalyzer,
    MetaComparator, RulesError,
};
use crate::config::AppConfig;
use crate::models::{CardEntry, ComparisonReport, MetaReport, SuggestionReport};
use crate::storage::{CorpusCache, CorpusLoad, CorpusSource};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub source: Arc<CorpusSource>,
    pub cache: Arc<CorpusCache>,
    pub rules: Arc<ArchetypeRules>,
    pub matchups: Arc<MatchupTable>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        source: CorpusSource,
        rules: ArchetypeRules,
        matchups: MatchupTable,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source: Arc::new(source),
            cache: Arc::new(CorpusCache::new()),
            rules: Arc::new(rules),
            matchups: Arc::new(matchups),
        }
    }

    /// Resolve the corpus location and heuristic tables from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, RulesError> {
        let source = CorpusSource::discover(config.meta.corpus_path.as_deref(), &config.storage());

        let rules = match &config.meta.archetype_rules_path {
            Some(path) => {
                info!("Using archetype rules from {:?}", path);
                ArchetypeRules::from_file(path)?
            }
            None => ArchetypeRules::builtin(),
        };
        let matchups = match &config.meta.matchups_path {
            Some(path) => {
                info!("Using matchup table from {:?}", path);
                MatchupTable::from_file(path)?
            }
            None => MatchupTable::builtin(),
        };

        Ok(Self::new(config, source, rules, matchups))
    }

    /// Current corpus, re-read only when the file changed.
    pub fn load_corpus(&self) -> CorpusLoad {
        self.cache.load(&self.source)
    }

    /// Compare a decklist against the current corpus.
    pub fn compare(&self, cards: &[CardEntry], options: &CompareOptions) -> ComparisonReport {
        let load = self.load_corpus();
        MetaComparator::new(&load.corpus, &self.rules)
            .enabled(self.config.meta.compare_enabled)
            .with_note(load.note)
            .compare(cards, options)
    }

    /// Compare, then derive adds and cuts from the similar decks.
    pub fn suggest(
        &self,
        cards: &[CardEntry],
        options: &CompareOptions,
    ) -> (ComparisonReport, SuggestionReport) {
        let comparison = self.compare(cards, options);
        let suggestions = suggest_adds_cuts(cards, &comparison.similar_decks, &self.config.suggest);
        (comparison, suggestions)
    }

    /// Meta report over the current corpus, with the loader's note when the
    /// corpus is empty.
    pub fn analyze(&self, options: &AnalyzeOptions) -> (MetaReport, Option<String>) {
        let load = self.load_corpus();
        let report = MetaAnalyzer::new(&self.rules).analyze(&load.corpus.decks, options);
        (report, load.note)
    }
}
