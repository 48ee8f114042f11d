/*!
 * Top-level task orchestration.
 *
 * The orchestrator wires parser, classifier, coordinator, record builder and
 * progress tracking into one background run. Submission is fire-and-forget:
 * input validation happens up front and rejects bad requests before a task
 * exists, then the caller gets a task id while the run proceeds on a
 * semaphore-gated worker pool. Runtime failures are caught at the run
 * boundary and recorded on the owning task only.
 */

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::app_config::Config;
use crate::adapters::{DictionaryStore, Lemmatizer, Transcriber, Translator, UserProgressStore};
use crate::errors::{AppError, DependencyError, InputError, NotFoundError};
use crate::file_utils::FileManager;
use crate::filtering::{FilterSettings, FilteringCoordinator, FilteringResult};
use crate::language_utils;
use crate::progress::{
    HEARTBEAT_INTERVAL_SECS, ProgressHandle, ProgressTracker, TaskProgress,
};
use crate::subtitle_processor::{TimedSegment, TimedTextParser};
use crate::vocabulary::{
    VocabularyItem, VocabularyLookupCache, VocabularyRecord, VocabularyRecordBuilder,
    WordClassifier, WordValidator,
};

/// The structured document persisted for every completed run
#[derive(Debug, Serialize)]
pub struct ResultArtifact<'a> {
    /// Total number of input segments
    pub total_subtitles: usize,
    /// De-duplicated vocabulary items
    pub items: &'a [VocabularyItem],
    /// Run statistics and context
    pub statistics: &'a crate::filtering::FilteringStatistics,
}

/// A request to filter subtitle text for one learner
#[derive(Debug, Clone)]
pub struct FilteringRequest {
    /// Raw time-coded text
    pub text: String,

    /// Stem used for artifact filenames
    pub source_name: String,

    /// Language override; falls back to the configured language
    pub language: Option<String>,

    /// Level override; falls back to the configured target level
    pub target_level: Option<crate::vocabulary::CefrLevel>,

    /// User override; falls back to the configured user
    pub user_id: Option<String>,
}

impl FilteringRequest {
    /// A request with no overrides
    pub fn new(text: &str, source_name: &str) -> Self {
        Self {
            text: text.to_string(),
            source_name: source_name.to_string(),
            language: None,
            target_level: None,
            user_id: None,
        }
    }
}

/// Orchestrates background filtering runs
pub struct TaskOrchestrator {
    config: Config,
    cache: VocabularyLookupCache,
    coordinator: Arc<FilteringCoordinator>,
    progress_store: Arc<dyn UserProgressStore>,
    translator: Option<Arc<dyn Translator>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    tracker: ProgressTracker,
    worker_permits: Arc<Semaphore>,
}

impl TaskOrchestrator {
    /// Wire an orchestrator from its adapters.
    ///
    /// Cache, classifier and coordinator are constructed here as owned
    /// values; nothing in the pipeline lives in global state.
    pub fn new(
        config: Config,
        lemmatizer: Arc<dyn Lemmatizer>,
        dictionary: Arc<dyn DictionaryStore>,
        progress_store: Arc<dyn UserProgressStore>,
        translator: Option<Arc<dyn Translator>>,
        transcriber: Option<Arc<dyn Transcriber>>,
        tracker: ProgressTracker,
    ) -> Self {
        let cache = VocabularyLookupCache::with_ttl(
            dictionary,
            std::time::Duration::from_secs(config.cache.word_ttl_secs),
            std::time::Duration::from_secs(config.cache.level_ttl_secs),
        );
        let classifier = WordClassifier::with_policy(
            lemmatizer,
            cache.clone(),
            config.filtering.level_policy.into(),
        );
        let validator = WordValidator::with_limits(config.validator_limits());
        let coordinator = Arc::new(FilteringCoordinator::new(validator, classifier));
        let worker_permits = Arc::new(Semaphore::new(config.tasks.max_concurrent_jobs));

        Self {
            config,
            cache,
            coordinator,
            progress_store,
            translator,
            transcriber,
            tracker,
            worker_permits,
        }
    }

    /// The shared vocabulary cache (stats, invalidation)
    pub fn cache(&self) -> &VocabularyLookupCache {
        &self.cache
    }

    /// The progress tracker (poll registry + push channel)
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Poll the state of a task
    pub fn poll(&self, task_id: &str) -> Result<TaskProgress, AppError> {
        self.tracker
            .get(task_id)
            .ok_or_else(|| NotFoundError::Task(task_id.to_string()).into())
    }

    /// Spawn the heartbeat loop for the push channel.
    ///
    /// Sends a heartbeat every interval and prunes connections that stayed
    /// silent past the timeout.
    pub fn start_heartbeat(&self) -> tokio::task::JoinHandle<()> {
        let broadcaster = self.tracker.broadcaster().clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                HEARTBEAT_INTERVAL_SECS,
            ));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                broadcaster.broadcast_heartbeat();
                broadcaster.prune_dead();
            }
        })
    }

    /// Submit a filtering run over raw time-coded text.
    ///
    /// Validates the input before creating a task; returns the task id
    /// immediately while the run executes on the worker pool.
    pub fn submit(&self, request: FilteringRequest) -> Result<String, AppError> {
        let settings = self.settings_for(&request)?;

        if request.text.trim().is_empty() {
            return Err(InputError::EmptySource("submitted text is empty".to_string()).into());
        }

        let segments = TimedTextParser::parse(&request.text)
            .map_err(|e| InputError::EmptySource(e.to_string()))?;

        Ok(self.spawn_run(segments, settings, request.source_name))
    }

    /// Submit a filtering run over a subtitle file
    pub fn submit_file<P: AsRef<Path>>(&self, path: P, request: FilteringRequest) -> Result<String, AppError> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            return Err(NotFoundError::SourceFile(path.display().to_string()).into());
        }

        let text = FileManager::read_to_string(path)?;
        let source_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(request.source_name.clone());

        self.submit(FilteringRequest {
            text,
            source_name,
            ..request
        })
    }

    /// Submit a transcription-then-filtering run over an audio file
    pub fn submit_transcription<P: AsRef<Path>>(
        &self,
        audio_path: P,
        request: FilteringRequest,
    ) -> Result<String, AppError> {
        let audio_path = audio_path.as_ref().to_path_buf();
        if !FileManager::file_exists(&audio_path) {
            return Err(NotFoundError::SourceFile(audio_path.display().to_string()).into());
        }
        let Some(transcriber) = self.transcriber.clone() else {
            return Err(InputError::InvalidRequest("no transcriber configured".to_string()).into());
        };

        let settings = self.settings_for(&request)?;
        let source_name = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(request.source_name);

        let task_id = Uuid::new_v4().to_string();
        let handle = self.tracker.start(&task_id, &settings.user_id);
        let runner = self.runner();
        let permits = Arc::clone(&self.worker_permits);

        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            handle.update(2, "transcribe", "Transcribing audio");

            match transcriber.transcribe(&audio_path).await {
                Ok(segments) if segments.is_empty() => {
                    handle.fail("transcription produced no segments");
                }
                Ok(segments) => {
                    runner.run(handle, segments, settings, source_name).await;
                }
                Err(e) => {
                    handle.fail(&e.to_string());
                }
            }
        });

        info!("Transcription task {} submitted", task_id);
        Ok(task_id)
    }

    /// Second pass over a finished result, without re-parsing
    pub fn refilter(
        &self,
        original: &FilteringResult,
        newly_known: &HashSet<String>,
    ) -> crate::filtering::RefilterReport {
        FilteringCoordinator::refilter(original, newly_known)
    }

    fn settings_for(&self, request: &FilteringRequest) -> Result<FilterSettings, AppError> {
        let language = request
            .language
            .clone()
            .unwrap_or_else(|| self.config.language.clone());
        language_utils::validate_language_code(&language)
            .map_err(|e| InputError::InvalidLanguage(e.to_string()))?;

        let mut settings = FilterSettings::new(
            &language,
            request.target_level.unwrap_or(self.config.target_level),
            request.user_id.as_deref().unwrap_or(&self.config.user_id),
        );
        settings.segment_concurrency = self.config.filtering.segment_concurrency;
        Ok(settings)
    }

    fn spawn_run(
        &self,
        segments: Vec<TimedSegment>,
        settings: FilterSettings,
        source_name: String,
    ) -> String {
        let task_id = Uuid::new_v4().to_string();
        let handle = self.tracker.start(&task_id, &settings.user_id);
        let runner = self.runner();
        let permits = Arc::clone(&self.worker_permits);

        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            runner.run(handle, segments, settings, source_name).await;
        });

        info!("Filtering task {} submitted", task_id);
        task_id
    }

    fn runner(&self) -> RunContext {
        RunContext {
            config: self.config.clone(),
            cache: self.cache.clone(),
            coordinator: Arc::clone(&self.coordinator),
            progress_store: Arc::clone(&self.progress_store),
            translator: self.translator.clone(),
        }
    }
}

/// Everything one background run needs, detached from the orchestrator
struct RunContext {
    config: Config,
    cache: VocabularyLookupCache,
    coordinator: Arc<FilteringCoordinator>,
    progress_store: Arc<dyn UserProgressStore>,
    translator: Option<Arc<dyn Translator>>,
}

impl RunContext {
    /// Execute one run, containing every failure on its own task
    async fn run(
        &self,
        handle: ProgressHandle,
        segments: Vec<TimedSegment>,
        settings: FilterSettings,
        source_name: String,
    ) {
        match self.execute(&handle, segments, settings, &source_name).await {
            Ok((summary, artifact_path)) => {
                handle.complete(summary, Some(artifact_path.display().to_string()));
            }
            Err(e) => {
                warn!("Task {} failed: {}", handle.task_id(), e);
                handle.fail(&e.to_string());
            }
        }
    }

    async fn execute(
        &self,
        handle: &ProgressHandle,
        mut segments: Vec<TimedSegment>,
        settings: FilterSettings,
        source_name: &str,
    ) -> Result<(serde_json::Value, PathBuf), AppError> {
        handle.update(5, "validate", "Checking segment structure");
        for warning in TimedTextParser::validate(&segments) {
            warn!("Task {}: {}", handle.task_id(), warning);
        }

        handle.update(10, "load", "Loading known words");
        let known_lemmas = self
            .progress_store
            .known_lemmas(&settings.user_id, &settings.language)
            .await?;

        let progress_handle = handle.clone();
        let on_progress = move |done: usize, total: usize| {
            let mapped = 10 + (done * 60 / total.max(1)) as u8;
            progress_handle.update(mapped, "classify", &format!("Classified {}/{} segments", done, total));
        };

        let result = self
            .coordinator
            .filter(&segments, &known_lemmas, &settings, Some(&on_progress))
            .await?;

        if self.config.filtering.translate_missing {
            handle.update(72, "translate", "Filling missing translations");
            self.fill_translations(&mut segments, &result, &settings).await;
        }

        handle.update(85, "records", "Building vocabulary records");
        let items = self.build_items(&result, &settings).await?;

        handle.update(92, "persist", "Writing result artifact");
        let artifact_path = self.persist(&segments, &result, &items, source_name)?;

        let summary = serde_json::json!({
            "total_subtitles": result.statistics.total_subtitles,
            "empty": result.statistics.empty_count,
            "single_blocker": result.statistics.single_blocker_count,
            "learning": result.statistics.learning_count,
            "unique_blockers": result.statistics.unique_blocker_count,
            "items": items.len(),
        });

        Ok((summary, artifact_path))
    }

    /// Translate learning segments that have no translation yet.
    ///
    /// Translation is an enrichment: individual failures degrade to the
    /// untranslated segment instead of failing the run.
    async fn fill_translations(
        &self,
        segments: &mut [TimedSegment],
        result: &FilteringResult,
        settings: &FilterSettings,
    ) {
        let Some(translator) = &self.translator else {
            warn!("translate_missing set but no translator configured");
            return;
        };

        let learning_indexes: HashSet<usize> = result
            .learning_subtitles
            .iter()
            .map(|s| s.segment.index)
            .collect();

        for segment in segments.iter_mut() {
            if !learning_indexes.contains(&segment.index) || segment.has_translation() {
                continue;
            }
            match translator
                .translate(
                    &segment.text,
                    &settings.language,
                    &self.config.filtering.translation_language,
                )
                .await
            {
                Ok(translation) => segment.translation = translation,
                Err(e) => warn!("Translation failed for segment {}: {}", segment.index, e),
            }
        }
    }

    /// Build de-duplicated vocabulary items, enriched from the dictionary
    async fn build_items(
        &self,
        result: &FilteringResult,
        settings: &FilterSettings,
    ) -> Result<Vec<VocabularyItem>, DependencyError> {
        let tokens = FilteringCoordinator::active_tokens(result);

        let mut records: BTreeMap<String, VocabularyRecord> = BTreeMap::new();
        for token in &tokens {
            let word = token.lemma_or_surface();
            if records.contains_key(&word) || token.dictionary_id.is_none() {
                continue;
            }
            if let Some(record) = self.cache.get_word(&word, &settings.language).await? {
                records.insert(word, record);
            }
        }

        let builder = VocabularyRecordBuilder::new(&settings.language);
        Ok(builder.build(&tokens, &records))
    }

    /// Write the JSON artifact and the highlighted companion file
    fn persist(
        &self,
        segments: &[TimedSegment],
        result: &FilteringResult,
        items: &[VocabularyItem],
        source_name: &str,
    ) -> Result<PathBuf, AppError> {
        let artifact = ResultArtifact {
            total_subtitles: result.statistics.total_subtitles,
            items,
            statistics: &result.statistics,
        };
        let json = serde_json::to_string_pretty(&artifact)
            .map_err(|e| AppError::Unknown(e.to_string()))?;

        let artifact_path = FileManager::artifact_path(
            Path::new(source_name),
            &self.config.output_dir,
            "vocabulary",
            "json",
        );
        FileManager::write_atomic(&artifact_path, &json)?;

        let highlighted = build_highlighted(segments, result);
        let highlighted_path = FileManager::artifact_path(
            Path::new(source_name),
            &self.config.output_dir,
            "highlighted",
            "srt",
        );
        FileManager::write_atomic(&highlighted_path, &highlighted)?;

        Ok(artifact_path)
    }
}

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}'\-]").unwrap());

/// Serialize segments with every recognized vocabulary surface form wrapped
/// in an inline highlight marker.
pub fn build_highlighted(segments: &[TimedSegment], result: &FilteringResult) -> String {
    let mut active_by_index: BTreeMap<usize, HashSet<String>> = BTreeMap::new();
    for annotated in result
        .single_blocker_subtitles
        .iter()
        .chain(result.learning_subtitles.iter())
    {
        active_by_index.insert(
            annotated.segment.index,
            annotated
                .active_words
                .iter()
                .map(|t| t.text.to_lowercase())
                .collect(),
        );
    }

    let highlighted: Vec<TimedSegment> = segments
        .iter()
        .map(|segment| {
            let mut out = segment.clone();
            if let Some(words) = active_by_index.get(&segment.index) {
                out.text = highlight_text(&segment.text, words);
            }
            out
        })
        .collect();

    TimedTextParser::serialize(&highlighted)
}

/// Wrap each word of `text` contained in `words` in `<b>` tags
fn highlight_text(text: &str, words: &HashSet<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        // take the next word (maximal run of word characters)
        let split_at = NON_WORD.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        if split_at == 0 {
            let ch = rest.chars().next().unwrap();
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        let (word, tail) = rest.split_at(split_at);
        if words.contains(&word.to_lowercase()) {
            out.push_str("<b>");
            out.push_str(word);
            out.push_str("</b>");
        } else {
            out.push_str(word);
        }
        rest = tail;
    }

    out
}
