//! Turn orchestration for Snakk.
//!
//! A tagged-phase state machine sequences acquisition, index build,
//! classification, and answering:
//!
//! ```text
//! CheckIndex ─┬─(ready)──────────────────────────────► Ready
//!             └► CheckLength ► ChooseStrategy ─┬► NativeCaptions ─┐
//!                                              └► FallbackTranscribe ◄┘(absent)
//!                                                        │
//!                                                  BuildIndex ► Ready
//! Ready ─(message)─► Classify ─┬► AnswerInfo
//!                              └► LocateAndSnapshot
//! ```
//!
//! The index check is the cache-hit fast path: once a conversation's
//! index exists, acquisition never runs again for it. Acquisition
//! intermediates commit to the conversation state only after the index
//! build succeeds, so a failed turn records its failure and changes
//! nothing else.

use crate::browser::BrowserPool;
use crate::classifier::{RequestClassifier, RequestKind};
use crate::completion::{CompletionModel, OpenAICompletion};
use crate::config::{Prompts, Settings};
use crate::conversation::{ConversationState, TurnOutcome};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SnakkError};
use crate::index::IndexBuilder;
use crate::locator::TimestampLocator;
use crate::media::{LengthBucket, MediaRef};
use crate::rag::AnswerSynthesizer;
use crate::snapshot::SnapshotCapturer;
use crate::transcript::{CaptionScraper, SpeechFallback, Transcript, TranscriptSegment, TranscriptSource};
use crate::transcription::WhisperTranscriber;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One state of the turn machine. Variants carry exactly the data the
/// next transition needs.
enum Phase {
    CheckIndex,
    CheckLength,
    ChooseStrategy {
        bucket: LengthBucket,
    },
    NativeCaptions {
        bucket: LengthBucket,
    },
    FallbackTranscribe {
        bucket: LengthBucket,
        native_available: Option<bool>,
    },
    BuildIndex {
        bucket: LengthBucket,
        native_available: Option<bool>,
        segments: Vec<TranscriptSegment>,
    },
    Ready {
        reused: bool,
    },
    Classify {
        message: String,
    },
    AnswerInfo {
        message: String,
    },
    LocateAndSnapshot {
        message: String,
    },
}

/// The main orchestrator: one instance serves many conversations, each
/// advanced one turn at a time.
pub struct Orchestrator {
    settings: Settings,
    captions: CaptionScraper,
    fallback: Arc<dyn TranscriptSource>,
    builder: IndexBuilder,
    classifier: RequestClassifier,
    synthesizer: AnswerSynthesizer,
    locator: TimestampLocator,
    capturer: SnapshotCapturer,
}

impl Orchestrator {
    /// Create an orchestrator with OpenAI-backed providers.
    ///
    /// The caller supplies the browser pool; everything else is wired
    /// from settings.
    pub fn new(settings: Settings, pool: Arc<BrowserPool>) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        let completion: Arc<dyn CompletionModel> =
            Arc::new(OpenAICompletion::new(&settings.classifier.model));

        let speech = Arc::new(WhisperTranscriber::with_config(&settings.transcription.model));
        let fallback: Arc<dyn TranscriptSource> =
            Arc::new(SpeechFallback::new(speech, settings.temp_dir()));

        Self::with_components(settings, Prompts::default(), pool, embedder, completion, fallback)
    }

    /// Create an orchestrator with caller-supplied providers.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        pool: Arc<BrowserPool>,
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionModel>,
        fallback: Arc<dyn TranscriptSource>,
    ) -> Result<Self> {
        std::fs::create_dir_all(settings.temp_dir())?;

        let wait_timeout = Duration::from_secs(settings.automation.wait_timeout_seconds);
        let snapshot_timeout = Duration::from_secs(settings.automation.snapshot_timeout_seconds);

        let captions = CaptionScraper::new(pool.clone(), wait_timeout);
        let builder = IndexBuilder::new(
            embedder.clone(),
            settings.index.chunk_chars,
            settings.index.chunk_overlap,
        );
        let classifier = RequestClassifier::new(
            completion.clone(),
            prompts.clone(),
            settings.classifier.temperature,
        );
        let synthesizer = AnswerSynthesizer::new(
            completion,
            embedder.clone(),
            prompts,
            settings.rag.top_k,
            settings.rag.temperature,
        );
        let locator = TimestampLocator::new(embedder);
        let capturer = SnapshotCapturer::new(pool, snapshot_timeout);

        Ok(Self {
            settings,
            captions,
            fallback,
            builder,
            classifier,
            synthesizer,
            locator,
            capturer,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Advance a conversation by one turn.
    ///
    /// Builds the index on first contact, then classifies and routes the
    /// message if one is present. On failure the state is unchanged
    /// except for `last_failure`, and the caller gets the typed reason;
    /// the conversation stays usable for a retry. While no index exists,
    /// a different media reference restarts the conversation; once the
    /// index is ready the reference is fixed.
    #[instrument(skip(self, state), fields(media = %media_reference))]
    pub async fn advance_turn(
        &self,
        state: &mut ConversationState,
        media_reference: &str,
        message: Option<&str>,
    ) -> Result<TurnOutcome> {
        if state.media_reference() != media_reference {
            if state.index_ready() {
                return Err(SnakkError::InvalidInput(format!(
                    "Conversation is bound to {}; start a new conversation for {}",
                    state.media_reference(),
                    media_reference
                )));
            }
            state.reset_for(media_reference);
        }

        match self.run_turn(state, message).await {
            Ok(outcome) => {
                state.last_failure = None;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Turn failed: {}", e);
                state.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Pre-flight: probe the media duration and bucket it.
    pub async fn check_media_length(&self, media_reference: &str) -> Result<LengthBucket> {
        let media = MediaRef::parse(media_reference)?;
        let duration = self.captions.probe_duration(&media).await?;
        Ok(LengthBucket::from_duration(
            duration,
            self.settings.media.short_threshold_seconds,
        ))
    }

    /// Pre-flight: check whether the media offers native captions.
    pub async fn has_native_captions(&self, media_reference: &str) -> Result<bool> {
        let media = MediaRef::parse(media_reference)?;
        self.captions.has_captions(&media).await
    }

    /// Drive the phase machine for one turn.
    async fn run_turn(
        &self,
        state: &mut ConversationState,
        message: Option<&str>,
    ) -> Result<TurnOutcome> {
        let media = MediaRef::parse(state.media_reference())?;

        let mut phase = Phase::CheckIndex;
        loop {
            phase = match phase {
                Phase::CheckIndex => {
                    if state.index_ready() {
                        Phase::Ready { reused: true }
                    } else {
                        Phase::CheckLength
                    }
                }

                Phase::CheckLength => {
                    let duration = self.captions.probe_duration(&media).await?;
                    let bucket = LengthBucket::from_duration(
                        duration,
                        self.settings.media.short_threshold_seconds,
                    );
                    info!("Media duration {}s, bucket {}", duration, bucket);
                    Phase::ChooseStrategy { bucket }
                }

                Phase::ChooseStrategy { bucket } => match bucket {
                    // Short media: the caption UI is unreliable there,
                    // go straight to speech-to-text.
                    LengthBucket::Short => Phase::FallbackTranscribe {
                        bucket,
                        native_available: None,
                    },
                    LengthBucket::Long => Phase::NativeCaptions { bucket },
                },

                Phase::NativeCaptions { bucket } => {
                    if !self.captions.has_captions(&media).await? {
                        info!("No native captions, falling back to transcription");
                        Phase::FallbackTranscribe {
                            bucket,
                            native_available: Some(false),
                        }
                    } else {
                        match self.captions.acquire(&media, bucket).await {
                            Ok(segments) => Phase::BuildIndex {
                                bucket,
                                native_available: Some(true),
                                segments,
                            },
                            Err(e) => {
                                warn!("Caption scrape failed, falling back: {}", e);
                                Phase::FallbackTranscribe {
                                    bucket,
                                    native_available: Some(true),
                                }
                            }
                        }
                    }
                }

                Phase::FallbackTranscribe {
                    bucket,
                    native_available,
                } => match self.fallback.acquire(&media, bucket).await {
                    Ok(segments) => Phase::BuildIndex {
                        bucket,
                        native_available,
                        segments,
                    },
                    Err(e) => {
                        return Err(SnakkError::Acquisition(format!(
                            "No transcript obtainable by any strategy: {}",
                            e
                        )));
                    }
                },

                Phase::BuildIndex {
                    bucket,
                    native_available,
                    segments,
                } => {
                    let transcript = Transcript::new(segments);
                    let index = self.builder.build(&transcript).await?;
                    state.commit_acquisition(
                        bucket,
                        native_available,
                        transcript.segments,
                        Arc::new(index),
                    );
                    Phase::Ready { reused: false }
                }

                Phase::Ready { reused } => match message {
                    None => {
                        return Ok(TurnOutcome::Indexed {
                            segments: state.segments.len(),
                            reused,
                        });
                    }
                    Some(text) => Phase::Classify {
                        message: text.to_string(),
                    },
                },

                Phase::Classify { message } => {
                    let kind = match self.classifier.classify(&message).await {
                        Ok(kind) => kind,
                        // Never drop a message over a flaky classification
                        Err(e) => {
                            warn!("Classification failed, defaulting to information: {}", e);
                            RequestKind::Information
                        }
                    };
                    match kind {
                        RequestKind::Information => Phase::AnswerInfo { message },
                        RequestKind::Image => Phase::LocateAndSnapshot { message },
                    }
                }

                Phase::AnswerInfo { message } => {
                    let index = state
                        .index_handle()
                        .ok_or(SnakkError::EmptyIndex)?;

                    let answer = self.synthesizer.answer(&index, &message).await?;

                    state.last_message = Some(message);
                    state.last_classification = Some(RequestKind::Information);
                    state.last_answer = Some(answer.clone());
                    return Ok(TurnOutcome::Answer(answer));
                }

                Phase::LocateAndSnapshot { message } => {
                    let index = state
                        .index_handle()
                        .ok_or(SnakkError::EmptyIndex)?;

                    let offset_seconds = self.locator.locate(&index, &message).await?;
                    let deep_link = media.with_time_offset(offset_seconds)?;
                    info!("Located offset {}s -> {}", offset_seconds, deep_link);

                    let image = self.capturer.capture(&deep_link).await?;

                    state.last_message = Some(message);
                    state.last_classification = Some(RequestKind::Image);
                    state.last_offset_seconds = Some(offset_seconds);
                    state.deep_link = Some(deep_link.clone());
                    state.last_snapshot = Some(image.clone());
                    return Ok(TurnOutcome::Snapshot {
                        offset_seconds,
                        deep_link,
                        image,
                    });
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserSession;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    /// Browser double scripted with the page state the scraper will see.
    struct ScriptedBrowser {
        duration_text: String,
        captions: bool,
        timestamps: Vec<String>,
        texts: Vec<String>,
        navigations: Arc<AtomicUsize>,
        panel_reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserSession for ScriptedBrowser {
        async fn navigate(&self, _url: &str) -> Result<()> {
            self.navigations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
            let visible = match selector {
                "#below" | "#bottom-row" | "video.html5-main-video" => true,
                ".ytp-time-duration" => !self.duration_text.is_empty(),
                _ => self.captions,
            };
            if visible {
                Ok(())
            } else {
                Err(SnakkError::ElementNotVisible(selector.to_string()))
            }
        }

        async fn click(&self, _selector: &str) -> Result<()> {
            Ok(())
        }

        async fn read_text(&self, selector: &str) -> Result<String> {
            match selector {
                ".ytp-time-duration" => Ok(self.duration_text.clone()),
                other => Err(SnakkError::Browser(format!("Unexpected read: {}", other))),
            }
        }

        async fn read_text_all(&self, selector: &str) -> Result<Vec<String>> {
            self.panel_reads.fetch_add(1, Ordering::SeqCst);
            match selector {
                ".segment-timestamp" => Ok(self.timestamps.clone()),
                ".segment-text" => Ok(self.texts.clone()),
                other => Err(SnakkError::Browser(format!("Unexpected read: {}", other))),
            }
        }

        async fn screenshot(&self) -> Result<Vec<u8>> {
            Ok(vec![0xff, 0xd8, 0xff])
        }
    }

    /// Completion double: routes on the system prompt so one instance can
    /// play both the classifier and the synthesizer.
    struct ScriptedCompletion {
        classify_output: String,
        answer_output: String,
    }

    #[async_trait]
    impl CompletionModel for ScriptedCompletion {
        async fn complete(&self, system: &str, _user: &str, _temperature: f32) -> Result<String> {
            if system.contains("classify") {
                Ok(self.classify_output.clone())
            } else {
                Ok(self.answer_output.clone())
            }
        }
    }

    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(keyword_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn keyword_vector(text: &str) -> Vec<f32> {
        if text.contains("recipe") {
            vec![0.0, 1.0, 0.0]
        } else if text.contains("intro") {
            vec![1.0, 0.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }

    /// Fallback strategy double with a call counter.
    struct ScriptedFallback {
        segments: Result<Vec<TranscriptSegment>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranscriptSource for ScriptedFallback {
        async fn acquire(
            &self,
            _media: &MediaRef,
            _bucket: LengthBucket,
        ) -> Result<Vec<TranscriptSegment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.segments {
                Ok(segments) => Ok(segments.clone()),
                Err(_) => Err(SnakkError::Transcription("scripted failure".to_string())),
            }
        }
    }

    struct Rig {
        orchestrator: Orchestrator,
        navigations: Arc<AtomicUsize>,
        panel_reads: Arc<AtomicUsize>,
        fallback_calls: Arc<AtomicUsize>,
    }

    fn rig(
        duration_text: &str,
        captions: bool,
        classify_output: &str,
        fallback: Result<Vec<TranscriptSegment>>,
    ) -> Rig {
        let navigations = Arc::new(AtomicUsize::new(0));
        let panel_reads = Arc::new(AtomicUsize::new(0));
        let fallback_calls = Arc::new(AtomicUsize::new(0));

        let browser = ScriptedBrowser {
            duration_text: duration_text.to_string(),
            captions,
            timestamps: vec!["00:05".to_string(), "01:30".to_string()],
            texts: vec!["intro".to_string(), "recipe steps".to_string()],
            navigations: navigations.clone(),
            panel_reads: panel_reads.clone(),
        };
        let pool = Arc::new(BrowserPool::new(vec![Box::new(browser)]));

        let mut settings = Settings::default();
        settings.general.temp_dir = std::env::temp_dir()
            .join("snakk-test")
            .to_string_lossy()
            .into_owned();

        let orchestrator = Orchestrator::with_components(
            settings,
            Prompts::default(),
            pool,
            Arc::new(KeywordEmbedder),
            Arc::new(ScriptedCompletion {
                classify_output: classify_output.to_string(),
                answer_output: "Install version two.".to_string(),
            }),
            Arc::new(ScriptedFallback {
                segments: fallback,
                calls: fallback_calls.clone(),
            }),
        )
        .unwrap();

        Rig {
            orchestrator,
            navigations,
            panel_reads,
            fallback_calls,
        }
    }

    fn fallback_segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("00:01", "fallback intro"),
            TranscriptSegment::new("00:09", "fallback recipe"),
        ]
    }

    #[tokio::test]
    async fn test_long_media_with_captions_end_to_end() {
        let rig = rig(
            "25:00",
            true,
            r#"{"request_category": "information"}"#,
            Ok(fallback_segments()),
        );

        let mut state = ConversationState::new(WATCH_URL);
        let outcome = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, Some("What version should I install?"))
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Answer(answer) => assert_eq!(answer, "Install version two."),
            other => panic!("Expected an answer, got {:?}", other),
        }

        assert!(state.index_ready());
        assert_eq!(state.segments.len(), 2);
        assert_eq!(state.has_native_transcript, Some(true));
        assert_eq!(state.length_bucket, Some(LengthBucket::Long));
        assert_eq!(state.last_classification, Some(RequestKind::Information));
        // Native strategy carried the acquisition; the fallback never ran.
        assert_eq!(rig.fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_acquisition() {
        let rig = rig(
            "25:00",
            true,
            r#"{"request_category": "information"}"#,
            Ok(fallback_segments()),
        );

        let mut state = ConversationState::new(WATCH_URL);
        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();

        let reads_after_build = rig.panel_reads.load(Ordering::SeqCst);
        let navs_after_build = rig.navigations.load(Ordering::SeqCst);
        assert!(reads_after_build > 0);

        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, Some("What version should I install?"))
            .await
            .unwrap();

        // Answering an information request needs no browser at all.
        assert_eq!(rig.panel_reads.load(Ordering::SeqCst), reads_after_build);
        assert_eq!(rig.navigations.load(Ordering::SeqCst), navs_after_build);
        assert_eq!(rig.fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_empty_turns_are_idempotent() {
        let rig = rig("25:00", true, "{}", Ok(fallback_segments()));

        let mut state = ConversationState::new(WATCH_URL);
        let first = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();
        assert!(matches!(
            first,
            TurnOutcome::Indexed {
                segments: 2,
                reused: false
            }
        ));

        let handle = state.index_handle().unwrap().id();
        let segments = state.segments.clone();

        let second = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();
        assert!(matches!(
            second,
            TurnOutcome::Indexed {
                segments: 2,
                reused: true
            }
        ));

        assert_eq!(state.index_handle().unwrap().id(), handle);
        assert_eq!(state.segments, segments);
    }

    #[tokio::test]
    async fn test_short_media_goes_straight_to_fallback() {
        let rig = rig("00:15", true, "{}", Ok(fallback_segments()));

        let mut state = ConversationState::new(WATCH_URL);
        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();

        assert_eq!(rig.fallback_calls.load(Ordering::SeqCst), 1);
        // The caption panel was never opened, and the probe never ran.
        assert_eq!(rig.panel_reads.load(Ordering::SeqCst), 0);
        assert_eq!(state.has_native_transcript, None);
        assert_eq!(state.length_bucket, Some(LengthBucket::Short));
        assert_eq!(state.segments.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_captions_fall_back() {
        let rig = rig("25:00", false, "{}", Ok(fallback_segments()));

        let mut state = ConversationState::new(WATCH_URL);
        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();

        assert_eq!(rig.fallback_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.has_native_transcript, Some(false));
        assert!(state.index_ready());
    }

    #[tokio::test]
    async fn test_double_failure_is_turn_fatal_and_recorded() {
        let rig = rig(
            "25:00",
            false,
            "{}",
            Err(SnakkError::Transcription("no audio".to_string())),
        );

        let mut state = ConversationState::new(WATCH_URL);
        let err = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, Some("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, SnakkError::Acquisition(_)));
        assert!(state.last_failure.is_some());
        // Nothing else changed: the conversation is reusable as-is.
        assert!(!state.index_ready());
        assert!(state.segments.is_empty());
        assert!(state.last_message.is_none());
        assert!(state.has_native_transcript.is_none());
    }

    #[tokio::test]
    async fn test_retry_with_different_media_after_failure() {
        let rig = rig(
            "25:00",
            false,
            "{}",
            Err(SnakkError::Transcription("no audio".to_string())),
        );

        let mut state = ConversationState::new(WATCH_URL);
        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap_err();

        // A different reference restarts the conversation while unindexed.
        let other = "https://www.youtube.com/watch?v=AAAAAAAAAAA";
        let err = rig
            .orchestrator
            .advance_turn(&mut state, other, None)
            .await
            .unwrap_err();
        assert_eq!(state.media_reference(), other);
        assert!(matches!(err, SnakkError::Acquisition(_)));
    }

    #[tokio::test]
    async fn test_media_reference_fixed_once_indexed() {
        let rig = rig("25:00", true, "{}", Ok(fallback_segments()));

        let mut state = ConversationState::new(WATCH_URL);
        rig.orchestrator
            .advance_turn(&mut state, WATCH_URL, None)
            .await
            .unwrap();

        let err = rig
            .orchestrator
            .advance_turn(
                &mut state,
                "https://www.youtube.com/watch?v=AAAAAAAAAAA",
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SnakkError::InvalidInput(_)));
        assert_eq!(state.media_reference(), WATCH_URL);
    }

    #[tokio::test]
    async fn test_ambiguous_classification_defaults_to_information() {
        // The classifier gets a label outside the closed set; the turn
        // must still answer instead of dropping the message.
        let rig = rig(
            "25:00",
            true,
            r#"{"request_category": "banana"}"#,
            Ok(fallback_segments()),
        );

        let mut state = ConversationState::new(WATCH_URL);
        let outcome = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, Some("What version should I install?"))
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::Answer(_)));
        assert_eq!(state.last_classification, Some(RequestKind::Information));
    }

    #[tokio::test]
    async fn test_image_request_locates_and_snapshots() {
        let rig = rig(
            "25:00",
            true,
            r#"{"request_category": "image"}"#,
            Ok(fallback_segments()),
        );

        let mut state = ConversationState::new(WATCH_URL);
        let outcome = rig
            .orchestrator
            .advance_turn(&mut state, WATCH_URL, Some("show me the recipe"))
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Snapshot {
                offset_seconds,
                deep_link,
                image,
            } => {
                assert_eq!(offset_seconds, 90);
                assert_eq!(
                    deep_link,
                    "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=90s"
                );
                assert!(!image.is_empty());
            }
            other => panic!("Expected a snapshot, got {:?}", other),
        }

        assert_eq!(state.last_classification, Some(RequestKind::Image));
        assert_eq!(state.last_offset_seconds, Some(90));
        assert!(state.last_snapshot.is_some());
        // An image request never produces a text answer.
        assert!(state.last_answer.is_none());
    }

    #[tokio::test]
    async fn test_image_request_replaces_existing_time_param() {
        let url_with_offset = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=5s";
        let rig = rig(
            "25:00",
            true,
            r#"{"request_category": "image"}"#,
            Ok(fallback_segments()),
        );

        let mut state = ConversationState::new(url_with_offset);
        let outcome = rig
            .orchestrator
            .advance_turn(&mut state, url_with_offset, Some("show me the recipe"))
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Snapshot { deep_link, .. } => {
                assert_eq!(
                    deep_link,
                    "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=90s"
                );
                assert_eq!(deep_link.matches("t=").count(), 1);
            }
            other => panic!("Expected a snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_preflight_operations() {
        let rig = rig("25:00", true, "{}", Ok(fallback_segments()));

        let bucket = rig
            .orchestrator
            .check_media_length(WATCH_URL)
            .await
            .unwrap();
        assert_eq!(bucket, LengthBucket::Long);

        assert!(rig.orchestrator.has_native_captions(WATCH_URL).await.unwrap());
    }
}
