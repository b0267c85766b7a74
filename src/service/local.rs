//! In-process word service backed by a word list, for drilling without a
//! server. Progress lives in memory for the lifetime of the service.

use crate::csv::{WordEntry, load_word_list};
use crate::error::ServiceError;
use crate::models::{AnswerQuery, BLANK_MARKER, Mode, Prompt, PromptKind, StageEvent};
use crate::service::WordService;
use async_trait::async_trait;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RECENT_WINDOW: usize = 50;
const RECENT_RESET_RATIO: f64 = 0.7;
const MAX_BLANKS: usize = 3;

#[derive(Debug)]
pub struct LocalWordService {
    words: Vec<WordEntry>,
    progress: Mutex<Progress>,
}

#[derive(Debug)]
struct Progress {
    stages: HashMap<String, u32>,
    recent: VecDeque<String>,
    current_typing: Option<String>,
    rng: StdRng,
}

impl LocalWordService {
    pub fn new(words: Vec<WordEntry>) -> Self {
        Self::with_rng(words, StdRng::from_entropy())
    }

    pub fn with_seed(words: Vec<WordEntry>, seed: u64) -> Self {
        Self::with_rng(words, StdRng::seed_from_u64(seed))
    }

    fn with_rng(words: Vec<WordEntry>, rng: StdRng) -> Self {
        Self {
            words,
            progress: Mutex::new(Progress {
                stages: HashMap::new(),
                recent: VecDeque::with_capacity(RECENT_WINDOW),
                current_typing: None,
                rng,
            }),
        }
    }

    pub fn from_csv(path: &Path) -> std::io::Result<Self> {
        let words = load_word_list(path)?;
        info!("loaded {} words from {}", words.len(), path.display());
        Ok(Self::new(words))
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn stage_of(&self, word: &str) -> Option<u32> {
        self.lock().ok()?.stages.get(word).copied()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Progress>, ServiceError> {
        self.progress
            .lock()
            .map_err(|_| ServiceError::Transport("word progress is unavailable".to_string()))
    }

    /// Distinct levels in the order they first appear in the list.
    pub fn level_names(&self) -> Vec<String> {
        let mut levels: Vec<String> = Vec::new();
        for level in self.words.iter().filter_map(|e| e.level.as_ref()) {
            if !levels.contains(level) {
                levels.push(level.clone());
            }
        }
        levels
    }

    fn next_prompt(&self, mode: Mode, level: Option<&str>) -> Result<Prompt, ServiceError> {
        let mut progress = self.lock()?;
        match mode {
            Mode::Recognition => {
                let entry = self.pick_unseen(&mut progress, level)?;
                raise_stage(&mut progress.stages, &entry.word, 1);
                Ok(to_prompt(entry, PromptKind::Recognition))
            }
            Mode::FillBlank => {
                let entry = self.pick_at_stage(&mut progress, 1).ok_or_else(|| {
                    ServiceError::Logical(
                        "You have not learned any words yet. Learn some in \"Recognize Words\" first."
                            .to_string(),
                    )
                })?;
                let (word_with_blanks, blanks) = make_blanks(&entry.word, &mut progress.rng);
                raise_stage(&mut progress.stages, &entry.word, 2);
                Ok(to_prompt(
                    entry,
                    PromptKind::FillBlank {
                        word_with_blanks,
                        blanks,
                    },
                ))
            }
            Mode::Typing => {
                let entry = self.pick_at_stage(&mut progress, 2).ok_or_else(|| {
                    ServiceError::Logical(
                        "No words have been practised in \"Fill in the Blanks\" yet.".to_string(),
                    )
                })?;
                raise_stage(&mut progress.stages, &entry.word, 3);
                progress.current_typing = Some(entry.word.clone());
                Ok(to_prompt(entry, PromptKind::Typing))
            }
        }
    }

    /// Random word of `level` (any level when `None`) not shown recently.
    /// The recent window is cleared once it covers most of the pool.
    fn pick_unseen(
        &self,
        progress: &mut Progress,
        level: Option<&str>,
    ) -> Result<&WordEntry, ServiceError> {
        let pool: Vec<&WordEntry> = self
            .words
            .iter()
            .filter(|e| level.is_none_or(|l| e.level.as_deref() == Some(l)))
            .collect();
        if pool.is_empty() {
            let message = match level {
                Some(level) => format!("There are no words at level {}.", level),
                None => "The word list is empty.".to_string(),
            };
            return Err(ServiceError::Logical(message));
        }
        if progress.recent.len() as f64 > pool.len() as f64 * RECENT_RESET_RATIO {
            debug!("clearing recent words ({})", progress.recent.len());
            progress.recent.clear();
        }

        let fresh: Vec<&WordEntry> = pool
            .iter()
            .copied()
            .filter(|e| !progress.recent.contains(&e.word))
            .collect();
        let entry = match fresh.choose(&mut progress.rng) {
            Some(entry) => *entry,
            None => {
                progress.recent.clear();
                *pool
                    .choose(&mut progress.rng)
                    .ok_or_else(|| ServiceError::Logical("The word list is empty.".to_string()))?
            }
        };

        if progress.recent.len() == RECENT_WINDOW {
            progress.recent.pop_front();
        }
        progress.recent.push_back(entry.word.clone());
        Ok(entry)
    }

    fn pick_at_stage(&self, progress: &mut Progress, min_stage: u32) -> Option<&WordEntry> {
        let eligible: Vec<&WordEntry> = self
            .words
            .iter()
            .filter(|e| progress.stages.get(&e.word).is_some_and(|s| *s >= min_stage))
            .collect();
        eligible.choose(&mut progress.rng).copied()
    }
}

fn raise_stage(stages: &mut HashMap<String, u32>, word: &str, stage: u32) -> u32 {
    let current = stages.entry(word.to_string()).or_insert(stage);
    *current = (*current).max(stage);
    *current
}

fn to_prompt(entry: &WordEntry, kind: PromptKind) -> Prompt {
    Prompt {
        word: entry.word.clone(),
        meaning: entry.meaning.clone(),
        level: entry.level.clone(),
        kind,
    }
}

/// Hides `max(1, min(3, len / 3))` letters of `word`, never whitespace.
/// Returns the masked word and the hidden letters in left-to-right order.
pub fn make_blanks<R: rand::Rng>(word: &str, rng: &mut R) -> (String, Vec<String>) {
    let mut chars: Vec<char> = word.chars().collect();
    let candidates: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return (word.to_string(), Vec::new());
    }

    let wanted = (chars.len() / 3).clamp(1, MAX_BLANKS).min(candidates.len());
    let mut positions: Vec<usize> = index::sample(rng, candidates.len(), wanted)
        .into_iter()
        .map(|i| candidates[i])
        .collect();
    positions.sort_unstable();

    let mut blanks = Vec::with_capacity(positions.len());
    for pos in positions {
        blanks.push(chars[pos].to_string());
        chars[pos] = BLANK_MARKER;
    }
    (chars.into_iter().collect(), blanks)
}

#[async_trait]
impl WordService for LocalWordService {
    async fn fetch_prompt(&self, mode: Mode, level: Option<&str>) -> Result<Prompt, ServiceError> {
        self.next_prompt(mode, level)
    }

    async fn report_stage_advance(&self, event: &StageEvent) -> Result<(), ServiceError> {
        let mut progress = self.lock()?;
        if !progress.stages.contains_key(&event.word) {
            return Err(ServiceError::Logical(format!(
                "\"{}\" is not in the learning record",
                event.word
            )));
        }
        let stage = raise_stage(&mut progress.stages, &event.word, event.stage);
        debug!("{:?} is now at stage {}", event.word, stage);
        Ok(())
    }

    async fn fetch_authoritative_answer(
        &self,
        _query: &AnswerQuery,
    ) -> Result<String, ServiceError> {
        self.lock()?
            .current_typing
            .clone()
            .ok_or_else(|| ServiceError::Logical("No typing exercise is in progress.".to_string()))
    }

    async fn levels(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.level_names())
    }

    async fn reset_recent_words(&self) -> Result<(), ServiceError> {
        let mut progress = self.lock()?;
        info!("forgetting {} recent words", progress.recent.len());
        progress.recent.clear();
        Ok(())
    }
}
