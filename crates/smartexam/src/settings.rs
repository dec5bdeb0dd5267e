use crate::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use smartexam_core::{shuffle, ExamMeta, Question, ScoringConfig, ShuffleOptions};
use std::path::PathBuf;

/// Resolve the library directory: `--home` / `SMARTEXAM_HOME`, else the
/// platform data directory.
pub fn library_dir(global: &crate::Global) -> Result<PathBuf> {
    if let Some(home) = &global.home {
        return Ok(home.clone());
    }

    let dir = dirs_next::data_dir()
        .ok_or_else(|| eyre!("Unable to determine data directory, set SMARTEXAM_HOME"))?
        .join("smartexam");

    log::debug!("library directory: {}", dir.display());

    Ok(dir)
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ShuffleArgs {
    /// Shuffle question order
    #[arg(long)]
    pub shuffle_questions: bool,

    /// Shuffle the options inside each question
    #[arg(long)]
    pub shuffle_options: bool,

    /// Seed for a reproducible shuffle
    #[arg(long, env = "SMARTEXAM_SEED")]
    pub seed: Option<u64>,
}

impl ShuffleArgs {
    pub fn options(&self) -> ShuffleOptions {
        ShuffleOptions {
            questions: self.shuffle_questions,
            options: self.shuffle_options,
        }
    }

    /// Display order for one attempt.
    pub fn apply(&self, questions: &[Question]) -> Vec<Question> {
        let options = self.options();
        match self.seed {
            Some(seed) => shuffle(questions, &options, &mut StdRng::seed_from_u64(seed)),
            None => shuffle(questions, &options, &mut rand::thread_rng()),
        }
    }
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScoringArgs {
    /// Points subtracted for each wrong answer
    #[arg(long, env = "SMARTEXAM_NEGATIVE_MARKING")]
    pub negative_marking: Option<f64>,

    /// Percent needed to pass (0-100)
    #[arg(long, env = "SMARTEXAM_PASS_MARK", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub pass_mark: Option<u8>,
}

impl ScoringArgs {
    /// Scoring for an exam; command-line values win over the exam's own.
    pub fn config(&self, meta: &ExamMeta) -> ScoringConfig {
        let stored = ScoringConfig::from_meta(meta);
        ScoringConfig {
            negative_marking: self.negative_marking.unwrap_or(stored.negative_marking),
            pass_mark: self.pass_mark.or(stored.pass_mark),
        }
    }
}
