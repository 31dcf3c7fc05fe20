//! Video link reconciliation.
//!
//! The generator is told to use only candidate video URLs, but nothing makes
//! it comply. Every generated activity passes through [`UrlReconciler`],
//! which keeps whitelisted URLs, attaches their [`VideoReference`]s, and
//! replaces fabricated ones with the first candidate when any exist.

use std::collections::HashMap;

use crate::types::{Activity, Pathway, Step, VideoReference};

/// What reconciliation did to one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Activity had no video URLs
    Untouched,
    /// At least one URL was whitelisted; `dropped` others were removed
    Verified { kept: usize, dropped: usize },
    /// No URL was whitelisted; replaced with the first candidate
    FellBack { dropped: usize },
    /// No URL was whitelisted and there were no candidates
    Cleared { dropped: usize },
}

/// Totals across a reconciled step or pathway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub activities: usize,
    pub kept: usize,
    pub dropped: usize,
    pub fallbacks: usize,
}

impl ReconcileSummary {
    pub fn record(&mut self, outcome: ReconcileOutcome) {
        self.activities += 1;
        match outcome {
            ReconcileOutcome::Untouched => {}
            ReconcileOutcome::Verified { kept, dropped } => {
                self.kept += kept;
                self.dropped += dropped;
            }
            ReconcileOutcome::FellBack { dropped } => {
                self.dropped += dropped;
                self.fallbacks += 1;
            }
            ReconcileOutcome::Cleared { dropped } => self.dropped += dropped,
        }
    }

    /// Whether any URL was removed or replaced.
    pub fn repaired_any(&self) -> bool {
        self.dropped > 0
    }
}

/// Enforces the video whitelist for one request's candidate set.
pub struct UrlReconciler<'a> {
    candidates: &'a [VideoReference],
    by_url: HashMap<&'a str, &'a VideoReference>,
}

impl<'a> UrlReconciler<'a> {
    pub fn new(candidates: &'a [VideoReference]) -> Self {
        // Repeated URLs resolve to the last reference listed
        let by_url: HashMap<&str, &VideoReference> = candidates
            .iter()
            .map(|video| (video.url.as_str(), video))
            .collect();
        Self { candidates, by_url }
    }

    /// Whether a URL belongs to the candidate set.
    pub fn is_whitelisted(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    /// Reconcile a single activity.
    pub fn reconcile(&self, mut activity: Activity) -> (Activity, ReconcileOutcome) {
        let urls = match activity.video_urls.take() {
            Some(urls) if !urls.is_empty() => urls,
            other => {
                activity.video_urls = other;
                return (activity, ReconcileOutcome::Untouched);
            }
        };

        let total = urls.len();
        let valid: Vec<String> = urls
            .into_iter()
            .filter(|url| self.is_whitelisted(url))
            .collect();
        let dropped = total - valid.len();

        if !valid.is_empty() {
            let references = valid
                .iter()
                .filter_map(|url| self.by_url.get(url.as_str()).map(|video| (*video).clone()))
                .collect();
            let kept = valid.len();
            activity.video_urls = Some(valid);
            activity.youtube_videos = Some(references);
            return (activity, ReconcileOutcome::Verified { kept, dropped });
        }

        match self.candidates.first() {
            Some(first) => {
                activity.video_urls = Some(vec![first.url.clone()]);
                activity.youtube_videos = Some(vec![first.clone()]);
                (activity, ReconcileOutcome::FellBack { dropped })
            }
            None => {
                activity.video_urls = Some(Vec::new());
                activity.youtube_videos = Some(Vec::new());
                (activity, ReconcileOutcome::Cleared { dropped })
            }
        }
    }

    /// Reconcile every activity in a step.
    pub fn reconcile_step(&self, mut step: Step) -> (Step, ReconcileSummary) {
        let mut summary = ReconcileSummary::default();
        step.activities = std::mem::take(&mut step.activities)
            .into_iter()
            .map(|activity| {
                let (activity, outcome) = self.reconcile(activity);
                summary.record(outcome);
                activity
            })
            .collect();
        (step, summary)
    }

    /// Reconcile every activity in every step of a pathway.
    pub fn reconcile_pathway(&self, mut pathway: Pathway) -> (Pathway, ReconcileSummary) {
        let mut summary = ReconcileSummary::default();
        pathway.steps = std::mem::take(&mut pathway.steps)
            .into_iter()
            .map(|step| {
                let (step, step_summary) = self.reconcile_step(step);
                summary.activities += step_summary.activities;
                summary.kept += step_summary.kept;
                summary.dropped += step_summary.dropped;
                summary.fallbacks += step_summary.fallbacks;
                step
            })
            .collect();
        (pathway, summary)
    }
}

/// Reconcile one activity against a candidate set.
pub fn reconcile(activity: Activity, candidates: &[VideoReference]) -> Activity {
    UrlReconciler::new(candidates).reconcile(activity).0
}
