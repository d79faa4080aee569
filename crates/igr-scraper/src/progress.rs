use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Connecting,
    SelectingDistrict,
    SelectingYear,
    SelectingTaluka,
    SelectingVillage,
    LookingUpSurveys,
    Matching,
    Verifying,
    Done,
}

impl Stage {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::Connecting => "connecting",
            Stage::SelectingDistrict => "selecting district",
            Stage::SelectingYear => "selecting year",
            Stage::SelectingTaluka => "selecting taluka",
            Stage::SelectingVillage => "selecting village",
            Stage::LookingUpSurveys => "looking up survey numbers",
            Stage::Matching => "matching",
            Stage::Verifying => "verifying",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Reports scrape stages to the log and, optionally, to a listener.
/// Reporting never fails, even after the listener has gone away.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl Progress {
    /// Log-only reporting.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn report(&self, stage: Stage, detail: Option<String>) {
        tracing::info!(stage = stage.label(), detail = detail.as_deref().unwrap_or(""), "scrape progress");
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent { stage, detail });
        }
    }

    pub fn stage(&self, stage: Stage) {
        self.report(stage, None);
    }
}
