//! Research session state and its phase transitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::model::NewsItem;
use crate::specialists::{SpecialistKind, SpecialistReport};

/// Phases of one research cycle
///
/// `Planning → Gathering → Analyzing → Critiquing → (Revising → Analyzing | Finalizing)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchPhase {
    Planning,
    Gathering,
    Analyzing,
    Critiquing,
    Revising,
    Finalizing,
}

impl fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planning => "planning",
            Self::Gathering => "gathering",
            Self::Analyzing => "analyzing",
            Self::Critiquing => "critiquing",
            Self::Revising => "revising",
            Self::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Everything known about one ticker analysis
///
/// Transitions take the session by value and hand back the updated one, so a
/// session is only ever advanced by whoever currently owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    pub id: Uuid,
    pub ticker: String,
    pub phase: ResearchPhase,
    /// Number of revisions performed so far
    pub iteration_count: usize,
    pub needs_revision: bool,
    pub research_plan: String,
    pub stock_data: BTreeMap<String, Value>,
    pub news_data: Vec<NewsItem>,
    pub analysis: String,
    pub critique: String,
    pub final_report: String,
    pub specialist_notes: BTreeMap<SpecialistKind, String>,
    pub data_gaps: Vec<String>,
    pub steps_used: usize,
}

impl ResearchSession {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            phase: ResearchPhase::Planning,
            iteration_count: 0,
            needs_revision: false,
            research_plan: String::new(),
            stock_data: BTreeMap::new(),
            news_data: Vec::new(),
            analysis: String::new(),
            critique: String::new(),
            final_report: String::new(),
            specialist_notes: BTreeMap::new(),
            data_gaps: Vec::new(),
            steps_used: 0,
        }
    }

    pub fn is_finalizing(&self) -> bool {
        self.phase == ResearchPhase::Finalizing
    }

    /// Planning → Gathering
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.research_plan = plan.into();
        self.phase = ResearchPhase::Gathering;
        self
    }

    /// Gathering → Analyzing, folding in every specialist report
    pub fn absorb(mut self, reports: impl IntoIterator<Item = SpecialistReport>) -> Self {
        for report in reports {
            self.stock_data.extend(report.metrics);
            self.news_data.extend(report.news);
            for gap in report.gaps {
                self.record_gap(gap);
            }
            self.specialist_notes.insert(report.kind, report.analysis);
        }
        self.phase = ResearchPhase::Analyzing;
        self
    }

    /// Analyzing → Critiquing
    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = analysis.into();
        self.phase = ResearchPhase::Critiquing;
        self
    }

    /// Records the critique; the phase moves on in [`route`](Self::route)
    pub fn with_critique(mut self, critique: impl Into<String>) -> Self {
        self.critique = critique.into();
        self
    }

    /// Critiquing → Revising when a revision is wanted and allowed, else Finalizing
    pub fn route(mut self, needs_revision: bool, max_iterations: usize) -> Self {
        self.needs_revision = needs_revision;
        if needs_revision && self.iteration_count < max_iterations {
            self.iteration_count += 1;
            self.phase = ResearchPhase::Revising;
        } else {
            self.phase = ResearchPhase::Finalizing;
        }
        self
    }

    /// Revising → Analyzing
    pub fn begin_revision(mut self) -> Self {
        self.phase = ResearchPhase::Analyzing;
        self
    }

    /// Jump to Finalizing from any phase
    pub fn into_finalizing(mut self) -> Self {
        self.phase = ResearchPhase::Finalizing;
        self
    }

    pub fn with_final_report(mut self, report: impl Into<String>) -> Self {
        self.final_report = report.into();
        self
    }

    pub fn with_steps_used(mut self, steps: usize) -> Self {
        self.steps_used = steps;
        self
    }

    /// Append a gap note unless an identical one is already recorded
    pub fn record_gap(&mut self, gap: impl Into<String>) {
        let gap = gap.into();
        if !self.data_gaps.contains(&gap) {
            self.data_gaps.push(gap);
        }
    }
}
