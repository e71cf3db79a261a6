//! The research cycle: plan, gather, analyze, critique, revise, finalize
//!
//! [`ResearchOrchestrator`] owns the orchestrator LLM, the three specialists
//! and a [`RevisionPolicy`]. Each call to [`run`](ResearchOrchestrator::run)
//! creates a fresh [`ResearchSession`] and a fresh [`StepBudget`], so runs
//! share no mutable state.

pub mod policy;
pub(crate) mod report;
pub mod session;

pub use policy::{CompletenessPolicy, CritiqueVerdictPolicy, RevisionPolicy};
pub use session::{ResearchPhase, ResearchSession};

use research_llm::{CompletionRequest, LLMError, LLMProvider};
use research_runtime::StepBudget;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{ResearchConfig, build_llm_provider};
use crate::error::{ResearchError, Result};
use crate::gateway::{MarketDataGateway, NewsGateway};
use crate::model::ResearchReport;
use crate::prompts::{Prompt, PromptLibrary};
use crate::specialists::{
    FundamentalAnalyst, SentimentAnalyst, Specialist, SpecialistKind, SpecialistReport,
    TechnicalAnalyst,
};
use crate::tools::{FundamentalsTool, NewsSearchTool, QuoteTool, TechnicalSummaryTool};

const ORCHESTRATOR_SYSTEM: &str =
    "You are the lead equity research analyst. Be precise, cite figures and never invent data.";

/// Plan heading that introduces each specialist's objective
fn plan_heading(kind: SpecialistKind) -> &'static str {
    match kind {
        SpecialistKind::Fundamental => "FUNDAMENTAL:",
        SpecialistKind::Technical => "TECHNICAL:",
        SpecialistKind::Sentiment => "SENTIMENT:",
    }
}

fn default_objective(kind: SpecialistKind) -> &'static str {
    match kind {
        SpecialistKind::Fundamental => {
            "Assess valuation, profitability and balance-sheet health from the quote and financial data."
        }
        SpecialistKind::Technical => {
            "Assess the trend against the 20, 50 and 200 day moving averages, RSI and the trade signal."
        }
        SpecialistKind::Sentiment => {
            "Summarize recent news flow and classify the overall market tone."
        }
    }
}

/// Plan used when the planner cannot be reached
pub fn default_plan() -> String {
    SpecialistKind::ALL
        .iter()
        .map(|&kind| format!("{} {}", plan_heading(kind), default_objective(kind)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The objective for `kind` from a plan, or its default when the plan has none
pub fn objective_for(plan: &str, kind: SpecialistKind) -> String {
    let heading = plan_heading(kind);
    plan.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '#', ' ']).trim_start())
        .find_map(|line| {
            let head = line.get(..heading.len())?;
            head.eq_ignore_ascii_case(heading)
                .then(|| line[heading.len()..].trim_matches(['*', ' ']).to_string())
        })
        .filter(|objective| !objective.is_empty())
        .unwrap_or_else(|| default_objective(kind).to_string())
}

/// Trim and upper-case a user supplied ticker
pub fn normalize_ticker(input: &str) -> Result<String> {
    let ticker = input.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ResearchError::InvalidTicker(input.to_string()));
    }
    Ok(ticker)
}

/// Runs research sessions
///
/// # Example
///
/// ```no_run
/// use equity_research::{ResearchConfig, ResearchOrchestrator};
///
/// # async fn example() -> equity_research::Result<()> {
/// let config = ResearchConfig::from_env()?;
/// let orchestrator = ResearchOrchestrator::from_config(&config)?;
/// let report = orchestrator.run("aapl").await?;
/// println!("{}", report.to_markdown());
/// # Ok(())
/// # }
/// ```
pub struct ResearchOrchestrator {
    llm: Arc<dyn LLMProvider>,
    prompts: Arc<PromptLibrary>,
    fundamental: Arc<dyn Specialist>,
    technical: Arc<dyn Specialist>,
    sentiment: Arc<dyn Specialist>,
    policy: Arc<dyn RevisionPolicy>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    max_iterations: usize,
    step_limit: usize,
}

impl ResearchOrchestrator {
    pub fn builder(config: ResearchConfig) -> ResearchOrchestratorBuilder {
        ResearchOrchestratorBuilder::new(config)
    }

    /// Wire the live providers named by `config`
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        Self::builder(config.clone())
            .llm(build_llm_provider(config)?)
            .market_gateway(MarketDataGateway::from_config(config)?)
            .news_gateway(NewsGateway::from_config(config)?)
            .build()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// Research one ticker and return the final report
    pub async fn run(&self, ticker: &str) -> Result<ResearchReport> {
        self.run_session(ticker).await.map(|(_, report)| report)
    }

    /// Like [`run`](Self::run), also returning the finished session
    #[instrument(skip_all, fields(ticker = %ticker.trim()))]
    pub async fn run_session(&self, ticker: &str) -> Result<(ResearchSession, ResearchReport)> {
        let ticker = normalize_ticker(ticker)?;
        let budget = StepBudget::new(self.step_limit);
        let mut session = ResearchSession::new(ticker);
        info!(
            session_id = %session.id,
            max_iterations = self.max_iterations,
            step_limit = self.step_limit,
            "Research session started"
        );

        while !session.is_finalizing() {
            info!(phase = %session.phase, iteration = session.iteration_count, "Entering phase");
            session = match session.phase {
                ResearchPhase::Planning => self.plan(session, &budget).await,
                ResearchPhase::Gathering => self.gather(session, &budget).await,
                ResearchPhase::Analyzing => self.analyze(session, &budget).await?,
                ResearchPhase::Critiquing => self.critique(session, &budget).await,
                ResearchPhase::Revising => session.begin_revision(),
                ResearchPhase::Finalizing => session,
            };
        }

        let (session, report) = self.finalize(session, &budget).await;
        info!(
            session_id = %session.id,
            iterations = session.iteration_count,
            steps_used = session.steps_used,
            data_gaps = session.data_gaps.len(),
            confidence = report.confidence,
            "Research session finished"
        );
        Ok((session, report))
    }

    async fn plan(&self, session: ResearchSession, budget: &StepBudget) -> ResearchSession {
        if !budget.try_consume() {
            warn!("Step budget exhausted before planning");
            return session.into_finalizing();
        }

        let plan = match self.ask(Prompt::Planner, json!({ "ticker": session.ticker })).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "Planner failed, using default plan");
                default_plan()
            }
        };
        session.with_plan(plan)
    }

    async fn gather(&self, session: ResearchSession, budget: &StepBudget) -> ResearchSession {
        let ticker = session.ticker.as_str();
        let plan = session.research_plan.as_str();
        let (fundamental, technical, sentiment) = tokio::join!(
            Self::delegate(self.fundamental.as_ref(), ticker, plan, budget),
            Self::delegate(self.technical.as_ref(), ticker, plan, budget),
            Self::delegate(self.sentiment.as_ref(), ticker, plan, budget),
        );

        let session = session.absorb([fundamental, technical, sentiment]);
        info!(
            metrics = session.stock_data.len(),
            news = session.news_data.len(),
            data_gaps = session.data_gaps.len(),
            "Gathering completed"
        );
        session
    }

    async fn delegate(
        specialist: &dyn Specialist,
        ticker: &str,
        plan: &str,
        budget: &StepBudget,
    ) -> SpecialistReport {
        let kind = specialist.kind();
        if !budget.try_consume() {
            warn!(specialist = %kind, "Step budget exhausted, specialist skipped");
            return SpecialistReport::skipped(kind, "step budget exhausted");
        }
        specialist.investigate(ticker, &objective_for(plan, kind)).await
    }

    async fn analyze(&self, session: ResearchSession, budget: &StepBudget) -> Result<ResearchSession> {
        if !budget.try_consume() {
            warn!("Step budget exhausted before analysis");
            return Ok(session.into_finalizing());
        }

        let revising = session.iteration_count > 0;
        let notes: Vec<_> = session
            .specialist_notes
            .iter()
            .map(|(kind, text)| json!({ "name": kind.name(), "text": text }))
            .collect();
        let vars = json!({
            "ticker": session.ticker,
            "plan": session.research_plan,
            "stock_data": serde_json::to_string_pretty(&session.stock_data)?,
            "news": session.news_data,
            "notes": notes,
            "data_gaps": session.data_gaps,
            "previous_analysis": revising.then_some(&session.analysis),
            "critique": revising.then_some(&session.critique),
            "iteration": session.iteration_count,
        });

        match self.ask(Prompt::Analyst, vars).await {
            Ok(analysis) => Ok(session.with_analysis(analysis)),
            Err(e) if revising => {
                warn!(error = %e, "Revision failed, keeping previous draft");
                Ok(session.into_finalizing())
            }
            Err(e) => Err(e),
        }
    }

    async fn critique(&self, session: ResearchSession, budget: &StepBudget) -> ResearchSession {
        if !budget.try_consume() {
            warn!("Step budget exhausted before critique");
            return session.into_finalizing();
        }

        let vars = json!({
            "ticker": session.ticker,
            "analysis": session.analysis,
            "data_gaps": session.data_gaps,
        });
        match self.ask(Prompt::Critic, vars).await {
            Ok(critique) => {
                let session = session.with_critique(critique);
                let needs_revision = self.policy.needs_revision(&session);
                info!(
                    iteration = session.iteration_count,
                    needs_revision, "Critique completed"
                );
                session.route(needs_revision, self.max_iterations)
            }
            Err(e) => {
                warn!(error = %e, "Critique failed, accepting draft");
                session.route(false, self.max_iterations)
            }
        }
    }

    async fn finalize(
        &self,
        session: ResearchSession,
        budget: &StepBudget,
    ) -> (ResearchSession, ResearchReport) {
        let report = if session.analysis.is_empty() || !budget.try_consume() {
            info!("Composing report without the model");
            report::compose_fallback(&session)
        } else {
            match self.ask(Prompt::Report, report::prompt_vars(&session)).await {
                Ok(text) => match report::parse_draft(&text) {
                    Some(draft) => report::compose(&session, draft),
                    None => {
                        warn!("Report reply was not valid JSON, composing report from session");
                        report::compose_fallback(&session)
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Report generation failed, composing report from session");
                    report::compose_fallback(&session)
                }
            }
        };

        let session = session
            .with_final_report(report.to_markdown())
            .with_steps_used(budget.used());
        (session, report)
    }

    /// One orchestrator LLM call without tools
    async fn ask<S: serde::Serialize>(&self, prompt: Prompt, vars: S) -> Result<String> {
        let content = self.prompts.render(prompt, vars)?;
        let request = CompletionRequest::builder(&self.model)
            .user(content)
            .system(ORCHESTRATOR_SYSTEM)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = self.llm.complete(request).await?;
        debug!(
            prompt = prompt.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Orchestrator LLM call completed"
        );

        response.text().ok_or_else(|| {
            LLMError::UnexpectedResponse(format!("empty reply to {}", prompt.name())).into()
        })
    }
}

/// Builder for [`ResearchOrchestrator`]
///
/// Specialists not set explicitly are built from the market and news
/// gateways, which are then required.
pub struct ResearchOrchestratorBuilder {
    config: ResearchConfig,
    llm: Option<Arc<dyn LLMProvider>>,
    market: Option<MarketDataGateway>,
    news: Option<NewsGateway>,
    fundamental: Option<Arc<dyn Specialist>>,
    technical: Option<Arc<dyn Specialist>>,
    sentiment: Option<Arc<dyn Specialist>>,
    policy: Option<Arc<dyn RevisionPolicy>>,
}

impl ResearchOrchestratorBuilder {
    pub fn new(config: ResearchConfig) -> Self {
        Self {
            config,
            llm: None,
            market: None,
            news: None,
            fundamental: None,
            technical: None,
            sentiment: None,
            policy: None,
        }
    }

    /// LLM used by the orchestrator phases and by the specialists
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn market_gateway(mut self, gateway: MarketDataGateway) -> Self {
        self.market = Some(gateway);
        self
    }

    pub fn news_gateway(mut self, gateway: NewsGateway) -> Self {
        self.news = Some(gateway);
        self
    }

    /// Replace the specialist of the same kind
    pub fn specialist(mut self, specialist: Arc<dyn Specialist>) -> Self {
        let slot = match specialist.kind() {
            SpecialistKind::Fundamental => &mut self.fundamental,
            SpecialistKind::Technical => &mut self.technical,
            SpecialistKind::Sentiment => &mut self.sentiment,
        };
        *slot = Some(specialist);
        self
    }

    /// Defaults to [`CritiqueVerdictPolicy`]
    pub fn revision_policy(mut self, policy: impl RevisionPolicy + 'static) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = Some(max_steps);
        self
    }

    pub fn build(self) -> Result<ResearchOrchestrator> {
        let config = self.config;
        let llm = self
            .llm
            .ok_or_else(|| ResearchError::Configuration("no LLM provider configured".to_string()))?;
        let prompts = Arc::new(PromptLibrary::new()?);

        let missing = |what: &str| {
            ResearchError::Configuration(format!("{what} gateway is required to build specialists"))
        };

        let fundamental: Arc<dyn Specialist> = match self.fundamental {
            Some(specialist) => specialist,
            None => {
                let market = self.market.clone().ok_or_else(|| missing("market data"))?;
                Arc::new(FundamentalAnalyst::new(
                    QuoteTool::new(market.clone()),
                    FundamentalsTool::new(market),
                    llm.clone(),
                    prompts.clone(),
                    &config,
                )?)
            }
        };
        let technical: Arc<dyn Specialist> = match self.technical {
            Some(specialist) => specialist,
            None => {
                let market = self.market.clone().ok_or_else(|| missing("market data"))?;
                Arc::new(TechnicalAnalyst::new(
                    TechnicalSummaryTool::new(market),
                    llm.clone(),
                    prompts.clone(),
                    &config,
                )?)
            }
        };
        let sentiment: Arc<dyn Specialist> = match self.sentiment {
            Some(specialist) => specialist,
            None => {
                let news = self.news.clone().ok_or_else(|| missing("news"))?;
                Arc::new(SentimentAnalyst::new(
                    NewsSearchTool::new(news, config.news_max_results),
                    llm.clone(),
                    prompts.clone(),
                    &config,
                )?)
            }
        };

        Ok(ResearchOrchestrator {
            llm,
            prompts,
            fundamental,
            technical,
            sentiment,
            policy: self
                .policy
                .unwrap_or_else(|| Arc::new(CritiqueVerdictPolicy::default())),
            model: config.model().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_iterations,
            step_limit: config.step_limit(),
        })
    }
}
