//! Prompt templates for the orchestrator phases and the specialists

use minijinja::Environment;
use serde::Serialize;

use crate::error::Result;

/// Templates known to the [`PromptLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Planner,
    Analyst,
    Critic,
    Report,
    FundamentalSystem,
    TechnicalSystem,
    SentimentSystem,
    SpecialistTask,
}

impl Prompt {
    pub const ALL: [Prompt; 8] = [
        Prompt::Planner,
        Prompt::Analyst,
        Prompt::Critic,
        Prompt::Report,
        Prompt::FundamentalSystem,
        Prompt::TechnicalSystem,
        Prompt::SentimentSystem,
        Prompt::SpecialistTask,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Planner => "research.planner",
            Self::Analyst => "research.analyst",
            Self::Critic => "research.critic",
            Self::Report => "research.report",
            Self::FundamentalSystem => "specialist.fundamental",
            Self::TechnicalSystem => "specialist.technical",
            Self::SentimentSystem => "specialist.sentiment",
            Self::SpecialistTask => "specialist.task",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Planner => PLANNER,
            Self::Analyst => ANALYST,
            Self::Critic => CRITIC,
            Self::Report => REPORT,
            Self::FundamentalSystem => FUNDAMENTAL_SYSTEM,
            Self::TechnicalSystem => TECHNICAL_SYSTEM,
            Self::SentimentSystem => SENTIMENT_SYSTEM,
            Self::SpecialistTask => SPECIALIST_TASK,
        }
    }
}

/// Compiled prompt templates
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for prompt in Prompt::ALL {
            env.add_template(prompt.name(), prompt.source())?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, prompt: Prompt, vars: S) -> Result<String> {
        let template = self.env.get_template(prompt.name())?;
        Ok(template.render(vars)?.trim().to_string())
    }
}

impl std::fmt::Debug for PromptLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptLibrary")
            .field("templates", &Prompt::ALL.map(Prompt::name))
            .finish()
    }
}

const PLANNER: &str = r"You are the lead equity research analyst coordinating a team of three specialists:
- fundamental-analyst: valuation, profitability and balance-sheet health (quote and financial data)
- technical-analyst: moving averages, RSI and the trade signal
- sentiment-analyst: recent news flow and market mood

Write a short research plan for {{ ticker }}. Use exactly these three headings, one line of
objective under each, describing what that specialist must cover for this company:

FUNDAMENTAL: ...
TECHNICAL: ...
SENTIMENT: ...";

const ANALYST: &str = r"You are the lead equity research analyst for {{ ticker }}.

Research plan:
{{ plan }}

Market data gathered by the team (JSON):
{{ stock_data }}

{% if news %}
News headlines:
{% for item in news %}
- {{ item.title }}{% if item.published_date %} ({{ item.published_date }}){% endif %}

{% endfor %}
{% else %}
No news articles were found.
{% endif %}

Specialist findings:
{% for note in notes %}
### {{ note.name }}
{{ note.text }}

{% endfor %}
{% if data_gaps %}
Data gaps (state each explicitly in your analysis):
{% for gap in data_gaps %}
- {{ gap }}
{% endfor %}
{% endif %}
{% if previous_analysis %}

This is revision {{ iteration }}. Your previous draft:
{{ previous_analysis }}

Reviewer critique to address:
{{ critique }}
{% endif %}

Write a unified research analysis with three sections titled Fundamental, Technical and
Sentiment, followed by a short overall view. Cite the numbers you rely on. Where data is
missing, say so instead of guessing.";

const CRITIC: &str = r"You are a senior reviewer checking an equity research draft on {{ ticker }}.

Draft:
{{ analysis }}

{% if data_gaps %}
Known data gaps:
{% for gap in data_gaps %}
- {{ gap }}
{% endfor %}
{% endif %}

Check that the draft covers fundamentals, technicals and sentiment, that its claims are
supported by the cited figures, and that the data gaps are acknowledged. List concrete
problems, if any.

End with exactly one line, either:
VERDICT: ACCEPT
or
VERDICT: REVISE";

const REPORT: &str = r#"Turn the final research analysis on {{ ticker }} into a report.

Analysis:
{{ analysis }}

{% if critique %}
Last review:
{{ critique }}
{% endif %}
{% if data_gaps %}
Data gaps:
{% for gap in data_gaps %}
- {{ gap }}
{% endfor %}
{% endif %}

Respond with a single JSON object and nothing else, using these keys:
{"summary": string, "fundamental_analysis": string, "technical_analysis": string,
 "sentiment_analysis": string, "recommendation": string, "key_risks": [string],
 "confidence": number between 0 and 1}"#;

const FUNDAMENTAL_SYSTEM: &str = r"You are a fundamental analysis specialist.

Your expertise covers valuation (P/E), profitability (EPS, net income, revenue) and
financial health (debt-to-equity). Use only get_stock_price and get_financial_data.

Interpret the figures in context, flag unusually high or low values, and state plainly
which metrics were unavailable. Do not invent numbers.";

const TECHNICAL_SYSTEM: &str = r"You are a technical analysis specialist.

Your expertise covers moving averages (20, 50 and 200 day), the 14-day RSI and the
resulting BUY/SELL/NEUTRAL signal. Use only get_technical_summary.

Explain the trend relative to each moving average, whether RSI shows overbought (above 70)
or oversold (below 30) conditions, and what the signal implies. Technical analysis is
probabilistic; say so where it matters.";

const SENTIMENT_SYSTEM: &str = r"You are a market sentiment specialist.

Your expertise covers news flow, market mood and emerging issues for a company. Use only
search_stock_news, optionally with a topic to narrow the search.

Summarize the dominant themes, classify the overall tone as positive, negative or mixed,
and name the articles your view rests on. If no news was found, say so.";

const SPECIALIST_TASK: &str = r"Ticker: {{ ticker }}
Objective: {{ objective }}

Data already gathered (JSON):
{{ data }}

{% if gaps %}
Unavailable data:
{% for gap in gaps %}
- {{ gap }}
{% endfor %}
{% endif %}

You may call your tools for anything else you need. Then write your analysis in a few
short paragraphs.";
