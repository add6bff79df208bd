//! The fixed cast of agents that write a proposal.
//!
//! Five specialist [`Role`]s each write one section. The editor merges
//! their sections and writes the two sections no specialist covers. A
//! summarizer condenses each finished section into one line for the
//! progress view.
//!
//! ## Example
//!
//! ```
//! use proposer::agents::Role;
//!
//! let risk = Role::RiskSpecialist;
//! assert_eq!(risk.display_name(), "Risk Specialist");
//! assert_eq!(risk.heading(), "Risks & Mitigation");
//! assert_eq!(risk.id(), "risk_specialist");
//! ```

pub mod editor;
pub mod specialist;
pub mod summarizer;

use std::collections::BTreeMap;

pub use editor::{combined_sections, editor_request, stream_editor};
pub use specialist::{run_specialist, specialist_request};
pub use summarizer::{fallback_summary, summarize_section, summary_request};

/// Display name used in status events for the editor pass.
pub const EDITOR_NAME: &str = "Editor";

/// System instruction for the editor pass.
pub const EDITOR_INSTRUCTION: &str = "You are a lead consultant. Combine the following sections written by your team into one cohesive proposal. Ensure the flow is logical, language is professional, and there is no duplication. The final output must have exactly these seven headings: 1. Executive Summary, 2. Market & Strategic Context, 3. Key Problem Areas, 4. Proposed Consulting Approach, 5. Value Proposition of Your Consulting Firm, 6. Financial & Strategic Impact, 7. Risks & Mitigation. You will receive sections 2\u{2011}6 from your team; you must also write the Executive Summary (section 1) and the Value Proposition (section 5) yourself, based on the overall content. Then assemble everything into a single markdown document.";

/// System instruction for one-line section summaries.
pub const SUMMARY_INSTRUCTION: &str =
    "Summarize the following section in one concise sentence (max 15 words).";

/// Top-level headings of the finished proposal, in order.
pub const FINAL_HEADINGS: [&str; 7] = [
    "Executive Summary",
    "Market & Strategic Context",
    "Key Problem Areas",
    "Proposed Consulting Approach",
    "Value Proposition of Your Consulting Firm",
    "Financial & Strategic Impact",
    "Risks & Mitigation",
];

/// Section text keyed by the role that wrote it, iterated in role order.
pub type SectionResults = BTreeMap<Role, String>;

/// One of the five specialist roles.
///
/// Roles are static configuration: each is bound to an identifier, a
/// display name, the heading of the section it writes and its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    MarketAnalyst,
    ProblemAnalyst,
    StrategyArchitect,
    FinancialAnalyst,
    RiskSpecialist,
}

struct RoleSpec {
    id: &'static str,
    display_name: &'static str,
    heading: &'static str,
    instruction: &'static str,
}

// Indexed by `Role as usize`; order matches `Role::ALL`.
const ROLE_TABLE: [RoleSpec; 5] = [
    RoleSpec {
        id: "market_analyst",
        display_name: "Market Analyst",
        heading: "Market & Strategic Context",
        instruction: "You are a senior market analyst specialised in GCC financial services. Based on the context provided, write the \"Market & Strategic Context\" section of a transformation proposal. Include: GCC banking competition, regulatory shifts, customer behaviour shifts, Islamic banking growth trends, and impact of national transformation programmes. Use markdown headings and bullet points.",
    },
    RoleSpec {
        id: "problem_analyst",
        display_name: "Problem Analyst",
        heading: "Key Problem Areas",
        instruction: "You are a strategy consultant. Based on the context, write the \"Key Problem Areas\" section. Structure it into Strategic, Operational, Technology, and Talent & Organisation sub\u{2011}sections. Be specific and use the data given (cost\u{2011}to\u{2011}income 58%, youth acquisition drop 20%, etc.).",
    },
    RoleSpec {
        id: "strategy_architect",
        display_name: "Strategy Architect",
        heading: "Proposed Consulting Approach",
        instruction: "You are a transformation expert. Write the \"Proposed Consulting Approach\" section, detailing the three phases (Diagnostic, Strategy Design, Implementation) with deliverables. Use the suggested timeline (8\u{2011}10 weeks for phase 1) and be precise.",
    },
    RoleSpec {
        id: "financial_analyst",
        display_name: "Financial Analyst",
        heading: "Financial & Strategic Impact",
        instruction: "You are a financial analyst. Write the \"Financial & Strategic Impact\" section. Estimate cost reduction potential (e.g., 10\u{2011}15% opex savings), revenue uplift, cost\u{2011}to\u{2011}income improvement, market share growth, and NPS improvement. Base on reasonable assumptions and the bank's current figures.",
    },
    RoleSpec {
        id: "risk_specialist",
        display_name: "Risk Specialist",
        heading: "Risks & Mitigation",
        instruction: "You are a risk management expert. Write the \"Risks & Mitigation\" section. Consider regional realities: regulatory delays, Shariah compliance, cultural resistance, talent scarcity, macroeconomic volatility. Propose mitigation strategies. Use a table if helpful.",
    },
];

impl Role {
    /// All roles in the fixed dispatch and document order.
    pub const ALL: [Role; 5] = [
        Role::MarketAnalyst,
        Role::ProblemAnalyst,
        Role::StrategyArchitect,
        Role::FinancialAnalyst,
        Role::RiskSpecialist,
    ];

    fn spec(self) -> &'static RoleSpec {
        &ROLE_TABLE[self as usize]
    }

    /// Stable snake_case identifier, e.g. `market_analyst`.
    pub fn id(self) -> &'static str {
        self.spec().id
    }

    /// Human-readable name shown in progress events.
    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    /// Heading of the section this role writes.
    pub fn heading(self) -> &'static str {
        self.spec().heading
    }

    /// System instruction sent with this role's request.
    pub fn instruction(self) -> &'static str {
        self.spec().instruction
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
