use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One rule in the fixed policy corpus. The corpus is loaded once at startup
/// and immutable for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub title: String,
    pub body: String,
}

/// Produced per lookup; read-only and not persisted beyond the response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCitation {
    pub policy_id: String,
    pub excerpt: String,
    pub match_score: usize,
}

#[derive(Debug, Error)]
pub enum PolicyCorpusError {
    #[error("policy corpus contains no `### POLICY-NNN:` sections")]
    NoPolicies,
    #[error("duplicate policy id `{0}` in corpus")]
    DuplicateId(String),
}

// Connective words carry no citation signal and would make near-empty
// messages match every policy.
const STOPWORDS: &[&str] = &[
    "all", "and", "any", "are", "but", "can", "each", "for", "from", "has", "have", "her", "his",
    "into", "its", "may", "not", "our", "per", "that", "the", "their", "then", "this", "was",
    "when", "while", "with", "you", "your",
];

#[derive(Debug)]
struct IndexedPolicy {
    policy: Policy,
    keywords: BTreeSet<String>,
}

/// Keyword-overlap lookup over the policy corpus. Intentionally simple: no
/// stemming, no embeddings, fully deterministic so citations are reproducible
/// for identical input.
#[derive(Debug)]
pub struct PolicyService {
    policies: Vec<IndexedPolicy>,
}

impl PolicyService {
    pub fn new(policies: Vec<Policy>) -> Self {
        let policies = policies
            .into_iter()
            .map(|policy| {
                let keywords = tokenize(&format!("{} {}", policy.title, policy.body));
                IndexedPolicy { policy, keywords }
            })
            .collect();
        Self { policies }
    }

    /// The built-in retail-banking corpus used when no external corpus file
    /// is configured.
    pub fn builtin() -> Self {
        Self::new(builtin_corpus())
    }

    /// Parses a markdown corpus of `### POLICY-NNN: Title` sections, each
    /// followed by its body text until the next heading or rule.
    pub fn from_markdown(content: &str) -> Result<Self, PolicyCorpusError> {
        let mut policies: Vec<Policy> = Vec::new();
        let mut current: Option<Policy> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if let Some(heading) = trimmed.strip_prefix("### ") {
                if let Some(policy) = current.take() {
                    policies.push(policy);
                }
                current = heading.split_once(':').and_then(|(id, title)| {
                    let id = id.trim();
                    id.starts_with("POLICY-").then(|| Policy {
                        id: id.to_owned(),
                        title: title.trim().to_owned(),
                        body: String::new(),
                    })
                });
                continue;
            }

            if trimmed.starts_with("##") || trimmed.starts_with("---") {
                if let Some(policy) = current.take() {
                    policies.push(policy);
                }
                continue;
            }

            if let Some(policy) = current.as_mut() {
                if !trimmed.is_empty() {
                    if !policy.body.is_empty() {
                        policy.body.push(' ');
                    }
                    policy.body.push_str(trimmed);
                }
            }
        }
        if let Some(policy) = current.take() {
            policies.push(policy);
        }

        if policies.is_empty() {
            return Err(PolicyCorpusError::NoPolicies);
        }
        let mut seen = BTreeSet::new();
        for policy in &policies {
            if !seen.insert(policy.id.clone()) {
                return Err(PolicyCorpusError::DuplicateId(policy.id.clone()));
            }
        }

        Ok(Self::new(policies))
    }

    pub fn get(&self, policy_id: &str) -> Option<&Policy> {
        self.policies.iter().map(|indexed| &indexed.policy).find(|policy| policy.id == policy_id)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Scores every policy by keyword overlap with `text`, keeps positive
    /// scores, and orders by descending score with ties broken by ascending
    /// policy id. An empty result is a normal outcome, not an error.
    pub fn cite(&self, text: &str) -> Vec<PolicyCitation> {
        let message_keywords = tokenize(text);

        let mut citations: Vec<PolicyCitation> = self
            .policies
            .iter()
            .filter_map(|indexed| {
                let match_score =
                    indexed.keywords.intersection(&message_keywords).count();
                (match_score > 0).then(|| PolicyCitation {
                    policy_id: indexed.policy.id.clone(),
                    excerpt: excerpt_of(&indexed.policy.body),
                    match_score,
                })
            })
            .collect();

        citations.sort_by(|a, b| {
            b.match_score.cmp(&a.match_score).then_with(|| a.policy_id.cmp(&b.policy_id))
        });
        citations
    }
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|token| token.len() >= 3 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

fn excerpt_of(body: &str) -> String {
    match body.find('.') {
        Some(index) => body[..=index].trim().to_owned(),
        None => body.trim().to_owned(),
    }
}

fn builtin_corpus() -> Vec<Policy> {
    let entries = [
        (
            "POLICY-001",
            "Card Replacement",
            "Replacement cards are issued within seven business days of a request. Expedited \
             delivery is available when the cardholder pays the expedited shipping fee. A \
             replacement keeps the existing PIN unless the cardholder asks otherwise.",
        ),
        (
            "POLICY-002",
            "Lost or Stolen Card Reporting",
            "A lost or stolen card is blocked at the moment the report is received. The bank \
             issues a replacement immediately and caps cardholder liability at fifty dollars \
             when the loss is reported within two business days.",
        ),
        (
            "POLICY-003",
            "Disputed or Unauthorized Charges",
            "A disputed or unauthorized charge can be contested within sixty days of the \
             statement date. Provisional credit posts within ten business days during the \
             investigation. Confirmed fraud removes the charge entirely.",
        ),
        (
            "POLICY-004",
            "Withdrawal and Spending Limits",
            "Daily ATM withdrawal limits default to five hundred dollars. Point-of-sale \
             spending limits default to two thousand dollars. Temporary limit increases can be \
             requested ahead of travel or a large purchase.",
        ),
        (
            "POLICY-005",
            "Monthly Maintenance Fees",
            "Checking accounts carry a monthly maintenance fee of twelve dollars. The fee is \
             waived in any month with a qualifying direct deposit or a minimum daily balance of \
             fifteen hundred dollars.",
        ),
        (
            "POLICY-006",
            "Fee Waivers and Refunds",
            "A first-time fee may be refunded as a one-time courtesy within a rolling twelve \
             months. Further waiver requests go to an account specialist who reviews the \
             account history before deciding.",
        ),
        (
            "POLICY-007",
            "Overdraft Handling",
            "An overdraft of fifty dollars or less incurs no fee. Beyond that threshold each \
             overdraft item costs thirty dollars, capped at three items per day. Protection \
             transfers from a linked savings account are free.",
        ),
        (
            "POLICY-008",
            "Account Closure",
            "An account can be closed at any branch or by written request. A remaining balance \
             is returned by check within ten business days. Accounts carrying a negative \
             balance must be settled before closure.",
        ),
    ];

    entries
        .into_iter()
        .map(|(id, title, body)| Policy {
            id: id.to_owned(),
            title: title.to_owned(),
            body: body.to_owned(),
        })
        .collect()
}
