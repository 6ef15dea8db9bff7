// Draft Content-Security-Policy assembled from a domain summary

use crate::aggregate::DomainSummary;
use crate::directive::Directive;
use cspscout_scanner::normalize::UNKNOWN_TOKEN;

const SELF_SOURCE: &str = "'self'";

/// Build a starting-point policy: `default-src 'self'` plus one clause per
/// directive that saw external resources. `unknown` tokens are left out.
pub fn draft_policy(summary: &DomainSummary) -> String {
    let mut clauses = Vec::new();
    let mut default_sources = vec![SELF_SOURCE.to_string()];

    for (directive, tokens) in summary {
        // BTreeMap keys are already sorted.
        let sources: Vec<&str> = tokens
            .keys()
            .map(String::as_str)
            .filter(|token| *token != UNKNOWN_TOKEN)
            .collect();

        if *directive == Directive::DefaultSrc {
            default_sources.extend(sources.iter().map(|s| s.to_string()));
            continue;
        }
        if sources.is_empty() {
            continue;
        }
        clauses.push(format!(
            "{} {} {}",
            directive.as_str(),
            SELF_SOURCE,
            sources.join(" ")
        ));
    }

    let mut policy = vec![format!(
        "{} {}",
        Directive::DefaultSrc.as_str(),
        default_sources.join(" ")
    )];
    policy.extend(clauses);
    policy.join("; ")
}
