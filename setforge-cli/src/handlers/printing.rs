//! Human-readable summaries printed to stderr alongside the machine-readable
//! `--format` output on stdout.

use std::fmt::Write;

use setforge_cache::CacheStats;
use setforge_suggest::Suggestion;
use setforge_validator::{Issue, IssueKind, QualityScore};

pub fn quality(score: &QualityScore) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    writeln!(output, "Quality: {:.1}%", score.percent)?;
    let mut categories: Vec<_> = score.category_scores.iter().collect();
    categories.sort_by_key(|(name, _)| *name);
    for (name, value) in categories {
        writeln!(output, "\t{name}: {value:.2}")?;
    }
    Ok(output)
}

pub fn issues(issues: &[Issue]) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    if issues.is_empty() {
        writeln!(output, "Issues: none")?;
        return Ok(output);
    }
    writeln!(output, "Issues ({}):", issues.len())?;
    for issue in issues {
        let marker = match issue.kind {
            IssueKind::Error => "E",
            IssueKind::Warning => "W",
            IssueKind::Info => "I",
            IssueKind::Suggestion => "S",
        };
        match issue.track_index {
            Some(index) => writeln!(output, "\t[{marker}] ({index}) {}", issue.message)?,
            None => writeln!(output, "\t[{marker}] {}", issue.message)?,
        }
    }
    Ok(output)
}

pub fn cache_stats(stats: &CacheStats) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    writeln!(output, "Cache:")?;
    writeln!(output, "\tfiles: {}", stats.total_files)?;
    writeln!(output, "\tsize: {} bytes", stats.total_size_bytes)?;
    writeln!(output, "\tcreated: {}", stats.created)?;
    writeln!(output, "\tlast cleanup: {}", stats.last_cleanup)?;
    Ok(output)
}

pub fn suggestions(prefix: &str, suggestions: &[Suggestion]) -> Result<String, std::fmt::Error> {
    let mut output = String::new();
    writeln!(output, "{prefix}:")?;
    for (rank, suggestion) in suggestions.iter().enumerate() {
        writeln!(
            output,
            "\t{}: {} (compat {:.2}) — {}",
            rank + 1,
            suggestion.track_id,
            suggestion.compat,
            suggestion.reason
        )?;
    }
    Ok(output)
}
