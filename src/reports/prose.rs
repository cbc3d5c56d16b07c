//! LLM prose segmentation
//!
//! Completion text is opaque. It is split into paragraphs on blank lines and
//! each paragraph is assigned to summary, risk analysis or recommendations:
//!
//! 1. If any paragraph opens with a heading naming one of those sections
//!    (`Summary`, `## Risk Analysis`, `3. Recommendations:` ...), paragraphs
//!    belong to the last heading seen. Text before the first heading counts
//!    as summary.
//! 2. Otherwise assignment is positional: first paragraph summary, second
//!    risk analysis, lines of the third recommendations. Anything after the
//!    third paragraph is dropped.
//!
//! Missing sections stay empty. This is brittle against free-form answers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProseSections {
    pub summary: String,
    pub risk_analysis: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Risk,
    Recommendations,
}

/// Non-empty paragraphs, lines trimmed at the end
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

/// Drop `-`, `*`, `•` and `1.` / `1)` markers
pub fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim();
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    line
}

/// Heading section of a line plus any text after `Heading:`
fn parse_heading(line: &str) -> Option<(Section, &str)> {
    let (head, inline) = match line.split_once(':') {
        Some((head, rest)) => (head, rest.trim().trim_matches('*').trim()),
        None => (line, ""),
    };
    let head = strip_bullet(head.trim_start_matches('#'))
        .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    let section = match head.to_lowercase().as_str() {
        "summary" | "concise summary" | "executive summary" => Section::Summary,
        "risk" | "risks" | "risk analysis" | "risk assessment" => Section::Risk,
        "recommendation" | "recommendations" | "specific recommendations" => Section::Recommendations,
        _ => return None,
    };
    Some((section, inline))
}

fn recommendation_lines(paragraph: &str) -> impl Iterator<Item = String> + '_ {
    paragraph
        .lines()
        .map(strip_bullet)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

pub fn segment_prose(text: &str) -> ProseSections {
    let paras = paragraphs(text);
    let has_headings = paras
        .iter()
        .any(|p| p.lines().next().and_then(parse_heading).is_some());

    if has_headings {
        segment_by_heading(&paras)
    } else {
        segment_by_position(&paras)
    }
}

fn segment_by_position(paras: &[String]) -> ProseSections {
    ProseSections {
        summary: paras.first().cloned().unwrap_or_default(),
        risk_analysis: paras.get(1).cloned().unwrap_or_default(),
        recommendations: paras
            .get(2)
            .map(|p| recommendation_lines(p).collect())
            .unwrap_or_default(),
    }
}

fn segment_by_heading(paras: &[String]) -> ProseSections {
    let mut summary: Vec<String> = Vec::new();
    let mut risk: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    let mut current = Section::Summary;

    for para in paras {
        let mut lines = para.lines();
        let first = lines.next().unwrap_or_default();

        let body = match parse_heading(first) {
            Some((section, inline)) => {
                current = section;
                let rest: Vec<&str> = std::iter::once(inline)
                    .chain(lines)
                    .filter(|l| !l.trim().is_empty())
                    .collect();
                rest.join("\n")
            }
            None => para.clone(),
        };
        if body.is_empty() {
            continue;
        }

        match current {
            Section::Summary => summary.push(body),
            Section::Risk => risk.push(body),
            Section::Recommendations => recommendations.extend(recommendation_lines(&body)),
        }
    }

    ProseSections {
        summary: summary.join("\n\n"),
        risk_analysis: risk.join("\n\n"),
        recommendations,
    }
}
