//! Freeform-to-template parser.
//!
//! The model output loosely follows the playbook convention (title line, risk
//! summary, EVENT blocks with a Context section and scenario entries) but is
//! unreliable about exact placement: structural labels get glued onto the end
//! of the preceding line, bullet markers vary, and emoji are sometimes used
//! in place of plain labels.
//!
//! Parsing runs in three passes:
//! 1. a cleanup pass that strips citation markers and tidies whitespace,
//! 2. an ordered table of rewrite rules that canonicalize each line
//!    (split glued labels, normalize emoji markers and dash variants),
//! 3. a classification pass that types each line and enforces the per-event
//!    caps (3 context bullets, 3 scenario entries).

use regex::Regex;
use tracing::debug;

/// Maximum context bullets kept per event block.
pub const MAX_CONTEXT_BULLETS: usize = 3;

/// Maximum scenario entries (headline + focus/rationale pair) kept per event.
pub const MAX_SCENARIOS: usize = 3;

/// Hyphen lookalikes the model may emit in place of a plain hyphen.
const DASHES: &str = r"\-\x{2010}\x{2011}\x{2012}\x{2013}\x{2212}";

/// Classification of a normalized playbook line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    RiskOn,
    RiskOff,
    EventHeading,
    ContextLabel,
    ContextBullet,
    ScenarioHeadline,
    ScenarioFocus,
    ScenarioRationale,
    /// Unrecognized content outside any event block, kept as-is.
    Passthrough,
}

/// One classified line of the normalized sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

/// A single canonicalization rule: pattern in, replacement out.
///
/// Replacements may contain `\n`; the rewritten line is re-split afterwards.
struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Parses loosely structured playbook text into a normalized line sequence.
pub struct PlaybookParser {
    rules: Vec<RewriteRule>,
    event_re: Regex,
    context_re: Regex,
    focus_re: Regex,
    rationale_re: Regex,
    citation_multi: Regex,
    citation_block: Regex,
    citation_single: Regex,
    double_space: Regex,
    space_before_punct: Regex,
}

impl PlaybookParser {
    pub fn new() -> Self {
        let rules = vec![
            RewriteRule {
                name: "emoji-event-marker",
                pattern: Regex::new(r"^\s*🌍\s*(?i:EVENT)\b").unwrap(),
                replacement: "EVENT",
            },
            RewriteRule {
                name: "emoji-context-label",
                pattern: Regex::new(r"(?i)^\s*📝\s*CONTEXT\s*:\s*").unwrap(),
                replacement: "Context:\n",
            },
            RewriteRule {
                name: "glued-context-label",
                pattern: Regex::new(r"(?i)\s+(?:📝\s*)?CONTEXT\s*:\s*").unwrap(),
                replacement: "\nContext:\n",
            },
            RewriteRule {
                name: "emoji-scenario-marker",
                pattern: Regex::new(r"^\s*🧩\s*").unwrap(),
                replacement: "• ",
            },
            RewriteRule {
                name: "glued-event-heading",
                pattern: Regex::new(r"(?i)\s+(EVENT\s+\d+\s*:)").unwrap(),
                replacement: "\n\n$1",
            },
            RewriteRule {
                name: "glued-title",
                pattern: Regex::new(r"\s+(Daily Macro & Trading Playbook)").unwrap(),
                replacement: "\n\n$1",
            },
            RewriteRule {
                name: "glued-risk-line",
                pattern: Regex::new(r"\s+(🟢 Risk\-On:|🔴 Risk\-Off:)").unwrap(),
                replacement: "\n$1",
            },
            RewriteRule {
                name: "inline-focus-label",
                pattern: Regex::new(&format!(
                    r"(?i)\s+[{DASHES}]\s*(Focus|Trade|Market Reaction)\s*:"
                ))
                .unwrap(),
                replacement: "\n- $1:",
            },
            RewriteRule {
                name: "inline-rationale-label",
                pattern: Regex::new(&format!(r"(?i)\s+[{DASHES}]\s*(Rationale)\s*:")).unwrap(),
                replacement: "\n- $1:",
            },
            RewriteRule {
                name: "inline-scenario-bullet",
                pattern: Regex::new(r"\s+•\s*").unwrap(),
                replacement: "\n• ",
            },
        ];

        Self {
            rules,
            event_re: Regex::new(r"(?i)^EVENT\s+(\d+)\s*:\s*(.+)$").unwrap(),
            context_re: Regex::new(r"(?i)^Context:\s*$").unwrap(),
            focus_re: Regex::new(&format!(
                r"(?i)^[{DASHES}]\s*(?:focus|trade|market reaction)\s*:\s*(.+)$"
            ))
            .unwrap(),
            rationale_re: Regex::new(&format!(r"(?i)^[{DASHES}]\s*rationale\s*:\s*(.+)$"))
                .unwrap(),
            citation_multi: Regex::new(r"(?:\[\d+\]){2,}").unwrap(),
            citation_block: Regex::new(r"\[(?:\d+\s*)+\]").unwrap(),
            citation_single: Regex::new(r"\[\d+\]").unwrap(),
            double_space: Regex::new(r"[ \t]{2,}").unwrap(),
            space_before_punct: Regex::new(r"[ \t]+([,.;:])").unwrap(),
        }
    }

    /// Parse raw model output into the normalized, capped line sequence.
    pub fn parse(&self, raw: &str) -> Vec<Line> {
        let cleaned = self.strip_citations(raw);
        let mut lines: Vec<String> = Vec::new();
        for line in cleaned.lines() {
            lines.extend(self.rewrite_line(line.trim_end()));
        }
        let out = self.structure(lines);
        debug!(lines = out.len(), "parsed playbook");
        out
    }

    /// Remove numeric citation markers like `[1]`, `[1][2]`, `[1 2 3]`.
    pub fn strip_citations(&self, text: &str) -> String {
        let s = self.citation_multi.replace_all(text, "");
        let s = self.citation_block.replace_all(&s, "");
        let s = self.citation_single.replace_all(&s, "");
        let s = self.double_space.replace_all(&s, " ");
        self.space_before_punct.replace_all(&s, "$1").trim().to_string()
    }

    /// Apply the rewrite rules to one line, splitting on any newlines the
    /// replacements introduce. Returns the resulting non-empty lines.
    pub fn rewrite_line(&self, line: &str) -> Vec<String> {
        let mut current = line.to_string();
        for rule in &self.rules {
            if rule.pattern.is_match(&current) {
                current = rule.pattern.replace_all(&current, rule.replacement).into_owned();
                debug!(rule = rule.name, "rewrite rule fired");
            }
        }
        current
            .split('\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Classify canonicalized lines and enforce per-event caps.
    fn structure(&self, lines: Vec<String>) -> Vec<Line> {
        let mut out: Vec<Line> = Vec::new();
        let mut in_event = false;
        let mut in_context = false;
        let mut bullets = 0usize;
        let mut scenarios = 0usize;
        // Whether detail lines under the current scenario headline are kept.
        let mut keep_details = false;

        for raw in lines {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("Daily Macro & Trading Playbook") {
                out.push(Line::new(LineKind::Title, line));
                continue;
            }
            if line.starts_with("🟢 Risk-On:") {
                out.push(Line::new(LineKind::RiskOn, line));
                continue;
            }
            if line.starts_with("🔴 Risk-Off:") {
                out.push(Line::new(LineKind::RiskOff, line));
                continue;
            }

            if let Some(caps) = self.event_re.captures(line) {
                in_event = true;
                in_context = false;
                bullets = 0;
                scenarios = 0;
                keep_details = false;
                out.push(Line::new(
                    LineKind::EventHeading,
                    format!("EVENT {}: {}", &caps[1], caps[2].trim()),
                ));
                continue;
            }

            if self.context_re.is_match(line) {
                if in_event {
                    in_context = true;
                    out.push(Line::new(LineKind::ContextLabel, "Context:"));
                }
                continue;
            }

            // Scenario detail lines must be matched before generic "-" bullets.
            if let Some(caps) = self.focus_re.captures(line) {
                if in_event {
                    if keep_details {
                        out.push(Line::new(LineKind::ScenarioFocus, caps[1].trim()));
                    }
                } else {
                    out.push(Line::new(LineKind::Passthrough, line));
                }
                continue;
            }
            if let Some(caps) = self.rationale_re.captures(line) {
                if in_event {
                    if keep_details {
                        out.push(Line::new(LineKind::ScenarioRationale, caps[1].trim()));
                    }
                } else {
                    out.push(Line::new(LineKind::Passthrough, line));
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("• ") {
                // A scenario headline ends the context section, even without a
                // blank line or closing marker.
                in_context = false;
                if in_event {
                    if scenarios < MAX_SCENARIOS {
                        scenarios += 1;
                        keep_details = true;
                        out.push(Line::new(LineKind::ScenarioHeadline, rest.trim()));
                    } else {
                        // Dropping a headline drops its focus/rationale pair too.
                        keep_details = false;
                    }
                } else {
                    out.push(Line::new(LineKind::Passthrough, line));
                }
                continue;
            }

            if in_context && line.starts_with('-') {
                if bullets < MAX_CONTEXT_BULLETS {
                    bullets += 1;
                    let text = line.trim_start_matches('-').trim();
                    out.push(Line::new(LineKind::ContextBullet, text));
                }
                continue;
            }

            if in_event {
                // Stray content inside an event block is dropped.
                continue;
            }
            out.push(Line::new(LineKind::Passthrough, line));
        }

        out
    }
}

impl Default for PlaybookParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(lines: &[Line]) -> Vec<LineKind> {
        lines.iter().map(|l| l.kind).collect()
    }

    // -- citation stripping --

    #[test]
    fn strips_single_and_multi_citations() {
        let p = PlaybookParser::new();
        assert_eq!(p.strip_citations("Oil higher [1]"), "Oil higher");
        assert_eq!(p.strip_citations("Oil higher [1][2][5]"), "Oil higher");
        assert_eq!(p.strip_citations("Oil higher [1 2 3]"), "Oil higher");
    }

    #[test]
    fn tidies_space_before_punctuation() {
        let p = PlaybookParser::new();
        assert_eq!(p.strip_citations("yields rose [3] , gold fell"), "yields rose, gold fell");
    }

    // -- rewrite rules --

    #[test]
    fn rewrite_splits_glued_context_label() {
        let p = PlaybookParser::new();
        let lines = p.rewrite_line("EVENT 1: Fed decision Context:");
        assert_eq!(lines, vec!["EVENT 1: Fed decision", "Context:"]);
    }

    #[test]
    fn rewrite_canonicalizes_emoji_event_marker() {
        let p = PlaybookParser::new();
        assert_eq!(p.rewrite_line("🌍 EVENT 2: OPEC meeting"), vec!["EVENT 2: OPEC meeting"]);
    }

    #[test]
    fn rewrite_canonicalizes_emoji_context_label() {
        let p = PlaybookParser::new();
        assert_eq!(p.rewrite_line("📝CONTEXT:"), vec!["Context:"]);
    }

    #[test]
    fn rewrite_canonicalizes_emoji_scenario_marker() {
        let p = PlaybookParser::new();
        assert_eq!(p.rewrite_line("🧩 Fed holds rates"), vec!["• Fed holds rates"]);
    }

    #[test]
    fn rewrite_splits_inline_focus_and_rationale() {
        let p = PlaybookParser::new();
        let lines = p.rewrite_line("• Ceasefire talks - Focus: oil softer - Rationale: supply risk fades");
        assert_eq!(
            lines,
            vec!["• Ceasefire talks", "- Focus: oil softer", "- Rationale: supply risk fades"]
        );
    }

    #[test]
    fn rewrite_splits_inline_scenario_bullet() {
        let p = PlaybookParser::new();
        let lines = p.rewrite_line("- positioning light • Surprise hike");
        assert_eq!(lines, vec!["- positioning light", "• Surprise hike"]);
    }

    #[test]
    fn rewrite_handles_en_dash_focus() {
        let p = PlaybookParser::new();
        let lines = p.rewrite_line("• Headline – Focus: equities firmer");
        assert_eq!(lines, vec!["• Headline", "- Focus: equities firmer"]);
    }

    #[test]
    fn rewrite_leaves_plain_lines_alone() {
        let p = PlaybookParser::new();
        assert_eq!(p.rewrite_line("- CPI printed hot last month"), vec!["- CPI printed hot last month"]);
    }

    // -- classification --

    #[test]
    fn classifies_a_well_formed_event() {
        let p = PlaybookParser::new();
        let raw = "Daily Macro & Trading Playbook – Monday\n\
                   🟢 Risk-On: tech bid\n\
                   🔴 Risk-Off: oil spike\n\
                   EVENT 1: Fed decision\n\
                   Context:\n\
                   - markets price a hold\n\
                   - dollar steady\n\
                   • Fed holds, dovish tone\n\
                   - Focus: equities firmer; yields lower\n\
                   - Rationale: easing path confirmed\n";
        let lines = p.parse(raw);
        assert_eq!(
            kinds(&lines),
            vec![
                LineKind::Title,
                LineKind::RiskOn,
                LineKind::RiskOff,
                LineKind::EventHeading,
                LineKind::ContextLabel,
                LineKind::ContextBullet,
                LineKind::ContextBullet,
                LineKind::ScenarioHeadline,
                LineKind::ScenarioFocus,
                LineKind::ScenarioRationale,
            ]
        );
        assert_eq!(lines[3].text, "EVENT 1: Fed decision");
        assert_eq!(lines[5].text, "markets price a hold");
        assert_eq!(lines[8].text, "equities firmer; yields lower");
    }

    #[test]
    fn caps_context_bullets_at_three() {
        let p = PlaybookParser::new();
        let raw = "EVENT 1: X\nContext:\n- a\n- b\n- c\n- d\n- e\n";
        let lines = p.parse(raw);
        let bullets = lines.iter().filter(|l| l.kind == LineKind::ContextBullet).count();
        assert_eq!(bullets, 3);
        assert_eq!(lines.last().unwrap().text, "c");
    }

    #[test]
    fn caps_scenarios_at_three_and_drops_their_details() {
        let p = PlaybookParser::new();
        let raw = "EVENT 1: X\nContext:\n- a\n\
                   • s1\n- Focus: f1\n- Rationale: r1\n\
                   • s2\n- Focus: f2\n- Rationale: r2\n\
                   • s3\n- Focus: f3\n- Rationale: r3\n\
                   • s4\n- Focus: f4\n- Rationale: r4\n";
        let lines = p.parse(raw);
        let headlines: Vec<&str> = lines
            .iter()
            .filter(|l| l.kind == LineKind::ScenarioHeadline)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(headlines, vec!["s1", "s2", "s3"]);
        let focuses = lines.iter().filter(|l| l.kind == LineKind::ScenarioFocus).count();
        let rationales = lines.iter().filter(|l| l.kind == LineKind::ScenarioRationale).count();
        assert_eq!(focuses, 3, "dropped headline must drop its focus line");
        assert_eq!(rationales, 3, "dropped headline must drop its rationale line");
    }

    #[test]
    fn scenario_bullet_ends_context_section() {
        let p = PlaybookParser::new();
        // No blank line or closing marker between context and scenarios; the
        // "-" line after the first headline must classify as focus, not bullet.
        let raw = "EVENT 1: X\nContext:\n- a\n• s1\n- Focus: f1\n- Rationale: r1\n";
        let lines = p.parse(raw);
        assert_eq!(
            kinds(&lines),
            vec![
                LineKind::EventHeading,
                LineKind::ContextLabel,
                LineKind::ContextBullet,
                LineKind::ScenarioHeadline,
                LineKind::ScenarioFocus,
                LineKind::ScenarioRationale,
            ]
        );
    }

    #[test]
    fn stray_lines_inside_event_are_dropped() {
        let p = PlaybookParser::new();
        let raw = "EVENT 1: X\nSome stray commentary\nContext:\n- a\n";
        let lines = p.parse(raw);
        assert!(!lines.iter().any(|l| l.text.contains("stray")));
    }

    #[test]
    fn unrecognized_top_level_lines_pass_through() {
        let p = PlaybookParser::new();
        let raw = "Markets open mixed this morning.\nEVENT 1: X\nContext:\n- a\n";
        let lines = p.parse(raw);
        assert_eq!(lines[0].kind, LineKind::Passthrough);
        assert_eq!(lines[0].text, "Markets open mixed this morning.");
    }

    #[test]
    fn counters_reset_per_event() {
        let p = PlaybookParser::new();
        let raw = "EVENT 1: X\nContext:\n- a\n- b\n- c\n- d\n\
                   EVENT 2: Y\nContext:\n- e\n- f\n- g\n- h\n";
        let lines = p.parse(raw);
        let bullets = lines.iter().filter(|l| l.kind == LineKind::ContextBullet).count();
        assert_eq!(bullets, 6);
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        let p = PlaybookParser::new();
        assert!(p.parse("").is_empty());
        assert!(p.parse("\n\n  \n").is_empty());
    }
}
