//! Template renderer.
//!
//! Takes the normalized line sequence and produces the final MarkdownV2
//! document: fixed bold title, dated header, separator rules between event
//! blocks, a fixed style per line kind, and a disclaimer footer. The header
//! and footer are emitted regardless of input, so even an empty sequence
//! renders to a valid message.

use chrono::Utc;
use chrono_tz::Tz;
use regex::Regex;

use crate::playbook::markup;
use crate::playbook::parse::{Line, LineKind};

const TITLE: &str = "📘 DAILY MACRO PLAYBOOK";
const RULE: &str = "────────────";
const SUBTITLE: &str = "Daily Macro & Trading Playbook with Risk Sentiments Explained";
const DISCLAIMER: &str =
    "⚠️SCENARIO-BASED MARKET COMMENTARY FOR RESEARCH AND INFORMATION PURPOSES ONLY. NOT INVESTMENT ADVICE.";

/// Renders normalized playbook lines into the canonical MarkdownV2 document.
pub struct Renderer {
    tz: Tz,
    blank_runs: Regex,
}

impl Renderer {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            blank_runs: Regex::new(r"\n{3,}").unwrap(),
        }
    }

    /// Render with today's date (in the configured timezone) in the header.
    pub fn render(&self, lines: &[Line]) -> String {
        let day = Utc::now()
            .with_timezone(&self.tz)
            .format("%a %d %b %Y")
            .to_string()
            .to_uppercase();
        self.render_dated(lines, &day)
    }

    /// Render with an explicit date header line.
    pub fn render_dated(&self, lines: &[Line], day: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        out.push(markup::bold(TITLE));
        out.push(markup::bold(&format!("📅 {day}")));
        out.push(RULE.to_string());

        let mut in_event = false;
        let mut risk_on_seen = false;
        let mut last_was_context = false;

        for line in lines {
            match line.kind {
                LineKind::Title => {
                    out.push(markup::bold(SUBTITLE));
                }
                LineKind::RiskOn => {
                    out.push(markup::escape(&line.text));
                    risk_on_seen = true;
                }
                LineKind::RiskOff => {
                    out.push(markup::escape(&line.text));
                    if risk_on_seen {
                        out.push(String::new());
                        out.push(RULE.to_string());
                    }
                }
                LineKind::EventHeading => {
                    if in_event {
                        if out.last().is_some_and(|l| !l.is_empty()) {
                            out.push(String::new());
                        }
                        out.push(RULE.to_string());
                    }
                    in_event = true;
                    last_was_context = false;
                    out.push(markup::bold(&format!("🌍 {}", line.text)));
                }
                LineKind::ContextLabel => {
                    out.push(markup::italic("📝CONTEXT:"));
                }
                LineKind::ContextBullet => {
                    out.push(format!("\\- {}", markup::escape(&line.text)));
                    last_was_context = true;
                }
                LineKind::ScenarioHeadline => {
                    if last_was_context {
                        // Visual gap between the context block and the first
                        // scenario entry.
                        out.push(String::new());
                        last_was_context = false;
                    }
                    out.push(format!("🧩 {}", markup::bold(&line.text)));
                }
                LineKind::ScenarioFocus => {
                    out.push(format!("{} {}", markup::italic("🎯 FOCUS:"), markup::escape(&line.text)));
                    last_was_context = false;
                }
                LineKind::ScenarioRationale => {
                    out.push(format!(
                        "{} {}",
                        markup::italic("🧠 RATIONALE:"),
                        markup::escape(&line.text)
                    ));
                    out.push(String::new());
                    last_was_context = false;
                }
                LineKind::Passthrough => {
                    out.push(markup::escape(&line.text));
                }
            }
        }

        if out.last().is_some_and(|l| !l.is_empty()) {
            out.push(String::new());
        }
        out.push(RULE.to_string());
        out.push(markup::italic(DISCLAIMER));
        out.push(RULE.to_string());

        let joined = out.join("\n");
        self.blank_runs.replace_all(&joined, "\n\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::parse::PlaybookParser;

    fn renderer() -> Renderer {
        Renderer::new(chrono_tz::Europe::London)
    }

    #[test]
    fn empty_input_still_has_header_and_footer() {
        let msg = renderer().render_dated(&[], "MON 01 JAN 2026");
        assert!(msg.starts_with("*📘 DAILY MACRO PLAYBOOK*"));
        assert!(msg.contains("*📅 MON 01 JAN 2026*"));
        assert!(msg.contains("NOT INVESTMENT ADVICE"));
        assert!(msg.ends_with(RULE));
    }

    #[test]
    fn render_uses_todays_date() {
        let msg = renderer().render(&[]);
        let year = Utc::now().with_timezone(&chrono_tz::Europe::London).format("%Y").to_string();
        assert!(msg.contains(&year));
    }

    #[test]
    fn event_block_is_styled_per_kind() {
        let p = PlaybookParser::new();
        let lines = p.parse(
            "EVENT 1: Fed decision\nContext:\n- markets price a hold\n\
             • Fed holds, dovish tone\n- Focus: equities firmer\n- Rationale: easing path\n",
        );
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        assert!(msg.contains("*🌍 EVENT 1: Fed decision*"));
        assert!(msg.contains("_📝CONTEXT:_"));
        assert!(msg.contains("\\- markets price a hold"));
        assert!(msg.contains("🧩 *Fed holds, dovish tone*"));
        assert!(msg.contains("_🎯 FOCUS:_ equities firmer"));
        assert!(msg.contains("_🧠 RATIONALE:_ easing path"));
    }

    #[test]
    fn separator_inserted_between_event_blocks() {
        let p = PlaybookParser::new();
        let lines = p.parse("EVENT 1: A\nContext:\n- a\nEVENT 2: B\nContext:\n- b\n");
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        let first = msg.find("*🌍 EVENT 1: A*").unwrap();
        let second = msg.find("*🌍 EVENT 2: B*").unwrap();
        let between = &msg[first..second];
        assert!(between.contains(RULE));
    }

    #[test]
    fn risk_block_followed_by_separator() {
        let p = PlaybookParser::new();
        let lines = p.parse("🟢 Risk-On: tech bid\n🔴 Risk-Off: oil spike\n");
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        assert!(msg.contains("🟢 Risk\\-On: tech bid"));
        assert!(msg.contains("🔴 Risk\\-Off: oil spike\n\n────────────"));
    }

    #[test]
    fn bullet_and_scenario_caps_survive_rendering() {
        let p = PlaybookParser::new();
        let lines = p.parse(
            "EVENT 1: X\nContext:\n- c1\n- c2\n\
             • s1\n- Focus: f1\n- Rationale: r1\n\
             • s2\n- Focus: f2\n- Rationale: r2\n\
             • s3\n- Focus: f3\n- Rationale: r3\n\
             • s4\n- Focus: f4\n- Rationale: r4\n",
        );
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        assert_eq!(msg.matches("\\- c").count(), 2, "context under cap is not truncated");
        assert_eq!(msg.matches("🧩 ").count(), 3, "excess scenario dropped");
        assert!(!msg.contains("s4"));
        assert!(!msg.contains("f4"));
    }

    #[test]
    fn consecutive_blank_lines_collapse() {
        let p = PlaybookParser::new();
        let lines = p.parse(
            "EVENT 1: X\nContext:\n- a\n• s1\n- Focus: f1\n- Rationale: r1\n\nEVENT 2: Y\n",
        );
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        assert!(!msg.contains("\n\n\n"));
    }

    #[test]
    fn title_line_rendered_with_fixed_subtitle() {
        let p = PlaybookParser::new();
        let lines = p.parse("Daily Macro & Trading Playbook – 1 Jan\n");
        let msg = renderer().render_dated(&lines, "MON 01 JAN 2026");
        assert!(msg.contains("*Daily Macro & Trading Playbook with Risk Sentiments Explained*"));
    }
}
