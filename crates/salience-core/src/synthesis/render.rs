//! Theme ranking and roll-up text

use std::collections::BTreeMap;

use crate::config::SynthesisConfig;
use crate::note::{NoteEntry, SynthesisLevel};

use super::period::Period;

/// A ranked tag and the strongest sources carrying it
#[derive(Debug, Clone, PartialEq)]
pub struct Theme<'a> {
    pub tag: String,
    /// Sum of the salience of every note carrying the tag
    pub weight: f64,
    pub sources: Vec<&'a NoteEntry>,
}

/// Top tags by cumulative salience, each with its highest-salience sources.
/// Ties keep tag name order for tags and input order for sources.
pub fn rank_themes<'a>(entries: &[&'a NoteEntry], config: &SynthesisConfig) -> Vec<Theme<'a>> {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for entry in entries {
        for tag in entry.tag_set() {
            *weights.entry(tag).or_default() += entry.salience;
        }
    }

    let mut ranked: Vec<(String, f64)> = weights.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(config.top_tags);

    ranked
        .into_iter()
        .map(|(tag, weight)| {
            let mut sources: Vec<&NoteEntry> = entries
                .iter()
                .copied()
                .filter(|e| e.tag_set().contains(&tag))
                .collect();
            sources.sort_by(|a, b| b.salience.total_cmp(&a.salience));
            sources.truncate(config.sources_per_tag);
            Theme {
                tag,
                weight,
                sources,
            }
        })
        .collect()
}

/// Mean of the top saliences, clamped to the configured range
pub fn aggregate_salience(entries: &[&NoteEntry], config: &SynthesisConfig) -> f64 {
    let mut saliences: Vec<f64> = entries.iter().map(|e| e.salience).collect();
    saliences.sort_by(|a, b| b.total_cmp(a));
    saliences.truncate(config.aggregate_top);
    if saliences.is_empty() {
        return config.min_salience;
    }
    let mean = saliences.iter().sum::<f64>() / saliences.len() as f64;
    mean.clamp(config.min_salience, config.max_salience)
}

/// Body text of a roll-up record
pub fn render(level: SynthesisLevel, period: &Period, entries: &[&NoteEntry], themes: &[Theme]) -> String {
    let title = match level {
        SynthesisLevel::Monthly => "Monthly synthesis",
        _ => "Weekly synthesis",
    };
    let unit = match level {
        SynthesisLevel::Monthly => "weekly summaries",
        _ => "notes",
    };

    let mut out = format!("# {}: {} to {}\n\n", title, period.start, period.end);
    if themes.is_empty() {
        out.push_str(&format!("{} {}, no tagged themes\n", entries.len(), unit));
        return out;
    }

    let names: Vec<&str> = themes.iter().map(|t| t.tag.as_str()).collect();
    out.push_str(&format!(
        "{} {}, top themes: {}\n",
        entries.len(),
        unit,
        names.join(", ")
    ));

    for theme in themes {
        out.push_str(&format!("\n## {}\n", theme.tag));
        for source in &theme.sources {
            out.push_str(&format!("- {}\n", source_line(level, source)));
        }
    }
    out
}

fn source_line(level: SynthesisLevel, source: &NoteEntry) -> String {
    match (level, source.period_start) {
        (SynthesisLevel::Monthly, Some(start)) => format!("week of {}: {}", start, source.summary_line()),
        _ => source.summary_line(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn note(text: &str, salience: f64, tags: &[&str]) -> NoteEntry {
        NoteEntry::new("s", text, Utc.with_ymd_and_hms(2026, 6, 2, 9, 0, 0).unwrap())
            .with_salience(salience)
            .with_tags(tags.iter().copied())
    }

    #[test]
    fn test_tags_ranked_by_cumulative_salience() {
        let notes = [
            note("a", 0.9, &["rust"]),
            note("b", 0.4, &["ci", "rust"]),
            note("c", 0.4, &["ci"]),
            note("d", 0.1, &["docs"]),
        ];
        let refs: Vec<&NoteEntry> = notes.iter().collect();
        let config = SynthesisConfig {
            top_tags: 2,
            sources_per_tag: 1,
            ..Default::default()
        };
        let themes = rank_themes(&refs, &config);
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].tag, "rust");
        assert!((themes[0].weight - 1.3).abs() < 1e-9);
        assert_eq!(themes[0].sources[0].text, "a");
        assert_eq!(themes[1].tag, "ci");
        assert_eq!(themes[1].sources[0].text, "b");
    }

    #[test]
    fn test_aggregate_is_clamped() {
        let config = SynthesisConfig::default();
        let low = [note("a", 0.05, &[])];
        let refs: Vec<&NoteEntry> = low.iter().collect();
        assert_eq!(aggregate_salience(&refs, &config), config.min_salience);

        let high = [note("a", 2.0, &[]), note("b", 1.5, &[])];
        let refs: Vec<&NoteEntry> = high.iter().collect();
        assert_eq!(aggregate_salience(&refs, &config), config.max_salience);

        let mid = [note("a", 0.6, &[]), note("b", 0.4, &[])];
        let refs: Vec<&NoteEntry> = mid.iter().collect();
        assert!((aggregate_salience(&refs, &config) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_lists_sources_under_themes() {
        let notes = [note("# Heading\nfixed the build", 0.6, &["ci"])];
        let refs: Vec<&NoteEntry> = notes.iter().collect();
        let themes = rank_themes(&refs, &SynthesisConfig::default());
        let period = Period::week_of(chrono::NaiveDate::from_ymd_opt(2026, 6, 2).unwrap());
        let text = render(SynthesisLevel::Weekly, &period, &refs, &themes);
        assert!(text.starts_with("# Weekly synthesis: 2026-06-01 to 2026-06-07\n"));
        assert!(text.contains("\n## ci\n- fixed the build\n"));
    }
}
