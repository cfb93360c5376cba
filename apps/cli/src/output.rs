use anyhow::Result;
use clap::ValueEnum;
use redraft_analyzers::CacheStatsSnapshot;
use redraft_engine::{AppliedFix, Suggestion};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Renders command results to stdout in the selected format.
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn suggestions(&self, suggestions: &[Suggestion]) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(suggestions),
            OutputFormat::Markdown => {
                if suggestions.is_empty() {
                    println!("No suggestions — looks clean.");
                    return Ok(());
                }
                println!("## Suggestions ({})", suggestions.len());
                let mut current_category = None;
                for suggestion in suggestions {
                    if current_category != Some(suggestion.category) {
                        current_category = Some(suggestion.category);
                        println!("\n### {}", suggestion.category.display_name());
                    }
                    println!(
                        "\n- **{}** `{}`{}",
                        suggestion.title,
                        suggestion.id,
                        if suggestion.ai_enhanced { " *(AI)*" } else { "" }
                    );
                    println!("  {}", suggestion.message);
                    if !suggestion.match_text.is_empty() {
                        println!(
                            "  > …{}**{}**{}…",
                            suggestion.context_before, suggestion.match_text, suggestion.context_after
                        );
                    }
                    if let Some(fix) = suggestion.primary_fix() {
                        println!("  Fix: `{fix}`");
                    }
                }
                Ok(())
            }
        }
    }

    pub fn applied_fix(&self, applied: &AppliedFix, document_json: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{document_json}");
                Ok(())
            }
            OutputFormat::Markdown => {
                println!(
                    "Replaced {}..{} with \"{}\" (delta {:+})",
                    applied.plain_start, applied.plain_end, applied.replacement, applied.delta
                );
                Ok(())
            }
        }
    }

    pub fn cache_stats(&self, stats: &CacheStatsSnapshot) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(stats),
            OutputFormat::Markdown => {
                println!("## Result cache");
                println!("- entries: {}", stats.entry_count);
                println!("- hits: {}", stats.hits);
                println!("- misses: {}", stats.misses);
                println!("- evictions: {}", stats.evictions);
                println!("- hit rate: {:.1}%", stats.hit_rate());
                Ok(())
            }
        }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
