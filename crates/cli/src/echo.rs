use owo_colors::OwoColorize;
use readlog_core::PreviewResult;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Readlog".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Preview links before you log them\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let indicator = if ms < 500.0 {
        "fast".green().to_string()
    } else if ms < 2000.0 {
        "moderate".bright_yellow().to_string()
    } else {
        "slow".bright_red().to_string()
    };

    eprintln!("  {} {:>8.2}ms ({})", format!("{}:", label).dimmed(), ms, indicator);
}

/// Render a preview as a plain-text card.
///
/// Colors are applied by the terminal-facing caller; this returns text only
/// so it can also be written to a file.
pub fn render_card(preview: &PreviewResult) -> String {
    let mut out = String::new();
    let field = |label: &str, value: Option<&str>| format!("{:<12} {}\n", label, value.unwrap_or("-"));

    out.push_str(&field("Title:", preview.title()));
    out.push_str(&field("Description:", preview.description()));
    out.push_str(&field("Image:", preview.image()));
    out.push_str(&field("Site:", preview.site_name()));
    out.push_str(&field("URL:", preview.final_url()));
    out
}

/// Print a preview card to stdout with highlighted labels.
pub fn print_card(preview: &PreviewResult) {
    println!("{}", "═".repeat(60).dimmed());
    for line in render_card(preview).lines() {
        match line.split_once(' ') {
            Some((label, value)) => println!("{} {}", label.bold().cyan(), value.trim_start().bright_white()),
            None => println!("{}", line),
        }
    }
    println!("{}", "═".repeat(60).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use readlog_core::{ExtractedFields, PreviewError, Url};

    #[test]
    fn test_render_card_success() {
        let url = Url::parse("https://example.com/post").unwrap();
        let fields = ExtractedFields { title: Some("Hello".into()), ..Default::default() };
        let card = render_card(&PreviewResult::success(&url, fields));

        assert!(card.contains("Title:       Hello"));
        assert!(card.contains("Image:       -"));
        assert!(card.contains("https://example.com/post"));
    }

    #[test]
    fn test_render_card_failure() {
        let card = render_card(&PreviewResult::failure(&PreviewError::Cancelled));
        assert!(card.contains("URL:         -"));
    }
}
