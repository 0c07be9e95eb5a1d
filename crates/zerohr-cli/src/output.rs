use owo_colors::{OwoColorize, Style};

use zerohr_core::TaskResult;
use zerohr_core::admin::WorkflowRow;

/// Styles for terminal output. All plain when color is disabled.
pub struct Palette {
    pub ok: Style,
    pub error: Style,
    pub warning: Style,
    pub dim: Style,
    pub bold: Style,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        if !color {
            return Self {
                ok: Style::new(),
                error: Style::new(),
                warning: Style::new(),
                dim: Style::new(),
                bold: Style::new(),
            };
        }
        Self {
            ok: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
        }
    }

    pub fn score(&self, score: f64) -> Style {
        if score >= 7.0 {
            self.ok
        } else if score >= 5.0 {
            self.warning
        } else {
            self.error
        }
    }
}

/// Summary block printed after a completed task.
pub fn summary(result: &TaskResult, status: &str, palette: &Palette) -> String {
    let feedback = if result.feedback.is_empty() {
        "-"
    } else {
        result.feedback.as_str()
    };
    format!(
        "{} {}\n{} {}\n{} {}\n{} {}",
        "Status:  ".style(palette.dim),
        status.style(palette.ok),
        "Score:   ".style(palette.dim),
        result.score_label().style(palette.score(result.score)),
        "Attempts:".style(palette.dim),
        result.attempts_made,
        "Feedback:".style(palette.dim),
        feedback,
    )
}

/// Fixed-width table of the workflow rows.
pub fn workflow_table(rows: &[WorkflowRow], palette: &Palette) -> String {
    let mut out = format!(
        "{}",
        format!("{:>6}  {:>7}  {:<16}  {:>5}", "ID", "SECTION", "STATUS", "SCORE").style(palette.bold)
    );
    for row in rows {
        let score = row
            .score
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        out.push('\n');
        out.push_str(&format!(
            "{:>6}  {:>7}  {:<16}  {:>5}",
            row.id, row.section, row.status, score
        ));
    }
    if rows.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}", "(no workflow rows)".style(palette.dim)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f64, feedback: &str) -> TaskResult {
        TaskResult {
            document: "DOC".into(),
            score,
            attempts_made: 2,
            feedback: feedback.into(),
        }
    }

    #[test]
    fn plain_summary_has_score_out_of_ten() {
        let text = summary(&result(8.0, ""), "Completed. Reset sent.", &Palette::new(false));
        assert!(text.contains("Score:    8 / 10"), "{text}");
        assert!(text.contains("Attempts: 2"));
        assert!(text.contains("Feedback: -"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn colored_summary_emits_escapes() {
        let text = summary(&result(3.5, "weak"), "done", &Palette::new(true));
        assert!(text.contains('\x1b'));
        assert!(text.contains("3.5 / 10"));
    }

    #[test]
    fn table_lists_rows() {
        let rows = vec![
            WorkflowRow {
                id: 1,
                section: 1,
                status: "da_generare".into(),
                score: None,
            },
            WorkflowRow {
                id: 2,
                section: 2,
                status: "generato".into(),
                score: Some(7.5),
            },
        ];
        let text = workflow_table(&rows, &Palette::new(false));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("da_generare"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains("7.5"));
    }

    #[test]
    fn empty_table_says_so() {
        let text = workflow_table(&[], &Palette::new(false));
        assert!(text.ends_with("(no workflow rows)"));
    }
}
