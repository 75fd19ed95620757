// Terminal UI utilities

use colored::Colorize;

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "┌─────────────────────────────────────────┐".bright_blue()
    );
    println!("{}", format!("│  {:<39}│", title).bright_blue());
    println!(
        "{}",
        "└─────────────────────────────────────────┘".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✓ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("✗ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", message.bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", message.bright_yellow());
}

/// `✓ PASS  label` / `✗ FAIL  label` with an indented detail line
pub fn print_check(label: &str, passed: bool, detail: &str) {
    let (icon, status) = if passed {
        ("✓".green(), "PASS".green())
    } else {
        ("✗".red(), "FAIL".red())
    };
    println!("  {} {}  {}", icon, status, label);
    println!("       {}", detail);
    println!();
}

/// A table cell with optional colour
pub struct Cell {
    text: String,
    color: Option<colored::Color>,
}

impl Cell {
    pub fn plain(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            color: None,
        }
    }

    pub fn good(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            color: Some(colored::Color::Green),
        }
    }

    pub fn bad(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            color: Some(colored::Color::Red),
        }
    }

    fn render(&self, width: usize) -> String {
        let padded = format!("{}{}", self.text, " ".repeat(width - display_width(&self.text)));
        match self.color {
            Some(color) => padded.color(color).to_string(),
            None => padded,
        }
    }
}

/// Render a bordered table, columns sized to their widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(display_width(&cell.text));
        }
    }

    let border = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(mid), right)
    };

    let mut lines = vec![border("+", "+", "+")];
    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!(" {} ", Cell::plain(h).render(*w)))
        .collect();
    lines.push(format!("|{}|", header_cells.join("|")));
    lines.push(border("+", "+", "+"));

    for row in rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let rendered = row
                    .get(i)
                    .map(|c| c.render(*w))
                    .unwrap_or_else(|| " ".repeat(*w));
                format!(" {} ", rendered)
            })
            .collect();
        lines.push(format!("|{}|", cells.join("|")));
    }
    lines.push(border("+", "+", "+"));

    lines.join("\n")
}

pub fn print_table(headers: &[&str], rows: &[Vec<Cell>]) {
    println!("{}", render_table(headers, rows));
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        colored::control::set_override(false);
        let table = render_table(
            &["Table", "Before"],
            &[
                vec![Cell::plain("cms_page"), Cell::plain(10)],
                vec![Cell::plain("quote"), Cell::bad("N/A ✗")],
            ],
        );

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+----------+--------+");
        assert_eq!(lines[1], "| Table    | Before |");
        assert_eq!(lines[3], "| cms_page | 10     |");
        assert_eq!(lines[4], "| quote    | N/A ✗  |");
        assert_eq!(lines.len(), 6);
    }
}
