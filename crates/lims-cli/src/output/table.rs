/// Columns shown first, in this order, when present.
const LEADING_COLUMNS: [&str; 4] = ["id", "identifier", "name", "state"];

/// Columns never worth a table cell.
const HIDDEN_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

const MIN_WIDTH: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Order columns: leading columns first, the rest alphabetically, timestamps dropped
/// unless nothing else is left.
#[must_use]
pub fn order_columns(mut columns: Vec<String>) -> Vec<String> {
    columns.sort();
    columns.dedup();
    let visible: Vec<String> = columns
        .iter()
        .filter(|c| !HIDDEN_COLUMNS.contains(&c.as_str()))
        .cloned()
        .collect();
    let mut rest = if visible.is_empty() { columns } else { visible };

    let mut ordered = Vec::with_capacity(rest.len());
    for lead in LEADING_COLUMNS {
        if let Some(pos) = rest.iter().position(|c| c == lead) {
            ordered.push(rest.remove(pos));
        }
    }
    ordered.extend(rest);
    ordered
}

/// Render an aligned plain-text table.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .max(MIN_WIDTH)
        })
        .collect();
    if let Some(max_width) = options.max_width {
        shrink_to_fit(&mut widths, max_width);
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&clip(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(header_line.trim_end().to_string());
    lines.push("-".repeat(header_line.trim_end().chars().count()));

    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let cell = clip(row.get(index).map_or("-", String::as_str), *width);
                let numeric = is_numeric(&cell);
                let padded = pad(&cell, *width, numeric);
                if options.color {
                    colorize(&padded, &cell)
                } else {
                    padded
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Narrow the widest column one character at a time until the row fits.
fn shrink_to_fit(widths: &mut [usize], max_width: usize) {
    let separators = widths.len().saturating_sub(1) * 2;
    while widths.iter().sum::<usize>() + separators > max_width {
        let Some((idx, _)) = widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > MIN_WIDTH)
            .max_by_key(|(_, w)| **w)
        else {
            break;
        };
        widths[idx] -= 1;
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(value.chars().count()));
    if right_align {
        format!("{fill}{value}")
    } else {
        format!("{value}{fill}")
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

/// Color entry states, deadline statuses, and booleans.
fn colorize(padded: &str, cell: &str) -> String {
    let code = match cell {
        "succeeded" | "repeat_succeeded" | "on_schedule" | "confirmed" | "true" => "32",
        "warning" | "active" | "pending" => "33",
        "failed" | "repeat_failed" | "overdue" | "error" | "false" => "31",
        _ => return padded.to_string(),
    };
    padded.replacen(cell, &format!("\u{1b}[{code}m{cell}\u{1b}[0m"), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn leading_columns_come_first() {
        let ordered = order_columns(cols(&["amount", "name", "created_at", "id", "barcode"]));
        assert_eq!(ordered, cols(&["id", "name", "amount", "barcode"]));
    }

    #[test]
    fn timestamps_kept_when_alone() {
        assert_eq!(order_columns(cols(&["created_at"])), cols(&["created_at"]));
    }

    #[test]
    fn numbers_align_right() {
        let out = render_table(
            &["name", "amount"],
            &[vec!["Tris".into(), "7.5".into()], vec!["EDTA".into(), "12.25".into()]],
            TableOptions {
                max_width: None,
                color: false,
            },
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name  amount");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "Tris     7.5");
        assert_eq!(lines[3], "EDTA   12.25");
    }

    #[test]
    fn wide_cells_are_clipped() {
        let out = render_table(
            &["name", "description"],
            &[vec!["Lysis".into(), "x".repeat(80)]],
            TableOptions {
                max_width: Some(40),
                color: false,
            },
        );
        assert!(out.lines().all(|line| line.chars().count() <= 40));
        assert!(out.contains('…'));
    }

    #[test]
    fn states_are_colored() {
        let out = render_table(
            &["state"],
            &[vec!["failed".into()]],
            TableOptions {
                max_width: None,
                color: true,
            },
        );
        assert!(out.contains("\u{1b}[31mfailed\u{1b}[0m"));
    }
}
