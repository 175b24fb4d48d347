use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header. Cells beyond the header count are ignored.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(h.len(), usize::max)
        })
        .collect();

    let line = |cells: &mut dyn Iterator<Item = String>| -> String {
        let padded: Vec<String> = cells
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&mut headers.iter().map(|h| h.to_string()));
    out.push_str(&line(&mut widths.iter().map(|&w| "-".repeat(w))));
    for row in rows {
        out.push_str(&line(&mut row.iter().cloned()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let rows = vec![
            vec!["rrule".to_string(), "FREQ=WEEKLY".to_string()],
            vec!["labels".to_string(), "chore, sync".to_string()],
        ];
        let table = render_table(&["KEY", "VALUE"], &rows);
        assert_eq!(
            table,
            "KEY     VALUE\n\
             ------  -----------\n\
             rrule   FREQ=WEEKLY\n\
             labels  chore, sync\n"
        );
    }

    #[test]
    fn short_rows_are_allowed() {
        let table = render_table(&["A", "B"], &[vec!["x".to_string()]]);
        assert!(table.ends_with("x\n"));
    }
}
