use super::types::Table;

/// Render a table as a GitHub-flavored markdown table.
///
/// The first row becomes the header. An empty table renders as an empty string.
pub fn table_to_markdown(table: &Table) -> String {
    let Some((header, body)) = table.rows().split_first() else {
        return String::new();
    };

    let column_count = table.column_count();
    let estimated = table.cells().map(|cell| cell.text.len() + 3).sum::<usize>() + table.row_count() * 2;
    let mut markdown = String::with_capacity(estimated + column_count * 6);

    push_row(&mut markdown, header.iter().map(|cell| cell.text.as_str()));
    push_row(&mut markdown, std::iter::repeat_n("---", column_count));
    for row in body {
        push_row(&mut markdown, row.iter().map(|cell| cell.text.as_str()));
    }

    markdown
}

fn push_row<'a>(buffer: &mut String, texts: impl Iterator<Item = &'a str>) {
    buffer.push('|');
    for text in texts {
        buffer.push(' ');
        escape_markdown_into(buffer, text);
        buffer.push_str(" |");
    }
    buffer.push('\n');
}

#[inline]
fn escape_markdown_into(buffer: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '|' => buffer.push_str("\\|"),
            '\\' => buffer.push_str("\\\\"),
            '\n' => buffer.push(' '),
            _ => buffer.push(ch),
        }
    }
}
