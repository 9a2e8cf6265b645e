use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_value_table(serde_json::to_value(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_value_table(value: Value) -> anyhow::Result<String> {
    match value {
        Value::Array(items) => Ok(render_rows(&items)),
        Value::Object(map) => {
            let rows = map
                .iter()
                .map(|(key, value)| vec![key.clone(), cell(value)])
                .collect::<Vec<_>>();
            Ok(table::render_table(&["field", "value"], &rows, options()))
        }
        scalar => Ok(cell(&scalar)),
    }
}

fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render_table(&["value"], &rows, options());
    }

    let columns = table::order_columns(
        items
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|map| map.keys().cloned())
            .collect(),
    );
    let headers = columns.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            columns
                .iter()
                .map(|column| map.get(column).map_or_else(|| String::from("-"), cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows, options())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(v) => v.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        nested => serde_json::to_string(nested).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}
