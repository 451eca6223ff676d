use crate::error::EngineFault;
use minijinja::{context, Environment};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

const INDENT: &str = "    ";

/// Maps become two-column tables, lists become bullet lists. The `.html`
/// name turns on auto-escaping for every interpolated value.
const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
</head>
<body>
<div id="rx-content">
{% for node in nodes recursive -%}
{% if node.slot == "row" %}<tr><td><b>{{ node.key }}</b></td><td>{% elif node.slot == "item" %}<li>{% endif -%}
{% if node.kind == "map" %}<table>
{{ loop(node.children)|safe }}</table>
{% elif node.kind == "list" %}<ul>
{{ loop(node.children)|safe }}</ul>
{% elif node.kind == "link" %}<a href="{{ node.text }}">{{ node.text }}</a>
{%- else %}{{ node.text }}{% endif -%}
{% if node.slot == "row" %}</td></tr>
{% elif node.slot == "item" %}</li>
{% endif -%}
{% endfor %}
</div>
</body>
</html>
"#;

static PAGES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("page.html", PAGE)
        .expect("page template should be valid");
    env
});

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Slot {
    Root,
    Row,
    Item,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum NodeKind {
    Map,
    List,
    Link,
    Text,
}

/// One value of the page tree, shaped for the recursive template loop.
#[derive(Debug, Serialize)]
struct HtmlNode<'a> {
    slot: Slot,
    /// Map key, empty outside of maps
    key: &'a str,
    kind: NodeKind,
    text: String,
    children: Vec<HtmlNode<'a>>,
}

impl<'a> HtmlNode<'a> {
    fn build(slot: Slot, key: &'a str, data: &'a Value) -> Self {
        let (kind, text, children) = match data {
            Value::Object(map) => (
                NodeKind::Map,
                String::new(),
                sorted_entries(map)
                    .into_iter()
                    .map(|(k, v)| Self::build(Slot::Row, k, v))
                    .collect(),
            ),
            Value::Array(items) => (
                NodeKind::List,
                String::new(),
                items.iter().map(|v| Self::build(Slot::Item, "", v)).collect(),
            ),
            Value::String(s) if is_link(s) => (NodeKind::Link, s.clone(), Vec::new()),
            scalar => (NodeKind::Text, scalar_text(scalar), Vec::new()),
        };
        Self {
            slot,
            key,
            kind,
            text,
            children,
        }
    }
}

/// A renderable representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
    ExtJson,
    Xml,
    Text,
    Csv,
}

impl OutputFormat {
    /// Renderer for a negotiated media type. `*/*` and `""` render as HTML.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "" | "*/*" | "text/html" => Some(Self::Html),
            "application/json" => Some(Self::Json),
            "application/ext+json" => Some(Self::ExtJson),
            "application/xml" => Some(Self::Xml),
            "text/plain" => Some(Self::Text),
            "text/csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Value of the `Content-Type` response header.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=UTF-8",
            Self::Json => "application/json; charset=UTF-8",
            Self::ExtJson => "application/ext+json; charset=UTF-8",
            Self::Xml => "application/xml; charset=UTF-8",
            Self::Text => "text/plain; charset=UTF-8",
            Self::Csv => "text/csv",
        }
    }

    /// Serialize `data`. `title` is only used by the HTML page frame.
    pub fn render(self, data: &Value, title: &str) -> Result<Vec<u8>, EngineFault> {
        match self {
            Self::Json | Self::ExtJson => serde_json::to_vec_pretty(data)
                .map_err(|e| EngineFault::internal(format!("JSON rendering failed: {e}"))),
            Self::Text => Ok(match data {
                Value::String(s) => s.clone().into_bytes(),
                other => other.to_string().into_bytes(),
            }),
            Self::Xml => Ok(render_xml(data).into_bytes()),
            Self::Csv => render_csv(data).map(String::into_bytes),
            Self::Html => render_html(data, title).map(String::into_bytes),
        }
    }
}

fn is_link(text: &str) -> bool {
    text.starts_with('/') || text.starts_with("http://") || text.starts_with("https://")
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "---".to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_xml(data: &Value) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<rxdoc>\n");
    xml_value(&mut out, data, 1);
    out.push_str("</rxdoc>\n");
    out
}

fn xml_value(out: &mut String, data: &Value, level: usize) {
    let indent = INDENT.repeat(level);
    match data {
        Value::Object(map) => {
            for (key, value) in sorted_entries(map) {
                let tag = xml_escape(&key.replace(' ', "_"));
                out.push_str(&format!("{indent}<{tag}>\n"));
                xml_value(out, value, level + 1);
                out.push_str(&format!("{indent}</{tag}>\n"));
            }
        }
        Value::Array(items) => {
            let item_indent = INDENT.repeat(level + 1);
            out.push_str(&format!("{indent}<rxlist>\n"));
            for item in items {
                out.push_str(&format!("{item_indent}<rxitem>\n"));
                xml_value(out, item, level + 2);
                out.push_str(&format!("{item_indent}</rxitem>\n"));
            }
            out.push_str(&format!("{indent}</rxlist>\n"));
        }
        scalar => {
            out.push_str(&format!("{indent}{}\n", xml_escape(&scalar_text(scalar))));
        }
    }
}

fn sorted_entries(map: &serde_json::Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_csv(data: &Value) -> Result<String, EngineFault> {
    let Value::Array(rows) = data else {
        warn!(kind = %json_kind(data), "Data not suitable for CSV rendering");
        return Err(EngineFault::NotAcceptable);
    };
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let mut out = String::new();
    match first {
        Value::Object(first_row) => {
            let mut keys: Vec<&String> = first_row.keys().collect();
            keys.sort();
            out.push_str(&keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(";"));
            out.push('\n');
            for row in rows {
                // Rows of a different shape are skipped.
                if let Value::Object(row) = row {
                    let cells: Vec<String> = keys
                        .iter()
                        .map(|k| row.get(k.as_str()).map(csv_cell).unwrap_or_default())
                        .collect();
                    out.push_str(&cells.join(";"));
                    out.push('\n');
                }
            }
        }
        Value::Array(first_row) => {
            let header: Vec<String> = (1..=first_row.len()).map(|i| format!("column_{i}")).collect();
            out.push_str(&header.join(";"));
            out.push('\n');
            for row in rows {
                if let Value::Array(cells) = row {
                    out.push_str(&cells.iter().map(csv_cell).collect::<Vec<_>>().join(";"));
                    out.push('\n');
                }
            }
        }
        other => {
            warn!(kind = %json_kind(other), "First CSV row is neither a map nor a list");
            return Err(EngineFault::NotAcceptable);
        }
    }
    Ok(out)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

fn render_html(data: &Value, title: &str) -> Result<String, EngineFault> {
    let page = PAGES
        .get_template("page.html")
        .map_err(|e| EngineFault::internal(format!("page template missing: {e}")))?;
    page.render(context! { title => title, nodes => [HtmlNode::build(Slot::Root, "", data)] })
        .map_err(|e| EngineFault::internal(format!("HTML rendering failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(format: OutputFormat, data: &Value) -> String {
        String::from_utf8(format.render(data, "t").unwrap()).unwrap()
    }

    #[test]
    fn test_xml_layout() {
        let out = text(OutputFormat::Xml, &json!({"b key": [1, null], "a": true}));
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<rxdoc>\n\
                        \x20   <a>\n        yes\n    </a>\n\
                        \x20   <b_key>\n        <rxlist>\n\
                        \x20           <rxitem>\n                1\n            </rxitem>\n\
                        \x20           <rxitem>\n                ---\n            </rxitem>\n\
                        \x20       </rxlist>\n    </b_key>\n</rxdoc>\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_csv_list_of_maps_uses_first_row_keys() {
        let out = text(
            OutputFormat::Csv,
            &json!([{"b": 2, "a": "x"}, {"a": "y", "c": 9}]),
        );
        assert_eq!(out, "a;b\nx;2\ny;\n");
    }

    #[test]
    fn test_csv_list_of_lists() {
        let out = text(OutputFormat::Csv, &json!([[1, "a"], [2, "b"]]));
        assert_eq!(out, "column_1;column_2\n1;a\n2;b\n");
    }

    #[test]
    fn test_csv_rejects_maps() {
        let err = OutputFormat::Csv.render(&json!({"a": 1}), "t").unwrap_err();
        assert_eq!(err.status(), 406);
    }

    #[test]
    fn test_html_escapes_and_links() {
        let out = text(OutputFormat::Html, &json!({"uri": "/resource/x", "desc": "<b>"}));
        let href = minijinja::HtmlEscape("/resource/x").to_string();
        assert!(out.contains(&format!("<a href=\"{href}\">{href}</a>")));
        assert!(out.contains("<td><b>desc</b></td><td>&lt;b&gt;</td>"));
        assert!(out.contains("<title>t</title>"));
    }

    #[test]
    fn test_html_nesting() {
        let out = text(OutputFormat::Html, &json!({"list": [1, null, {"k": true}]}));
        assert!(out.contains("<table>"));
        assert!(out.contains("<li>1</li>"));
        assert!(out.contains("<li>---</li>"));
        assert!(out.contains("<td><b>k</b></td><td>yes</td>"));
        assert_eq!(out.matches("<table>").count(), out.matches("</table>").count());
        assert_eq!(out.matches("<ul>").count(), 1);
    }

    #[test]
    fn test_xml_escapes_text() {
        let out = text(OutputFormat::Xml, &json!({"a": "x<y & z"}));
        assert!(out.contains("x&lt;y &amp; z"));
    }

    #[test]
    fn test_text_passes_strings_through() {
        assert_eq!(text(OutputFormat::Text, &json!("plain")), "plain");
        assert_eq!(text(OutputFormat::Text, &json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_media_type_mapping() {
        assert_eq!(OutputFormat::from_media_type("*/*"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_media_type(""), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_media_type("image/png"), None);
    }
}
