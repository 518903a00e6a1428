// Markup helpers shared by the report sections. Everything returned here is
// finished HTML; database text is escaped by the caller before it becomes a
// cell or a body.

use std::fmt::Write;

pub const TAILWIND_HREF: &str = "https://unpkg.com/tailwindcss@^2/dist/tailwind.min.css";

const SECTION_CLASSES: &str = "overflow-hidden rounded-lg shadow-md bg-white hover:shadow-xl \
    transition-shadow duration-300 ease-in-out p-4 mb-4";

const CHART_SCRIPT: &str = "document.querySelectorAll('.chart').forEach(function (el) {
    Highcharts.chart(el, JSON.parse(el.dataset.options));
});";

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn section_id(title: &str) -> String {
    title.replace(' ', "-")
}

pub fn section(title: &str, body: &str) -> String {
    format!(
        "<section id=\"{id}\" class=\"{classes}\">\n\
         <h3 class=\"text-xl font-semibold pb-3\">{title}</h3>\n{body}\n</section>\n",
        id = escape(&section_id(title)),
        classes = SECTION_CLASSES,
        title = escape(title),
        body = body,
    )
}

// Links without a leading '#' are treated as fragment names.
pub fn navigation(items: &[(String, String)]) -> String {
    let mut out = String::from(
        "<div><div class=\"sticky top-0 mt-20 w-32 pl-3 pt-2 text-sm rounded-lg shadow-md bg-white\">\n\
         <ul class=\"nav\">\n",
    );
    for (name, link) in items {
        let link = if link.starts_with('#') {
            link.clone()
        } else {
            format!("#{}", link)
        };
        let _ = writeln!(
            out,
            "<li class=\"py-1\"><a class=\"nav-link\" href=\"{}\">{}</a></li>",
            escape(&link),
            escape(name)
        );
    }
    out.push_str("</ul>\n</div></div>\n");
    out
}

/// A data grid. Header labels are escaped, cells are inserted as given.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table class=\"table-auto w-full text-sm\">\n<thead><tr>");
    for header in headers {
        let _ = write!(
            out,
            "<th class=\"px-2 py-1 text-left border-b\">{}</th>",
            escape(header)
        );
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str(&table_row(row, None));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

pub fn table_row(cells: &[String], class: Option<&str>) -> String {
    let mut out = match class {
        Some(class) => format!("<tr class=\"{}\">", escape(class)),
        None => String::from("<tr>"),
    };
    for cell in cells {
        let _ = write!(out, "<td class=\"px-2 py-1 border-b align-top\">{}</td>", cell);
    }
    out.push_str("</tr>\n");
    out
}

// `options` is a serialized chart options object; the page script builds the
// chart from the data attribute once the library has loaded.
pub fn chart(options: &str) -> String {
    format!(
        "<div class=\"chart m-2 p-2 border\" data-options=\"{}\"></div>\n",
        escape(options)
    )
}

pub fn page(title: &str, highcharts_src: &str, navigation: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link href="{tailwind}" rel="stylesheet">
<script src="{highcharts}"></script>
</head>
<body>
<div class="md:container md:mx-auto">
<div class="min-h-screen flex flex-row bg-gray-100">
{navigation}<div class="p-3 flex-1">
<section><h1 class="text-2xl p-4 text-center">{title}</h1></section>
{content}</div>
</div>
</div>
<script>{script}</script>
</body>
</html>
"#,
        title = escape(title),
        tailwind = TAILWIND_HREF,
        highcharts = escape(highcharts_src),
        navigation = navigation,
        content = content,
        script = CHART_SCRIPT,
    )
}

#[cfg(test)]
pub mod tests {
    use super::{chart, escape, navigation, section, section_id, table};

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_section_id_and_markup() {
        assert_eq!(section_id("Status history"), "Status-history");

        let html = section("Restore points", "<p>body</p>");
        assert!(html.starts_with("<section id=\"Restore-points\""));
        assert!(html.contains(">Restore points</h3>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_navigation_prefixes_links() {
        let html = navigation(&[
            ("Metrics".to_string(), "Metrics".to_string()),
            ("Logs".to_string(), "#Logs".to_string()),
        ]);
        assert!(html.contains("href=\"#Metrics\">Metrics</a>"));
        assert!(html.contains("href=\"#Logs\">Logs</a>"));
        assert!(!html.contains("##"));
    }

    #[test]
    fn test_table() {
        let html = table(
            &["Key", "Value"],
            &[vec!["a".to_string(), "<b>1</b>".to_string()]],
        );
        assert!(html.contains(">Key</th>"));
        assert!(html.contains(">a</td>"));
        assert!(html.contains("><b>1</b></td>"));
    }

    #[test]
    fn test_chart_escapes_options() {
        let html = chart("{\"title\":{\"text\":\"a<b\"}}");
        assert!(html.contains("data-options=\"{&quot;title&quot;:{&quot;text&quot;:&quot;a&lt;b&quot;}}\""));
    }
}
