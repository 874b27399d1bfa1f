// Dashboard page. The page is static apart from its title; charts are
// drawn client-side from the JSON endpoints.

const DASHBOARD_TEMPLATE: &str = include_str!("../assets/dashboard.html");

pub fn render_dashboard(title: &str) -> String {
    DASHBOARD_TEMPLATE.replace("{{title}}", &escape_html(title))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
