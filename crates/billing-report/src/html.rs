//! Self-contained HTML diff report.
//!
//! One collapsible block per customer (alphabetical), license rows grouped by
//! category, deltas coloured positive / negative / neutral, and a checkbox
//! that hides customers without changes. No external assets.

use std::collections::BTreeMap;

use billing_core::formatting::{delta_tone, format_count, format_delta, format_value, percent_change};
use billing_core::models::{
    Category, ComparisonResult, CustomerDiff, CustomerStatus, Delta, LicenseDelta,
};
use billing_data::summary::ComparisonSummary;
use chrono::{DateTime, Local};

/// Report header information.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub title: String,
    /// Label of the older extract, e.g. `"January 2025"`.
    pub older_label: String,
    /// Label of the newer extract.
    pub newer_label: String,
    pub generated_at: DateTime<Local>,
    /// Initial state of the "only customers with changes" toggle.
    pub changes_only: bool,
}

/// Generate the complete HTML report.
pub fn generate_html_report(
    metadata: &ReportMetadata,
    result: &ComparisonResult,
    summary: &ComparisonSummary,
) -> String {
    let header = generate_header(metadata);
    let summary_section = generate_summary_section(summary);
    let categories_section = generate_categories_section(summary);
    let customers_section = generate_customers_section(result, metadata.changes_only);
    let footer = generate_footer(metadata);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <div class="container">
{header}
{summary_section}
{categories_section}
{customers_section}
{footer}
    </div>
    <script>
{script}
    </script>
</body>
</html>"#,
        title = escape_html(&metadata.title),
        css = CSS,
        header = header,
        summary_section = summary_section,
        categories_section = categories_section,
        customers_section = customers_section,
        footer = footer,
        script = SCRIPT,
    )
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
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

// ── Sections ──────────────────────────────────────────────────────────────────

fn generate_header(metadata: &ReportMetadata) -> String {
    format!(
        r#"        <header class="header">
            <h1>{title}</h1>
            <p class="subtitle">{older} &rarr; {newer}</p>
        </header>"#,
        title = escape_html(&metadata.title),
        older = escape_html(&metadata.older_label),
        newer = escape_html(&metadata.newer_label),
    )
}

fn generate_summary_section(summary: &ComparisonSummary) -> String {
    let net = Delta::Count(summary.delta);
    let pct = percent_change(summary.older, summary.newer, 1)
        .map(|p| format!(" ({:+.1}%)", p))
        .unwrap_or_default();

    let cards = [
        ("Customers", format_count(summary.customers_total as i64), "neutral"),
        ("With changes", format_count(summary.customers_changed as i64), "neutral"),
        ("New", format_count(summary.customers_added as i64), "positive"),
        ("Gone", format_count(summary.customers_removed as i64), "negative"),
        ("Net licenses", format!("{}{}", format_delta(&net), pct), delta_tone(&net)),
    ];

    let cards_html = cards
        .iter()
        .map(|(label, value, tone)| {
            format!(
                r#"                <div class="summary-card">
                    <h4>{label}</h4>
                    <p class="{tone}">{value}</p>
                </div>"#,
                label = label,
                tone = tone,
                value = value,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <section class="section">
            <h2 class="section-title">Summary</h2>
            <div class="summary-grid">
{cards}
            </div>
        </section>"#,
        cards = cards_html,
    )
}

fn generate_categories_section(summary: &ComparisonSummary) -> String {
    if summary.categories.is_empty() {
        return String::new();
    }

    let rows = summary
        .categories
        .iter()
        .map(|(category, totals)| {
            let delta = Delta::Count(totals.delta);
            format!(
                r#"                    <tr>
                        <td>{category}</td>
                        <td class="num">{older}</td>
                        <td class="num">{newer}</td>
                        <td class="num {tone}">{delta}</td>
                        <td class="num">{changed}</td>
                    </tr>"#,
                category = category.label(),
                older = format_count(totals.older),
                newer = format_count(totals.newer),
                tone = delta_tone(&delta),
                delta = format_delta(&delta),
                changed = totals.changed_licenses,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <section class="section">
            <h2 class="section-title">By Category</h2>
            <table class="diff-table">
                <thead>
                    <tr>
                        <th>Category</th>
                        <th class="num">Older</th>
                        <th class="num">Newer</th>
                        <th class="num">Change</th>
                        <th class="num">Changed entries</th>
                    </tr>
                </thead>
                <tbody>
{rows}
                </tbody>
            </table>
        </section>"#,
        rows = rows,
    )
}

fn generate_customers_section(result: &ComparisonResult, changes_only: bool) -> String {
    let mut customers: Vec<(&str, &CustomerDiff)> = result.iter().collect();
    customers.sort_by(|a, b| a.0.cmp(b.0));

    let blocks = customers
        .iter()
        .map(|(name, diff)| generate_customer_block(name, diff))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <section class="section">
            <h2 class="section-title">Customers ({count})</h2>
            <label class="filter">
                <input type="checkbox" id="changes-only"{checked}> Show only customers with changes
            </label>
{blocks}
        </section>"#,
        count = customers.len(),
        checked = if changes_only { " checked" } else { "" },
        blocks = blocks,
    )
}

fn generate_customer_block(name: &str, diff: &CustomerDiff) -> String {
    let badge = match diff.status {
        CustomerStatus::Added => r#" <span class="badge badge-added">New</span>"#,
        CustomerStatus::Removed => r#" <span class="badge badge-removed">Gone</span>"#,
        CustomerStatus::Retained => "",
    };
    let total = Delta::Count(diff.total_delta);

    let body = if diff.licenses.is_empty() {
        r#"                <p class="empty">No billable licenses in either extract.</p>"#.to_string()
    } else {
        generate_license_table(diff)
    };

    format!(
        r#"            <details class="customer" data-changed="{changed}"{open}>
                <summary>
                    <span class="customer-name">{name}</span>{badge}
                    <span class="customer-total {tone}">{older} &rarr; {newer} ({delta})</span>
                </summary>
{body}
            </details>"#,
        changed = diff.has_changes,
        open = if diff.has_changes { " open" } else { "" },
        name = escape_html(name),
        badge = badge,
        tone = delta_tone(&total),
        older = format_count(diff.total_older),
        newer = format_count(diff.total_newer),
        delta = format_delta(&total),
        body = body,
    )
}

fn generate_license_table(diff: &CustomerDiff) -> String {
    let mut grouped: BTreeMap<Category, Vec<(&str, &LicenseDelta)>> = BTreeMap::new();
    for (license, delta) in &diff.licenses {
        grouped
            .entry(delta.category)
            .or_default()
            .push((license.as_str(), delta));
    }

    let rows = grouped
        .iter()
        .flat_map(|(category, entries)| {
            let heading = format!(
                r#"                        <tr class="category-row"><td colspan="4">{}</td></tr>"#,
                category.label()
            );
            std::iter::once(heading).chain(entries.iter().map(|(license, delta)| {
                format!(
                    r#"                        <tr class="{row_class}">
                            <td>{license}</td>
                            <td class="num">{older}</td>
                            <td class="num">{newer}</td>
                            <td class="num {tone}">{delta}</td>
                        </tr>"#,
                    row_class = if delta.changed { "changed" } else { "unchanged" },
                    license = escape_html(license),
                    older = escape_html(&format_value(&delta.older)),
                    newer = escape_html(&format_value(&delta.newer)),
                    tone = delta_tone(&delta.delta),
                    delta = format_delta(&delta.delta),
                )
            }))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"                <table class="diff-table">
                    <thead>
                        <tr>
                            <th>License</th>
                            <th class="num">Older</th>
                            <th class="num">Newer</th>
                            <th class="num">Change</th>
                        </tr>
                    </thead>
                    <tbody>
{rows}
                    </tbody>
                </table>"#,
        rows = rows,
    )
}

fn generate_footer(metadata: &ReportMetadata) -> String {
    format!(
        r#"        <footer class="footer">
            <p>Generated: {date}</p>
        </footer>"#,
        date = metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

// ── Static assets ─────────────────────────────────────────────────────────────

const CSS: &str = r#"
        :root {
            --primary: #1e40af;
            --secondary: #64748b;
            --success: #16a34a;
            --danger: #dc2626;
            --light: #f8fafc;
            --dark: #1e293b;
            --border: #e2e8f0;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: 'Segoe UI', system-ui, -apple-system, sans-serif;
            line-height: 1.5;
            color: var(--dark);
            background: var(--light);
        }

        .container { max-width: 1100px; margin: 0 auto; padding: 2rem; background: white; min-height: 100vh; }

        .header { text-align: center; padding: 1.5rem 0; border-bottom: 3px solid var(--primary); margin-bottom: 2rem; }
        .header h1 { color: var(--primary); font-size: 1.8rem; font-weight: 600; }
        .header .subtitle { color: var(--secondary); font-size: 1.1rem; }

        .section { margin-bottom: 2rem; }
        .section-title { color: var(--primary); font-size: 1.3rem; margin-bottom: 1rem; border-bottom: 1px solid var(--border); }

        .summary-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 1rem; }
        .summary-card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem; text-align: center; }
        .summary-card h4 { color: var(--secondary); font-weight: 500; font-size: 0.9rem; }
        .summary-card p { font-size: 1.5rem; font-weight: 600; }

        .diff-table { width: 100%; border-collapse: collapse; font-size: 0.95rem; }
        .diff-table th, .diff-table td { padding: 0.4rem 0.75rem; border-bottom: 1px solid var(--border); text-align: left; }
        .diff-table th { background: var(--light); color: var(--secondary); font-weight: 600; }
        .diff-table .num { text-align: right; font-variant-numeric: tabular-nums; }
        .category-row td { background: #eef2ff; color: var(--primary); font-weight: 600; }
        tr.unchanged td { color: var(--secondary); }

        .positive { color: var(--success); }
        .negative { color: var(--danger); }
        .neutral { color: var(--secondary); }

        .filter { display: block; margin-bottom: 1rem; cursor: pointer; }

        .customer { border: 1px solid var(--border); border-radius: 8px; margin-bottom: 0.75rem; }
        .customer summary { padding: 0.75rem 1rem; cursor: pointer; display: flex; gap: 0.75rem; align-items: center; }
        .customer[data-changed="true"] summary { background: #fefce8; }
        .customer .customer-name { font-weight: 600; flex: 1; }
        .customer .diff-table, .customer .empty { margin: 0 1rem 1rem; width: calc(100% - 2rem); }
        .empty { color: var(--secondary); font-style: italic; }

        .badge { font-size: 0.75rem; padding: 0.1rem 0.5rem; border-radius: 999px; color: white; }
        .badge-added { background: var(--success); }
        .badge-removed { background: var(--danger); }

        .footer { text-align: center; color: var(--secondary); font-size: 0.85rem; padding-top: 1rem; border-top: 1px solid var(--border); }
"#;

const SCRIPT: &str = r#"
        (function () {
            var toggle = document.getElementById('changes-only');
            function applyFilter() {
                var unchanged = document.querySelectorAll('.customer[data-changed="false"]');
                for (var i = 0; i < unchanged.length; i++) {
                    unchanged[i].hidden = toggle.checked;
                }
            }
            toggle.addEventListener('change', applyFilter);
            applyFilter();
        })();
"#;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::catalog::LicenseCatalog;
    use billing_core::models::{LicenseRecord, LicenseValue, Snapshot};
    use billing_data::comparator::compare;

    fn metadata(changes_only: bool) -> ReportMetadata {
        ReportMetadata {
            title: "Billing Comparison".to_string(),
            older_label: "January 2025".to_string(),
            newer_label: "February 2025".to_string(),
            generated_at: Local::now(),
            changes_only,
        }
    }

    fn sample() -> ComparisonResult {
        use LicenseValue::{Count, Text};
        let catalog = LicenseCatalog::new(&["AgentA"], &["RMM"], &["SKU"], "M365").unwrap();
        let snapshot = |rows: Vec<(&str, Vec<(&str, LicenseValue)>)>| -> Snapshot {
            rows.into_iter()
                .map(|(c, cells)| (c, cells.into_iter().collect::<LicenseRecord>()))
                .collect()
        };
        let older = snapshot(vec![
            ("Zeta <Holdings> & Co", vec![("AgentA", Count(10)), ("SKU", Text("BASIC".into()))]),
            ("Acme", vec![("RMM", Count(3))]),
            ("Gone Ltd", vec![("M365 E3", Count(4))]),
        ]);
        let newer = snapshot(vec![
            ("Zeta <Holdings> & Co", vec![("AgentA", Count(7)), ("SKU", Text("PREMIUM".into()))]),
            ("Acme", vec![("RMM", Count(3))]),
            ("NewCo", vec![("AgentA", Count(1200))]),
        ]);
        compare(&older, &newer, &catalog)
    }

    fn render(changes_only: bool) -> String {
        let result = sample();
        let summary = ComparisonSummary::from_result(&result);
        generate_html_report(&metadata(changes_only), &result, &summary)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_report_skeleton() {
        let html = render(false);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Billing Comparison</title>"));
        assert!(html.contains("January 2025 &rarr; February 2025"));
        assert!(html.contains("id=\"changes-only\""));
    }

    #[test]
    fn test_customer_names_are_escaped() {
        let html = render(false);
        assert!(html.contains("Zeta &lt;Holdings&gt; &amp; Co"));
        assert!(!html.contains("Zeta <Holdings>"));
    }

    #[test]
    fn test_customers_in_alphabetical_order() {
        let html = render(false);
        let acme = html.find(">Acme<").unwrap();
        let gone = html.find(">Gone Ltd<").unwrap();
        let newco = html.find(">NewCo<").unwrap();
        let zeta = html.find(">Zeta &lt;").unwrap();
        assert!(acme < gone && gone < newco && newco < zeta);
    }

    #[test]
    fn test_changed_flags_and_badges() {
        let html = render(false);
        assert_eq!(html.matches(r#"data-changed="true""#).count(), 3);
        assert_eq!(html.matches(r#"data-changed="false""#).count(), 1);
        assert!(html.contains("badge-added"));
        assert!(html.contains("badge-removed"));
    }

    #[test]
    fn test_delta_tones_and_placeholders() {
        let html = render(false);
        assert!(html.contains(r#"<td class="num negative">-3</td>"#));
        assert!(html.contains(r#"<td class="num positive">+1,200</td>"#));
        assert!(html.contains(r#"<td class="num neutral">—</td>"#));
        assert!(html.contains("PREMIUM"));
    }

    #[test]
    fn test_category_headings_follow_display_order() {
        let html = render(false);
        let customer = html.find("Zeta &lt;").unwrap();
        let rest = &html[customer..];
        let security = rest.find(Category::SecurityAgent.label()).unwrap();
        let third = rest.find(Category::ThirdParty.label()).unwrap();
        assert!(security < third);
    }

    #[test]
    fn test_changes_only_initial_state() {
        assert!(render(true).contains(r#"id="changes-only" checked>"#));
        assert!(render(false).contains(r#"id="changes-only">"#));
    }

    #[test]
    fn test_empty_comparison() {
        let result = ComparisonResult::default();
        let summary = ComparisonSummary::from_result(&result);
        let html = generate_html_report(&metadata(false), &result, &summary);
        assert!(html.contains("Customers (0)"));
        assert!(!html.contains("By Category"));
    }
}
