use crate::models::{JournalEntry, Mood};
use crate::stats::DashboardResponse;
use chrono::Local;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 200.0;
const CHART_PADDING: f64 = 28.0;

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

pub fn render_login(message: Option<&str>) -> String {
    let notice = message
        .map(|text| format!(r#"<p class="notice">{}</p>"#, escape_html(text)))
        .unwrap_or_default();
    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{NOTICE}}", &notice)
}

pub fn render_dashboard(
    alias: &str,
    dashboard: &DashboardResponse,
    recent: &[&JournalEntry],
) -> String {
    let stats = &dashboard.stats;
    let frequent = dashboard
        .frequent_mood
        .as_ref()
        .map(|badge| badge.emoji)
        .unwrap_or("-");

    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TOTAL}}", &stats.total.to_string())
        .replace("{{FREQUENT}}", frequent)
        .replace("{{WEEKS}}", &stats.weekly.len().to_string())
        .replace("{{STREAK}}", &stats.streak.to_string())
        .replace("{{MOOD_OPTIONS}}", &mood_options())
        .replace("{{CHART}}", &mood_chart(dashboard))
        .replace("{{ENTRIES}}", &entry_list(recent))
        .replacen("{{ALIAS}}", &escape_html(alias), 1)
}

fn mood_options() -> String {
    Mood::all()
        .map(|mood| {
            let checked = if mood.value() == 3 { " checked" } else { "" };
            format!(
                r#"<label class="mood" title="{label}"><input type="radio" name="mood" value="{value}"{checked} /><span>{emoji}</span></label>"#,
                label = mood.label(),
                value = mood.value(),
                emoji = mood.emoji(),
            )
        })
        .collect()
}

fn mood_chart(dashboard: &DashboardResponse) -> String {
    let points = &dashboard.chart;
    if points.is_empty() {
        return r#"<text class="chart-label" x="50%" y="50%" text-anchor="middle">No entries yet</text>"#
            .to_string();
    }

    let step = if points.len() > 1 {
        (CHART_WIDTH - CHART_PADDING * 2.0) / (points.len() - 1) as f64
    } else {
        0.0
    };
    let y = |mood: u8| {
        let span = f64::from(Mood::MAX - Mood::MIN);
        CHART_HEIGHT
            - CHART_PADDING
            - (f64::from(mood - Mood::MIN) / span) * (CHART_HEIGHT - CHART_PADDING * 2.0)
    };

    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, point)| (CHART_PADDING + step * i as f64, y(point.mood.value())))
        .collect();

    let path = coords
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    let dots: String = coords
        .iter()
        .zip(points)
        .map(|((x, y), point)| {
            format!(
                r#"<circle class="chart-point" cx="{x:.1}" cy="{y:.1}" r="4"><title>{} {}</title></circle>"#,
                point.date,
                point.mood.emoji()
            )
        })
        .collect();

    format!(r#"<polyline class="chart-line" points="{path}" />{dots}"#)
}

fn entry_list(recent: &[&JournalEntry]) -> String {
    if recent.is_empty() {
        return r#"<p class="hint">Your first entry awaits.</p>"#.to_string();
    }
    recent
        .iter()
        .map(|entry| {
            format!(
                r#"<article class="entry"><header><span>{emoji} {label}</span><time>{when}</time></header><p>{content}</p></article>"#,
                emoji = entry.mood.emoji(),
                label = entry.mood.label(),
                when = entry
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
                content = escape_html(&entry.content),
            )
        })
        .collect()
}

const STYLE: &str = r#"
    :root {
      --bg: #eef6f3;
      --ink: #24302c;
      --accent: #2f8f73;
      --muted: #6b7a74;
      --card: rgba(255, 255, 255, 0.9);
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg), #e6eefb);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px;
    }
    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: 0 20px 50px rgba(36, 48, 44, 0.15);
      padding: 32px;
      display: grid;
      gap: 24px;
    }
    h1 { margin: 0; font-family: Georgia, serif; }
    .subtitle, .hint { margin: 0; color: var(--muted); }
    .panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 14px; }
    .stat { background: white; border-radius: 16px; padding: 16px; display: grid; gap: 6px; text-align: center; }
    .stat .value { font-size: 1.7rem; font-weight: 600; }
    .stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: var(--muted); }
    form { display: grid; gap: 12px; }
    input[type=text], input[type=email], input[type=password], textarea {
      border: 1px solid #cfdad6; border-radius: 12px; padding: 12px; font: inherit;
    }
    textarea { min-height: 120px; }
    button { border: none; border-radius: 999px; padding: 12px 18px; font-weight: 600; cursor: pointer; background: var(--accent); color: white; }
    .moods { display: flex; gap: 10px; justify-content: center; }
    .mood input { display: none; }
    .mood span { font-size: 1.8rem; padding: 6px; border-radius: 999px; cursor: pointer; }
    .mood input:checked + span { background: #cdeee2; }
    .entry { background: white; border-radius: 14px; padding: 14px; }
    .entry header { display: flex; justify-content: space-between; color: var(--muted); font-size: 0.9rem; }
    .entry p { white-space: pre-wrap; }
    .notice { background: #fff6df; border-radius: 12px; padding: 10px 14px; }
    #chart { width: 100%; height: 200px; background: white; border-radius: 16px; }
    .chart-line { fill: none; stroke: var(--accent); stroke-width: 3; }
    .chart-point { fill: white; stroke: var(--accent); stroke-width: 2; }
    .chart-label { fill: var(--muted); font-size: 12px; }
    .columns { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 20px; }
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Sign in · Wellness Journal</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Wellness Journal</h1>
      <p class="subtitle">A private space for your thoughts, and a community that listens.</p>
    </header>
    {{NOTICE}}
    <section class="columns">
      <form method="post" action="/login">
        <h2>Sign in</h2>
        <input type="email" name="email" placeholder="Email" required />
        <input type="password" name="password" placeholder="Password" required />
        <button type="submit">Sign in</button>
      </form>
      <form method="post" action="/signup">
        <h2>Create account</h2>
        <input type="text" name="alias" placeholder="Alias" required />
        <input type="email" name="email" placeholder="Email" required />
        <input type="password" name="password" placeholder="Password" required />
        <button type="submit">Sign up</button>
      </form>
    </section>
    <form method="post" action="/login/anonymous">
      <button type="submit">Continue anonymously</button>
    </form>
  </main>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Dashboard · Wellness Journal</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Hello, {{ALIAS}}</h1>
      <p class="subtitle">Your wellness journey at a glance.</p>
    </header>

    <section class="panel">
      <div class="stat"><span class="value">{{TOTAL}}</span><span class="label">Total entries</span></div>
      <div class="stat"><span class="value">{{FREQUENT}}</span><span class="label">Frequent mood</span></div>
      <div class="stat"><span class="value">{{WEEKS}}</span><span class="label">Weekly summaries</span></div>
      <div class="stat"><span class="value">{{STREAK}}</span><span class="label">Longest streak</span></div>
    </section>

    <section>
      <h2>Mood over time</h2>
      <svg id="chart" viewBox="0 0 600 200" role="img" aria-label="Mood chart">{{CHART}}</svg>
    </section>

    <form method="post" action="/journal">
      <h2>How are you feeling today?</h2>
      <div class="moods">{{MOOD_OPTIONS}}</div>
      <textarea name="content" placeholder="Write about your day..." required></textarea>
      <button type="submit">Save entry</button>
    </form>

    <section>
      <h2>Recent entries</h2>
      {{ENTRIES}}
    </section>

    <form method="post" action="/logout">
      <button type="submit">Sign out</button>
    </form>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::build_dashboard;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn escape_html_neutralises_markup() {
        assert_eq!(
            escape_html(r#"<b>"hi" & 'bye'</b>"#),
            "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn dashboard_renders_stats_and_escapes_content() {
        let entry = JournalEntry {
            id: 1,
            created_at: Utc::now(),
            mood: Mood::new(5).unwrap(),
            content: "<script>alert(1)</script>".into(),
            user_id: Uuid::nil(),
        };
        let entries = vec![entry];
        let dashboard = build_dashboard(&entries);
        let recent: Vec<_> = entries.iter().collect();
        let html = render_dashboard("river", &dashboard, &recent);

        assert!(html.contains("Hello, river"));
        assert!(html.contains(r#"<span class="value">😄</span>"#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn login_shows_notice() {
        let html = render_login(Some("Invalid login credentials."));
        assert!(html.contains(r#"<p class="notice">Invalid login credentials.</p>"#));
        assert!(!render_login(None).contains("class=\"notice\""));
    }
}
