// ABOUTME: Plain-text rendering of project views for the terminal dashboard.
// ABOUTME: Relative timestamps and durations are formatted here.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::ProjectView;

/// Render a one-line-per-project overview.
pub fn render_dashboard(views: &[ProjectView], identity: Option<&str>) -> String {
    let mut out = String::new();

    match identity {
        Some(who) => {
            let _ = writeln!(out, "Logged in as {who}");
        }
        None => out.push_str("Not logged in\n"),
    }

    if views.is_empty() {
        out.push_str("\nNo projects yet. Run `deckhand deploy` in a project folder.\n");
        return out;
    }

    let name_width = views.iter().map(|v| v.name.as_str().len()).max().unwrap_or(0);
    let url_width = views
        .iter()
        .map(|v| v.public_url.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(1);

    out.push('\n');
    for view in views {
        let url = view.public_url.as_deref().unwrap_or("-");
        let _ = write!(
            out,
            "  {} {:<name_width$}  {:<8}  {:<url_width$}",
            view.status.glyph(),
            view.name.as_str(),
            view.status.as_str(),
            url,
        );

        let extras = [
            view.framework.clone(),
            view.cpu.as_ref().map(|c| format!("cpu {c}")),
            view.memory.as_ref().map(|m| format!("mem {m}")),
            view.uptime.as_ref().map(|u| format!("up {u}")),
        ];
        for extra in extras.into_iter().flatten() {
            let _ = write!(out, "  {extra}");
        }
        out.push('\n');
    }

    out
}

/// Render everything known about one project.
pub fn render_detail(view: &ProjectView, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", view.name, view.status);

    let mut field = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<13}{}", format!("{label}:"), value);
        }
    };

    field("Public URL", view.public_url.clone());
    field("Local URL", view.local_url.clone());
    field(
        "Tunnel",
        Some(if view.tunnel_active { "active" } else { "inactive" }.to_string()),
    );
    field("Framework", view.framework.clone());
    field("Directory", view.directory.clone());
    field("Resources", resources_line(view));
    field("Uptime", view.uptime.clone());
    field(
        "Auto-deploy",
        view.auto_deploy
            .as_ref()
            .map(|a| format!("{}@{}", a.repo, a.branch)),
    );
    if !view.custom_domains.is_empty() {
        field("Domains", Some(view.custom_domains.join(", ")));
    }

    if !view.deploys.is_empty() {
        out.push_str("\nRecent deploys\n");
        for deploy in &view.deploys {
            let _ = write!(out, "  #{:<6} {:<9}", deploy.id, deploy.status);
            if let Some(sha) = deploy.short_sha() {
                let _ = write!(out, " {sha}");
            }
            if let Some(ms) = deploy.duration_ms {
                let _ = write!(out, " {}", format_duration_ms(ms));
            }
            match deploy.created_at() {
                Some(at) => {
                    let _ = write!(out, " {}", format_relative(at, now));
                }
                None => {
                    let _ = write!(out, " {}", deploy.created_at);
                }
            }
            if let Some(error) = &deploy.error {
                let _ = write!(out, "  {error}");
            }
            out.push('\n');
        }
    }

    out
}

fn resources_line(view: &ProjectView) -> Option<String> {
    let parts: Vec<String> = [
        view.cpu.as_ref().map(|c| format!("cpu {c}")),
        view.memory.as_ref().map(|m| format!("mem {m}")),
        view.network.as_ref().map(|n| format!("net {n}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

/// "just now", "5m ago", "3h ago", "2d ago".
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// "850ms", "5.3s", "2m 05s".
pub fn format_duration_ms(ms: u64) -> String {
    match ms {
        ms if ms < 1_000 => format!("{ms}ms"),
        ms if ms < 60_000 => format!("{:.1}s", ms as f64 / 1_000.0),
        ms => format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000),
    }
}
