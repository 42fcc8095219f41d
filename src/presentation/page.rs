// Single-page view with the initial state embedded for first paint
use crate::domain::dashboard::Dashboard;
use crate::domain::user::User;
use serde::Serialize;

const TEMPLATE: &str = include_str!("page.html");

/// JSON that is safe to drop inside a `<script>` element
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to serialize page state: {}", e);
            "null".to_string()
        })
        .replace("</", "<\\/")
}

/// Fill the template markers in one pass, in the order they appear, so
/// embedded data can never be mistaken for a later marker.
pub fn render_page(users: &[User], dashboards: &[Dashboard], ha_url: &str) -> String {
    let replacements = [
        ("__DASHBOARDS__", script_json(dashboards)),
        ("__USERS__", script_json(users)),
        ("__HA_URL__", script_json(ha_url)),
    ];

    let mut html = String::with_capacity(TEMPLATE.len());
    let mut rest = TEMPLATE;
    for (marker, value) in &replacements {
        if let Some((head, tail)) = rest.split_once(*marker) {
            html.push_str(head);
            html.push_str(value);
            rest = tail;
        }
    }
    html.push_str(rest);
    html
}
