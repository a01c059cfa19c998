use services::session::SUPPRESSED_SHORTCUTS;

/// Attaches the environment listeners under `key` and forwards what they see
/// through `dioxus.send`. The script stays pending until the matching
/// [`uninstall_monitor_script`] runs, so the eval channel lives as long as the listeners.
pub(super) fn install_monitor_script(key: &str) -> String {
    let shortcuts = serde_json::to_string(&SUPPRESSED_SHORTCUTS).unwrap_or_else(|_| "[]".into());
    format!(
        r#"
        const key = {key:?};
        const registry = window.__proctorMonitors || (window.__proctorMonitors = {{}});
        if (registry[key]) {{
            return;
        }}
        const shortcuts = {shortcuts};
        const onVisibility = () => {{
            dioxus.send({{ kind: "visibility", hidden: document.hidden }});
        }};
        const onPopState = () => {{
            history.pushState(null, "", window.location.href);
            dioxus.send({{ kind: "pop_state" }});
        }};
        const onContextMenu = (event) => {{
            event.preventDefault();
            dioxus.send({{ kind: "context_menu" }});
        }};
        const onKeyDown = (event) => {{
            const blocked = shortcuts.some((s) =>
                s.key === event.key && (!s.ctrl || event.ctrlKey) && (!s.shift || event.shiftKey));
            if (!blocked) {{
                return;
            }}
            event.preventDefault();
            dioxus.send({{
                kind: "key_down",
                key: event.key,
                ctrl: event.ctrlKey,
                shift: event.shiftKey,
            }});
        }};
        history.pushState(null, "", window.location.href);
        document.addEventListener("visibilitychange", onVisibility);
        window.addEventListener("popstate", onPopState);
        document.addEventListener("contextmenu", onContextMenu);
        document.addEventListener("keydown", onKeyDown);
        await new Promise((resolve) => {{
            registry[key] = () => {{
                document.removeEventListener("visibilitychange", onVisibility);
                window.removeEventListener("popstate", onPopState);
                document.removeEventListener("contextmenu", onContextMenu);
                document.removeEventListener("keydown", onKeyDown);
                delete registry[key];
                resolve();
            }};
        }});
        "#
    )
}

pub(super) fn uninstall_monitor_script(key: &str) -> String {
    format!(
        r#"
        const registry = window.__proctorMonitors;
        const stop = registry && registry[{key:?}];
        if (stop) {{
            stop();
        }}
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_script_is_scoped_to_its_key() {
        let script = install_monitor_script("proctor-monitor-abc-1");
        assert!(script.contains(r#"const key = "proctor-monitor-abc-1";"#));
        assert!(script.contains(r#""key":"F12""#));
        assert!(script.contains("visibilitychange"));

        let script = uninstall_monitor_script("proctor-monitor-abc-1");
        assert!(script.contains(r#"registry["proctor-monitor-abc-1"]"#));
    }
}
