use crate::engine::{EffectParam, EffectParams};
use crate::error::{HostError, HostResult};
use crate::events::{MaximizeState, Monitor, MonitorId, Rect, WindowId, WindowSnapshot, WindowType};
use crate::mappings::Shortcut;
use crate::services::shortcut_listener::ShortcutWatch;
use crate::debug_if_enabled;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;
use tracing::{debug, info};

use super::r#trait::Compositor;

/// Узел дерева `swaymsg -t get_tree`
#[derive(Debug, Deserialize)]
struct SwayNode {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    focused: bool,
    rect: SwayRect,
    #[serde(default)]
    nodes: Vec<SwayNode>,
    #[serde(default)]
    floating_nodes: Vec<SwayNode>,
    #[serde(default)]
    fullscreen_mode: u8,
    #[serde(default)]
    sticky: bool,
    #[serde(default)]
    pid: Option<u32>,
    #[serde(default)]
    window_properties: Option<WindowProperties>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SwayRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<SwayRect> for Rect {
    fn from(r: SwayRect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

#[derive(Debug, Deserialize)]
struct WindowProperties {
    #[serde(default)]
    window_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Разобранное дерево sway: окна и мониторы
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SwayTree {
    pub windows: Vec<WindowSnapshot>,
    pub monitors: Vec<Monitor>,
}

impl SwayTree {
    /// Получить дерево через `swaymsg`
    pub fn fetch() -> HostResult<Self> {
        let output = Command::new("swaymsg")
            .args(["-r", "-t", "get_tree"])
            .output()
            .map_err(|e| HostError::Command(format!("swaymsg не найден: {}", e)))?;

        if !output.status.success() {
            return Err(HostError::Command("swaymsg get_tree вернул ошибку".to_string()));
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    pub fn parse(json: &str) -> HostResult<Self> {
        let root: SwayNode = serde_json::from_str(json)?;
        let mut tree = SwayTree::default();

        // Первый активный выход считается основным
        let outputs = root
            .nodes
            .iter()
            .filter(|node| node.node_type == "output" && node.name.as_deref() != Some("__i3"));

        for (index, output) in outputs.enumerate() {
            let monitor = MonitorId(index as u32);
            let work_area = output
                .nodes
                .iter()
                .find(|node| node.node_type == "workspace")
                .map(|workspace| Rect::from(workspace.rect))
                .unwrap_or_else(|| Rect::from(output.rect));

            tree.monitors.push(Monitor {
                id: monitor,
                is_primary: index == 0,
                work_area,
            });

            for workspace in output.nodes.iter().filter(|node| node.node_type == "workspace") {
                Self::collect_windows(workspace, monitor, false, &mut tree.windows);
            }
        }

        Ok(tree)
    }

    fn collect_windows(node: &SwayNode, monitor: MonitorId, floating: bool, out: &mut Vec<WindowSnapshot>) {
        let is_leaf = node.nodes.is_empty() && node.floating_nodes.is_empty();
        let is_window = matches!(node.node_type.as_str(), "con" | "floating_con")
            && is_leaf
            && (node.pid.is_some() || node.window_properties.is_some());

        if is_window {
            let window_type = match node
                .window_properties
                .as_ref()
                .and_then(|props| props.window_type.as_deref())
            {
                None | Some("normal") => WindowType::Normal,
                Some("dialog") => WindowType::Dialog,
                Some(_) => WindowType::Other,
            };

            let maximize = if node.fullscreen_mode != 0 {
                MaximizeState::Both
            } else {
                MaximizeState::None
            };

            out.push(WindowSnapshot {
                id: WindowId(node.id),
                title: node.name.clone().unwrap_or_default(),
                window_type,
                has_focus: node.focused,
                is_above: floating && node.sticky,
                maximize,
                frame: node.rect.into(),
                monitor,
            });
            return;
        }

        for child in &node.nodes {
            Self::collect_windows(child, monitor, floating, out);
        }
        for child in &node.floating_nodes {
            Self::collect_windows(child, monitor, true, out);
        }
    }
}

/// Компоновщик sway: эффект затемнения выражается через `opacity`.
///
/// Насыщенность sway не поддерживает, поэтому соответствующие команды
/// только логируются.
pub struct SwayCompositor {
    monitors: HashMap<MonitorId, Monitor>,
    shortcut_watch: ShortcutWatch,
}

impl SwayCompositor {
    pub fn new(shortcut_watch: ShortcutWatch) -> Self {
        info!("Инициализация SwayCompositor");
        Self {
            monitors: HashMap::new(),
            shortcut_watch,
        }
    }

    pub fn test() -> HostResult<()> {
        let output = Command::new("swaymsg").args(["-t", "get_version"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(HostError::Command("sway недоступен".to_string()))
        }
    }

    fn run_command(window: WindowId, command: &str) -> HostResult<()> {
        let criteria = format!("[con_id={}] {}", window.0, command);
        debug_if_enabled!("swaymsg {}", criteria);

        let output = Command::new("swaymsg").args(["-r", &criteria]).output()?;
        Self::check_reply(window, &String::from_utf8_lossy(&output.stdout))
    }

    fn check_reply(window: WindowId, stdout: &str) -> HostResult<()> {
        let replies: Vec<CommandReply> = serde_json::from_str(stdout)?;
        for reply in replies {
            if reply.success {
                continue;
            }
            let error = reply.error.unwrap_or_default();
            if error.contains("No matching node") {
                return Err(HostError::StaleWindow(window));
            }
            return Err(HostError::Command(error));
        }
        Ok(())
    }
}

impl Compositor for SwayCompositor {
    fn windows(&mut self) -> HostResult<Vec<WindowSnapshot>> {
        let tree = SwayTree::fetch()?;
        self.monitors = tree.monitors.into_iter().map(|m| (m.id, m)).collect();
        Ok(tree.windows)
    }

    fn monitor(&self, id: MonitorId) -> Option<Monitor> {
        self.monitors.get(&id).copied()
    }

    fn overview_visible(&self) -> bool {
        false
    }

    fn attach_effect(&mut self, window: WindowId, _name: &str, params: EffectParams) -> HostResult<()> {
        Self::run_command(window, &format!("opacity {:.3}", params.brightness))
    }

    fn remove_effect(&mut self, window: WindowId, _name: &str) -> HostResult<()> {
        Self::run_command(window, "opacity 1")
    }

    fn set_effect_parameter(
        &mut self,
        window: WindowId,
        _name: &str,
        param: EffectParam,
        value: f64,
    ) -> HostResult<()> {
        match param {
            EffectParam::Brightness => Self::run_command(window, &format!("opacity {:.3}", value)),
            EffectParam::Saturation => {
                debug!("sway не поддерживает насыщенность, окно {} пропущено", window);
                Ok(())
            }
        }
    }

    fn register_keybinding(&mut self, shortcut: &Shortcut) -> HostResult<()> {
        *self.shortcut_watch.write() = Some(shortcut.clone());
        Ok(())
    }

    fn unregister_keybinding(&mut self) {
        *self.shortcut_watch.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "id": 1, "type": "root", "name": "root",
        "rect": {"x": 0, "y": 0, "width": 3200, "height": 1080},
        "nodes": [
            {"id": 2, "type": "output", "name": "__i3",
             "rect": {"x": 0, "y": 0, "width": 1920, "height": 1080}, "nodes": []},
            {"id": 3, "type": "output", "name": "DP-1",
             "rect": {"x": 0, "y": 0, "width": 1920, "height": 1080},
             "nodes": [
                {"id": 4, "type": "workspace", "name": "1",
                 "rect": {"x": 0, "y": 30, "width": 1920, "height": 1050},
                 "nodes": [
                    {"id": 10, "type": "con", "name": "Terminal", "focused": true, "pid": 100,
                     "rect": {"x": 0, "y": 30, "width": 960, "height": 1050}, "nodes": []},
                    {"id": 11, "type": "con", "name": "Browser", "pid": 101,
                     "rect": {"x": 960, "y": 30, "width": 960, "height": 1050}, "nodes": []}
                 ],
                 "floating_nodes": [
                    {"id": 12, "type": "floating_con", "name": "Picture", "pid": 102, "sticky": true,
                     "rect": {"x": 100, "y": 100, "width": 300, "height": 200}, "nodes": []},
                    {"id": 13, "type": "floating_con", "name": "Save As", "pid": 103,
                     "window_properties": {"window_type": "dialog"},
                     "rect": {"x": 500, "y": 300, "width": 600, "height": 400}, "nodes": []}
                 ]}
             ]},
            {"id": 5, "type": "output", "name": "HDMI-A-1",
             "rect": {"x": 1920, "y": 0, "width": 1280, "height": 1024},
             "nodes": [
                {"id": 6, "type": "workspace", "name": "2",
                 "rect": {"x": 1920, "y": 0, "width": 1280, "height": 1024},
                 "nodes": [
                    {"id": 20, "type": "con", "name": "Video", "pid": 200, "fullscreen_mode": 1,
                     "rect": {"x": 1920, "y": 0, "width": 1280, "height": 1024}, "nodes": []}
                 ]}
             ]}
        ]
    }"#;

    #[test]
    fn test_parse_tree_windows_and_monitors() {
        let tree = SwayTree::parse(TREE).unwrap();

        assert_eq!(tree.monitors.len(), 2);
        assert!(tree.monitors[0].is_primary);
        assert_eq!(tree.monitors[0].work_area, Rect::new(0, 30, 1920, 1050));
        assert!(!tree.monitors[1].is_primary);

        let ids: Vec<u64> = tree.windows.iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![10, 11, 12, 13, 20]);
    }

    #[test]
    fn test_parse_tree_window_attributes() {
        let tree = SwayTree::parse(TREE).unwrap();
        let find = |id: u64| tree.windows.iter().find(|w| w.id == WindowId(id)).unwrap();

        assert!(find(10).has_focus);
        assert_eq!(find(11).frame, Rect::new(960, 30, 960, 1050));
        assert!(find(12).is_above);
        assert_eq!(find(13).window_type, WindowType::Dialog);
        assert_eq!(find(20).maximize, MaximizeState::Both);
        assert_eq!(find(20).monitor, MonitorId(1));
    }

    #[test]
    fn test_command_reply_no_matching_node_is_stale() {
        let stale = SwayCompositor::check_reply(
            WindowId(5),
            r#"[{"success": false, "error": "No matching node."}]"#,
        );
        assert!(matches!(stale, Err(HostError::StaleWindow(WindowId(5)))));

        assert!(SwayCompositor::check_reply(WindowId(5), r#"[{"success": true}]"#).is_ok());
        assert!(matches!(
            SwayCompositor::check_reply(WindowId(5), r#"[{"success": false, "error": "boom"}]"#),
            Err(HostError::Command(_))
        ));
    }
}
