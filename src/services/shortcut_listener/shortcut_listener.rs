use crate::error::{DimError, Result};
use crate::events::{EngineEvent, KeyCode, KeyState};
use crate::mappings::Shortcut;
use crate::utils::DeviceFinder;
use crate::{debug_if_enabled, trace_if_enabled};
use evdev::{Device, EventType};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::key_mapping::KeyMapper;
use super::modifier_state::ModifierState;
use super::r#trait::ShortcutListenerTrait;
use super::ShortcutWatch;

/// Распознаёт нажатие комбинации в потоке событий клавиатуры
#[derive(Debug, Default)]
pub struct ChordDetector {
    modifiers: ModifierState,
}

impl ChordDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Обработать одно событие клавиши; `true` если нажата `shortcut`.
    ///
    /// Автоповтор не считается новым нажатием.
    pub fn on_key(&mut self, code: u16, state: KeyState, shortcut: Option<&Shortcut>) -> bool {
        let pressed = state != KeyState::Released;
        if self.modifiers.update_key(evdev::KeyCode::new(code), pressed) {
            return false;
        }
        if state != KeyState::Pressed {
            return false;
        }

        trace_if_enabled!(
            "Нажата клавиша {} ({})",
            code,
            KeyMapper::get_key_name(code).unwrap_or("?")
        );
        shortcut.is_some_and(|s| s.matches(KeyCode(code), self.modifiers.to_modifiers()))
    }
}

/// Читает клавиатуру без эксклюзивного захвата, события доходят до сессии как обычно
pub struct RealShortcutListener {
    device: Device,
    watch: ShortcutWatch,
    events: mpsc::Sender<EngineEvent>,
}

impl RealShortcutListener {
    pub fn new(device_path: &str, watch: ShortcutWatch, events: mpsc::Sender<EngineEvent>) -> Result<Self> {
        info!("Инициализация RealShortcutListener");

        let device_path = DeviceFinder::find_keyboard_device(device_path)?;
        let device = Device::open(&device_path).map_err(|e| {
            DimError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());

        Ok(Self { device, watch, events })
    }

    /// Блокирующий цикл чтения; завершается, когда движок закрыл канал
    fn read_loop(mut self) -> Result<()> {
        let mut detector = ChordDetector::new();

        loop {
            let batch: Vec<evdev::InputEvent> = match self.device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                    continue;
                }
            };

            for event in batch {
                if event.event_type() != EventType::KEY {
                    continue;
                }
                let Some(state) = KeyState::from_evdev_value(event.value()) else {
                    continue;
                };

                let shortcut = self.watch.read().clone();
                if !detector.on_key(event.code(), state, shortcut.as_ref()) {
                    continue;
                }

                debug_if_enabled!("Сработала горячая клавиша переключения");
                if self.events.blocking_send(EngineEvent::ToggleShortcut).is_err() {
                    info!("Движок остановлен, RealShortcutListener завершает работу");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ShortcutListenerTrait for RealShortcutListener {
    async fn run(self: Box<Self>) -> Result<()> {
        info!("RealShortcutListener запущен, начинаем чтение событий");

        // Отдельный поток не держит рантайм при завершении процесса
        let (done_tx, done_rx) = oneshot::channel();
        std::thread::Builder::new()
            .name("shortcut-listener".to_string())
            .spawn(move || {
                let _ = done_tx.send((*self).read_loop());
            })?;

        done_rx.await.unwrap_or_else(|_| {
            warn!("Поток чтения клавиатуры аварийно завершился");
            Err(DimError::Internal("поток чтения клавиатуры завершился без результата".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_D: u16 = 32;
    const KEY_LEFTMETA: u16 = 125;
    const KEY_LEFTSHIFT: u16 = 42;

    fn super_d() -> Shortcut {
        Shortcut::parse("<Super>d").unwrap()
    }

    #[test]
    fn test_chord_fires_on_press() {
        let mut detector = ChordDetector::new();
        let shortcut = super_d();

        assert!(!detector.on_key(KEY_LEFTMETA, KeyState::Pressed, Some(&shortcut)));
        assert!(detector.on_key(KEY_D, KeyState::Pressed, Some(&shortcut)));
        // Автоповтор и отпускание не срабатывают
        assert!(!detector.on_key(KEY_D, KeyState::Repeat, Some(&shortcut)));
        assert!(!detector.on_key(KEY_D, KeyState::Released, Some(&shortcut)));
    }

    #[test]
    fn test_extra_modifier_blocks_chord() {
        let mut detector = ChordDetector::new();
        let shortcut = super_d();

        detector.on_key(KEY_LEFTMETA, KeyState::Pressed, Some(&shortcut));
        detector.on_key(KEY_LEFTSHIFT, KeyState::Pressed, Some(&shortcut));
        assert!(!detector.on_key(KEY_D, KeyState::Pressed, Some(&shortcut)));
    }

    #[test]
    fn test_released_modifier_blocks_chord() {
        let mut detector = ChordDetector::new();
        let shortcut = super_d();

        detector.on_key(KEY_LEFTMETA, KeyState::Pressed, Some(&shortcut));
        detector.on_key(KEY_LEFTMETA, KeyState::Released, Some(&shortcut));
        assert!(!detector.on_key(KEY_D, KeyState::Pressed, Some(&shortcut)));
    }

    #[test]
    fn test_nothing_fires_without_shortcut() {
        let mut detector = ChordDetector::new();
        detector.on_key(KEY_LEFTMETA, KeyState::Pressed, None);
        assert!(!detector.on_key(KEY_D, KeyState::Pressed, None));
    }
}
