use crate::dim_error;
use crate::error::{DimError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Поиск клавиатуры, с которой слушается горячая клавиша переключения
pub struct DeviceFinder;

impl DeviceFinder {
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                DimError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        Self::auto_find_keyboard()
    }

    fn auto_find_keyboard() -> Result<PathBuf> {
        info!("Начинаем автопоиск клавиатурного устройства...");

        if let Some(device) = Self::find_by_id()? {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Some(device) = Self::find_by_event_devices()? {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        DimError::device_not_found(
            "Не удалось найти подходящее клавиатурное устройство. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    /// Приоритет ссылки из `/dev/input/by-id`; `None` для не-клавиатур
    pub fn by_id_priority(name: &str) -> Option<u32> {
        if !name.contains("event") {
            return None;
        }
        let lower = name.to_lowercase();
        if lower.contains("mouse") || lower.contains("deathadder") {
            return None;
        }

        if name.ends_with("event-kbd") {
            Some(100)
        } else if lower.contains("keyboard") {
            Some(50)
        } else if name.contains("kbd") {
            Some(10)
        } else {
            None
        }
    }

    fn find_by_id() -> Result<Option<PathBuf>> {
        let by_id_dir = Path::new("/dev/input/by-id");
        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return Ok(None);
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| dim_error!(permission, "Нет доступа к /dev/input/by-id: {}", e))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            let Some(priority) = Self::by_id_priority(name) else {
                continue;
            };
            if Self::is_keyboard_device(&path) {
                debug!("Клавиатура {} (приоритет: {})", name, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(candidates.into_iter().next().map(|(path, _)| path))
    }

    fn find_by_event_devices() -> Result<Option<PathBuf>> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| dim_error!(permission, "Нет доступа к /dev/input: {}", e))?;

        let mut event_devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("event"))
            })
            .collect();
        event_devices.sort();

        Ok(event_devices.into_iter().find(|path| Self::is_keyboard_device(path)))
    }

    fn is_keyboard_device(device_path: &Path) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return false;
            }
        };

        let device_name = device.name().unwrap_or("Unknown").to_lowercase();
        if ["mouse", "touchpad", "trackpoint"].iter().any(|m| device_name.contains(m)) {
            debug!("Исключаем устройство как мышь/тачпад: {:?} ({})", device_path, device_name);
            return false;
        }

        // Нужны модификаторы: без них комбинацию не нажать
        device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_A)
                && keys.contains(evdev::KeyCode::KEY_LEFTMETA)
                && keys.contains(evdev::KeyCode::KEY_LEFTCTRL)
                && keys.iter().count() > 20
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyboard_device_with_specific_path() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(DimError::DeviceNotFound(_))));
    }

    #[test]
    fn test_by_id_priorities() {
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_USB_Keyboard-event-kbd"), Some(100));
        assert_eq!(DeviceFinder::by_id_priority("usb-Vendor_Keyboard-if01-event-joystick"), Some(50));
        assert_eq!(DeviceFinder::by_id_priority("usb-Razer_DeathAdder-event-kbd"), None);
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_Mouse-event-mouse"), None);
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_USB_Keyboard-kbd"), None);
    }
}
