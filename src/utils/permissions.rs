use crate::dim_error;
use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Проверить доступ к клавиатурам для горячей клавиши.
///
/// Ошибка не фатальна: без доступа движок работает, но переключение
/// комбинацией недоступно.
pub fn check_input_access() -> Result<()> {
    info!("Проверка прав доступа...");
    check_not_root();

    let input_dir = Path::new("/dev/input");
    if !input_dir.exists() {
        return Err(dim_error!(permission, "Директория {:?} не существует", input_dir));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {:?} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(dim_error!(
            permission,
            "Нет доступа к {:?}: {}. Добавьте пользователя в группу 'input'",
            input_dir,
            e
        )),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Приложение запущено от имени root!");
            warn!("   Для чтения клавиатуры достаточно группы 'input':");
            warn!("   sudo usermod -a -G input $USER");
            warn!("   (затем перезайдите в систему)");
        }
        Ok(user) => info!("Приложение запущено от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}
