#![cfg(windows)]

use std::path::{Path, PathBuf};

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    ICON_BIG, ICON_SMALL, IMAGE_ICON, LR_DEFAULTSIZE, LR_LOADFROMFILE, LoadImageW, MB_ICONERROR,
    MB_ICONINFORMATION, MB_OK, MESSAGEBOX_STYLE, MessageBoxW, SendMessageW, WM_SETICON,
};
use windows::core::PCWSTR;

use crate::utils::to_utf16;

pub const CAPTION: &str = "Service Toggler";

fn message_box(hwnd: Option<HWND>, text: &str, style: MESSAGEBOX_STYLE) {
    let text_w = to_utf16(text);
    let caption_w = to_utf16(CAPTION);
    unsafe {
        MessageBoxW(
            hwnd.unwrap_or_default(),
            PCWSTR(text_w.as_ptr()),
            PCWSTR(caption_w.as_ptr()),
            style | MB_OK,
        );
    }
}

/// Modal informational notice.
pub fn info(hwnd: Option<HWND>, text: &str) {
    tracing::info!("notice: {}", text);
    message_box(hwnd, text, MB_ICONINFORMATION);
}

pub fn error(hwnd: Option<HWND>, text: &str) {
    tracing::error!("notice: {}", text);
    message_box(hwnd, text, MB_ICONERROR);
}

/// `icon.ico` next to the running executable.
pub fn icon_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("icon.ico")
}

/// Load the window icon from disk. Missing or unreadable icons are reported and ignored.
pub fn apply_window_icon(hwnd: HWND, path: &Path) {
    if !path.exists() {
        info(Some(hwnd), &format!("Icon not found at: {}", path.display()));
        return;
    }
    let path_w = to_utf16(&path.to_string_lossy());
    let loaded = unsafe {
        LoadImageW(
            None,
            PCWSTR(path_w.as_ptr()),
            IMAGE_ICON,
            0,
            0,
            LR_LOADFROMFILE | LR_DEFAULTSIZE,
        )
    };
    match loaded {
        Ok(icon) => unsafe {
            let l = LPARAM(icon.0 as isize);
            SendMessageW(hwnd, WM_SETICON, WPARAM(ICON_BIG as usize), l);
            SendMessageW(hwnd, WM_SETICON, WPARAM(ICON_SMALL as usize), l);
        },
        Err(e) => error(Some(hwnd), &format!("Error loading icon: {}", e.message())),
    }
}
